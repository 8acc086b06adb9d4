//! Octet assignment registry.
//!
//! Tracks which accounts hold which non-client and client octets so that
//! overlapping address blocks can be reported with every account involved.

use std::collections::BTreeMap;

use crate::error::{OctetKind, Violation};
use crate::models::AccountOctets;

/// Registry of octet values claimed by network-enabled accounts
#[derive(Debug, Default)]
pub struct OctetRegistry {
    /// (kind, value) -> accounts holding it, in registration order
    assignments: BTreeMap<(OctetKind, u8), Vec<String>>,
    /// Number of accounts registered
    accounts: usize,
}

impl OctetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both octets of one account
    pub fn register(&mut self, account: &str, octets: AccountOctets) {
        self.claim(OctetKind::NonClient, octets.vpc_and_subnet, account);
        self.claim(OctetKind::Client, octets.client, account);
        self.accounts += 1;
    }

    fn claim(&mut self, kind: OctetKind, value: u8, account: &str) {
        let holders = self.assignments.entry((kind, value)).or_default();
        if let Some(first) = holders.first() {
            log::debug!("{} octet {} already held by '{}', now also claimed by '{}'", kind, value, first, account);
        }
        holders.push(account.to_string());
    }

    /// Accounts holding a given octet value
    pub fn holders(&self, kind: OctetKind, value: u8) -> &[String] {
        self.assignments
            .get(&(kind, value))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.accounts
    }

    /// Every octet value held by more than one account.
    ///
    /// Non-client collisions are reported before client collisions, each in
    /// ascending octet order.
    pub fn collisions(&self) -> Vec<Violation> {
        self.assignments
            .iter()
            .filter(|(_, holders)| holders.len() > 1)
            .map(|(&(kind, value), holders)| Violation::OverlappingAddressBlock {
                kind,
                value,
                accounts: holders.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octets(vpc_and_subnet: u8, client: u8) -> AccountOctets {
        AccountOctets { vpc_and_subnet, client }
    }

    #[test]
    fn test_single_account_never_collides() {
        let mut registry = OctetRegistry::new();
        registry.register("dev", octets(3, 3));
        assert!(registry.collisions().is_empty());
        assert_eq!(registry.account_count(), 1);
    }

    #[test]
    fn test_kinds_are_checked_independently() {
        let mut registry = OctetRegistry::new();
        registry.register("dev", octets(1, 2));
        registry.register("prod", octets(2, 1));
        assert!(registry.collisions().is_empty());
        assert_eq!(registry.holders(OctetKind::NonClient, 1), ["dev".to_string()]);
        assert!(registry.holders(OctetKind::NonClient, 9).is_empty());
    }

    #[test]
    fn test_collisions_are_ordered_and_complete() {
        let mut registry = OctetRegistry::new();
        registry.register("dev", octets(5, 12));
        registry.register("prod", octets(5, 13));
        registry.register("stage", octets(6, 12));
        registry.register("sandbox", octets(5, 14));

        assert_eq!(
            registry.collisions(),
            vec![
                Violation::OverlappingAddressBlock {
                    kind: OctetKind::NonClient,
                    value: 5,
                    accounts: vec!["dev".to_string(), "prod".to_string(), "sandbox".to_string()],
                },
                Violation::OverlappingAddressBlock {
                    kind: OctetKind::Client,
                    value: 12,
                    accounts: vec!["dev".to_string(), "stage".to_string()],
                },
            ]
        );
    }
}
