//! Cross-document validation.
//!
//! Rule categories run in a fixed order. Every violation of one category is
//! collected before failing, and the first failing category stops the run:
//!
//! 1. account documents name managed accounts
//! 2. declared service keys name existing modules
//! 3. IAM groups are unique, and grants and memberships reference known
//!    groups and accounts
//! 4. network octets are unique across accounts

use std::collections::HashSet;

use crate::aggregate::UnvalidatedConfig;
use crate::error::{ConfigError, Violation};
use crate::ip::OctetRegistry;
use crate::services::ModuleCatalog;

/// Validate an assembled configuration against the module catalog
pub fn validate_config(config: &UnvalidatedConfig, catalog: &ModuleCatalog) -> Result<(), ConfigError> {
    let categories: [(&str, fn(&UnvalidatedConfig, &ModuleCatalog) -> Vec<Violation>); 4] = [
        ("account names", |c, _| check_account_names(c)),
        ("service modules", check_service_modules),
        ("IAM references", |c, _| check_iam_references(c)),
        ("address blocks", |c, _| check_address_blocks(c)),
    ];

    for (name, check) in categories {
        let violations = check(config, catalog);
        if !violations.is_empty() {
            log::error!("Validation of {} failed with {} violation(s)", name, violations.len());
            return Err(ConfigError::Validation(violations));
        }
        log::debug!("Validation of {} passed", name);
    }

    Ok(())
}

/// Every account document must belong to a managed account
pub fn check_account_names(config: &UnvalidatedConfig) -> Vec<Violation> {
    config
        .accounts
        .iter()
        .filter(|a| !config.header.is_managed(&a.account_name))
        .map(|a| Violation::UnknownAccount {
            account: a.account_name.clone(),
            context: "account-services document".to_string(),
        })
        .collect()
}

/// Every declared service key must name a provisioning module.
///
/// One violation per account document, listing all of its unknown keys.
pub fn check_service_modules(config: &UnvalidatedConfig, catalog: &ModuleCatalog) -> Vec<Violation> {
    config
        .accounts
        .iter()
        .filter_map(|account| {
            let keys: Vec<String> = account
                .declared_keys
                .iter()
                .filter(|k| !catalog.contains(k))
                .cloned()
                .collect();
            (!keys.is_empty()).then(|| Violation::UnknownServiceModule {
                account: account.account_name.clone(),
                keys,
            })
        })
        .collect()
}

/// Group names must be unique, group grants and user memberships must
/// reference known groups, and grants must reference managed accounts
pub fn check_iam_references(config: &UnvalidatedConfig) -> Vec<Violation> {
    let iam = &config.iam;
    let mut violations = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for group in &iam.groups {
        if !seen.insert(group.as_str()) && reported.insert(group.as_str()) {
            violations.push(Violation::DuplicateGroup { group: group.clone() });
        }
    }

    for group in iam.group_accounts.keys() {
        if !iam.has_group(group) {
            violations.push(Violation::UnknownGroup {
                group: group.clone(),
                context: "granted accounts in group_accounts".to_string(),
            });
        }
    }

    for (group, accounts) in &iam.group_accounts {
        for account in accounts {
            if !config.header.is_managed(account) {
                violations.push(Violation::UnknownAccount {
                    account: account.clone(),
                    context: format!("granted to group '{}'", group),
                });
            }
        }
    }

    for user in &iam.users {
        for group in &user.groups {
            if !iam.has_group(group) {
                violations.push(Violation::UnknownGroup {
                    group: group.clone(),
                    context: format!("assigned to user '{}'", user.user_name),
                });
            }
        }
    }

    violations
}

/// Non-client and client octets must each be unique across accounts
pub fn check_address_blocks(config: &UnvalidatedConfig) -> Vec<Violation> {
    let mut registry = OctetRegistry::new();
    for account in &config.accounts {
        if let Some(network) = account.network() {
            registry.register(&account.account_name, network.octets);
        }
    }

    if registry.account_count() < 2 {
        return Vec::new();
    }
    registry.collisions()
}
