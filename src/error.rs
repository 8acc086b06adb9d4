//! Error types for configuration loading, resolution and cross-validation.
//!
//! Every error here is terminal for the current run. Callers present the
//! message and exit; nothing is retried or repaired.

use std::fmt;
use std::path::PathBuf;

/// Which of the two per-account octets an address-block check refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OctetKind {
    /// Octet substituted into the VPC and subnet blocks (2nd position)
    NonClient,
    /// Octet substituted into the VPN client pool block (3rd position)
    Client,
}

impl OctetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OctetKind::NonClient => "non-client",
            OctetKind::Client => "client",
        }
    }
}

impl fmt::Display for OctetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cross-validation finding.
///
/// Violations are grouped per rule category inside [`ConfigError::Validation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("account '{account}' ({context}) is not listed in header.yaml managed_accounts")]
    UnknownAccount { account: String, context: String },

    #[error("group '{group}' ({context}) does not exist in the iam.yaml groups list")]
    UnknownGroup { group: String, context: String },

    #[error("group '{group}' is listed more than once in the iam.yaml groups list")]
    DuplicateGroup { group: String },

    #[error("account '{account}' declares service(s) with no matching module: {}", keys.join(", "))]
    UnknownServiceModule { account: String, keys: Vec<String> },

    #[error("{kind} octet {value} is assigned to more than one account: {}", accounts.join(", "))]
    OverlappingAddressBlock {
        kind: OctetKind,
        value: u8,
        accounts: Vec<String>,
    },
}

/// Errors raised while building the aggregate configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required document not found: {}", path.display())]
    MissingDocument { path: PathBuf },

    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("invalid CIDR block '{block}': expected a.b.c.d/n")]
    InvalidBlockFormat { block: String },

    #[error("invalid email address '{email}': expected local-part@domain")]
    InvalidEmailFormat { email: String },

    #[error("account '{account}' not found in the provisioning output")]
    AccountNotInDirectory { account: String },

    #[error("configuration validation failed:\n{}", format_violations(.0))]
    Validation(Vec<Violation>),
}

impl ConfigError {
    /// Violations carried by a validation failure; empty for other errors
    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigError::Validation(violations) => violations,
            _ => &[],
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ConfigError::MalformedDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {}", v))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_violation() {
        let err = ConfigError::Validation(vec![
            Violation::UnknownGroup {
                group: "ops".to_string(),
                context: "assigned to user Jane".to_string(),
            },
            Violation::UnknownServiceModule {
                account: "dev".to_string(),
                keys: vec!["cicdd".to_string(), "vpn".to_string()],
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("group 'ops'"));
        assert!(msg.contains("cicdd, vpn"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_overlap_message_names_kind_and_value() {
        let violation = Violation::OverlappingAddressBlock {
            kind: OctetKind::Client,
            value: 12,
            accounts: vec!["dev".to_string(), "prod".to_string()],
        };
        assert_eq!(
            violation.to_string(),
            "client octet 12 is assigned to more than one account: dev, prod"
        );
    }

    #[test]
    fn test_non_validation_error_has_no_violations() {
        let err = ConfigError::InvalidEmailFormat {
            email: "nobody".to_string(),
        };
        assert!(err.violations().is_empty());
    }
}
