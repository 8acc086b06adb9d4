//! JSON documents handed to the provisioning tool.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateConfig;
use crate::error::ConfigError;
use crate::models::User;

use super::AccountDirectory;

pub const ADMINISTRATOR_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AdministratorAccess";
pub const CODEARTIFACT_READ_ONLY_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AWSCodeArtifactReadOnlyAccess";

/// Account to create under the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    pub email: String,
    pub parent_id: String,
}

/// `org.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsDocument {
    pub accounts: Vec<AccountRecord>,
}

impl AccountsDocument {
    /// One record per managed account, in header order
    pub fn from_config(config: &AggregateConfig) -> Result<Self, ConfigError> {
        let header = config.header();
        let accounts = header
            .managed_account_names()
            .map(|name| {
                Ok(AccountRecord {
                    name: name.to_string(),
                    email: header.account_email(name)?,
                    parent_id: header.parent_id.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { accounts })
    }
}

/// Inputs of the IAM bootstrap module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamBootstrapDocument {
    pub groups: Vec<String>,
    /// Group -> account IDs
    pub group_accounts: IndexMap<String, Vec<String>>,
    pub users: Vec<User>,
    pub group_policy_arns: IndexMap<String, Vec<String>>,
}

impl IamBootstrapDocument {
    pub fn from_config(config: &AggregateConfig, directory: &AccountDirectory) -> Result<Self, ConfigError> {
        let iam = config.iam_with_account_ids(directory)?;
        let group_policy_arns = group_policy_arns(&iam.groups);
        Ok(Self {
            groups: iam.groups,
            group_accounts: iam.group_accounts,
            users: iam.users,
            group_policy_arns,
        })
    }
}

/// Managed policies attached to groups by name.
///
/// A group whose name contains `developer` gets read-only package access,
/// otherwise `admin` gets administrator access. Other groups get nothing.
pub fn group_policy_arns(groups: &[String]) -> IndexMap<String, Vec<String>> {
    groups
        .iter()
        .filter_map(|group| {
            let lower = group.to_lowercase();
            let arn = if lower.contains("developer") {
                CODEARTIFACT_READ_ONLY_POLICY_ARN
            } else if lower.contains("admin") {
                ADMINISTRATOR_POLICY_ARN
            } else {
                return None;
            };
            Some((group.clone(), vec![arn.to_string()]))
        })
        .collect()
}
