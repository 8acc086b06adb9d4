//! The aggregate configuration model.
//!
//! [`UnvalidatedConfig`] is the plain composition of all parsed and resolved
//! documents. It can be built directly (tests do) and only turns into an
//! [`AggregateConfig`] through [`UnvalidatedConfig::validate`], so rendering
//! never sees a partially valid model.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::models::{IamPolicy, NetworkHeader, OrganizationHeader, User};
use crate::registry::AccountDirectory;
use crate::services::{AccountServices, ModuleCatalog, NetworkService};
use crate::utils::validation::validate_config;

/// Groups whose members receive build and review notifications
const NOTIFIED_GROUP_MARKERS: [&str; 2] = ["admin", "developer"];

/// Assembled but not yet trusted configuration
#[derive(Debug, Clone)]
pub struct UnvalidatedConfig {
    pub header: OrganizationHeader,
    pub iam: IamPolicy,
    pub network: NetworkHeader,
    pub accounts: Vec<AccountServices>,
}

impl UnvalidatedConfig {
    /// Compose the parts. The network certificate subject is always
    /// replaced with the organization's alias and name.
    pub fn assemble(
        header: OrganizationHeader,
        iam: IamPolicy,
        network: NetworkHeader,
        accounts: Vec<AccountServices>,
    ) -> Self {
        let network = network.with_certificate_from(&header);
        Self {
            header,
            iam,
            network,
            accounts,
        }
    }

    /// Run every cross-document check and seal the model
    pub fn validate(self, catalog: &ModuleCatalog) -> Result<AggregateConfig, ConfigError> {
        validate_config(&self, catalog)?;
        Ok(AggregateConfig {
            header: self.header,
            iam: self.iam,
            network: self.network,
            accounts: self.accounts,
        })
    }
}

/// Validated, read-only configuration consumed by every generation step
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    header: OrganizationHeader,
    iam: IamPolicy,
    network: NetworkHeader,
    accounts: Vec<AccountServices>,
}

impl AggregateConfig {
    pub fn header(&self) -> &OrganizationHeader {
        &self.header
    }

    pub fn iam(&self) -> &IamPolicy {
        &self.iam
    }

    pub fn network(&self) -> &NetworkHeader {
        &self.network
    }

    pub fn accounts(&self) -> &[AccountServices] {
        &self.accounts
    }

    pub fn services_for(&self, account: &str) -> Option<&AccountServices> {
        self.accounts.iter().find(|a| a.account_name == account)
    }

    pub fn vpn_users_for(&self, account: &str) -> Vec<&User> {
        self.iam.vpn_users_for(account)
    }

    /// Accounts with a network service, with that service
    pub fn network_accounts(&self) -> impl Iterator<Item = (&str, &NetworkService)> {
        self.accounts
            .iter()
            .filter_map(|a| a.network().map(|n| (a.account_name.as_str(), n)))
    }

    /// Emails of users holding an admin or developer group granted
    /// `account`, deduplicated and sorted
    pub fn notification_emails(&self, account: &str) -> Vec<String> {
        let emails: BTreeSet<&str> = self
            .iam
            .users
            .iter()
            .filter(|u| {
                u.groups.iter().any(|g| {
                    let lowered = g.to_lowercase();
                    NOTIFIED_GROUP_MARKERS.iter().any(|m| lowered.contains(m)) && self.iam.grants(g, account)
                })
            })
            .map(|u| u.email.as_str())
            .collect();
        emails.into_iter().map(str::to_string).collect()
    }

    /// A new IAM policy whose group grants name account IDs instead of
    /// account names
    pub fn iam_with_account_ids(&self, directory: &AccountDirectory) -> Result<IamPolicy, ConfigError> {
        let mut group_accounts = IndexMap::with_capacity(self.iam.group_accounts.len());
        for (group, accounts) in &self.iam.group_accounts {
            let ids = accounts
                .iter()
                .map(|account| directory.id_of(account).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            group_accounts.insert(group.clone(), ids);
        }

        Ok(IamPolicy {
            groups: self.iam.groups.clone(),
            group_accounts,
            users: self.iam.users.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Model builders shared by unit tests

    use super::*;
    use crate::ip::derive_network_service;
    use crate::models::{AccountOctets, PersonName, ServerCertificate};
    use crate::services::ServiceVariant;

    pub const HEADER_YAML: &str = r#"
base_email: ops@x.com
org_prefix: acme
org_name: Acme Corp
org_alias: acme
org_email: root@x.com
aws_profiles:
  backend: { profile: backend, region: us-east-1 }
  identity_center: { profile: idc, region: us-east-1 }
  org_main: { profile: main, region: us-west-2 }
backend:
  bucket_name: acme-tf-state
  dynamodb_table_name: acme-tf-lock
parent_id: ou-abcd-12345678
managed_accounts:
  dev:
  prod:
    email: prod@x.com
"#;

    pub fn header() -> OrganizationHeader {
        serde_yaml::from_str(HEADER_YAML).unwrap()
    }

    pub fn network_header() -> NetworkHeader {
        NetworkHeader {
            vpc_cidr_block_base: "10.0.0.0/16".to_string(),
            subnet_cidr_block: "10.0.0.0/24".to_string(),
            public_subnet_cidr_block_base: "10.0.0.0/24".to_string(),
            client_cidr_block_base: "10.0.0.0/22".to_string(),
            server_certificate: ServerCertificate::default(),
        }
    }

    pub fn user(user_name: &str, groups: &[&str], vpn_access: bool) -> User {
        User {
            display_name: user_name.to_uppercase(),
            user_name: user_name.to_string(),
            name: PersonName {
                given_name: user_name.to_string(),
                family_name: "Test".to_string(),
            },
            email: format!("{}@x.com", user_name),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            vpn_access,
        }
    }

    pub fn iam() -> IamPolicy {
        let mut group_accounts = IndexMap::new();
        group_accounts.insert("admins".to_string(), vec!["dev".to_string(), "prod".to_string()]);
        group_accounts.insert("developers".to_string(), vec!["dev".to_string()]);
        IamPolicy {
            groups: vec!["admins".to_string(), "developers".to_string(), "auditors".to_string()],
            group_accounts,
            users: vec![
                user("jdoe", &["developers"], true),
                user("sroe", &["admins"], false),
                user("alee", &["auditors"], true),
            ],
        }
    }

    pub fn network_account(name: &str, vpc_and_subnet: u8, client: u8) -> AccountServices {
        let octets = AccountOctets { vpc_and_subnet, client };
        let mut services = AccountServices::new(name);
        services
            .add_service(ServiceVariant::Network(
                derive_network_service(&network_header(), octets).unwrap(),
            ))
            .unwrap();
        services
    }

    pub fn unvalidated(accounts: Vec<AccountServices>) -> UnvalidatedConfig {
        UnvalidatedConfig::assemble(header(), iam(), network_header(), accounts)
    }

    pub fn catalog() -> ModuleCatalog {
        ["cicd", "vpc-vpn", "test-webapp", "monitoring"].into_iter().collect()
    }
}
