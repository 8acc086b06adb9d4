//! Typed records for the user-authored configuration documents.
//!
//! Field names match the YAML keys of `header.yaml`, `iam.yaml` and
//! `vpc-vpn-header.yaml`. Unknown keys are ignored.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::utils::email::{plus_address, split_email};

/// Named AWS CLI profile and the region it operates in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsProfile {
    pub profile: String,
    pub region: String,
}

/// Profiles used by the different provisioning stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsProfiles {
    pub backend: AwsProfile,
    pub identity_center: AwsProfile,
    pub org_main: AwsProfile,
}

/// Remote state storage coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStorage {
    pub bucket_name: String,
    pub dynamodb_table_name: String,
}

/// Optional per-account settings in `managed_accounts`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOverride {
    /// Explicit root email; plus-addressed from `base_email` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Organization identity and shared provisioning settings (`header.yaml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationHeader {
    pub base_email: String,
    pub org_prefix: String,
    pub org_name: String,
    pub org_alias: String,
    pub org_email: String,
    pub aws_profiles: AwsProfiles,
    pub backend: BackendStorage,
    pub parent_id: String,
    #[serde(default)]
    pub managed_accounts: IndexMap<String, Option<AccountOverride>>,
}

impl OrganizationHeader {
    pub fn is_managed(&self, account: &str) -> bool {
        self.managed_accounts.contains_key(account)
    }

    /// Managed account names in authoring order
    pub fn managed_account_names(&self) -> impl Iterator<Item = &str> {
        self.managed_accounts.keys().map(String::as_str)
    }

    /// Root email of a managed account.
    ///
    /// An explicit override wins; otherwise the account name is used as the
    /// plus-address tag of `base_email`.
    pub fn account_email(&self, account: &str) -> Result<String, ConfigError> {
        let explicit = self
            .managed_accounts
            .get(account)
            .and_then(Option::as_ref)
            .and_then(|o| o.email.as_deref());

        match explicit {
            Some(email) => {
                split_email(email)?;
                Ok(email.to_string())
            }
            None => plus_address(&self.base_email, account),
        }
    }
}

/// Structured name of an identity-center user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub given_name: String,
    pub family_name: String,
}

/// Identity-center user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub display_name: String,
    pub user_name: String,
    pub name: PersonName,
    pub email: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub vpn_access: bool,
}

/// Groups, group grants and users (`iam.yaml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamPolicy {
    pub groups: Vec<String>,
    /// Group name -> account names (or account IDs once projected)
    #[serde(default)]
    pub group_accounts: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl IamPolicy {
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Whether `group` is granted access to `account`
    pub fn grants(&self, group: &str, account: &str) -> bool {
        self.group_accounts
            .get(group)
            .map_or(false, |accounts| accounts.iter().any(|a| a == account))
    }

    /// Users holding VPN access through a group granted `account`
    pub fn vpn_users_for(&self, account: &str) -> Vec<&User> {
        self.users
            .iter()
            .filter(|u| u.vpn_access)
            .filter(|u| u.groups.iter().any(|g| self.grants(g, account)))
            .collect()
    }
}

/// Server certificate subject for the client VPN endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCertificate {
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub organization: String,
}

/// Base address blocks shared by every network-enabled account
/// (`vpc-vpn-header.yaml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHeader {
    pub vpc_cidr_block_base: String,
    pub subnet_cidr_block: String,
    pub public_subnet_cidr_block_base: String,
    pub client_cidr_block_base: String,
    /// Always derived from the organization header during assembly
    #[serde(default)]
    pub server_certificate: ServerCertificate,
}

impl NetworkHeader {
    /// Copy of this header whose certificate subject comes from the
    /// organization (alias as common name, org name as organization)
    pub fn with_certificate_from(&self, header: &OrganizationHeader) -> NetworkHeader {
        NetworkHeader {
            server_certificate: ServerCertificate {
                common_name: header.org_alias.clone(),
                organization: header.org_name.clone(),
            },
            ..self.clone()
        }
    }
}

/// Per-account octets substituted into the network base blocks.
///
/// Accepts integers or numeric strings in YAML (`client: 12` or
/// `client: "12"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountOctets {
    #[serde(deserialize_with = "deserialize_octet")]
    pub vpc_and_subnet: u8,
    #[serde(deserialize_with = "deserialize_octet")]
    pub client: u8,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOctet {
    Number(i64),
    Text(String),
}

fn deserialize_octet<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    match RawOctet::deserialize(deserializer)? {
        RawOctet::Number(n) => {
            u8::try_from(n).map_err(|_| de::Error::custom(format!("octet {} is outside 0-255", n)))
        }
        RawOctet::Text(s) => s
            .trim()
            .parse::<u8>()
            .map_err(|_| de::Error::custom(format!("octet '{}' is not an integer in 0-255", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_YAML: &str = r#"
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

    #[test]
    fn test_header_parsing_keeps_account_order() {
        let header: OrganizationHeader = serde_yaml::from_str(HEADER_YAML).unwrap();
        assert_eq!(header.managed_account_names().collect::<Vec<_>>(), ["dev", "prod"]);
        assert!(header.is_managed("prod"));
        assert!(!header.is_managed("stage"));
        assert_eq!(header.aws_profiles.org_main.region, "us-west-2");
    }

    #[test]
    fn test_account_email() {
        let header: OrganizationHeader = serde_yaml::from_str(HEADER_YAML).unwrap();
        assert_eq!(header.account_email("dev").unwrap(), "ops+dev@x.com");
        assert_eq!(header.account_email("prod").unwrap(), "prod@x.com");
    }

    #[test]
    fn test_account_email_checks_override() {
        let mut header: OrganizationHeader = serde_yaml::from_str(HEADER_YAML).unwrap();
        header.managed_accounts.insert(
            "stage".to_string(),
            Some(AccountOverride {
                email: Some("stage.x.com".to_string()),
            }),
        );
        assert!(matches!(
            header.account_email("stage"),
            Err(ConfigError::InvalidEmailFormat { .. })
        ));
    }

    #[test]
    fn test_empty_override_falls_back_to_plus_address() {
        let mut header: OrganizationHeader = serde_yaml::from_str(HEADER_YAML).unwrap();
        header
            .managed_accounts
            .insert("stage".to_string(), Some(AccountOverride::default()));
        assert_eq!(header.account_email("stage").unwrap(), "ops+stage@x.com");
    }

    #[test]
    fn test_user_defaults() {
        let yaml = r#"
display_name: Jane Doe
user_name: jdoe
name: { given_name: Jane, family_name: Doe }
email: jane@x.com
"#;
        let user: User = serde_yaml::from_str(yaml).unwrap();
        assert!(!user.vpn_access);
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_vpn_users_for_account() {
        let yaml = r#"
groups: [admins, developers]
group_accounts:
  admins: [dev, prod]
  developers: [dev]
users:
  - display_name: Jane Doe
    user_name: jdoe
    name: { given_name: Jane, family_name: Doe }
    email: jane@x.com
    groups: [developers]
    vpn_access: true
  - display_name: Sam Roe
    user_name: sroe
    name: { given_name: Sam, family_name: Roe }
    email: sam@x.com
    groups: [admins]
"#;
        let iam: IamPolicy = serde_yaml::from_str(yaml).unwrap();
        let dev: Vec<_> = iam.vpn_users_for("dev").iter().map(|u| u.user_name.as_str()).collect();
        assert_eq!(dev, ["jdoe"]);
        assert!(iam.vpn_users_for("prod").is_empty());
        assert!(iam.grants("admins", "prod"));
        assert!(!iam.grants("developers", "prod"));
    }

    #[test]
    fn test_certificate_is_derived_from_header() {
        let header: OrganizationHeader = serde_yaml::from_str(HEADER_YAML).unwrap();
        let yaml = r#"
vpc_cidr_block_base: 10.0.0.0/16
subnet_cidr_block: 10.0.0.0/24
public_subnet_cidr_block_base: 10.0.0.0/24
client_cidr_block_base: 10.8.0.0/22
server_certificate:
  common_name: hand-written
  organization: hand-written
"#;
        let network: NetworkHeader = serde_yaml::from_str(yaml).unwrap();
        let derived = network.with_certificate_from(&header);

        assert_eq!(derived.server_certificate.common_name, "acme");
        assert_eq!(derived.server_certificate.organization, "Acme Corp");
        assert_eq!(derived.vpc_cidr_block_base, network.vpc_cidr_block_base);
        assert_eq!(network.server_certificate.common_name, "hand-written");
    }

    #[test]
    fn test_octets_accept_numbers_and_strings() {
        let from_text: AccountOctets = serde_yaml::from_str("{vpc_and_subnet: \"5\", client: \"12\"}").unwrap();
        let from_int: AccountOctets = serde_yaml::from_str("{vpc_and_subnet: 5, client: 12}").unwrap();
        assert_eq!(from_text, from_int);
        assert_eq!(from_int.client, 12);
    }

    #[test]
    fn test_octets_reject_out_of_range() {
        assert!(serde_yaml::from_str::<AccountOctets>("{vpc_and_subnet: 256, client: 1}").is_err());
        assert!(serde_yaml::from_str::<AccountOctets>("{vpc_and_subnet: -1, client: 1}").is_err());
        assert!(serde_yaml::from_str::<AccountOctets>("{vpc_and_subnet: five, client: 1}").is_err());
    }
}
