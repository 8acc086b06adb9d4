//! Per-account service declarations.
//!
//! Account documents map free-form keys to service configuration. Known keys
//! resolve into the closed [`ServiceVariant`] set; keys starting with
//! `ignore` are skipped; everything else is kept as a declared key so the
//! cross-validator can check it against the module catalog.

pub mod catalog;
pub mod resolver;
pub mod types;

pub use catalog::ModuleCatalog;
pub use resolver::resolve_account_services;
pub use types::{
    AccountServices, CicdPackage, CicdPackages, CicdService, GitMode, GithubSettings, NetworkService,
    ServiceVariant,
};

/// Key of the CI/CD service
pub const CICD_KEY: &str = "cicd";
/// Key of the VPC/VPN service
pub const NETWORK_KEY: &str = "vpc-vpn";
/// Key of the test workload service
pub const TEST_WORKLOAD_KEY: &str = "test-webapp";
/// Keys starting with this prefix are skipped entirely
pub const IGNORE_PREFIX: &str = "ignore";

/// Whether a service key opts out of resolution and validation
pub fn is_ignored(key: &str) -> bool {
    key.starts_with(IGNORE_PREFIX)
}
