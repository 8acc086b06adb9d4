//! Typed per-account service variants.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ip::CidrBlock;
use crate::models::AccountOctets;

use super::{CICD_KEY, NETWORK_KEY, TEST_WORKLOAD_KEY};

/// Where a CI/CD pipeline reads its sources from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitMode {
    /// Object-store-backed git remotes
    S3,
    /// Hosted git through a CodeStar connection
    GitHub,
}

impl GitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitMode::S3 => "S3",
            GitMode::GitHub => "GitHub",
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

/// Hosted-git pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSettings {
    pub owner: String,
    pub repos: Vec<String>,
    pub codestar_arn: String,
    pub codebuild_project_prefix: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl GithubSettings {
    /// Repository name -> `owner/repository`
    pub fn repositories(&self) -> IndexMap<String, String> {
        self.repos
            .iter()
            .map(|repo| (repo.clone(), format!("{}/{}", self.owner, repo)))
            .collect()
    }
}

/// A package built by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CicdPackage {
    pub name: String,
    pub terminal_background_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CicdPackages {
    #[serde(default)]
    pub python: Vec<CicdPackage>,
}

/// `cicd` service declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CicdService {
    pub git: GitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<CicdPackages>,
}

impl CicdService {
    pub fn package(&self, name: &str) -> Option<&CicdPackage> {
        self.packages.as_ref()?.python.iter().find(|p| p.name == name)
    }
}

/// `vpc-vpn` service, resolved into concrete address blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkService {
    pub vpc_cidr_block: CidrBlock,
    pub subnet_cidr_block: CidrBlock,
    pub public_subnet_cidr_block: CidrBlock,
    pub client_cidr_block: CidrBlock,
    /// Octets the blocks were derived from
    pub octets: AccountOctets,
}

impl NetworkService {
    pub fn blocks(&self) -> [CidrBlock; 4] {
        [
            self.vpc_cidr_block,
            self.subnet_cidr_block,
            self.public_subnet_cidr_block,
            self.client_cidr_block,
        ]
    }
}

/// Closed set of typed service declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceVariant {
    Cicd(CicdService),
    Network(NetworkService),
    TestWorkload,
}

impl ServiceVariant {
    /// Module key the variant was declared under
    pub fn module_key(&self) -> &'static str {
        match self {
            ServiceVariant::Cicd(_) => CICD_KEY,
            ServiceVariant::Network(_) => NETWORK_KEY,
            ServiceVariant::TestWorkload => TEST_WORKLOAD_KEY,
        }
    }
}

/// Resolved services of one managed account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountServices {
    pub account_name: String,
    /// Every non-ignored key of the account document, in authoring order
    pub declared_keys: Vec<String>,
    services: Vec<ServiceVariant>,
}

impl AccountServices {
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            declared_keys: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Record a declared key that has no typed variant (yet)
    pub fn declare(&mut self, key: impl Into<String>) {
        self.declared_keys.push(key.into());
    }

    /// Append a typed service and declare its key.
    ///
    /// An account holds at most one variant of each kind.
    pub fn add_service(&mut self, service: ServiceVariant) -> Result<(), String> {
        let key = service.module_key();
        if self.services.iter().any(|s| s.module_key() == key) {
            return Err(format!(
                "account '{}' declares the '{}' service more than once",
                self.account_name, key
            ));
        }
        self.declare(key);
        self.services.push(service);
        Ok(())
    }

    pub fn services(&self) -> &[ServiceVariant] {
        &self.services
    }

    pub fn cicd(&self) -> Option<&CicdService> {
        self.services.iter().find_map(|s| match s {
            ServiceVariant::Cicd(cicd) => Some(cicd),
            _ => None,
        })
    }

    pub fn network(&self) -> Option<&NetworkService> {
        self.services.iter().find_map(|s| match s {
            ServiceVariant::Network(network) => Some(network),
            _ => None,
        })
    }

    pub fn has_test_workload(&self) -> bool {
        self.services
            .iter()
            .any(|s| matches!(s, ServiceVariant::TestWorkload))
    }
}
