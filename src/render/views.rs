//! Serializable projections of the aggregate model, one per template family.

use indexmap::IndexMap;
use serde::Serialize;

use crate::aggregate::AggregateConfig;
use crate::models::{OrganizationHeader, User};
use crate::registry::AccountDirectoryEntry;
use crate::services::{GithubSettings, NetworkService};

/// `terraform/org/terraform.tfvars`
#[derive(Debug, Clone, Serialize)]
pub struct OrgTfvarsView {
    pub profile: String,
    pub region: String,
}

impl OrgTfvarsView {
    pub fn from_header(header: &OrganizationHeader) -> Self {
        Self {
            profile: header.aws_profiles.identity_center.profile.clone(),
            region: header.aws_profiles.identity_center.region.clone(),
        }
    }
}

/// `terraform/backend/terraform.tfvars`
#[derive(Debug, Clone, Serialize)]
pub struct BackendTfvarsView {
    pub profile: String,
    pub region: String,
    pub bucket_name: String,
    pub table_name: String,
}

impl BackendTfvarsView {
    pub fn from_header(header: &OrganizationHeader) -> Self {
        Self {
            profile: header.aws_profiles.backend.profile.clone(),
            region: header.aws_profiles.backend.region.clone(),
            bucket_name: header.backend.bucket_name.clone(),
            table_name: header.backend.dynamodb_table_name.clone(),
        }
    }
}

/// IAM bootstrap root module
#[derive(Debug, Clone, Serialize)]
pub struct IamRootView {
    pub profile: String,
    pub region: String,
    /// IAM sub-module, relative to the root module directory
    pub relative_module_path: String,
    /// IAM bootstrap document, relative to the root module directory
    pub iam_inputs_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GithubView {
    pub repositories: IndexMap<String, String>,
    pub codestar_arn: String,
    pub codebuild_project_prefix: String,
    pub branch: String,
}

impl From<&GithubSettings> for GithubView {
    fn from(github: &GithubSettings) -> Self {
        Self {
            repositories: github.repositories(),
            codestar_arn: github.codestar_arn.clone(),
            codebuild_project_prefix: github.codebuild_project_prefix.clone(),
            branch: github.branch.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkView {
    pub vpc_cidr_block: String,
    pub subnet_cidr_block: String,
    pub public_subnet_cidr_block: String,
    pub client_cidr_block: String,
}

impl From<&NetworkService> for NetworkView {
    fn from(network: &NetworkService) -> Self {
        Self {
            vpc_cidr_block: network.vpc_cidr_block.to_string(),
            subnet_cidr_block: network.subnet_cidr_block.to_string(),
            public_subnet_cidr_block: network.public_subnet_cidr_block.to_string(),
            client_cidr_block: network.client_cidr_block.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VpnUserView {
    pub user_name: String,
    pub display_name: String,
    pub email: String,
    /// Identifier-safe form of the user name
    pub resource_name: String,
}

impl From<&User> for VpnUserView {
    fn from(user: &User) -> Self {
        let resource_name = user
            .user_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        Self {
            user_name: user.user_name.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            resource_name,
        }
    }
}

/// Per-account root module (`terraform/.build/accounts/<account>`)
#[derive(Debug, Clone, Serialize)]
pub struct AccountModuleView {
    pub account_name: String,
    pub account_alias: String,
    pub target_account_id: String,
    pub org_main_profile: String,
    pub org_main_region: String,
    pub id_center_profile: String,
    pub id_center_region: String,
    /// Modules directory, relative to the account module directory
    pub modules_source: String,

    pub cicd: bool,
    pub git_type: Option<&'static str>,
    pub github: Option<GithubView>,
    pub s3_git_bucket_name: String,
    pub codeartifact_domain_name: String,
    pub codeartifact_repository_name: String,
    pub codebuild_project_name: String,
    pub notification_emails: Vec<String>,

    pub vpc: bool,
    pub network: Option<NetworkView>,
    pub cert_common_name: String,
    pub cert_organization: String,
    /// Empty unless the account has a network service
    pub vpn_users: Vec<VpnUserView>,

    pub test_webapp: bool,
}

impl AccountModuleView {
    pub fn build(config: &AggregateConfig, entry: &AccountDirectoryEntry, modules_source: &str) -> Self {
        let header = config.header();
        let services = config.services_for(&entry.name);
        let cicd = services.and_then(|s| s.cicd());
        let network = services.and_then(|s| s.network());

        let resource_prefix = format!("{}-{}", header.org_prefix, entry.name.to_lowercase());
        let vpn_users = if network.is_some() {
            config.vpn_users_for(&entry.name).into_iter().map(VpnUserView::from).collect()
        } else {
            Vec::new()
        };

        Self {
            account_name: entry.name.clone(),
            account_alias: entry.alias(),
            target_account_id: entry.id.clone(),
            org_main_profile: header.aws_profiles.org_main.profile.clone(),
            org_main_region: header.aws_profiles.org_main.region.clone(),
            id_center_profile: header.aws_profiles.identity_center.profile.clone(),
            id_center_region: header.aws_profiles.identity_center.region.clone(),
            modules_source: modules_source.to_string(),

            cicd: cicd.is_some(),
            git_type: cicd.map(|c| c.git.as_str()),
            github: cicd.and_then(|c| c.github.as_ref()).map(GithubView::from),
            s3_git_bucket_name: format!("{}-s3-git-bucket", resource_prefix),
            codeartifact_domain_name: format!("{}-ca-domain-1", resource_prefix),
            codeartifact_repository_name: format!("{}-ca-repo-1", resource_prefix),
            codebuild_project_name: format!("{}-build-1", resource_prefix),
            notification_emails: config.notification_emails(&entry.name),

            vpc: network.is_some(),
            network: network.map(NetworkView::from),
            cert_common_name: config.network().server_certificate.common_name.clone(),
            cert_organization: config.network().server_certificate.organization.clone(),
            vpn_users,

            test_webapp: services.map_or(false, |s| s.has_test_workload()),
        }
    }

    /// Whether a `vpn_clients.tf` is generated for this account
    pub fn has_vpn_clients(&self) -> bool {
        self.vpc && !self.vpn_users.is_empty()
    }
}
