//! Template rendering for provisioning-tool inputs.
//!
//! Templates are embedded at compile time and registered once per
//! [`TeraRenderer`]. Rendering is a pure function of the template and the
//! serialized view passed in.

pub mod views;

use serde::Serialize;
use tera::{Context, Tera};

pub use views::{AccountModuleView, BackendTfvarsView, IamRootView, OrgTfvarsView};

/// Errors raised while registering or rendering templates
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to register templates: {0}")]
    Registration(#[source] tera::Error),

    #[error("failed to render template '{template}': {source}")]
    Template {
        template: &'static str,
        #[source]
        source: tera::Error,
    },

    #[error("failed to build template context: {0}")]
    Context(#[source] tera::Error),
}

/// Every template the generators render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    AccountMain,
    AccountVariables,
    AccountOutput,
    AccountTfvars,
    AccountVpnClients,
    BackendTfvars,
    OrgTfvars,
    IamMain,
    IamVariables,
    IamOutput,
}

impl TemplateId {
    pub const ALL: [TemplateId; 10] = [
        TemplateId::AccountMain,
        TemplateId::AccountVariables,
        TemplateId::AccountOutput,
        TemplateId::AccountTfvars,
        TemplateId::AccountVpnClients,
        TemplateId::BackendTfvars,
        TemplateId::OrgTfvars,
        TemplateId::IamMain,
        TemplateId::IamVariables,
        TemplateId::IamOutput,
    ];

    /// Registered template name
    pub fn name(self) -> &'static str {
        match self {
            TemplateId::AccountMain => "accounts/main.tf",
            TemplateId::AccountVariables => "accounts/variables.tf",
            TemplateId::AccountOutput => "accounts/output.tf",
            TemplateId::AccountTfvars => "accounts/terraform.tfvars",
            TemplateId::AccountVpnClients => "accounts/vpn_clients.tf",
            TemplateId::BackendTfvars => "backend/terraform.tfvars",
            TemplateId::OrgTfvars => "org/terraform.tfvars",
            TemplateId::IamMain => "iam/main.tf",
            TemplateId::IamVariables => "iam/variables.tf",
            TemplateId::IamOutput => "iam/output.tf",
        }
    }

    /// File name of the rendered artifact
    pub fn file_name(self) -> &'static str {
        self.name().rsplit('/').next().unwrap_or_default()
    }

    fn source(self) -> &'static str {
        match self {
            TemplateId::AccountMain => include_str!("../../templates/accounts/main.tf.tera"),
            TemplateId::AccountVariables => include_str!("../../templates/accounts/variables.tf.tera"),
            TemplateId::AccountOutput => include_str!("../../templates/accounts/output.tf.tera"),
            TemplateId::AccountTfvars => include_str!("../../templates/accounts/terraform.tfvars.tera"),
            TemplateId::AccountVpnClients => include_str!("../../templates/accounts/vpn_clients.tf.tera"),
            TemplateId::BackendTfvars => include_str!("../../templates/backend/terraform.tfvars.tera"),
            TemplateId::OrgTfvars => include_str!("../../templates/org/terraform.tfvars.tera"),
            TemplateId::IamMain => include_str!("../../templates/iam/main.tf.tera"),
            TemplateId::IamVariables => include_str!("../../templates/iam/variables.tf.tera"),
            TemplateId::IamOutput => include_str!("../../templates/iam/output.tf.tera"),
        }
    }
}

/// Text sink for generated artifacts
pub trait Renderer {
    fn render(&self, template: TemplateId, context: &Context) -> Result<String, RenderError>;

    /// Render with a context built from any serializable view
    fn render_view<V: Serialize>(&self, template: TemplateId, view: &V) -> Result<String, RenderError>
    where
        Self: Sized,
    {
        let context = Context::from_serialize(view).map_err(RenderError::Context)?;
        self.render(template, &context)
    }
}

/// [`Renderer`] over the embedded Tera templates
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TemplateId::ALL.iter().map(|id| (id.name(), id.source())))
            .map_err(RenderError::Registration)?;
        Ok(Self { tera })
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: TemplateId, context: &Context) -> Result<String, RenderError> {
        self.tera
            .render(template.name(), context)
            .map_err(|source| RenderError::Template {
                template: template.name(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::registry::AccountDirectoryEntry;
    use crate::services::{AccountServices, CicdService, GitMode, GithubSettings, ServiceVariant};

    fn entry(name: &str) -> AccountDirectoryEntry {
        AccountDirectoryEntry {
            name: name.to_string(),
            arn: format!("arn:aws:organizations::999:account/o-1/{}", name),
            id: "111122223333".to_string(),
            assumable_role_arn: "arn:aws:iam::111122223333:role/OrganizationAccountAccessRole".to_string(),
            parent_id: "ou-1".to_string(),
        }
    }

    #[test]
    fn test_all_templates_register() {
        let renderer = TeraRenderer::new().unwrap();
        for id in TemplateId::ALL {
            assert!(renderer.tera.get_template_names().any(|n| n == id.name()));
        }
        assert_eq!(TemplateId::AccountTfvars.file_name(), "terraform.tfvars");
    }

    #[test]
    fn test_render_org_tfvars() {
        let renderer = TeraRenderer::new().unwrap();
        let out = renderer
            .render_view(TemplateId::OrgTfvars, &OrgTfvarsView::from_header(&header()))
            .unwrap();
        assert_eq!(out, "aws_profile_name = \"idc\"\naws_region       = \"us-east-1\"\n");
    }

    #[test]
    fn test_render_backend_tfvars() {
        let renderer = TeraRenderer::new().unwrap();
        let out = renderer
            .render_view(TemplateId::BackendTfvars, &BackendTfvarsView::from_header(&header()))
            .unwrap();
        assert!(out.contains("bucket_name         = \"acme-tf-state\""));
        assert!(out.contains("dynamodb_table_name = \"acme-tf-lock\""));
        assert!(out.contains("aws_profile_name    = \"backend\""));
    }

    #[test]
    fn test_render_account_module() {
        let mut dev = network_account("dev", 5, 12);
        dev.add_service(ServiceVariant::Cicd(CicdService {
            git: GitMode::GitHub,
            github: Some(GithubSettings {
                owner: "acme".to_string(),
                repos: vec!["api".to_string()],
                codestar_arn: "arn:codestar".to_string(),
                codebuild_project_prefix: "acme".to_string(),
                branch: "main".to_string(),
            }),
            packages: None,
        }))
        .unwrap();
        let config = unvalidated(vec![dev]).validate(&catalog()).unwrap();
        let view = AccountModuleView::build(&config, &entry("dev"), "../../../modules");
        let renderer = TeraRenderer::new().unwrap();

        let tfvars = renderer.render_view(TemplateId::AccountTfvars, &view).unwrap();
        assert!(tfvars.contains("target_account_id = \"111122223333\""));
        assert!(tfvars.contains("s3_git_bucket_name           = \"acme-dev-s3-git-bucket\""));
        assert!(tfvars.contains(r#"review_notification_emails   = ["jdoe@x.com","sroe@x.com"]"#));
        assert!(tfvars.contains(r#"github_repositories          = {"api":"acme/api"}"#));
        assert!(tfvars.contains("vpc_cidr_block                        = \"10.5.0.0/16\""));
        assert!(tfvars.contains("client_vpn_endpoint_client_cidr_block = \"10.0.12.0/22\""));
        assert!(tfvars.contains("cert_common_name                      = \"acme\""));

        let main = renderer.render_view(TemplateId::AccountMain, &view).unwrap();
        assert!(main.contains("source = \"../../../modules/cicd\""));
        assert!(main.contains("module \"vpc_vpn\""));
        assert!(!main.contains("module \"test_webapp\""));
        assert!(main.contains("hashicorp/tls"));

        let vpn = renderer.render_view(TemplateId::AccountVpnClients, &view).unwrap();
        assert!(vpn.contains("resource \"tls_private_key\" \"jdoe\""));
        assert!(!vpn.contains("sroe"));
    }

    #[test]
    fn test_notification_emails_follow_account_grants() {
        let mut prod = AccountServices::new("prod");
        prod.add_service(ServiceVariant::Cicd(CicdService {
            git: GitMode::S3,
            github: None,
            packages: None,
        }))
        .unwrap();
        let config = unvalidated(vec![prod]).validate(&catalog()).unwrap();
        let view = AccountModuleView::build(&config, &entry("prod"), "../../../modules");
        assert_eq!(view.notification_emails, ["sroe@x.com"]);

        let tfvars = TeraRenderer::new().unwrap().render_view(TemplateId::AccountTfvars, &view).unwrap();
        assert!(tfvars.contains(r#"build_notification_emails    = ["sroe@x.com"]"#));
        assert!(!tfvars.contains("jdoe@x.com"));
    }

    #[test]
    fn test_render_account_without_services() {
        let config = unvalidated(vec![AccountServices::new("prod")]).validate(&catalog()).unwrap();
        let view = AccountModuleView::build(&config, &entry("prod"), "../../../modules");
        let renderer = TeraRenderer::new().unwrap();

        let tfvars = renderer.render_view(TemplateId::AccountTfvars, &view).unwrap();
        assert!(!tfvars.contains("cidr_block"));
        assert!(!tfvars.contains("git_type"));

        let variables = renderer.render_view(TemplateId::AccountVariables, &view).unwrap();
        assert!(variables.contains("variable \"target_account_id\""));
        assert!(!variables.contains("variable \"vpc_cidr_block\""));
    }

    #[test]
    fn test_render_iam_root_module() {
        let view = IamRootView {
            profile: "idc".to_string(),
            region: "us-east-1".to_string(),
            relative_module_path: "../../modules/iam".to_string(),
            iam_inputs_path: "../.config/iam.json".to_string(),
        };
        let renderer = TeraRenderer::new().unwrap();
        let main = renderer.render_view(TemplateId::IamMain, &view).unwrap();
        assert!(main.contains("source = \"../../modules/iam\""));
        let variables = renderer.render_view(TemplateId::IamVariables, &view).unwrap();
        assert!(variables.contains("default     = \"../.config/iam.json\""));
    }
}
