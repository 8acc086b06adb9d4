//! Artifact generation.
//!
//! Each step takes a validated [`AggregateConfig`] and writes one family of
//! provisioning-tool inputs. Steps that need account IDs also take the
//! [`AccountDirectory`] read from the organization stage's output.

use crate::aggregate::AggregateConfig;
use crate::registry::{AccountDirectory, AccountsDocument, IamBootstrapDocument};
use crate::render::{AccountModuleView, BackendTfvarsView, IamRootView, OrgTfvarsView, Renderer, TemplateId};
use crate::utils::paths::relative_path;
use color_eyre::eyre::{Result, WrapErr};
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Write text, creating parent directories
fn write_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err_with(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(path, content).wrap_err_with(|| format!("Failed to write {:?}", path))?;
    debug!("Wrote {:?}", path);
    Ok(())
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("Failed to serialize JSON document")?;
    write_artifact(path, &json)
}

fn render_to<R: Renderer, V: Serialize>(renderer: &R, template: TemplateId, view: &V, dir: &Path) -> Result<PathBuf> {
    let content = renderer
        .render_view(template, view)
        .wrap_err_with(|| format!("Failed to render {}", template.name()))?;
    let path = dir.join(template.file_name());
    write_artifact(&path, &content)?;
    Ok(path)
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Write `org.json` and the organization stage's `terraform.tfvars`
pub fn generate_org_accounts<R: Renderer>(
    config: &AggregateConfig,
    renderer: &R,
    org_json_path: &Path,
    org_dir: &Path,
) -> Result<AccountsDocument> {
    let accounts = AccountsDocument::from_config(config).wrap_err("Failed to derive account emails")?;
    write_json(org_json_path, &accounts)?;
    info!("Generated accounts document with {} accounts at {:?}", accounts.accounts.len(), org_json_path);

    let tfvars = render_to(renderer, TemplateId::OrgTfvars, &OrgTfvarsView::from_header(config.header()), org_dir)?;
    info!("Generated organization variables at {:?}", tfvars);

    Ok(accounts)
}

/// Write the state backend stage's `terraform.tfvars`
pub fn generate_backend_tfvars<R: Renderer>(config: &AggregateConfig, renderer: &R, backend_dir: &Path) -> Result<PathBuf> {
    let path = render_to(
        renderer,
        TemplateId::BackendTfvars,
        &BackendTfvarsView::from_header(config.header()),
        backend_dir,
    )?;
    info!("Generated backend variables at {:?}", path);
    Ok(path)
}

/// Write the IAM bootstrap document
pub fn generate_iam_inputs(
    config: &AggregateConfig,
    directory: &AccountDirectory,
    iam_json_path: &Path,
) -> Result<IamBootstrapDocument> {
    let document = IamBootstrapDocument::from_config(config, directory)
        .wrap_err("Failed to map group grants to account IDs")?;
    write_json(iam_json_path, &document)?;
    info!(
        "Generated IAM inputs for {} groups and {} users at {:?}",
        document.groups.len(),
        document.users.len(),
        iam_json_path
    );
    Ok(document)
}

/// Write the IAM root module that feeds the bootstrap document to the IAM
/// sub-module
pub fn generate_iam_root_module<R: Renderer>(
    config: &AggregateConfig,
    renderer: &R,
    iam_dir: &Path,
    iam_module_dir: &Path,
    iam_json_path: &Path,
) -> Result<Vec<PathBuf>> {
    let identity_center = &config.header().aws_profiles.identity_center;
    let view = IamRootView {
        profile: identity_center.profile.clone(),
        region: identity_center.region.clone(),
        relative_module_path: display_path(&relative_path(iam_module_dir, iam_dir)),
        iam_inputs_path: display_path(&relative_path(iam_json_path, iam_dir)),
    };

    let written = [TemplateId::IamMain, TemplateId::IamVariables, TemplateId::IamOutput]
        .into_iter()
        .map(|template| render_to(renderer, template, &view, iam_dir))
        .collect::<Result<Vec<_>>>()?;
    info!("Generated IAM root module at {:?}", iam_dir);
    Ok(written)
}

/// Create (or replace, with `overwrite`) a module directory
fn prepare_module_dir(dir: &Path, overwrite: bool) -> Result<()> {
    if dir.is_dir() && overwrite {
        debug!("Replacing existing module directory {:?}", dir);
        fs::remove_dir_all(dir).wrap_err_with(|| format!("Failed to remove {:?}", dir))?;
    }
    fs::create_dir_all(dir).wrap_err_with(|| format!("Failed to create directory {:?}", dir))
}

/// Write one root module per provisioned account.
///
/// Returns the module directories in directory order.
pub fn generate_account_modules<R: Renderer>(
    config: &AggregateConfig,
    renderer: &R,
    directory: &AccountDirectory,
    accounts_dir: &Path,
    modules_dir: &Path,
    overwrite: bool,
) -> Result<Vec<PathBuf>> {
    let mut module_dirs = Vec::with_capacity(directory.len());

    for entry in directory.iter() {
        let module_dir = accounts_dir.join(&entry.name);
        prepare_module_dir(&module_dir, overwrite)?;

        let modules_source = display_path(&relative_path(modules_dir, &module_dir));
        let view = AccountModuleView::build(config, entry, &modules_source);

        for template in [
            TemplateId::AccountMain,
            TemplateId::AccountVariables,
            TemplateId::AccountOutput,
            TemplateId::AccountTfvars,
        ] {
            render_to(renderer, template, &view, &module_dir)?;
        }

        if view.has_vpn_clients() {
            render_to(renderer, TemplateId::AccountVpnClients, &view, &module_dir)?;
            info!("Account {}: {} VPN client(s)", entry.name, view.vpn_users.len());
        }

        info!(
            "Generated module for account {} (cicd: {}, vpc-vpn: {}, test-webapp: {}) at {:?}",
            entry.name, view.cicd, view.vpc, view.test_webapp, module_dir
        );
        module_dirs.push(module_dir);
    }

    Ok(module_dirs)
}
