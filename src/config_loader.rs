use crate::aggregate::{AggregateConfig, UnvalidatedConfig};
use crate::error::ConfigError;
use crate::ip::parse_base_blocks;
use crate::models::{IamPolicy, NetworkHeader, OrganizationHeader};
use crate::services::{resolve_account_services, ModuleCatalog};
use log::{debug, info};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const HEADER_FILE: &str = "header.yaml";
pub const IAM_FILE: &str = "iam.yaml";
pub const NETWORK_HEADER_FILE: &str = "vpc-vpn-header.yaml";
pub const ACCOUNT_SERVICES_DIR: &str = "account-services";

/// `<account>.services.yaml`
static ACCOUNT_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_-]*)\.services\.yaml$").expect("Invalid account document regex")
});

/// One per-account services document, still untyped
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDocument {
    /// Derived from the file name
    pub account_name: String,
    pub path: PathBuf,
    /// Service key -> service body, in authoring order
    pub entries: serde_yaml::Mapping,
}

/// Every document of a configuration directory, parsed but not resolved
#[derive(Debug, Clone)]
pub struct ConfigDocuments {
    pub header: OrganizationHeader,
    pub iam: IamPolicy,
    pub network: NetworkHeader,
    pub accounts: Vec<AccountDocument>,
}

/// Read a YAML document into `T`
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::MissingDocument {
            path: path.to_path_buf(),
        },
        _ => ConfigError::malformed(path, e),
    })?;

    serde_yaml::from_str(&content).map_err(|e| ConfigError::malformed(path, e))
}

/// Read the three header documents and every account document
pub fn load_documents(config_dir: &Path) -> Result<ConfigDocuments, ConfigError> {
    info!("Loading configuration from: {:?}", config_dir);

    let header: OrganizationHeader = read_yaml(&config_dir.join(HEADER_FILE))?;
    let iam: IamPolicy = read_yaml(&config_dir.join(IAM_FILE))?;
    let network: NetworkHeader = read_yaml(&config_dir.join(NETWORK_HEADER_FILE))?;
    parse_base_blocks(&network)?;
    let accounts = discover_account_documents(&config_dir.join(ACCOUNT_SERVICES_DIR))?;

    info!(
        "Loaded {} managed accounts, {} groups, {} users, {} account documents",
        header.managed_accounts.len(),
        iam.groups.len(),
        iam.users.len(),
        accounts.len()
    );

    Ok(ConfigDocuments {
        header,
        iam,
        network,
        accounts,
    })
}

/// Parse every `<account>.services.yaml` in `dir`, sorted by file name.
///
/// Hidden files are skipped. Any other file name is rejected since the
/// account name could not be derived from it.
pub fn discover_account_documents(dir: &Path) -> Result<Vec<AccountDocument>, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::MissingDocument { path: dir.to_path_buf() },
        _ => ConfigError::malformed(dir, e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::malformed(dir, e))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with('.') {
            debug!("Skipping hidden entry {:?}", entry.path());
            continue;
        }
        files.push((file_name, entry.path()));
    }
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for (file_name, path) in files {
        let account_name = ACCOUNT_FILE_RE
            .captures(&file_name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ConfigError::malformed(&path, "expected a file named <account>.services.yaml"))?;

        // An empty document means no services
        let entries = match read_yaml::<Option<serde_yaml::Mapping>>(&path)? {
            Some(entries) => entries,
            None => serde_yaml::Mapping::new(),
        };

        debug!("Discovered account document for {} with {} entries", account_name, entries.len());
        documents.push(AccountDocument {
            account_name,
            path,
            entries,
        });
    }

    Ok(documents)
}

/// Module catalog from the immediate sub-directories of `modules_dir`
pub fn load_module_catalog(modules_dir: &Path) -> Result<ModuleCatalog, ConfigError> {
    let entries = fs::read_dir(modules_dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::MissingDocument {
            path: modules_dir.to_path_buf(),
        },
        _ => ConfigError::malformed(modules_dir, e),
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::malformed(modules_dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') && entry.path().is_dir() {
            names.push(name);
        }
    }

    let catalog: ModuleCatalog = names.into_iter().collect();
    debug!(
        "Module catalog ({} modules): {:?}",
        catalog.len(),
        catalog.iter().collect::<Vec<_>>()
    );
    Ok(catalog)
}

/// Load, resolve and assemble, without validating
pub fn load_unvalidated(config_dir: &Path) -> Result<UnvalidatedConfig, ConfigError> {
    let documents = load_documents(config_dir)?;

    let accounts = documents
        .accounts
        .iter()
        .map(|doc| resolve_account_services(doc, &documents.network))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UnvalidatedConfig::assemble(
        documents.header,
        documents.iam,
        documents.network,
        accounts,
    ))
}

/// Load and validate the full configuration.
///
/// This is the only way callers obtain an [`AggregateConfig`] from disk.
pub fn load_config(config_dir: &Path, modules_dir: &Path) -> Result<AggregateConfig, ConfigError> {
    let catalog = load_module_catalog(modules_dir)?;
    let config = load_unvalidated(config_dir)?.validate(&catalog)?;
    info!("Configuration is valid ({} account documents)", config.accounts().len());
    Ok(config)
}
