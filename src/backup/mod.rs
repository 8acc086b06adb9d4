//! Project configuration backup, purge and restore.
//!
//! A backup archive holds, at its top level, one entry per backed-up
//! directory. Per-account `terraform.tfvars` files live deep inside the build
//! tree, so they are flattened into single top-level entries by encoding
//! their project-relative path with `/` -> `__`:
//!
//! ```text
//! terraform/.build/accounts/dev/terraform.tfvars
//!   -> terraform__.build__accounts__dev__terraform.tfvars
//! ```

pub mod archive;
pub mod restore;

use std::path::{Component, Path, PathBuf};

use crate::layout::ProjectLayout;

pub use archive::{create_backup_archive, purge_project};
pub use restore::restore_archive;

const PATH_SEPARATOR_ENCODING: &str = "__";
pub(crate) const ACCOUNT_TFVARS: &str = "terraform.tfvars";

/// Errors raised by backup, purge and restore
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("path {} cannot be flattened reversibly", path.display())]
    AmbiguousArchivePath { path: PathBuf },

    #[error(
        "expected only the accounts build directory to remain after restoring, found: {}",
        remaining.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    UnexpectedRestoreTargets { remaining: Vec<PathBuf> },
}

impl BackupError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> BackupError {
        let path = path.into();
        move |source| BackupError::Io { path, source }
    }
}

/// What is kept from one backed-up directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupRule {
    /// The whole directory, under its base name
    Whole,
    /// Named entries, filed under `<parent name>/<dir name>/`
    Files(&'static [&'static str]),
    /// Every file with this name anywhere below, flattened
    Flattened(&'static str),
}

/// Directories copied into a backup archive, in archive order
pub fn backup_rules(layout: &ProjectLayout) -> Vec<(PathBuf, BackupRule)> {
    vec![
        (layout.generated_vpn_configs_dir(), BackupRule::Whole),
        (layout.accounts_output_dir(), BackupRule::Whole),
        (layout.accounts_build_dir(), BackupRule::Flattened(ACCOUNT_TFVARS)),
        (layout.client_vpn_configs_dir(), BackupRule::Whole),
        (layout.tf_config_dir(), BackupRule::Whole),
        (layout.tf_logs_dir(), BackupRule::Whole),
        (layout.backend_dir(), BackupRule::Files(&["backend.hcl", "terraform.tfvars"])),
        (layout.org_dir(), BackupRule::Files(&["terraform.tfvars"])),
        (layout.user_configs_dir(), BackupRule::Whole),
    ]
}

/// What a purge removes from one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeRule {
    Whole,
    Entries(&'static [&'static str]),
}

pub fn purge_rules(layout: &ProjectLayout) -> Vec<(PathBuf, PurgeRule)> {
    vec![
        (layout.generated_vpn_configs_dir(), PurgeRule::Whole),
        (layout.services_dir(), PurgeRule::Whole),
        (layout.build_dir(), PurgeRule::Whole),
        (layout.client_vpn_configs_dir(), PurgeRule::Whole),
        (layout.tf_config_dir(), PurgeRule::Whole),
        (layout.tf_logs_dir(), PurgeRule::Whole),
        (layout.backend_dir(), PurgeRule::Entries(&["backend.hcl", "terraform.tfvars"])),
        (layout.org_dir(), PurgeRule::Entries(&[".terraform", ".terraform.lock.hcl", "terraform.tfvars"])),
        (layout.user_configs_dir(), PurgeRule::Whole),
    ]
}

/// Directories a restore writes back into, in restore order
pub fn restore_targets(layout: &ProjectLayout) -> Vec<PathBuf> {
    vec![
        layout.client_vpn_configs_dir(),
        layout.tf_config_dir(),
        layout.tf_logs_dir(),
        layout.generated_vpn_configs_dir(),
        layout.user_configs_dir(),
        layout.backend_dir(),
        layout.org_dir(),
        layout.accounts_build_dir(),
        layout.accounts_output_dir(),
    ]
}

/// Flatten a relative path into one archive entry name.
///
/// Components that contain `__` or start or end with `_` are rejected since
/// decoding could not tell them apart from a separator.
pub fn encode_archive_path(relative: &Path) -> Result<String, BackupError> {
    let ambiguous = || BackupError::AmbiguousArchivePath {
        path: relative.to_path_buf(),
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        let Component::Normal(part) = component else {
            return Err(ambiguous());
        };
        let part = part.to_str().ok_or_else(ambiguous)?;
        if part.contains(PATH_SEPARATOR_ENCODING) || part.starts_with('_') || part.ends_with('_') {
            return Err(ambiguous());
        }
        parts.push(part);
    }

    if parts.is_empty() {
        return Err(ambiguous());
    }
    Ok(parts.join(PATH_SEPARATOR_ENCODING))
}

/// Inverse of [`encode_archive_path`]
pub fn decode_archive_path(encoded: &str) -> PathBuf {
    encoded.split(PATH_SEPARATOR_ENCODING).collect()
}
