//! Restoring a project from a backup archive.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::TempDir;
use zip::ZipArchive;

use super::archive::copy_tree;
use super::{decode_archive_path, restore_targets, BackupError, ACCOUNT_TFVARS};
use crate::layout::ProjectLayout;

/// Top-level entry holding the stage directories filed under their parent
const TERRAFORM_ENTRY: &str = "terraform";

/// Summary of a restore
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Directories restored from whole-directory entries
    pub directories: Vec<PathBuf>,
    /// Per-account variable files written back
    pub account_tfvars: Vec<PathBuf>,
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Restore `archive_path` into the project.
///
/// Whole directories are matched by base name. The backend and organization
/// stage files come from the `terraform` entry. After that, the accounts
/// build directory must be the only target left, and every flattened
/// `terraform.tfvars` entry is decoded into `accounts/<account>/`. Any other
/// leftover target fails the restore before account files are touched.
pub fn restore_archive(layout: &ProjectLayout, archive_path: &Path) -> Result<RestoreReport, BackupError> {
    let unpacked = TempDir::new().map_err(BackupError::io(std::env::temp_dir()))?;
    let file = File::open(archive_path).map_err(BackupError::io(archive_path))?;
    ZipArchive::new(file)?.extract(unpacked.path())?;
    info!("Unpacked {:?}", archive_path);

    let mut contents: Vec<String> = fs::read_dir(unpacked.path())
        .map_err(BackupError::io(unpacked.path()))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    contents.sort();

    let mut report = RestoreReport::default();
    let mut remaining = Vec::new();

    for target in restore_targets(layout) {
        let name = base_name(&target);
        if let Some(pos) = contents.iter().position(|c| *c == name) {
            contents.remove(pos);
            let source = unpacked.path().join(&name);
            if source.is_dir() {
                copy_tree(&source, &target)?;
            }
            debug!("Restored {:?}", target);
            report.directories.push(target);
        } else {
            remaining.push(target);
        }
    }

    let has_terraform_entry = contents.iter().any(|c| c == TERRAFORM_ENTRY);
    let stage_dirs = [layout.backend_dir(), layout.org_dir()];
    if has_terraform_entry {
        let mut unmatched = Vec::with_capacity(remaining.len());
        for target in remaining {
            if !stage_dirs.contains(&target) {
                unmatched.push(target);
                continue;
            }
            let source = unpacked.path().join(TERRAFORM_ENTRY).join(base_name(&target));
            if source.is_dir() {
                copy_tree(&source, &target)?;
            }
            debug!("Restored {:?}", target);
            report.directories.push(target);
        }
        remaining = unmatched;
        contents.retain(|c| c != TERRAFORM_ENTRY);
    }

    let accounts_dir = layout.accounts_build_dir();
    if remaining.len() != 1 || remaining[0] != accounts_dir {
        return Err(BackupError::UnexpectedRestoreTargets { remaining });
    }

    for encoded in contents.iter().filter(|c| c.contains(ACCOUNT_TFVARS)) {
        let decoded = decode_archive_path(encoded);
        let Some(account) = decoded.parent().and_then(Path::file_name) else {
            warn!("Skipping archive entry {} with no account directory", encoded);
            continue;
        };

        let dest_dir = accounts_dir.join(account);
        fs::create_dir_all(&dest_dir).map_err(BackupError::io(&dest_dir))?;
        let dest = dest_dir.join(ACCOUNT_TFVARS);
        let source = unpacked.path().join(encoded);
        fs::copy(&source, &dest).map_err(BackupError::io(&source))?;
        debug!("Restored {} to {:?}", encoded, dest);
        report.account_tfvars.push(dest);
    }

    info!(
        "Restore complete: {} directories, {} account variable files",
        report.directories.len(),
        report.account_tfvars.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::create_backup_archive;

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn populate(layout: &ProjectLayout) {
        write(layout.user_configs_dir().join("header.yaml"), "org_prefix: acme");
        write(layout.generated_vpn_configs_dir().join("dev/jdoe.ovpn"), "client");
        write(layout.accounts_output_dir().join("org_output.json"), "{}");
        write(layout.client_vpn_configs_dir().join("dev.pem"), "pem");
        write(layout.tf_config_dir().join("org.json"), "{}");
        write(layout.tf_logs_dir().join("apply.log"), "ok");
        write(layout.backend_dir().join("backend.hcl"), "bucket = \"b\"");
        write(layout.backend_dir().join("terraform.tfvars"), "bucket_name = \"b\"");
        write(layout.org_dir().join("terraform.tfvars"), "aws_region = \"us-east-1\"");
        write(layout.accounts_build_dir().join("dev/terraform.tfvars"), "target_account_id = \"111\"");
        write(layout.accounts_build_dir().join("prod/terraform.tfvars"), "target_account_id = \"222\"");
    }

    #[test]
    fn test_backup_purge_restore_cycle() {
        let project = TempDir::new().unwrap();
        let layout = ProjectLayout::new(project.path());
        populate(&layout);

        let out = TempDir::new().unwrap();
        let archive = create_backup_archive(&layout, out.path()).unwrap();
        crate::backup::purge_project(&layout).unwrap();
        assert!(!layout.user_configs_dir().exists());

        let report = restore_archive(&layout, &archive).unwrap();
        assert_eq!(report.account_tfvars.len(), 2);
        assert_eq!(
            fs::read_to_string(layout.accounts_build_dir().join("prod/terraform.tfvars")).unwrap(),
            "target_account_id = \"222\""
        );
        assert!(layout.user_configs_dir().join("header.yaml").is_file());
        assert!(layout.backend_dir().join("backend.hcl").is_file());
        assert!(layout.org_dir().join("terraform.tfvars").is_file());
        assert!(layout.accounts_output_dir().join("org_output.json").is_file());
    }

    #[test]
    fn test_stage_copy_failure_is_returned() {
        let project = TempDir::new().unwrap();
        let layout = ProjectLayout::new(project.path());
        populate(&layout);

        let out = TempDir::new().unwrap();
        let archive = create_backup_archive(&layout, out.path()).unwrap();

        let target = TempDir::new().unwrap();
        let target_layout = ProjectLayout::new(target.path());
        write(target_layout.org_dir(), "a file where the org stage directory belongs");

        let err = restore_archive(&target_layout, &archive).unwrap_err();
        match err {
            BackupError::Io { path, .. } => assert!(path.starts_with(target_layout.org_dir())),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!target_layout.accounts_build_dir().join("dev").exists());
    }

    #[test]
    fn test_incomplete_archive_fails_fast() {
        let project = TempDir::new().unwrap();
        let layout = ProjectLayout::new(project.path());
        populate(&layout);
        fs::remove_dir_all(layout.tf_logs_dir()).unwrap();

        let out = TempDir::new().unwrap();
        let archive = create_backup_archive(&layout, out.path()).unwrap();

        let target = TempDir::new().unwrap();
        let target_layout = ProjectLayout::new(target.path());
        let err = restore_archive(&target_layout, &archive).unwrap_err();
        match err {
            BackupError::UnexpectedRestoreTargets { remaining } => {
                assert_eq!(remaining, [target_layout.tf_logs_dir(), target_layout.accounts_build_dir()]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!target_layout.accounts_build_dir().join("dev").exists());
    }
}
