//! Backup archive creation and project purge.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{backup_rules, encode_archive_path, purge_rules, BackupError, BackupRule, PurgeRule};
use crate::layout::ProjectLayout;

/// Archive file name for a backup taken at `at`
pub fn archive_name(at: DateTime<Utc>) -> String {
    format!("{}.zip", at.format("%Y-%m-%dT%H-%M-%SZ"))
}

/// Copy a directory tree, merging into an existing destination
pub(crate) fn copy_tree(source: &Path, dest: &Path) -> Result<(), BackupError> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| BackupError::AmbiguousArchivePath {
                path: entry.path().to_path_buf(),
            })?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(BackupError::io(&target))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(BackupError::io(parent))?;
            }
            fs::copy(entry.path(), &target).map_err(BackupError::io(entry.path()))?;
        }
    }
    Ok(())
}

fn dir_name(path: &Path) -> &std::ffi::OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}

/// Copy everything the backup rules select into `staging`
fn stage_backup(layout: &ProjectLayout, staging: &Path) -> Result<usize, BackupError> {
    let mut staged = 0;

    for (dir, rule) in backup_rules(layout) {
        if !dir.is_dir() {
            debug!("Skipping missing directory {:?}", dir);
            continue;
        }

        match rule {
            BackupRule::Whole => {
                copy_tree(&dir, &staging.join(dir_name(&dir)))?;
                staged += 1;
            }
            BackupRule::Files(names) => {
                let parent_name = dir.parent().map(dir_name).unwrap_or_default();
                let dest = staging.join(parent_name).join(dir_name(&dir));
                fs::create_dir_all(&dest).map_err(BackupError::io(&dest))?;
                for name in names {
                    let source = dir.join(name);
                    if source.is_file() {
                        fs::copy(&source, dest.join(name)).map_err(BackupError::io(&source))?;
                        staged += 1;
                    }
                }
            }
            BackupRule::Flattened(file_name) => {
                for entry in WalkDir::new(&dir).sort_by_file_name() {
                    let entry = entry?;
                    if !entry.file_type().is_file() || entry.file_name() != file_name {
                        continue;
                    }
                    let rel = entry.path().strip_prefix(layout.root()).unwrap_or(entry.path());
                    let encoded = encode_archive_path(rel)?;
                    fs::copy(entry.path(), staging.join(&encoded)).map_err(BackupError::io(entry.path()))?;
                    debug!("Staged {:?} as {}", entry.path(), encoded);
                    staged += 1;
                }
            }
        }
    }

    Ok(staged)
}

/// Zip the contents of `source` into `archive_path`
fn zip_tree(source: &Path, archive_path: &Path) -> Result<(), BackupError> {
    let file = File::create(archive_path).map_err(BackupError::io(archive_path))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path()).map_err(BackupError::io(entry.path()))?;
            io::copy(&mut input, &mut zip).map_err(BackupError::io(entry.path()))?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Build a backup archive of the project in `output_dir`.
///
/// Files are staged in a temporary directory that is removed when this
/// returns, on success or failure.
pub fn create_backup_archive(layout: &ProjectLayout, output_dir: &Path) -> Result<PathBuf, BackupError> {
    let staging = TempDir::new().map_err(BackupError::io(std::env::temp_dir()))?;
    let staged = stage_backup(layout, staging.path())?;
    info!("Staged {} backup entries", staged);

    fs::create_dir_all(output_dir).map_err(BackupError::io(output_dir))?;
    let archive_path = output_dir.join(archive_name(Utc::now()));
    zip_tree(staging.path(), &archive_path)?;

    info!("Archive created at: {:?}", archive_path);
    Ok(archive_path)
}

fn remove_path(path: &Path) -> Result<bool, BackupError> {
    if path.is_dir() {
        fs::remove_dir_all(path).map_err(BackupError::io(path))?;
    } else if path.is_file() {
        fs::remove_file(path).map_err(BackupError::io(path))?;
    } else {
        return Ok(false);
    }
    debug!("Removed {:?}", path);
    Ok(true)
}

/// Remove the current project's generated and authored configuration.
///
/// Returns the paths removed.
pub fn purge_project(layout: &ProjectLayout) -> Result<Vec<PathBuf>, BackupError> {
    let mut removed = Vec::new();
    for (dir, rule) in purge_rules(layout) {
        let targets = match rule {
            PurgeRule::Whole => vec![dir],
            PurgeRule::Entries(names) => names.iter().map(|n| dir.join(n)).collect(),
        };
        for target in targets {
            if remove_path(&target)? {
                removed.push(target);
            }
        }
    }
    info!("Purged {} paths", removed.len());
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zip::ZipArchive;

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_archive_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(archive_name(at), "2024-03-09T14-05-07Z.zip");
    }

    #[test]
    fn test_backup_archive_layout() {
        let project = TempDir::new().unwrap();
        let layout = ProjectLayout::new(project.path());
        write(layout.user_configs_dir().join("header.yaml"), "base_email: ops@x.com");
        write(layout.backend_dir().join("backend.hcl"), "bucket = \"b\"");
        write(layout.backend_dir().join("main.tf"), "# not backed up");
        write(layout.accounts_build_dir().join("dev/terraform.tfvars"), "x = 1");
        write(layout.accounts_build_dir().join("dev/main.tf"), "# not backed up");

        let out = TempDir::new().unwrap();
        let archive_path = create_backup_archive(&layout, out.path()).unwrap();
        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();

        assert!(names.contains(&"user_configs/header.yaml".to_string()));
        assert!(names.contains(&"terraform/backend/backend.hcl".to_string()));
        assert!(names.contains(&"terraform__.build__accounts__dev__terraform.tfvars".to_string()));
        assert!(!names.iter().any(|n| n.ends_with("main.tf")));
        assert!(archive.by_name("user_configs/header.yaml").is_ok());
    }

    #[test]
    fn test_purge_keeps_stage_modules() {
        let project = TempDir::new().unwrap();
        let layout = ProjectLayout::new(project.path());
        write(layout.user_configs_dir().join("iam.yaml"), "groups: []");
        write(layout.org_dir().join("terraform.tfvars"), "x = 1");
        write(layout.org_dir().join("main.tf"), "# kept");
        write(layout.accounts_build_dir().join("dev/main.tf"), "# removed");

        let removed = purge_project(&layout).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(!layout.user_configs_dir().exists());
        assert!(!layout.build_dir().exists());
        assert!(layout.org_dir().join("main.tf").is_file());
    }
}
