//! Well-known directories of a provisioning project.
//!
//! ```text
//! <root>/
//! |-- user_configs/                    # authored YAML documents
//! |-- generated_vpn_configs/
//! |-- services/
//! \-- terraform/
//!     |-- modules/                     # provisioning modules (catalog)
//!     |-- backend/  org/               # stage root modules
//!     |-- .config/  .logs/  .client_vpn_configs/
//!     \-- .build/
//!         |-- iam/
//!         \-- accounts/<account>/      # generated per-account modules
//!             \-- .output/
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths are kept; relative ones are taken from the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn terraform_dir(&self) -> PathBuf {
        self.root.join("terraform")
    }

    pub fn user_configs_dir(&self) -> PathBuf {
        self.root.join("user_configs")
    }

    pub fn generated_vpn_configs_dir(&self) -> PathBuf {
        self.root.join("generated_vpn_configs")
    }

    pub fn services_dir(&self) -> PathBuf {
        self.root.join("services")
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.terraform_dir().join("modules")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.terraform_dir().join(".build")
    }

    pub fn accounts_build_dir(&self) -> PathBuf {
        self.build_dir().join("accounts")
    }

    pub fn accounts_output_dir(&self) -> PathBuf {
        self.accounts_build_dir().join(".output")
    }

    pub fn iam_build_dir(&self) -> PathBuf {
        self.build_dir().join("iam")
    }

    pub fn iam_module_dir(&self) -> PathBuf {
        self.modules_dir().join("iam")
    }

    pub fn tf_config_dir(&self) -> PathBuf {
        self.terraform_dir().join(".config")
    }

    pub fn tf_logs_dir(&self) -> PathBuf {
        self.terraform_dir().join(".logs")
    }

    pub fn client_vpn_configs_dir(&self) -> PathBuf {
        self.terraform_dir().join(".client_vpn_configs")
    }

    pub fn backend_dir(&self) -> PathBuf {
        self.terraform_dir().join("backend")
    }

    pub fn org_dir(&self) -> PathBuf {
        self.terraform_dir().join("org")
    }

    /// `org.json`, the accounts document
    pub fn org_json_path(&self) -> PathBuf {
        self.tf_config_dir().join("org.json")
    }

    /// IAM bootstrap document
    pub fn iam_json_path(&self) -> PathBuf {
        self.tf_config_dir().join("iam_users.json")
    }

    /// Default location of the provisioning tool's organization output
    pub fn org_output_path(&self) -> PathBuf {
        self.accounts_output_dir().join("org_output.json")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(".")
    }
}
