//! # infra-mgmt - Organization configuration aggregation
//!
//! This library loads the hand-authored YAML documents that describe an AWS
//! Organization (accounts, IAM users and groups, network address plan,
//! per-account services), cross-validates them into one
//! [`aggregate::AggregateConfig`], and generates the inputs consumed by the
//! provisioning stages.
//!
//! ## Architecture
//!
//! - `config_loader`: Document discovery and YAML parsing
//! - `models`: Header, IAM and network header documents
//! - `services`: Account service variants and their resolution
//! - `ip`: Octet substitution for address blocks and collision tracking
//! - `aggregate`: Assembly and validation of the aggregate configuration
//! - `registry`: Account directory and the derived JSON documents
//! - `render`: Template rendering of provisioning-tool inputs
//! - `orchestrator`: Artifact generation steps
//! - `backup`: Project backup, purge and restore
//! - `layout`: Project directory layout
//! - `utils`: Email, path and validation helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use infra_mgmt::config_loader::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("user_configs"), Path::new("terraform/modules"))?;
//! for account in config.accounts() {
//!     println!("{}: {} services", account.account_name, account.services().len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Loading and validation return typed [`error::ConfigError`] values. A
//! validation failure carries every violation found, not only the first.
//! Artifact generation returns `color_eyre` reports with file context.

pub mod aggregate;
pub mod backup;
pub mod config_loader;
pub mod error;
pub mod ip;
pub mod layout;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod render;
pub mod services;
pub mod utils;
