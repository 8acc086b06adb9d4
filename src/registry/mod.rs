//! # Account Registry Module
//!
//! Bridges the validated configuration and the provisioning tool in both
//! directions.
//!
//! ## Inbound: account directory
//!
//! After the organization stage is applied, the provisioning tool reports the
//! accounts it created. [`AccountDirectory`] reads that output in either of
//! two shapes:
//!
//! ```json
//! {
//!   "account_ids": { "value": { "dev": "111111111111" } },
//!   "account_arns": { "value": { "dev": "arn:aws:organizations::..." } }
//! }
//! ```
//!
//! or already grouped per account:
//!
//! ```json
//! { "dev": { "id": "111111111111", "arn": "arn:aws:organizations::...", ... } }
//! ```
//!
//! ## Outbound: JSON documents
//!
//! - [`AccountsDocument`] (`org.json`): accounts to create, with emails
//! - [`IamBootstrapDocument`]: groups, grants by account ID, users and the
//!   managed policies attached to each group

pub mod directory;
pub mod documents;

pub use directory::{AccountDirectory, AccountDirectoryEntry};
pub use documents::{group_policy_arns, AccountRecord, AccountsDocument, IamBootstrapDocument};
