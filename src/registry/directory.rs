//! Account directory built from the provisioning tool's output.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// One provisioned account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDirectoryEntry {
    /// Filled from the map key
    #[serde(default)]
    pub name: String,
    #[serde(alias = "account_arns")]
    pub arn: String,
    #[serde(alias = "account_ids", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "assumable_role_arns")]
    pub assumable_role_arn: String,
    #[serde(alias = "landing_parent_ids")]
    pub parent_id: String,
}

impl AccountDirectoryEntry {
    /// Account name usable as an identifier (`-` replaced by `_`)
    pub fn alias(&self) -> String {
        self.name.replace('-', "_")
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected an account id, found {}", other))),
    }
}

/// Provisioned accounts, looked up by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDirectory {
    entries: IndexMap<String, AccountDirectoryEntry>,
}

impl AccountDirectory {
    /// Read a provisioning output file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::MissingDocument {
                path: path.to_path_buf(),
            },
            _ => ConfigError::malformed(path, e),
        })?;
        Self::from_json_str(&content).map_err(|reason| ConfigError::malformed(path, reason))
    }

    /// Parse either the per-account form or the raw `output -json` form
    pub fn from_json_str(content: &str) -> Result<Self, String> {
        let root: Map<String, Value> = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let per_account = if is_output_form(&root) {
            rearrange_output(root)
        } else {
            root
        };

        per_account
            .into_iter()
            .map(|(name, record)| -> Result<AccountDirectoryEntry, String> {
                let mut entry: AccountDirectoryEntry = serde_json::from_value(record)
                    .map_err(|e| format!("account '{}': {}", name, e))?;
                entry.name = name;
                Ok(entry)
            })
            .collect()
    }

    pub fn get(&self, account: &str) -> Result<&AccountDirectoryEntry, ConfigError> {
        self.entries
            .get(account)
            .ok_or_else(|| ConfigError::AccountNotInDirectory {
                account: account.to_string(),
            })
    }

    pub fn id_of(&self, account: &str) -> Result<&str, ConfigError> {
        self.get(account).map(|e| e.id.as_str())
    }

    pub fn arn_of(&self, account: &str) -> Result<&str, ConfigError> {
        self.get(account).map(|e| e.arn.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountDirectoryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<AccountDirectoryEntry> for AccountDirectory {
    fn from_iter<I: IntoIterator<Item = AccountDirectoryEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }
}

/// `{field: {"value": {...}}}` at every top-level key
fn is_output_form(root: &Map<String, Value>) -> bool {
    !root.is_empty()
        && root
            .values()
            .all(|v| v.get("value").map_or(false, Value::is_object))
}

/// `{field: {"value": {account: v}}}` -> `{account: {field: v}}`
fn rearrange_output(root: Map<String, Value>) -> Map<String, Value> {
    let mut per_account: Map<String, Value> = Map::new();
    for (field, output) in root {
        let Some(Value::Object(values)) = output.get("value").cloned() else {
            continue;
        };
        for (account, value) in values {
            let record = per_account
                .entry(account)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(record) = record {
                record.insert(field.clone(), value);
            }
        }
    }
    per_account
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OUTPUT_JSON: &str = r#"{
        "account_arns": {"sensitive": false, "type": ["map", "string"], "value": {
            "dev-team": "arn:aws:organizations::999:account/o-1/111",
            "prod": "arn:aws:organizations::999:account/o-1/222"}},
        "account_ids": {"sensitive": false, "type": ["map", "string"], "value": {
            "dev-team": "111", "prod": "222"}},
        "assumable_role_arns": {"sensitive": false, "type": ["map", "string"], "value": {
            "dev-team": "arn:aws:iam::111:role/Admin", "prod": "arn:aws:iam::222:role/Admin"}},
        "landing_parent_ids": {"sensitive": false, "type": ["map", "string"], "value": {
            "dev-team": "ou-1", "prod": "ou-1"}}
    }"#;

    #[test]
    fn test_output_form_is_rearranged() {
        let directory = AccountDirectory::from_json_str(OUTPUT_JSON).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.id_of("prod").unwrap(), "222");
        assert_eq!(directory.arn_of("dev-team").unwrap(), "arn:aws:organizations::999:account/o-1/111");

        let dev = directory.get("dev-team").unwrap();
        assert_eq!(dev.assumable_role_arn, "arn:aws:iam::111:role/Admin");
        assert_eq!(dev.parent_id, "ou-1");
        assert_eq!(dev.alias(), "dev_team");
    }

    #[test]
    fn test_flattened_form() {
        let json = r#"{"dev": {"arn": "arn:dev", "id": 111, "assumable_role_arn": "arn:role", "parent_id": "ou-1"}}"#;
        let directory = AccountDirectory::from_json_str(json).unwrap();
        assert_eq!(directory.id_of("dev").unwrap(), "111");
        assert_eq!(directory.get("dev").unwrap().name, "dev");
    }

    #[test]
    fn test_missing_account() {
        let directory = AccountDirectory::from_json_str(OUTPUT_JSON).unwrap();
        assert!(matches!(
            directory.id_of("stage"),
            Err(ConfigError::AccountNotInDirectory { ref account }) if account == "stage"
        ));
    }

    #[test]
    fn test_incomplete_record_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"dev": {{"arn": "arn:dev"}}}}"#).unwrap();
        let err = AccountDirectory::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }));
    }
}
