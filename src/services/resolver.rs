//! Classification of free-form service entries into typed variants.

use serde::Deserialize;
use serde_yaml::Value;

use crate::config_loader::AccountDocument;
use crate::error::ConfigError;
use crate::ip::derive_network_service;
use crate::models::{AccountOctets, NetworkHeader};

use super::types::{AccountServices, CicdService, GitMode, ServiceVariant};
use super::{is_ignored, CICD_KEY, NETWORK_KEY, TEST_WORKLOAD_KEY};

/// Body of a `vpc-vpn` entry
#[derive(Debug, Deserialize)]
struct NetworkEntry {
    #[serde(rename = "account-octets")]
    account_octets: AccountOctets,
}

/// Resolve every entry of one account document, in authoring order.
///
/// Keys starting with `ignore` are dropped. `cicd`, `vpc-vpn` and
/// `test-webapp` become typed variants; any other key is only recorded as
/// declared so module existence can be checked later.
pub fn resolve_account_services(
    doc: &AccountDocument,
    network: &NetworkHeader,
) -> Result<AccountServices, ConfigError> {
    let mut services = AccountServices::new(doc.account_name.clone());

    for (key, body) in &doc.entries {
        let key = key
            .as_str()
            .ok_or_else(|| ConfigError::malformed(&doc.path, format!("service key {:?} is not a string", key)))?;

        if is_ignored(key) {
            log::debug!("Skipping ignored service '{}' for account {}", key, doc.account_name);
            continue;
        }

        let variant = match key {
            CICD_KEY => ServiceVariant::Cicd(parse_cicd(doc, body)?),
            NETWORK_KEY => {
                let entry: NetworkEntry = parse_body(doc, key, body)?;
                ServiceVariant::Network(derive_network_service(network, entry.account_octets)?)
            }
            TEST_WORKLOAD_KEY => ServiceVariant::TestWorkload,
            other => {
                log::info!(
                    "Account {} declares '{}' with no typed model; only its module will be checked",
                    doc.account_name,
                    other
                );
                services.declare(other);
                continue;
            }
        };

        log::debug!("Resolved service '{}' for account {}", key, doc.account_name);
        services
            .add_service(variant)
            .map_err(|reason| ConfigError::malformed(&doc.path, reason))?;
    }

    Ok(services)
}

fn parse_body<T: for<'de> Deserialize<'de>>(doc: &AccountDocument, key: &str, body: &Value) -> Result<T, ConfigError> {
    serde_yaml::from_value(body.clone())
        .map_err(|e| ConfigError::malformed(&doc.path, format!("invalid '{}' service: {}", key, e)))
}

fn parse_cicd(doc: &AccountDocument, body: &Value) -> Result<CicdService, ConfigError> {
    let cicd: CicdService = parse_body(doc, CICD_KEY, body)?;
    if cicd.git == GitMode::GitHub && cicd.github.is_none() {
        return Err(ConfigError::malformed(
            &doc.path,
            "'cicd' uses git mode GitHub but has no 'github' settings",
        ));
    }
    Ok(cicd)
}
