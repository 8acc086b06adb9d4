//! Email address helpers for plus-addressing.

use crate::error::ConfigError;

/// Split an address into its local part and domain.
///
/// # Examples
/// ```
/// use infra_mgmt::utils::email::split_email;
///
/// let (prefix, domain) = split_email("team+proj@example.com").unwrap();
/// assert_eq!(prefix, "team+proj");
/// assert_eq!(domain, "example.com");
/// assert!(split_email("example.com").is_err());
/// ```
pub fn split_email(email: &str) -> Result<(&str, &str), ConfigError> {
    let invalid = || ConfigError::InvalidEmailFormat {
        email: email.to_string(),
    };

    let (prefix, domain) = email.split_once('@').ok_or_else(invalid)?;
    if prefix.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    Ok((prefix, domain))
}

/// Derive `prefix+tag@domain` from a base mailbox
pub fn plus_address(base_email: &str, tag: &str) -> Result<String, ConfigError> {
    let (prefix, domain) = split_email(base_email)?;
    Ok(format!("{}+{}@{}", prefix, tag, domain))
}
