//! Bind-parameter name validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::sql::SqlError;

static SAFE_PARAMETER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const SIGILS: [char; 3] = ['@', ':', '$'];

/// Accept `name` only if it can be interpolated into SQL text as `@name`.
pub fn validate_parameter_name(name: &str) -> Result<(), SqlError> {
    if name.starts_with(SIGILS) {
        return Err(SqlError::SigilParameterName {
            name: name.to_string(),
        });
    }
    if !SAFE_PARAMETER_NAME.is_match(name) {
        return Err(SqlError::UnsafeParameterName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// `@name`, after validation.
pub(crate) fn bind(name: &str) -> Result<String, SqlError> {
    validate_parameter_name(name)?;
    Ok(format!("@{}", name))
}
