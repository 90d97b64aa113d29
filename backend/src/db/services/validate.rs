//! Input validation helpers.
//!
//! Every failure is a `ValidationError` naming the offending field, which the
//! HTTP layer renders as 422.

use serde_json::Value;

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

fn invalid(field: &str, message: String) -> RepositoryError {
    RepositoryError::validation_with_context(
        message,
        ErrorContext::default().with_entity(field),
    )
}

/// Character count of `value` must lie in `min..=max`.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> RepositoryResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(invalid(
            field,
            format!("{} must have at least {} characters", field, min),
        ));
    }
    if len > max {
        return Err(invalid(
            field,
            format!("{} must have at most {} characters", field, max),
        ));
    }
    Ok(())
}

pub fn optional_length(
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> RepositoryResult<()> {
    value.map_or(Ok(()), |v| length(field, v, min, max))
}

pub fn range(field: &str, value: i32, min: i32, max: i32) -> RepositoryResult<()> {
    if value < min || value > max {
        return Err(invalid(
            field,
            format!("{} must be between {} and {}", field, min, max),
        ));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: i32) -> RepositoryResult<()> {
    if value < 0 {
        return Err(invalid(field, format!("{} must be greater than or equal to 0", field)));
    }
    Ok(())
}

/// Six hexadecimal digits without a leading `#`.
pub fn hex_colour(field: &str, value: &str) -> RepositoryResult<()> {
    if value.len() != 6 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(
            field,
            format!("{} must be a 6 character hexadecimal colour", field),
        ));
    }
    Ok(())
}

/// Absolute http(s) URL with a non-empty host.
pub fn http_url(field: &str, value: &str) -> RepositoryResult<()> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    let host = rest.and_then(|r| r.split(['/', '?', '#']).next());

    match host {
        Some(h) if !h.is_empty() && !value.chars().any(char::is_whitespace) => Ok(()),
        _ => Err(invalid(field, format!("{} must be a valid URL", field))),
    }
}

pub fn email(value: &str) -> RepositoryResult<()> {
    length("email", value, 3, 255)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(invalid("email", "email must be a valid e-mail address".to_string()));
    }
    Ok(())
}

/// Free-form stats must be a JSON object.
pub fn json_object(field: &str, value: Option<&Value>) -> RepositoryResult<()> {
    match value {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(invalid(field, format!("{} must be a JSON object", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_length_counts_characters() {
        assert!(length("shortName", "SÃO", 2, 4).is_ok());
        assert!(length("shortName", "S", 2, 4).is_err());
        assert!(length("shortName", "TOOLONG", 2, 4).is_err());
    }

    #[test]
    fn test_hex_colour() {
        assert!(hex_colour("mainColorHex", "00ff7A").is_ok());
        assert!(hex_colour("mainColorHex", "#00ff7").is_err());
        assert!(hex_colour("mainColorHex", "00ff7G").is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("iconUrl", "https://cdn.example.com/icon.png").is_ok());
        assert!(http_url("iconUrl", "ftp://example.com").is_err());
        assert!(http_url("iconUrl", "https:///path").is_err());
        assert!(http_url("iconUrl", "https://exa mple.com").is_err());
    }

    #[test]
    fn test_email() {
        assert!(email("ana@example.com").is_ok());
        assert!(email("ana.example.com").is_err());
        assert!(email("ana@localhost").is_err());
        assert!(email("@example.com").is_err());
    }

    #[test]
    fn test_json_object() {
        assert!(json_object("stats", None).is_ok());
        assert!(json_object("stats", Some(&json!({"sprints": 4}))).is_ok());
        let err = json_object("stats", Some(&json!([1, 2]))).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }
}
