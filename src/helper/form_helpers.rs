use super::ServiceError;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Trimmed value, or `None` when blank.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn optional_non_empty(value: Option<&str>) -> Option<String> {
    value.and_then(non_empty)
}

/// Parses a comma separated id list such as `"3, 5,8"`. Blank input is an empty list.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, ServiceError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ServiceError::validation(format!("ID tidak valid: {}", part)))
        })
        .collect()
}

/// `"all"` and blank values mean "no filter".
pub fn filter_value(value: Option<&str>) -> Option<String> {
    optional_non_empty(value).filter(|v| v != "all")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("ortu@example.com"));
        assert!(!is_valid_email("ortu@example"));
        assert!(!is_valid_email("bukan email"));
    }

    #[test]
    fn id_lists() {
        assert_eq!(parse_id_list("3, 5,8").unwrap(), vec![3, 5, 8]);
        assert!(parse_id_list("").unwrap().is_empty());
        assert!(parse_id_list("1,x").is_err());
    }

    #[test]
    fn all_means_no_filter() {
        assert_eq!(filter_value(Some("all")), None);
        assert_eq!(filter_value(Some("  ")), None);
        assert_eq!(filter_value(Some("pending")), Some("pending".to_string()));
    }
}
