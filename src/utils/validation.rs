use crate::utils::error::{BatchError, Result};
use regex::Regex;
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(field_name: &str, files: &[String], allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<String> = allowed_extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect();

    for file in files {
        match std::path::Path::new(file).extension().and_then(|ext| ext.to_str()) {
            Some(extension) if allowed_set.contains(&extension.to_ascii_lowercase()) => {}
            Some(extension) => {
                return Err(BatchError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(BatchError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// `#rgb` 或 `#rrggbb` 色碼
pub fn validate_color(field_name: &str, value: &str) -> Result<()> {
    let re = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").map_err(|e| BatchError::ConfigError {
        message: e.to_string(),
    })?;

    if !re.is_match(value) {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a hex color such as #000000".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output", "./out").is_ok());
        assert!(validate_path("output", "").is_err());
        assert!(validate_path("output", "a\0b").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("concurrency", 5, 1).is_ok());
        assert!(validate_positive_number("concurrency", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["template.svg".to_string(), "CARD.SVG".to_string()];
        assert!(validate_file_extensions("template", &files, &["svg"]).is_ok());

        let invalid_files = vec!["template.png".to_string()];
        assert!(validate_file_extensions("template", &invalid_files, &["svg"]).is_err());

        let no_extension = vec!["template".to_string()];
        assert!(validate_file_extensions("template", &no_extension, &["svg"]).is_err());
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("qr.dark_color", "#000").is_ok());
        assert!(validate_color("qr.dark_color", "#A0b1C2").is_ok());
        assert!(validate_color("qr.dark_color", "black").is_err());
        assert!(validate_color("qr.dark_color", "#12345").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("qr.logo_size", 0.25, 0.05, 0.5).is_ok());
        assert!(validate_range("qr.logo_size", 0.75, 0.05, 0.5).is_err());
    }
}
