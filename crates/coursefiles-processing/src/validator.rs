use coursefiles_core::{AppError, Config};
use std::path::Path;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (must be below {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid {field}: must be a positive integer")]
    InvalidOwner { field: &'static str },

    #[error("Empty file")]
    EmptyFile,
}

impl ValidationError {
    /// Malformed request, as opposed to a well-formed upload that breaks a limit.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ValidationError::InvalidFilename(_) | ValidationError::InvalidOwner { .. }
        )
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        if err.is_malformed_input() {
            AppError::InvalidInput(err.to_string())
        } else {
            AppError::UpstreamRejected(err.to_string())
        }
    }
}

/// Course file upload validator
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes(),
            config.allowed_extensions().to_vec(),
        )
    }

    pub fn validate_owner(&self, user_id: i32, course_id: i32) -> Result<(), ValidationError> {
        if user_id <= 0 {
            return Err(ValidationError::InvalidOwner { field: "user_id" });
        }
        if course_id <= 0 {
            return Err(ValidationError::InvalidOwner { field: "course_id" });
        }
        Ok(())
    }

    /// File names become part of the storage key, so separators and `..` are refused.
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidFilename(
                "filename must not be empty".to_string(),
            ));
        }
        if trimmed.contains('/') || trimmed.contains('\\') || trimmed.contains("..") {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }
        Ok(())
    }

    /// Size must be non-zero and strictly below the limit.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size >= self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidExtension {
                extension: String::new(),
                allowed: self.allowed_extensions.clone(),
            })?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Malformed-input checks run first so they win over limit violations.
    pub fn validate_all(
        &self,
        user_id: i32,
        course_id: i32,
        filename: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_owner(user_id, course_id)?;
        self.validate_filename(filename)?;
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MB: usize = 5 * 1024 * 1024;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(
            FIVE_MB,
            vec!["txt".to_string(), ".PDF".to_string(), "docx".to_string()],
        )
    }

    #[test]
    fn test_validate_file_size_is_strictly_below_limit() {
        let validator = test_validator();
        assert!(validator.validate_file_size(FIVE_MB - 1).is_ok());
        assert!(matches!(
            validator.validate_file_size(FIVE_MB),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_file_size_empty() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension() {
        let validator = test_validator();
        assert!(validator.validate_extension("notes.txt").is_ok());
        assert!(validator.validate_extension("slides.pdf").is_ok()); // normalized whitelist
        assert!(validator.validate_extension("Essay.DOCX").is_ok());
        assert!(validator.validate_extension("image.png").is_err());
        assert!(validator.validate_extension("README").is_err());
    }

    #[test]
    fn test_validate_filename() {
        let validator = test_validator();
        assert!(validator.validate_filename("week 1 notes.txt").is_ok());
        assert!(validator.validate_filename("").is_err());
        assert!(validator.validate_filename("../secret.txt").is_err());
        assert!(validator.validate_filename("dir/notes.txt").is_err());
        assert!(validator.validate_filename("dir\\notes.txt").is_err());
    }

    #[test]
    fn test_validate_owner() {
        let validator = test_validator();
        assert!(validator.validate_owner(1, 2).is_ok());
        assert!(matches!(
            validator.validate_owner(0, 2),
            Err(ValidationError::InvalidOwner { field: "user_id" })
        ));
        assert!(matches!(
            validator.validate_owner(1, -5),
            Err(ValidationError::InvalidOwner { field: "course_id" })
        ));
    }

    #[test]
    fn test_validate_all_orders_malformed_input_first() {
        let validator = test_validator();
        let err = validator
            .validate_all(0, 2, "huge.png", FIVE_MB * 2)
            .unwrap_err();
        assert!(err.is_malformed_input());

        let err = validator
            .validate_all(1, 2, "huge.png", FIVE_MB * 2)
            .unwrap_err();
        assert!(!err.is_malformed_input());

        assert!(validator.validate_all(1, 2, "notes.txt", 10).is_ok());
    }

    #[test]
    fn test_app_error_classification() {
        use coursefiles_core::ErrorMetadata;

        let err: AppError = ValidationError::InvalidFilename("../x".to_string()).into();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err: AppError = ValidationError::FileTooLarge { size: 10, max: 5 }.into();
        assert_eq!(err.error_code(), "UPSTREAM_REJECTED");
    }
}
