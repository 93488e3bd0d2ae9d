/// Input validation for uploads, document edits, comments and accounts.
use thiserror::Error;

/// Longest title accepted on upload or rename.
pub const MAX_TITLE_LEN: usize = 255;

const DEFAULT_TITLE: &str = "document.pdf";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file provided")]
    MissingFile,
    #[error("file is empty")]
    EmptyFile,
    #[error("invalid file type `{found}`, only {allowed} files are allowed")]
    InvalidFileType { found: String, allowed: String },
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("title cannot be longer than {MAX_TITLE_LEN} characters")]
    TitleTooLong,
    #[error("comment content cannot be empty")]
    EmptyContent,
    #[error("page number must be 1 or greater, got {0}")]
    InvalidPageNumber(i64),
    #[error("a valid email address is required")]
    InvalidEmail,
    #[error("password must be at least {0} characters long")]
    PasswordTooShort(usize),
    #[error("name must be between {min} and {max} characters")]
    NameLength { min: usize, max: usize },
    #[error("invalid blob path")]
    InvalidBlobPath,
    #[error("{0}")]
    Malformed(String),
}

/// Check an incoming file against the allowed media type and size limit.
///
/// The media type check runs before the size check, so an oversized file of
/// the wrong type reports the type.
pub fn validate_upload(
    declared_mime: &str,
    size: u64,
    allowed_mime: &str,
    max_bytes: u64,
) -> Result<(), ValidationError> {
    if declared_mime != allowed_mime {
        return Err(ValidationError::InvalidFileType {
            found: declared_mime.to_string(),
            allowed: allowed_mime.to_string(),
        });
    }
    if size == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Trim a title and check it is usable. Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(title.to_string())
}

/// Title for an upload that came without one: the trimmed filename, cut to
/// [`MAX_TITLE_LEN`] characters, or `document.pdf` when nothing is left.
pub fn default_title(filename: &str) -> String {
    let title: String = filename.trim().chars().take(MAX_TITLE_LEN).collect();
    let title = title.trim_end();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Trim comment content. Whitespace-only content is rejected.
pub fn validate_comment(page_number: i64, content: &str) -> Result<(u32, String), ValidationError> {
    let page = u32::try_from(page_number)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or(ValidationError::InvalidPageNumber(page_number))?;
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok((page, content.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &str = "application/pdf";
    const LIMIT: u64 = 10 * 1024 * 1024;

    #[test]
    fn accepts_pdf_at_limit() {
        assert!(validate_upload(PDF, LIMIT, PDF, LIMIT).is_ok());
    }

    #[test]
    fn rejects_wrong_type_before_size() {
        let err = validate_upload("image/png", LIMIT + 1, PDF, LIMIT).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFileType { .. }));
    }

    #[test]
    fn rejects_oversized_and_empty() {
        assert_eq!(
            validate_upload(PDF, LIMIT + 1, PDF, LIMIT),
            Err(ValidationError::FileTooLarge {
                size: LIMIT + 1,
                limit: LIMIT
            })
        );
        assert_eq!(validate_upload(PDF, 0, PDF, LIMIT), Err(ValidationError::EmptyFile));
    }

    #[test]
    fn title_is_trimmed() {
        assert_eq!(validate_title("  Report  ").unwrap(), "Report");
        assert_eq!(validate_title("   "), Err(ValidationError::EmptyTitle));
        assert_eq!(
            validate_title(&"x".repeat(MAX_TITLE_LEN + 1)),
            Err(ValidationError::TitleTooLong)
        );
    }

    #[test]
    fn comment_needs_content_and_positive_page() {
        assert_eq!(validate_comment(2, " hi ").unwrap(), (2, "hi".to_string()));
        assert_eq!(validate_comment(1, " \n\t"), Err(ValidationError::EmptyContent));
        assert_eq!(validate_comment(0, "hi"), Err(ValidationError::InvalidPageNumber(0)));
        assert_eq!(validate_comment(-3, "hi"), Err(ValidationError::InvalidPageNumber(-3)));
    }

    #[test]
    fn default_title_never_fails() {
        assert_eq!(default_title("  report.pdf "), "report.pdf");
        assert_eq!(default_title(""), "document.pdf");
        assert_eq!(default_title("   "), "document.pdf");

        let long = format!("{}.pdf", "a".repeat(300));
        let title = default_title(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_LEN);
        assert!(validate_title(&title).is_ok());
    }
}
