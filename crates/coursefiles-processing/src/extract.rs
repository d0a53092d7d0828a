//! Plain-text extraction for uploaded course files.
//!
//! Text formats are decoded as lossy UTF-8. PDF goes through `pdf-extract`;
//! DOCX is read as a zip archive and the paragraph text is pulled out of
//! `word/document.xml`.

use coursefiles_core::AppError;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Text extraction is not supported for '{0}' files")]
    Unsupported(String),

    #[error("Could not read {format} content: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    #[error("File contains no extractable text")]
    NoText,
}

/// Every extraction failure means the upload itself is unusable.
impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::UpstreamRejected(err.to_string())
    }
}

/// Extract the readable text of `data`, choosing the decoder by `file_name`'s extension.
pub fn extract_text(data: &[u8], file_name: &str) -> Result<String, ExtractionError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "txt" | "md" | "csv" | "json" => String::from_utf8_lossy(data).into_owned(),
        #[cfg(feature = "document")]
        "pdf" => extract_pdf_text(data)?,
        #[cfg(feature = "document")]
        "docx" => extract_docx_text(data)?,
        other => return Err(ExtractionError::Unsupported(other.to_string())),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::NoText);
    }

    tracing::debug!(
        file_name = %file_name,
        text_len = trimmed.len(),
        "Text extracted"
    );

    Ok(trimmed.to_string())
}

#[cfg(feature = "document")]
fn extract_pdf_text(data: &[u8]) -> Result<String, ExtractionError> {
    use std::io::Write;

    let malformed = |message: String| ExtractionError::Malformed {
        format: "PDF",
        message,
    };

    let mut temp = tempfile::NamedTempFile::new()
        .map_err(|e| malformed(format!("failed to create temp file: {}", e)))?;
    temp.write_all(data)
        .and_then(|_| temp.flush())
        .map_err(|e| malformed(format!("failed to write temp file: {}", e)))?;

    pdf_extract::extract_text(temp.path()).map_err(|e| {
        tracing::warn!(error = %e, "PDF text extraction failed");
        malformed(e.to_string())
    })
}

#[cfg(feature = "document")]
fn extract_docx_text(data: &[u8]) -> Result<String, ExtractionError> {
    use regex::Regex;
    use std::io::{Cursor, Read};

    let malformed = |message: String| ExtractionError::Malformed {
        format: "DOCX",
        message,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|e| malformed(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| malformed(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| malformed(e.to_string()))?;

    let paragraph_re =
        Regex::new(r"(?s)<w:p[ >].*?</w:p>").map_err(|e| malformed(e.to_string()))?;
    let run_re = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").map_err(|e| malformed(e.to_string()))?;

    let paragraphs: Vec<String> = paragraph_re
        .find_iter(&xml)
        .map(|p| {
            run_re
                .captures_iter(p.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str()))
                .collect::<String>()
        })
        .filter(|p| !p.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

#[cfg(feature = "document")]
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
