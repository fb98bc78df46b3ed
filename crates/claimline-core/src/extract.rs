//! Document text extraction seam.
//!
//! The orchestrator only sees the [`TextExtractor`] trait; the bundled
//! implementation handles plain text and reports PDF and Word documents
//! as unsupported so a richer extractor can be injected at the seam.

use thiserror::Error;

/// Extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// File extension is not one the extractor can handle.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// Bytes could not be decoded as the declared format.
    #[error("could not read document: {0}")]
    CorruptFile(String),
    /// Extraction succeeded but produced no usable text.
    #[error("document contains no extractable text")]
    EmptyContent,
}

/// Document format recognised from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Word,
    PlainText,
}

impl DocumentFormat {
    /// Recognise a format from the filename extension, case-insensitive.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;
        match extension.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" => Some(DocumentFormat::Word),
            "txt" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }
}

/// Turns uploaded bytes into text.
pub trait TextExtractor: Send + Sync {
    /// Extract text from `bytes` uploaded under `filename`.
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Extractor for plain-text uploads. PDF and Word files need an external
/// extractor and are reported unsupported here.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        let format = DocumentFormat::from_filename(filename)
            .ok_or_else(|| ExtractError::UnsupportedFormat(filename.to_string()))?;
        match format {
            DocumentFormat::PlainText => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| ExtractError::CorruptFile(e.to_string()))?;
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ExtractError::EmptyContent);
                }
                Ok(trimmed.to_string())
            }
            DocumentFormat::Pdf => Err(ExtractError::UnsupportedFormat(
                "PDF extraction requires an external extractor".to_string(),
            )),
            DocumentFormat::Word => Err(ExtractError::UnsupportedFormat(
                "Word extraction requires an external extractor".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_filename("claim.PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_filename("letter.Docx"), Some(DocumentFormat::Word));
        assert_eq!(DocumentFormat::from_filename("notes.txt"), Some(DocumentFormat::PlainText));
        assert_eq!(DocumentFormat::from_filename("payload.exe"), None);
        assert_eq!(DocumentFormat::from_filename("no-extension"), None);
    }

    #[test]
    fn plain_text_extraction_trims() {
        let extractor = PlainTextExtractor;
        let text = extractor.extract("notes.txt", b"  hello claim  \n").unwrap();
        assert_eq!(text, "hello claim");
    }

    #[test]
    fn whitespace_only_is_empty_content() {
        let extractor = PlainTextExtractor;
        let err = extractor.extract("notes.txt", b"   \n\t").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyContent));
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let extractor = PlainTextExtractor;
        let err = extractor.extract("notes.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFile(_)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let extractor = PlainTextExtractor;
        let err = extractor.extract("payload.exe", b"MZ").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }
}
