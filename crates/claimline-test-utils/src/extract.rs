use claimline_core::extract::{ExtractError, TextExtractor};

/// Extractor that returns a fixed text for any supported filename,
/// bypassing real format handling.
#[derive(Debug, Clone)]
pub struct StubExtractor {
    text: String,
}

impl StubExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextExtractor for StubExtractor {
    fn extract(&self, filename: &str, _bytes: &[u8]) -> Result<String, ExtractError> {
        if filename.ends_with(".exe") {
            return Err(ExtractError::UnsupportedFormat(filename.to_string()));
        }
        Ok(self.text.clone())
    }
}
