use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PdfEditError {
    #[error("Invalid page range: {0}")]
    Range(String),

    #[error("Failed to parse PDF: {0}")]
    Format(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Input(String),

    #[error("Unusable font program: {0}")]
    Font(String),

    #[error("Unreadable image: {0}")]
    Image(String),

    #[error("Password rejected: {0}")]
    Password(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}

impl PdfEditError {
    /// Errors caused by the request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PdfEditError::Operation(_))
    }
}

impl From<lopdf::Error> for PdfEditError {
    fn from(err: lopdf::Error) -> Self {
        PdfEditError::Operation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_cloneable_values() {
        let err = PdfEditError::Range("Page 9 is out of range".into());
        let copy = err.clone();
        assert_eq!(copy.to_string(), err.to_string());
        assert!(copy.is_client_error());
        assert!(!PdfEditError::Operation("save".into()).clone().is_client_error());
    }
}
