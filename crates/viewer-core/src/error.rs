use flipbook_engine::PdfEngineError;

pub type ViewerResult<T> = Result<T, ViewerError>;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("flipbook: target not specified")]
    MissingTarget,
    #[error("flipbook: target not found: {0}")]
    TargetNotFound(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("failed to load document: {0}")]
    Load(#[from] PdfEngineError),
    #[error("document has no pages")]
    EmptyDocument,
    #[error("zoom must be a positive finite number, got {0}")]
    InvalidZoom(f32),
}

impl ViewerError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Setup failures that leave no usable viewer behind.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingTarget | Self::TargetNotFound(_) | Self::InvalidConfig(_) | Self::ConfigParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert_eq!(ViewerError::MissingTarget.to_string(), "flipbook: target not specified");
        assert!(ViewerError::TargetNotFound("#book".into()).to_string().contains("#book"));
        assert!(ViewerError::invalid_config("x").to_string().starts_with("invalid configuration:"));
    }

    #[test]
    fn load_errors_are_recoverable() {
        let err = ViewerError::from(PdfEngineError::Backend("boom".into()));

        assert!(!err.is_fatal());
        assert!(err.to_string().contains("boom"));
        assert!(ViewerError::MissingTarget.is_fatal());
    }
}
