//! Error taxonomy for the load/render sequence

/// Everything that can go wrong between the first visibility event and the
/// last painted page.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("document source {location} unreachable (status {status})")]
    SourceUnreachable { location: String, status: u16 },

    #[error("document served as {content_type}, not a PDF: {snippet:?}")]
    WrongContentType {
        content_type: String,
        snippet: String,
    },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("page {page} failed to render: {detail}")]
    PageRender { page: usize, detail: String },

    #[error("decoding engine is not available")]
    EngineUnavailable,
}

impl ViewerError {
    pub fn page_render(page: usize, detail: impl Into<String>) -> Self {
        Self::PageRender {
            page,
            detail: detail.into(),
        }
    }

    /// Text shown inside the error indicator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SourceUnreachable { location, status } => {
                format!("Could not fetch the document ({location}, HTTP {status}).")
            }
            Self::WrongContentType {
                content_type,
                snippet,
            } => format!(
                "The document was served as {content_type} instead of a PDF. \
                 It starts with: \"{snippet}\""
            ),
            Self::Decode(_) => "The document could not be decoded.".to_string(),
            Self::PageRender { page, .. } => format!("Page {page} could not be rendered."),
            Self::EngineUnavailable => "The PDF engine is not loaded.".to_string(),
        }
    }
}

pub type ViewerResult<T> = std::result::Result<T, ViewerError>;
