use thiserror::Error;

/// Failure to extract text from one attachment; absorbed by the composer
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported MIME type: {0}")]
    Unsupported(String),

    #[error("{filename} is not valid UTF-8")]
    InvalidUtf8 { filename: String },

    #[error("Failed to read PDF {filename}: {message}")]
    Pdf { filename: String, message: String },

    #[error("Failed to read Word document {filename}: {message}")]
    Docx { filename: String, message: String },

    #[error("Extraction task failed: {0}")]
    Task(String),
}
