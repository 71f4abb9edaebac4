//! Upload payload accepted by file creation.

use bytes::Bytes;

/// The only media type a data room accepts.
pub const PDF_MIME: &str = "application/pdf";

/// A file handed to the repository for storage.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Desired file name (including extension).
    pub name: String,
    /// Declared media type.
    pub mime: String,
    /// File content.
    pub data: Bytes,
}

impl NewFile {
    /// Creates a new upload payload.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Shorthand for a PDF upload.
    pub fn pdf(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(name, PDF_MIME, data)
    }

    /// Byte length of the content.
    pub fn size(&self) -> i64 {
        self.data.len() as i64
    }

    /// Check whether the declared media type is PDF.
    pub fn is_pdf(&self) -> bool {
        self.mime == PDF_MIME
    }
}
