use bytes::Bytes;

/// An uploaded image as received at the request boundary.
#[derive(Debug, Clone)]
pub struct CoverFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
    received: usize,
}

impl CoverFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self { filename: filename.into(), content_type: content_type.into(), received: bytes.len(), bytes }
    }

    /// A part that was only partly buffered: `head` holds the first bytes,
    /// `received` counts everything that arrived. Such a cover can only fail
    /// validation and is never uploaded.
    pub fn truncated(filename: impl Into<String>, content_type: impl Into<String>, head: impl Into<Bytes>, received: usize) -> Self {
        let bytes = head.into();
        let received = received.max(bytes.len());
        Self { filename: filename.into(), content_type: content_type.into(), bytes, received }
    }

    /// Bytes received for this part, buffered or not.
    pub fn size(&self) -> usize { self.received }

    pub fn is_truncated(&self) -> bool { self.received > self.bytes.len() }
}

/// What an update does with the listing's cover.
#[derive(Debug, Clone)]
pub enum CoverChange {
    Keep,
    Replace(CoverFile),
}

impl From<Option<CoverFile>> for CoverChange {
    fn from(file: Option<CoverFile>) -> Self {
        match file {
            Some(f) => CoverChange::Replace(f),
            None => CoverChange::Keep,
        }
    }
}
