use std::path::Path;

/// Which records a fetch should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    All,
    OwnedBy(String),
}

/// Image attached to a create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageBlob {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased file extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// What an update does with the stored image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageChange {
    #[default]
    Keep,
    Replace(ImageBlob),
    Remove,
}
