use std::io;
use std::path::Path;

pub const PLAIN_TEXT_MIME: &str = "text/plain";

/// A file chosen for batch prediction: one URL per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, inferring the MIME type from its extension
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, mime_for_path(path), bytes))
    }

    pub fn is_plain_text(&self) -> bool {
        // Browsers may append parameters such as `; charset=utf-8`
        self.mime_type
            .split(';')
            .next()
            .map(|essence| essence.trim().eq_ignore_ascii_case(PLAIN_TEXT_MIME))
            .unwrap_or(false)
    }

    /// Non-blank, trimmed lines: what the backend will treat as URLs
    pub fn url_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.bytes)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
