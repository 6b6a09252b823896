//! Resume document text. PDF extraction is CPU-bound; callers run
//! `extract_text` inside `tokio::task::spawn_blocking`.

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Text of a supported resume document, `None` for unsupported types.
///
/// A PDF that cannot be read yields an empty string so the resume still gets a
/// manual-review record instead of failing the batch.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Option<String> {
    match DocumentKind::from_filename(filename)? {
        DocumentKind::PlainText => Some(String::from_utf8_lossy(bytes).into_owned()),
        DocumentKind::Pdf => match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Could not read PDF {filename}: {e}");
                Some(String::new())
            }
        },
    }
}
