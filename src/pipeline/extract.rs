//! Text extraction from uploaded `.txt` and `.pdf` files.

use lopdf::Document;
use tracing::debug;

use crate::error::ExtractError;

/// Supported upload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Txt,
}

/// Extension lookup, matched against the lowercased final extension.
const EXTENSIONS: &[(&str, FileKind)] = &[("pdf", FileKind::Pdf), ("txt", FileKind::Txt)];

impl FileKind {
    /// Resolve the kind from a filename's last extension, case-insensitively.
    ///
    /// Returns `None` for names without an extension or with an unsupported one.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.trim().rsplit_once('.')?;
        let ext = ext.to_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }
}

/// Extract trimmed plain text from file bytes of a known kind.
///
/// The result may be empty; callers decide whether that is an error.
pub fn extract(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    let text = match kind {
        FileKind::Txt => extract_txt(bytes)?,
        FileKind::Pdf => extract_pdf(bytes)?,
    };
    debug!(kind = kind.as_str(), bytes = bytes.len(), chars = text.len(), "Extracted text");
    Ok(text)
}

/// Strict UTF-8 decode; a leading byte-order mark is dropped.
fn extract_txt(bytes: &[u8]) -> Result<String, ExtractError> {
    let text = String::from_utf8(bytes.to_vec())?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(text.trim().to_string())
}

/// Concatenate the text of every page in page order.
///
/// A page whose text can't be extracted contributes nothing; only a document
/// that fails to load (or is encrypted) is an error.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Extraction(e.to_string()))?;

    if doc.is_encrypted() {
        return Err(ExtractError::Extraction("document is encrypted".into()));
    }

    let mut text = String::new();
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                debug!(page = page_number, error = %e, "No extractable text on page");
            }
        }
    }

    Ok(text.trim().to_string())
}
