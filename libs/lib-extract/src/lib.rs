//! File-to-text extraction for uploaded emails (PDF and plain text).

use anyhow::Context;

/// Upload kinds the classifier accepts, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFile {
    Pdf,
    Txt,
}

impl SupportedFile {
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

/// Extract text from an uploaded file according to its detected kind.
pub fn extract_text(kind: SupportedFile, bytes: &[u8]) -> anyhow::Result<String> {
    match kind {
        SupportedFile::Pdf => extract_pdf(bytes),
        SupportedFile::Txt => Ok(extract_txt(bytes)),
    }
}

/// Pages come back newline-joined from the extractor; trim the result.
pub fn extract_pdf(bytes: &[u8]) -> anyhow::Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes).context("Failed to read PDF content")?;
    Ok(text.trim().to_string())
}

/// Decode as UTF-8, falling back to latin-1 for legacy exports.
pub fn extract_txt(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_supported_extensions() {
        assert_eq!(SupportedFile::from_filename("email.pdf"), Some(SupportedFile::Pdf));
        assert_eq!(SupportedFile::from_filename("EMAIL.TXT"), Some(SupportedFile::Txt));
        assert_eq!(SupportedFile::from_filename("email.docx"), None);
        assert_eq!(SupportedFile::from_filename("no_extension"), None);
    }

    #[test]
    fn test_txt_utf8() {
        assert_eq!(extract_txt("solicitação".as_bytes()), "solicitação");
    }

    #[test]
    fn test_txt_latin1_fallback() {
        // "solicitação" encoded as latin-1 is invalid UTF-8
        let latin1 = b"solicita\xe7\xe3o";
        assert_eq!(extract_txt(latin1), "solicitação");
    }
}
