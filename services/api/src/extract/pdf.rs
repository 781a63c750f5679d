//! services/api/src/extract/pdf.rs

use lopdf::Document;

use super::ExtractError;

/// Extracts text from every page of the PDF, concatenated in page order
/// with no separator between pages.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        let page_text = document
            .extract_text(&[*page_number])
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        text.push_str(&page_text);
    }
    Ok(text)
}
