use lopdf::Document;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// How many leading pages the OCR check extracts text from.
pub const OCR_PAGE_LIMIT: usize = 5;

/// Returns `true` if the file starts with the PDF header. Read failures count
/// as "not a PDF".
pub fn is_pdf(path: &Path) -> bool {
    let mut header = [0u8; 5];
    match File::open(path).and_then(|mut f| f.read_exact(&mut header)) {
        Ok(()) => &header == PDF_MAGIC,
        Err(_) => false,
    }
}

/// Whether any of the first `OCR_PAGE_LIMIT` pages yields non-blank text.
///
/// A file that is not a PDF, or that cannot be parsed, has no text layer.
/// A page whose text cannot be extracted counts as blank.
pub fn has_text_layer(path: &Path) -> bool {
    if !is_pdf(path) {
        return false;
    }
    let document = match Document::load(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Could not parse PDF {:?}: {}", path, e);
            return false;
        }
    };

    let found = document
        .get_pages()
        .keys()
        .take(OCR_PAGE_LIMIT)
        .any(|&page| match document.extract_text(&[page]) {
            Ok(text) => !text.trim().is_empty(),
            Err(e) => {
                tracing::debug!("No text extracted from page {} of {:?}: {}", page, path, e);
                false
            }
        });
    tracing::debug!("Text layer check for {:?}: {}", path, found);
    found
}

/// Guesses a MIME type from the file extension.
pub fn media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
