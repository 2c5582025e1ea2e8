use std::panic;

use crawl_core::{clean_text, ContentKind};

use crate::{Extracted, Extractor, Resource, ResourceError};

/// Text layer of a PDF, pages in order. PDFs carry no title, date or links.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extract(&self, resource: &Resource<'_>) -> Result<Extracted, ResourceError> {
        let raw = extract_pdf_text(resource.body)?;
        Ok(Extracted {
            text: clean_text(&raw),
            ..Extracted::default()
        })
    }
}

/// Extract raw text from PDF bytes. The parser panics on some malformed
/// inputs; those panics surface as an extraction failure.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ResourceError> {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(err)) => Err(ResourceError::ExtractionFailure {
            kind: ContentKind::Pdf,
            message: err.to_string(),
        }),
        Err(_) => Err(ResourceError::ExtractionFailure {
            kind: ContentKind::Pdf,
            message: "pdf parser panicked".to_string(),
        }),
    }
}
