//! PDF page splitting: one standalone single-page document per physical page.
//!
//! The model gets exactly one page per call so nothing on a long bill is
//! skipped when the model's attention runs out. lopdf works entirely in
//! memory, so the downloaded bytes never touch disk: load once, and for each
//! page serialize a cloned document with every other page deleted.

use crate::error::ExtractError;
use lopdf::Document;

/// A loaded multi-page PDF, ready to be split.
pub struct PdfPages {
    doc: Document,
    /// Page numbers as lopdf reports them (1-based), in physical order.
    page_numbers: Vec<u32>,
}

/// Parse the downloaded bytes as a PDF.
pub fn load(bytes: &[u8]) -> Result<PdfPages, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::CorruptPdf {
        detail: e.to_string(),
    })?;
    let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers.sort_unstable();
    Ok(PdfPages { doc, page_numbers })
}

impl PdfPages {
    /// Number of physical pages.
    pub fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    /// Serialize page `index` (0-based) as a standalone one-page PDF.
    ///
    /// Clones the document, deletes every other page, drops the now
    /// unreferenced objects, and writes the result to a buffer.
    pub fn single_page_bytes(&self, index: usize) -> Result<Vec<u8>, ExtractError> {
        let keep = *self
            .page_numbers
            .get(index)
            .ok_or(ExtractError::PageOutOfRange {
                page: index + 1,
                total: self.page_count(),
            })?;

        let delete: Vec<u32> = self
            .page_numbers
            .iter()
            .copied()
            .filter(|&n| n != keep)
            .collect();

        let mut single = self.doc.clone();
        single.delete_pages(&delete);
        single.prune_objects();

        let mut buf = Vec::new();
        single
            .save_to(&mut buf)
            .map_err(|e| ExtractError::Internal(format!("page serialization failed: {e}")))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, ObjectId};

    /// Minimal valid PDF with `page_count` empty US-Letter pages.
    fn create_test_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();

        let mut page_ids: Vec<Object> = Vec::new();
        for _ in 0..page_count {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids,
                "Count" => page_count as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    #[test]
    fn counts_pages() {
        let pdf = load(&create_test_pdf(3)).unwrap();
        assert_eq!(pdf.page_count(), 3);
    }

    #[test]
    fn single_page_round_trips_as_one_page_pdf() {
        let pdf = load(&create_test_pdf(4)).unwrap();
        for i in 0..4 {
            let chunk = pdf.single_page_bytes(i).unwrap();
            assert!(chunk.starts_with(b"%PDF"), "chunk {i} missing PDF header");
            let reloaded = load(&chunk).unwrap();
            assert_eq!(reloaded.page_count(), 1, "chunk {i} should have 1 page");
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let pdf = load(&create_test_pdf(2)).unwrap();
        assert!(matches!(
            pdf.single_page_bytes(2),
            Err(ExtractError::PageOutOfRange { page: 3, total: 2 })
        ));
    }

    #[test]
    fn garbage_bytes_are_a_corrupt_pdf() {
        assert!(matches!(
            load(b"definitely not a pdf"),
            Err(ExtractError::CorruptPdf { .. })
        ));
    }
}
