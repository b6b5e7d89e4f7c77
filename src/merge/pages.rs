//! Page slicing and cross-document splicing.
//!
//! Slicing keeps the source document's object graph intact and rewrites only
//! the page tree, so annotations, fonts and shared resources survive.
//! Splicing renumbers the incoming document past the target's highest object
//! id before the object maps are merged, then grafts the incoming pages onto
//! the target's page tree.

use crate::error::{AssembleError, Result};
use lopdf::{Document, Object, ObjectId};

/// A half-open page range, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// First page index, inclusive.
    pub start: usize,
    /// One past the last page index.
    pub end: usize,
}

impl PageSlice {
    /// Create a slice.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of pages selected.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the slice selects nothing.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Builds output documents from slices of source documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler;

impl DocumentAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }

    /// Number of pages in a document.
    pub fn page_count(&self, document: &Document) -> usize {
        document.get_pages().len()
    }

    /// Create a new document holding only the pages in `slice`.
    ///
    /// # Errors
    ///
    /// Fails when the slice selects no existing pages or the page tree is
    /// malformed.
    pub fn extract_slice(&self, document: &Document, slice: &PageSlice) -> Result<Document> {
        if slice.is_empty() {
            return Err(AssembleError::merge_failed("page slice is empty"));
        }

        let pages = document.get_pages();
        // get_pages is keyed by 1-based page number.
        let page_ids: Vec<ObjectId> = (slice.start..slice.end)
            .filter_map(|index| pages.get(&(index as u32 + 1)).copied())
            .collect();

        if page_ids.is_empty() {
            return Err(AssembleError::merge_failed(format!(
                "slice {}..{} selects no pages of a {}-page document",
                slice.start,
                slice.end,
                pages.len()
            )));
        }

        let mut extracted = document.clone();
        self.set_page_tree(&mut extracted, &page_ids)?;
        Ok(extracted)
    }

    /// Append a document's pages to the accumulating target.
    ///
    /// The first appended document becomes the base; later ones are
    /// renumbered past the base's id space and grafted onto its page tree.
    ///
    /// # Errors
    ///
    /// Fails when either document's catalog or page tree is malformed.
    pub fn append(&self, target: &mut Option<Document>, part: Document) -> Result<()> {
        let Some(base) = target.as_mut() else {
            *target = Some(part);
            return Ok(());
        };

        let mut part = part;
        part.renumber_objects_with(base.max_id + 1);
        base.max_id = part.max_id;

        let page_ids: Vec<ObjectId> = part.get_pages().into_values().collect();
        base.objects.extend(part.objects);
        self.graft_pages(base, &page_ids)
    }

    /// Drop unreferenced objects and compress streams before writing.
    pub fn finalize(&self, document: &mut Document) {
        document.prune_objects();
        document.renumber_objects();
        document.compress();
    }

    /// Replace the page tree so only `page_ids` remain, in order.
    fn set_page_tree(&self, document: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
        let pages_id = self.pages_root(document)?;
        let pages_obj = document.get_object_mut(pages_id)?;

        let Object::Dictionary(dict) = pages_obj else {
            return Err(AssembleError::merge_failed("Pages object is not a dictionary"));
        };
        let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
        dict.set("Kids", Object::Array(kids));
        dict.set("Count", Object::Integer(page_ids.len() as i64));
        Ok(())
    }

    /// Append `page_ids` to the document's existing page tree.
    fn graft_pages(&self, document: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
        let pages_id = self.pages_root(document)?;

        for page_id in page_ids {
            if let Ok(Object::Dictionary(page)) = document.get_object_mut(*page_id) {
                page.set("Parent", Object::Reference(pages_id));
            }
        }

        let pages_obj = document.get_object_mut(pages_id)?;
        let Object::Dictionary(dict) = pages_obj else {
            return Err(AssembleError::merge_failed("Pages object is not a dictionary"));
        };

        let mut kids = dict
            .get(b"Kids")
            .and_then(|k| k.as_array())
            .map(|k| k.clone())
            .unwrap_or_default();
        let count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);

        kids.extend(page_ids.iter().map(|id| Object::Reference(*id)));
        dict.set("Kids", Object::Array(kids));
        dict.set("Count", Object::Integer(count + page_ids.len() as i64));
        Ok(())
    }

    fn pages_root(&self, document: &Document) -> Result<ObjectId> {
        let catalog = document.catalog()?;
        let pages_id = catalog.get(b"Pages").and_then(|p| p.as_reference())?;
        Ok(pages_id)
    }
}
