//! Shared fixtures for the integration tests.
//!
//! Fixtures are generated with lopdf rather than checked in: blank-page
//! documents where only page counts matter, and text-bearing documents where
//! boundary detection has to read real extracted text.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

/// Write a PDF of blank pages.
pub fn write_blank_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    let mut doc = blank_document(pages);
    doc.save(&path).expect("failed to save fixture");
    path
}

/// Write a PDF with one line of text per page.
pub fn write_text_pdf(dir: &Path, name: &str, page_texts: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut doc = text_document(page_texts);
    doc.save(&path).expect("failed to save fixture");
    path
}

/// A full two-unit reading book: four per-unit categories plus a monolithic
/// unit test file whose page text carries the unit markers.
pub fn write_reading_45_book(book_dir: &Path) {
    for unit in 1..=2 {
        write_blank_pdf(book_dir, &format!("Word_List_Unit_{unit:02}.pdf"), 2);
        write_blank_pdf(book_dir, &format!("Word_Test_Unit_{unit:02}.pdf"), 2);
        write_blank_pdf(book_dir, &format!("Translation_Sheet_Unit_{unit:02}.pdf"), 3);
        write_blank_pdf(book_dir, &format!("Unscramble_Sheet_Unit_{unit:02}.pdf"), 2);
    }
    write_text_pdf(
        book_dir,
        "Unit_Test_ALL.pdf",
        &[
            "Unit 1 Test",
            "questions for the first unit",
            "Unit 2 Test",
            "questions for the second unit",
        ],
    );
}

fn blank_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for _ in 0..pages {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        page_ids.push(page_id);
    }

    finish_document(&mut doc, pages_id, page_ids);
    doc
}

fn text_document(page_texts: &[&str]) -> Document {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("failed to encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        page_ids.push(page_id);
    }

    finish_document(&mut doc, pages_id, page_ids);
    doc
}

fn finish_document(doc: &mut Document, pages_id: lopdf::ObjectId, page_ids: Vec<lopdf::ObjectId>) {
    let count = page_ids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        "Count" => count,
    };
    doc.objects.insert(pages_id, pages_dict.into());

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Page count of a written PDF.
pub fn page_count(path: &Path) -> usize {
    Document::load(path)
        .expect("failed to load output")
        .get_pages()
        .len()
}
