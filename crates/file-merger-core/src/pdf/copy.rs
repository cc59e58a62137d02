//! Copying pages from a source PDF into the output document.
//!
//! Source objects are renumbered above the target's highest id and moved
//! over wholesale. The source's catalog, page tree nodes and outlines are
//! dropped; each copied page is re-parented onto the output page tree, so
//! attributes it used to inherit from its old ancestors are copied onto the
//! page first.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Page attributes that may be inherited from ancestor page tree nodes.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page has no MediaBox anywhere in its ancestry.
const FALLBACK_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

/// Parse `source` and copy all of its pages, in order, into `target`.
///
/// Returns the ids of the copied page objects in source page order. The
/// caller is responsible for adding them to the page tree rooted at
/// `pages_id`.
pub(crate) fn copy_pages(
    target: &mut Document,
    pages_id: ObjectId,
    source: &[u8],
    file: &str,
) -> Result<Vec<ObjectId>> {
    let mut doc = Document::load_mem(source)
        .map_err(|e| Error::malformed(file, format!("failed to parse PDF: {e}")))?;

    doc.renumber_objects_with(target.max_id + 1);

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut pages = Vec::with_capacity(page_ids.len());

    for page_id in page_ids {
        let mut page = doc
            .get_dictionary(page_id)
            .map_err(|e| Error::malformed(file, format!("failed to read page object: {e}")))?
            .clone();

        for key in INHERITABLE_ATTRIBUTES {
            if !page.has(key)
                && let Some(value) = inherited_attribute(&doc, &page, key)
            {
                page.set(key, value);
            }
        }

        if !page.has(b"MediaBox") {
            page.set(
                "MediaBox",
                Object::Array(FALLBACK_MEDIA_BOX.iter().map(|&v| Object::Integer(v)).collect()),
            );
        }

        page.set("Parent", Object::Reference(pages_id));
        pages.push((page_id, page));
    }

    let source_max_id = doc.max_id;

    for (object_id, object) in doc.objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                target.objects.insert(object_id, object);
            }
        }
    }

    let copied: Vec<ObjectId> = pages.iter().map(|(id, _)| *id).collect();
    for (page_id, page) in pages {
        target.objects.insert(page_id, Object::Dictionary(page));
    }

    target.max_id = target.max_id.max(source_max_id);

    Ok(copied)
}

/// Look up `key` on the nearest ancestor of `page` that defines it.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// Two pages whose MediaBox and Resources live on the page tree root.
    fn pdf_with_inherited_attributes() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "ProcSet",
            Object::Array(vec![Object::Name(b"PDF".to_vec())]),
        )]));

        let mut kids = Vec::new();
        for label in ["first", "second"] {
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                format!("% {label}").into_bytes(),
            ));
            kids.push(Object::Reference(doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]))));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(2)),
                ("Resources", Object::Reference(resources_id)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 300.into(), 400.into()]),
                ),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_copy_materializes_inherited_attributes() {
        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();

        let copied = copy_pages(&mut target, pages_id, &pdf_with_inherited_attributes(), "a.pdf")
            .unwrap();
        assert_eq!(copied.len(), 2);

        for id in &copied {
            let page = target.get_dictionary(*id).unwrap();
            assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), pages_id);
            assert!(page.has(b"Resources"));
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media_box[2].as_i64().unwrap(), 300);
        }
    }

    #[test]
    fn test_copy_ids_do_not_collide() {
        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();
        let source = pdf_with_inherited_attributes();

        let first = copy_pages(&mut target, pages_id, &source, "a.pdf").unwrap();
        let second = copy_pages(&mut target, pages_id, &source, "b.pdf").unwrap();

        assert!(first.iter().all(|id| !second.contains(id)));
        assert!(second.iter().all(|id| id.0 > pages_id.0));
        assert!(target.max_id >= second.iter().map(|id| id.0).max().unwrap());
    }

    #[test]
    fn test_copy_rejects_garbage() {
        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();

        let result = copy_pages(&mut target, pages_id, b"%PDF-1.4 definitely broken", "bad.pdf");
        assert!(matches!(result, Err(Error::MalformedInput { ref file, .. }) if file == "bad.pdf"));
    }
}
