//! .docx flattening: unzip the container, walk the WordprocessingML body and
//! emit one text line per paragraph with hyperlinks spliced inline as
//! `text(url)`. A hyperlink is only ever substituted within the paragraph it
//! physically belongs to.

use crate::data::{DataError, DataResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};

#[derive(Debug, Clone, Default)]
pub struct DocParagraph {
    pub text: String,
    pub links: Vec<DocHyperlink>,
}

#[derive(Debug, Clone)]
pub struct DocHyperlink {
    pub text: String,
    pub url: String,
}

/// Flatten an uploaded .docx into plain text, one line per paragraph.
pub fn flatten_document(bytes: &[u8]) -> DataResult<String> {
    let paragraphs = extract_paragraphs(bytes)?;
    Ok(paragraphs
        .iter()
        .map(splice_hyperlinks)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Extract paragraphs with their text and per-paragraph hyperlinks.
pub fn extract_paragraphs(bytes: &[u8]) -> DataResult<Vec<DocParagraph>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DataError::Validation(format!("not a .docx archive: {e}")))?;

    let relationships = match read_archive_file(&mut archive, "word/_rels/document.xml.rels") {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };

    let document = read_archive_file(&mut archive, "word/document.xml")
        .ok_or_else(|| DataError::Validation("archive has no word/document.xml".to_string()))?;

    parse_paragraphs(&document, &relationships)
}

/// Splice each hyperlink's URL into its paragraph text: after the first
/// occurrence of the link's display text, or appended as `text(url)` when
/// the display text is absent from the paragraph.
pub fn splice_hyperlinks(paragraph: &DocParagraph) -> String {
    let mut text = paragraph.text.clone();
    for link in &paragraph.links {
        match text.find(&link.text) {
            Some(start) if !link.text.is_empty() => {
                text.insert_str(start + link.text.len(), &format!("({})", link.url));
            }
            _ => {
                text.push_str(&format!("{}({})", link.text, link.url));
            }
        }
    }
    text
}

fn read_archive_file(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Map relationship ids to their external targets (hyperlink URLs live in
/// the relationships part, not in the document body).
fn parse_relationships(xml: &str) -> DataResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DataError::Validation(format!("malformed relationships part: {e}")))?;
        match event {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| {
                                DataError::Validation(format!("malformed relationship attr: {e}"))
                            })?
                            .into_owned();
                        match attr.key.local_name().as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        targets.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

fn parse_paragraphs(
    xml: &str,
    relationships: &HashMap<String, String>,
) -> DataResult<Vec<DocParagraph>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<DocParagraph> = None;
    let mut link: Option<DocHyperlink> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DataError::Validation(format!("malformed document part: {e}")))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => current = Some(DocParagraph::default()),
                b"hyperlink" => {
                    if current.is_some() {
                        link = hyperlink_target(&e, relationships)?.map(|url| DocHyperlink {
                            text: String::new(),
                            url,
                        });
                    }
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
                b"hyperlink" => {
                    if let (Some(paragraph), Some(done)) = (current.as_mut(), link.take()) {
                        paragraph.links.push(done);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    let chunk = t
                        .unescape()
                        .map_err(|e| DataError::Validation(format!("malformed text run: {e}")))?;
                    if let Some(paragraph) = current.as_mut() {
                        paragraph.text.push_str(&chunk);
                        if let Some(open) = link.as_mut() {
                            open.text.push_str(&chunk);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn hyperlink_target(
    e: &quick_xml::events::BytesStart<'_>,
    relationships: &HashMap<String, String>,
) -> DataResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"id" {
            let id = attr
                .unescape_value()
                .map_err(|e| DataError::Validation(format!("malformed hyperlink attr: {e}")))?;
            return Ok(relationships.get(id.as_ref()).cloned());
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_docx(document_xml: &str, rels_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer
            .start_file("word/document.xml", options)
            .expect("start document part");
        writer
            .write_all(document_xml.as_bytes())
            .expect("write document part");
        writer
            .start_file("word/_rels/document.xml.rels", options)
            .expect("start rels part");
        writer
            .write_all(rels_xml.as_bytes())
            .expect("write rels part");
        writer.finish().expect("finish archive").into_inner()
    }

    const RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="hyperlink" Target="https://example.com/x" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_splice_inserts_after_first_occurrence() {
        let paragraph = DocParagraph {
            text: "Check X for updates".to_string(),
            links: vec![DocHyperlink {
                text: "X".to_string(),
                url: "https://example.com/x".to_string(),
            }],
        };
        assert_eq!(
            splice_hyperlinks(&paragraph),
            "Check X(https://example.com/x) for updates"
        );
    }

    #[test]
    fn test_splice_appends_when_display_text_missing() {
        let paragraph = DocParagraph {
            text: "See the docs".to_string(),
            links: vec![DocHyperlink {
                text: "whitepaper".to_string(),
                url: "https://example.com/wp".to_string(),
            }],
        };
        assert_eq!(
            splice_hyperlinks(&paragraph),
            "See the docswhitepaper(https://example.com/wp)"
        );
    }

    #[test]
    fn test_hyperlink_never_leaks_into_adjacent_paragraph() {
        let document = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p>
      <w:r><w:t>Check </w:t></w:r>
      <w:hyperlink r:id="rId1"><w:r><w:t>X</w:t></w:r></w:hyperlink>
      <w:r><w:t> for updates</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>X marks the spot</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

        let bytes = build_docx(document, RELS);
        let flattened = flatten_document(&bytes).expect("flatten should succeed");
        let lines: Vec<&str> = flattened.lines().collect();
        assert_eq!(lines[0], "Check X(https://example.com/x) for updates");
        // The second paragraph also contains the literal "X" but holds no
        // hyperlink, so it must stay untouched.
        assert_eq!(lines[1], "X marks the spot");
    }

    #[test]
    fn test_unresolvable_relationship_is_skipped() {
        let document = r#"<?xml version="1.0"?>
<w:document xmlns:w="w" xmlns:r="r">
  <w:body>
    <w:p>
      <w:hyperlink r:id="rId99"><w:r><w:t>ghost</w:t></w:r></w:hyperlink>
    </w:p>
  </w:body>
</w:document>"#;

        let bytes = build_docx(document, RELS);
        let flattened = flatten_document(&bytes).expect("flatten should succeed");
        // Text survives, but no (url) is appended for the dangling id.
        assert_eq!(flattened, "ghost");
    }

    #[test]
    fn test_rejects_non_docx_payload() {
        let result = flatten_document(b"just some bytes");
        assert!(matches!(result, Err(DataError::Validation(_))));
    }
}
