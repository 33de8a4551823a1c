use std::io::{Cursor, Read, Write};

use async_trait::async_trait;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, TsuyakuError};
use crate::translate::TranslationOutcome;
use super::xml::{XmlDocument, XmlElement, XmlNode};
use super::{check_alignment, Extraction, FormatAdapter, Segment};

/// Container entry holding the main document body
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Where a segment's text lives in the body tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSlot {
    Paragraph(Vec<usize>),
    Cell(Vec<usize>),
}

#[derive(Debug)]
struct ContainerEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

#[derive(Debug)]
pub struct DocumentShell {
    entries: Vec<ContainerEntry>,
    body: XmlDocument,
    slots: Vec<TextSlot>,
}

impl DocumentShell {
    pub fn slots(&self) -> &[TextSlot] {
        &self.slots
    }
}

/// Word-processor documents (.docx): paragraphs first, then table cells
pub struct DocumentAdapter;

#[async_trait]
impl FormatAdapter for DocumentAdapter {
    type Shell = DocumentShell;

    async fn extract(&self, input: &[u8]) -> Result<Extraction<DocumentShell>> {
        let entries = read_container(input)?;
        let part = entries
            .iter()
            .find(|entry| entry.name == DOCUMENT_PART)
            .ok_or_else(|| TsuyakuError::Document(format!("Missing {} in container", DOCUMENT_PART)))?;
        let body = XmlDocument::parse(&part.data)?;

        let mut slots = Vec::new();
        let mut segments = Vec::new();
        for (slot, text) in locate_text(&body)? {
            if text.trim().is_empty() {
                continue;
            }
            segments.push(Segment::new(slots.len(), text));
            slots.push(slot);
        }

        debug!("Document: {} translatable paragraphs and cells", segments.len());

        Ok(Extraction {
            shell: DocumentShell { entries, body, slots },
            segments,
        })
    }

    async fn reconstruct(
        &self,
        shell: DocumentShell,
        segments: &[Segment],
        outcomes: Vec<TranslationOutcome>,
    ) -> Result<Vec<u8>> {
        check_alignment(segments, &outcomes)?;

        let DocumentShell { mut entries, mut body, slots } = shell;
        for (segment, outcome) in segments.iter().zip(outcomes) {
            let slot = slots.get(segment.slot).ok_or_else(|| {
                TsuyakuError::Document(format!("Unknown text slot {}", segment.slot))
            })?;
            let (path, is_cell) = match slot {
                TextSlot::Paragraph(path) => (path, false),
                TextSlot::Cell(path) => (path, true),
            };
            let element = body.element_at_mut(path).ok_or_else(|| {
                TsuyakuError::Document(format!("Text slot {} no longer in document", segment.slot))
            })?;
            if is_cell {
                replace_cell_text(element, outcome.text());
            } else {
                replace_paragraph_text(element, outcome.text());
            }
        }

        let rewritten = body.to_bytes()?;
        for entry in entries.iter_mut().filter(|entry| entry.name == DOCUMENT_PART) {
            entry.data = rewritten.clone();
        }

        write_container(&entries)
    }
}

fn read_container(input: &[u8]) -> Result<Vec<ContainerEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(input))?;
    let mut entries = Vec::with_capacity(archive.len());

    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        entries.push(ContainerEntry {
            name: file.name().to_string(),
            data,
            compression: file.compression(),
            is_dir: file.is_dir(),
        });
    }

    Ok(entries)
}

fn write_container(entries: &[ContainerEntry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in entries {
        let method = match entry.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let options = SimpleFileOptions::default().compression_method(method);
        if entry.is_dir {
            writer.add_directory(entry.name.as_str(), options)?;
        } else {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.data)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// All paragraphs of the body in order, then every table cell in row-major order
fn locate_text(body: &XmlDocument) -> Result<Vec<(TextSlot, String)>> {
    let (root_idx, root) = body
        .root()
        .ok_or_else(|| TsuyakuError::Document("Document part has no root element".to_string()))?;
    let (body_idx, body_element) = root
        .child_elements()
        .find(|(_, element)| element.is("w:body"))
        .ok_or_else(|| TsuyakuError::Document("Document part has no w:body".to_string()))?;
    let body_path = vec![root_idx, body_idx];

    let mut located = Vec::new();
    let mut tables = Vec::new();

    for (idx, element) in body_element.child_elements() {
        if element.is("w:p") {
            located.push((TextSlot::Paragraph(child_path(&body_path, idx)), paragraph_text(element)?));
        } else if element.is("w:tbl") {
            tables.push((idx, element));
        }
    }

    for (table_idx, table) in tables {
        let table_path = child_path(&body_path, table_idx);
        for (row_idx, row) in table.child_elements().filter(|(_, e)| e.is("w:tr")) {
            let row_path = child_path(&table_path, row_idx);
            for (cell_idx, cell) in row.child_elements().filter(|(_, e)| e.is("w:tc")) {
                located.push((TextSlot::Cell(child_path(&row_path, cell_idx)), cell_text(cell)?));
            }
        }
    }

    Ok(located)
}

fn child_path(parent: &[usize], idx: usize) -> Vec<usize> {
    let mut path = parent.to_vec();
    path.push(idx);
    path
}

/// Runs of a paragraph, including those nested in hyperlinks
fn runs(paragraph: &XmlElement) -> Vec<&XmlElement> {
    let mut runs = Vec::new();
    for (_, child) in paragraph.child_elements() {
        if child.is("w:r") {
            runs.push(child);
        } else if child.is("w:hyperlink") {
            runs.extend(child.child_elements().map(|(_, e)| e).filter(|e| e.is("w:r")));
        }
    }
    runs
}

pub fn paragraph_text(paragraph: &XmlElement) -> Result<String> {
    let mut text = String::new();
    for run in runs(paragraph) {
        for (_, item) in run.child_elements() {
            match item.name() {
                b"w:t" => text.push_str(&item.text()?),
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:noBreakHyphen" => text.push('-'),
                _ => {}
            }
        }
    }
    Ok(text)
}

pub fn cell_text(cell: &XmlElement) -> Result<String> {
    let texts = cell
        .child_elements()
        .filter(|(_, e)| e.is("w:p"))
        .map(|(_, p)| paragraph_text(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(texts.join("\n"))
}

/// A single run carrying `text`; newlines become breaks and tabs become tab marks
fn build_run(properties: Option<XmlElement>, text: &str) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if let Some(properties) = properties {
        run.push_element(properties);
    }

    for (line_idx, line) in text.split('\n').enumerate() {
        if line_idx > 0 {
            run.push_element(XmlElement::new("w:br"));
        }
        for (piece_idx, piece) in line.split('\t').enumerate() {
            if piece_idx > 0 {
                run.push_element(XmlElement::new("w:tab"));
            }
            if !piece.is_empty() {
                let mut t = XmlElement::new("w:t").with_attribute("xml:space", "preserve");
                t.push_text(piece);
                run.push_element(t);
            }
        }
    }
    run
}

fn first_run_properties(paragraph: &XmlElement) -> Option<XmlElement> {
    runs(paragraph)
        .into_iter()
        .find_map(|run| run.first_child("w:rPr"))
        .cloned()
}

/// Overwrite a paragraph's text. Paragraph properties stay, runs collapse into one.
pub fn replace_paragraph_text(paragraph: &mut XmlElement, text: &str) {
    let paragraph_properties = paragraph.first_child("w:pPr").cloned();
    let run_properties = first_run_properties(paragraph);

    paragraph.clear_children();
    if let Some(properties) = paragraph_properties {
        paragraph.push_element(properties);
    }
    paragraph.push_element(build_run(run_properties, text));
}

/// Overwrite a cell's content with a single paragraph holding `text`
pub fn replace_cell_text(cell: &mut XmlElement, text: &str) {
    let cell_properties = cell.first_child("w:tcPr").cloned();
    let first_paragraph = cell.first_child("w:p").cloned();

    let mut paragraph = XmlElement::new("w:p");
    let run_properties = first_paragraph.as_ref().and_then(first_run_properties);
    if let Some(properties) = first_paragraph.as_ref().and_then(|p| p.first_child("w:pPr")) {
        paragraph.push_element(properties.clone());
    }
    paragraph.push_element(build_run(run_properties, text));

    cell.clear_children();
    if let Some(properties) = cell_properties {
        cell.push_element(properties);
    }
    cell.children.push(XmlNode::Element(paragraph));
    cell.self_closing = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Quarterly </w:t></w:r><w:r><w:t>report</w:t></w:r></w:p>"#,
        r#"<w:p/>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tblPr/><w:tr><w:tc><w:tcPr><w:tcW w:w="100"/></w:tcPr><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p/></w:tc></w:tr>"#,
        r#"<w:tr><w:tc><w:p><w:r><w:t>Line one</w:t></w:r></w:p><w:p><w:r><w:t>Line two</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:hyperlink><w:r><w:t>Link</w:t></w:r></w:hyperlink><w:r><w:tab/><w:t>after</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:p><w:r><w:t>Closing</w:t></w:r></w:p>"#,
        r#"<w:sectPr/></w:body></w:document>"#,
    );

    fn docx(body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file(DOCUMENT_PART, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    async fn translate_with(input: &[u8], f: impl Fn(usize, &str) -> TranslationOutcome) -> Vec<u8> {
        let adapter = DocumentAdapter;
        let extraction = adapter.extract(input).await.unwrap();
        let outcomes = extraction.segments.iter().map(|s| f(s.slot, &s.text)).collect();
        adapter
            .reconstruct(extraction.shell, &extraction.segments, outcomes)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_extract_order_paragraphs_then_cells() {
        let extraction = DocumentAdapter.extract(&docx(BODY)).await.unwrap();
        let texts: Vec<&str> = extraction.segments.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(
            texts,
            vec!["Quarterly report", "Closing", "Name", "Line one\nLine two", "Link\tafter"]
        );
        assert!(matches!(extraction.shell.slots()[0], TextSlot::Paragraph(_)));
        assert!(matches!(extraction.shell.slots()[2], TextSlot::Cell(_)));
    }

    #[tokio::test]
    async fn test_pass_through_keeps_visible_text_and_counts() {
        let input = docx(BODY);
        let output = translate_with(&input, |_, text| TranslationOutcome::Translated(text.to_string())).await;

        let before = XmlDocument::parse(read_part(&input, DOCUMENT_PART).as_bytes()).unwrap();
        let after = XmlDocument::parse(read_part(&output, DOCUMENT_PART).as_bytes()).unwrap();
        let before_text: Vec<String> = locate_text(&before).unwrap().into_iter().map(|(_, t)| t).collect();
        let after_text: Vec<String> = locate_text(&after).unwrap().into_iter().map(|(_, t)| t).collect();

        assert_eq!(before_text, after_text);
        assert_eq!(read_part(&output, "[Content_Types].xml"), "<Types/>");
    }

    #[tokio::test]
    async fn test_failed_segment_keeps_original_and_siblings_translate() {
        let output = translate_with(&docx(BODY), |slot, text| {
            if slot == 1 {
                TranslationOutcome::Fallback {
                    original: text.to_string(),
                    reason: "timeout".to_string(),
                }
            } else {
                TranslationOutcome::Translated(text.to_uppercase())
            }
        })
        .await;

        let extraction = DocumentAdapter.extract(&output).await.unwrap();
        let texts: Vec<&str> = extraction.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["QUARTERLY REPORT", "Closing", "NAME", "LINE ONE\nLINE TWO", "LINK\tAFTER"]
        );
    }

    #[tokio::test]
    async fn test_properties_survive_replacement() {
        let output = translate_with(&docx(BODY), |_, _| TranslationOutcome::Translated("X & Y".to_string())).await;
        let xml = read_part(&output, DOCUMENT_PART);

        assert!(xml.contains(r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">X &amp; Y</w:t></w:r></w:p>"#));
        assert!(xml.contains(r#"<w:tc><w:tcPr><w:tcW w:w="100"/></w:tcPr><w:p><w:r><w:t xml:space="preserve">X &amp; Y</w:t></w:r></w:p></w:tc>"#));
        assert!(xml.contains("<w:tc><w:p/></w:tc>"));
        assert!(xml.contains("<w:sectPr/>"));
    }

    #[test]
    fn test_build_run_maps_breaks_and_tabs() {
        let mut paragraph = XmlElement::new("w:p");
        replace_paragraph_text(&mut paragraph, "a\tb\nc");
        assert_eq!(paragraph_text(&paragraph).unwrap(), "a\tb\nc");
    }

    #[tokio::test]
    async fn test_invalid_containers_are_document_errors() {
        assert!(DocumentAdapter.extract(b"not a zip").await.is_err());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<a/>").unwrap();
        let no_body = writer.finish().unwrap().into_inner();
        let err = DocumentAdapter.extract(&no_body).await.unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_PART));

        let err = DocumentAdapter.extract(&docx("<w:document><w:body>")).await.unwrap_err();
        assert!(matches!(err, TsuyakuError::Document(_)));
    }
}
