//! Office Open XML package helpers
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::LoadError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use zip::ZipArchive;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Signature of OLE compound documents: legacy `.xls` files and
/// password-protected workbooks
const COMPOUND_DOCUMENT_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Opens the ZIP package of a workbook, rejecting compound documents.
pub(super) fn open<R: Read + Seek>(name: &str, mut reader: R) -> Result<ZipArchive<R>, LoadError> {
    if is_compound_document(&mut reader)? {
        Err(LoadError::CompoundDocument(name.to_owned()))?;
    }
    Ok(ZipArchive::new(reader)?)
}

/// Loads the worksheet relationships of a workbook part.
///
/// Returns a mapping of relationship IDs to worksheet paths.
pub(super) fn load_relationships<R: Read + Seek>(zip: &mut ZipArchive<R>, path: &str) -> Result<HashMap<String, String>, LoadError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| LoadError::MissingEntry(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Maps cell style indexes to cell types using custom and built-in formats.
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the package.
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Checks the signature of the input and rewinds it.
fn is_compound_document<R: Read + Seek>(reader: &mut R) -> Result<bool, LoadError> {
    let mut magic = [0u8; 8];
    let is_compound = match reader.read_exact(&mut magic) {
        Ok(()) => magic == COMPOUND_DOCUMENT_MAGIC,
        Err(_) => false,
    };
    reader.seek(SeekFrom::Start(0))?;
    Ok(is_compound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn normalizes_relationship_targets() {
        assert_eq!(to_zip_path(Cow::Borrowed("worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::Borrowed("/xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::Borrowed("xl/worksheets/sheet2.xml")), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn rejects_compound_documents() {
        let mut bytes = COMPOUND_DOCUMENT_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 504]);
        assert!(matches!(
            open("legacy.xls", Cursor::new(bytes)),
            Err(LoadError::CompoundDocument(name)) if name == "legacy.xls"
        ));
        assert!(matches!(open("garbage.xlsx", Cursor::new(b"not a zip".to_vec())), Err(LoadError::Zip(_))));
    }

    #[test]
    fn keeps_only_worksheet_relationships() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/_rels/workbook.xml.rels", SimpleFileOptions::default()).unwrap();
        writer
            .write_all(
                br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
            )
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let mut zip = open("report.xlsx", Cursor::new(bytes)).unwrap();
        let relationships = load_relationships(&mut zip, "xl/_rels/workbook.xml.rels").unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships["rId1"], "xl/worksheets/sheet1.xml");
        assert!(matches!(
            load_relationships(&mut zip, "xl/_rels/missing.rels"),
            Err(LoadError::MissingEntry(_))
        ));
    }

    #[test]
    fn resolves_style_number_formats() {
        let custom = HashMap::from([("164".to_string(), CellType::NumberDate1900)]);
        let formats = load_number_formats(vec!["0".into(), "14".into(), "164".into(), "22".into()], custom, false);
        assert_eq!(
            formats,
            vec![
                CellType::Number,
                CellType::NumberDate1900,
                CellType::NumberDate1900,
                CellType::NumberDateTime1900
            ]
        );
    }
}
