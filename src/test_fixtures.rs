//! In-memory `.xlsx` packages for tests.
//!
//! Cells are written from short codes:
//! `@45292` is a number with the date style, `^45292.5` one with a custom
//! date-time style, `#0` a shared string index,
//! `!#N/A` an error value, numeric text a plain number, an empty string no
//! cell at all and anything else an inline string.
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::spreadsheet::reference::index_to_reference;

#[derive(Default)]
pub(crate) struct WorkbookBuilder {
    sheets: Vec<(String, String)>,
    shared_strings: Option<String>,
    date1904: bool,
}

impl WorkbookBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `<si>` items; each entry is the raw inner XML of one item.
    pub(crate) fn shared_strings(mut self, items: &[&str]) -> Self {
        let body: String = items.iter().map(|item| format!("<si>{item}</si>")).collect();
        self.shared_strings = Some(format!(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
            items.len(),
            body
        ));
        self
    }

    pub(crate) fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    pub(crate) fn sheet(self, name: &str, rows: &[&[&str]]) -> Self {
        let mut data = String::new();
        for (row, cells) in rows.iter().enumerate() {
            data.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, code) in cells.iter().enumerate() {
                data.push_str(&cell_xml(&index_to_reference(row, col), code));
            }
            data.push_str("</row>");
        }
        self.raw_sheet(name, &data)
    }

    /// Adds a sheet whose `<sheetData>` content is given verbatim.
    pub(crate) fn raw_sheet(mut self, name: &str, data: &str) -> Self {
        self.sheets.push((
            name.to_owned(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
            ),
        ));
        self
    }

    /// Writes the package, returning the bytes of the `.xlsx` file.
    pub(crate) fn build(self) -> Vec<u8> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut write = |path: &str, content: &str| {
            writer.start_file(path, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        };

        let mut sheets = String::new();
        let mut relationships = String::new();
        for (index, (name, _)) in self.sheets.iter().enumerate() {
            let id = index + 1;
            sheets.push_str(&format!(r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, escape(name)));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
            ));
        }
        let styles_id = self.sheets.len() + 1;
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
        ));

        write(
            "xl/workbook.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr date1904="{}"/><sheets>{sheets}</sheets></workbook>"#,
                if self.date1904 { "1" } else { "0" }
            ),
        );
        write(
            "xl/_rels/workbook.xml.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
            ),
        );
        write(
            "xl/styles.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts><cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/><xf numFmtId="164" applyNumberFormat="1"/></cellXfs></styleSheet>"#,
        );
        if let Some(shared_strings) = &self.shared_strings {
            write("xl/sharedStrings.xml", shared_strings);
        }
        for (index, (_, content)) in self.sheets.iter().enumerate() {
            write(&format!("xl/worksheets/sheet{}.xml", index + 1), content);
        }
        writer.finish().unwrap().into_inner()
    }
}

fn cell_xml(reference: &str, code: &str) -> String {
    if code.is_empty() {
        String::new()
    } else if let Some(serial) = code.strip_prefix('@') {
        format!(r#"<c r="{reference}" s="1"><v>{serial}</v></c>"#)
    } else if let Some(serial) = code.strip_prefix('^') {
        format!(r#"<c r="{reference}" s="2"><v>{serial}</v></c>"#)
    } else if let Some(index) = code.strip_prefix('#') {
        format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
    } else if let Some(error) = code.strip_prefix('!') {
        format!(r#"<c r="{reference}" t="e"><v>{}</v></c>"#, escape(error))
    } else if code.parse::<f64>().is_ok() {
        format!(r#"<c r="{reference}"><v>{code}</v></c>"#)
    } else {
        format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(code))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
