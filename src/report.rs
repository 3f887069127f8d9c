//! Flattening of XML result payloads into CSV tables
//!
//! A completed job's payload is a list of `entry` elements. The first entry
//! defines the column header (its immediate child element names, minus known
//! placeholder fields); every entry then becomes one row, looking each header
//! field up by name and substituting an empty value when absent.

use std::path::Path;

use crate::error::{ReportError, Result};

/// Flattening rules for a result payload
///
/// Names the fields that are structural padding rather than business data,
/// so the flattener never has to hard-code tag names.
#[derive(Clone, Debug)]
pub struct ReportSchema {
    placeholder_fields: Vec<String>,
}

impl ReportSchema {
    /// A schema excluding the given placeholder field names
    pub fn new<I, S>(placeholder_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            placeholder_fields: placeholder_fields.into_iter().map(Into::into).collect(),
        }
    }

    fn is_placeholder(&self, tag: &str) -> bool {
        self.placeholder_fields.iter().any(|f| f == tag)
    }
}

impl Default for ReportSchema {
    /// The hipmatch payload carries two padding fields with no business data
    fn default() -> Self {
        Self::new(["padding1", "padding2"])
    }
}

/// A flattened result payload
///
/// Invariant: every row has exactly `header.len()` columns; fields absent
/// from an entry render as the empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportTable {
    /// Column names, from the first entry's child elements in document order
    pub header: Vec<String>,
    /// One row per entry, in document order
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Write the table as CSV: header row first, then one row per entry
    ///
    /// The output file is created here and nowhere else, so failed runs
    /// never leave a partial report behind.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Flatten a raw result payload into a table
///
/// # Errors
///
/// - [`ReportError::MalformedPayload`] if the payload is not well-formed XML
/// - [`ReportError::NoEntries`] if no `entry` elements exist; the header is
///   derived from the first entry, so an empty payload has no valid table
pub fn flatten(payload: &str, schema: &ReportSchema) -> Result<ReportTable, ReportError> {
    let doc = roxmltree::Document::parse(payload)
        .map_err(|e| ReportError::MalformedPayload(e.to_string()))?;

    let entries: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("entry"))
        .collect();
    let first = entries.first().ok_or(ReportError::NoEntries)?;

    let header: Vec<String> = first
        .children()
        .filter(|c| c.is_element())
        .map(|c| c.tag_name().name().to_string())
        .filter(|tag| !schema.is_placeholder(tag))
        .collect();

    let rows = entries
        .iter()
        .map(|entry| {
            header
                .iter()
                .map(|field| {
                    entry
                        .children()
                        .find(|c| c.is_element() && c.tag_name().name() == field.as_str())
                        .and_then(|c| c.text())
                        .unwrap_or("")
                        .to_string()
                })
                .collect()
        })
        .collect();

    Ok(ReportTable { header, rows })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn header_from_first_entry_excludes_placeholders() {
        let payload = r#"<response><result><log><logs>
            <entry><a>1</a><b>2</b><padding1>x</padding1></entry>
            <entry><a>3</a><b>4</b></entry>
        </logs></log></result></response>"#;

        let table = flatten(payload, &ReportSchema::default()).unwrap();
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn missing_fields_render_as_empty_strings() {
        let payload = r#"<result>
            <entry><user>alice</user><ip>10.0.0.2</ip><os>linux</os></entry>
            <entry><user>bob</user><os>macos</os></entry>
            <entry><ip>10.0.0.4</ip></entry>
        </result>"#;

        let table = flatten(payload, &ReportSchema::default()).unwrap();
        assert_eq!(table.header, vec!["user", "ip", "os"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["alice", "10.0.0.2", "linux"],
                vec!["bob", "", "macos"],
                vec!["", "10.0.0.4", ""],
            ]
        );
    }

    #[test]
    fn every_row_matches_header_width() {
        let payload = r#"<result>
            <entry><a>1</a></entry>
            <entry><a>2</a><extra>ignored by header</extra></entry>
        </result>"#;

        let table = flatten(payload, &ReportSchema::default()).unwrap();
        for row in &table.rows {
            assert_eq!(row.len(), table.header.len());
        }
    }

    #[test]
    fn zero_entries_is_a_distinct_error() {
        let payload = r#"<response status="success"><result><log><logs/></log></result></response>"#;
        assert!(matches!(
            flatten(payload, &ReportSchema::default()),
            Err(ReportError::NoEntries)
        ));
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        assert!(matches!(
            flatten("<result><entry>", &ReportSchema::default()),
            Err(ReportError::MalformedPayload(_))
        ));
    }

    #[test]
    fn entries_appear_in_document_order() {
        let payload = r#"<result>
            <entry><n>first</n></entry>
            <entry><n>second</n></entry>
            <entry><n>third</n></entry>
        </result>"#;

        let table = flatten(payload, &ReportSchema::default()).unwrap();
        let names: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn custom_schema_excludes_its_own_placeholders() {
        let payload = r#"<result>
            <entry><keep>1</keep><filler>x</filler></entry>
        </result>"#;

        let table = flatten(payload, &ReportSchema::new(["filler"])).unwrap();
        assert_eq!(table.header, vec!["keep"]);
    }

    #[test]
    fn csv_round_trips_through_the_output_format() {
        let payload = r#"<result>
            <entry><user>alice</user><ip>10.0.0.2</ip><padding1>x</padding1></entry>
            <entry><user>bob</user></entry>
        </result>"#;
        let table = flatten(payload, &ReportSchema::default()).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        table.write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(header, table.header);

        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(rows, table.rows);
    }

    #[test]
    fn csv_quotes_fields_containing_the_delimiter() {
        let payload = r#"<result>
            <entry><desc>a, b and c</desc></entry>
        </result>"#;
        let table = flatten(payload, &ReportSchema::default()).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        table.write_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "desc\n\"a, b and c\"\n");
    }
}
