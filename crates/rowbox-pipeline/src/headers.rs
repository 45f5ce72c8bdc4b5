//! Header extraction
//!
//! Derives the ordered column-name list for an uploaded file by asking the
//! [`Parser`] collaborator for a bounded preview. The byte-level CSV/XLSX
//! decoding itself lives behind the trait; this module only decides which
//! part of the preview is authoritative and what to do when parsing fails.
//!
//! No error escapes this module: every failure degrades to a naive raw-byte
//! split, and if that also fails the result is an empty list, for which the
//! coordinator substitutes synthetic columns.

use rowbox_common::types::FileFormat;
use tracing::{debug, warn};

/// How many bytes of the raw file the degraded fallback inspects.
const FALLBACK_PREFIX_BYTES: usize = 4096;

/// A bounded preview of a tabular file.
#[derive(Debug, Clone, Default)]
pub struct Preview {
    /// Declared header row, if the format has one (authoritative for CSV).
    pub header: Option<Vec<String>>,
    /// First data row as ordered (column name, value) pairs. For XLSX the
    /// keys of this row are treated as the column names.
    pub first_row: Option<Vec<(String, String)>>,
}

/// Parsing collaborator. Implementations decode file bytes into a bounded
/// preview; the pipeline never touches the byte-level format itself.
pub trait Parser: Send + Sync {
    /// Produce a preview with at most `max_rows` data rows.
    fn preview(&self, bytes: &[u8], format: FileFormat, max_rows: usize)
        -> anyhow::Result<Preview>;
}

/// Extract the ordered column-name list for a file.
///
/// CSV: the parser's declared header row is authoritative. XLSX: the keys of
/// the first data row. On parser failure, degrades to [`fallback_split`];
/// worst case the result is empty.
pub fn extract_headers(parser: &dyn Parser, bytes: &[u8], format: FileFormat) -> Vec<String> {
    match parser.preview(bytes, format, 1) {
        Ok(preview) => {
            if format == FileFormat::Csv {
                if let Some(header) = preview.header.filter(|h| !h.is_empty()) {
                    return header;
                }
            }
            if let Some(row) = preview.first_row.filter(|r| !r.is_empty()) {
                return row.into_iter().map(|(name, _)| name).collect();
            }
            debug!(%format, "Parser preview had no header or rows; falling back to raw split");
            fallback_split(bytes)
        }
        Err(error) => {
            warn!(%format, error = %error, "Parser preview failed; falling back to raw split");
            fallback_split(bytes)
        }
    }
}

/// Degraded best-effort extraction: split the first line of a fixed-size
/// byte prefix on commas and strip quote characters.
///
/// Inaccurate for quoted or escaped CSV by design; this path only runs when
/// the real parser has already failed.
pub fn fallback_split(bytes: &[u8]) -> Vec<String> {
    let prefix = &bytes[..bytes.len().min(FALLBACK_PREFIX_BYTES)];
    let text = String::from_utf8_lossy(prefix);

    let Some(first_line) = text.lines().next() else {
        return Vec::new();
    };

    let fields: Vec<String> = first_line
        .split(',')
        .map(|field| field.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .collect();

    // All-empty names carry no information; synthesize names of the observed
    // width instead so downstream mapping still has columns to work with.
    if fields.iter().all(String::is_empty) {
        if fields.len() > 1 {
            return synthetic_columns(fields.len());
        }
        return Vec::new();
    }

    fields
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("Column {}", i + 1)
            } else {
                name
            }
        })
        .collect()
}

/// Placeholder column names `Column 1..Column N` for files whose headers
/// could not be extracted at all.
pub fn synthetic_columns(count: usize) -> Vec<String> {
    (1..=count.max(1)).map(|i| format!("Column {}", i)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct FakeParser {
        result: anyhow::Result<Preview>,
    }

    impl FakeParser {
        fn ok(preview: Preview) -> Self {
            Self { result: Ok(preview) }
        }

        fn failing() -> Self {
            Self {
                result: Err(anyhow::anyhow!("corrupt stream")),
            }
        }
    }

    impl Parser for FakeParser {
        fn preview(
            &self,
            _bytes: &[u8],
            _format: FileFormat,
            _max_rows: usize,
        ) -> anyhow::Result<Preview> {
            match &self.result {
                Ok(p) => Ok(p.clone()),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    #[test]
    fn test_csv_header_row_is_authoritative() {
        let parser = FakeParser::ok(Preview {
            header: Some(vec!["name".into(), "email".into()]),
            first_row: Some(vec![("wrong".into(), "x".into())]),
        });
        let columns = extract_headers(&parser, b"ignored", FileFormat::Csv);
        assert_eq!(columns, vec!["name", "email"]);
    }

    #[test]
    fn test_xlsx_uses_first_row_keys() {
        let parser = FakeParser::ok(Preview {
            header: None,
            first_row: Some(vec![
                ("region".into(), "EMEA".into()),
                ("amount".into(), "10".into()),
            ]),
        });
        let columns = extract_headers(&parser, b"ignored", FileFormat::Xlsx);
        assert_eq!(columns, vec!["region", "amount"]);
    }

    #[test]
    fn test_parser_failure_falls_back_to_raw_split() {
        let parser = FakeParser::failing();
        let columns = extract_headers(&parser, b"name,email,amount\n1,2,3\n", FileFormat::Csv);
        assert_eq!(columns, vec!["name", "email", "amount"]);
    }

    #[test]
    fn test_fallback_strips_quotes_and_whitespace() {
        let columns = fallback_split(b"\"name\", 'email' ,amount\r\nrow");
        assert_eq!(columns, vec!["name", "email", "amount"]);
    }

    #[test]
    fn test_fallback_on_empty_input_is_empty() {
        assert!(fallback_split(b"").is_empty());
        let parser = FakeParser::failing();
        assert!(extract_headers(&parser, b"", FileFormat::Csv).is_empty());
    }

    #[test]
    fn test_fallback_synthesizes_names_for_blank_header() {
        // Three comma-separated empty fields: width is known, names are not.
        let columns = fallback_split(b",,\ndata,data,data\n");
        assert_eq!(columns, vec!["Column 1", "Column 2", "Column 3"]);
    }

    #[test]
    fn test_fallback_fills_individual_blank_names() {
        let columns = fallback_split(b"name,,amount\n");
        assert_eq!(columns, vec!["name", "Column 2", "amount"]);
    }

    #[test]
    fn test_synthetic_columns() {
        assert_eq!(synthetic_columns(3), vec!["Column 1", "Column 2", "Column 3"]);
        assert_eq!(synthetic_columns(0), vec!["Column 1"]);
    }
}
