//! Local CSV preview parser
//!
//! Implements the pipeline's [`Parser`] seam with the `csv` crate so header
//! extraction can run client-side while the server does its own extraction.
//! XLSX decoding is server-only; previewing one here returns an error, which
//! the pipeline treats as "fall back and wait for the server".

use csv::ReaderBuilder;
use rowbox_common::types::FileFormat;
use rowbox_pipeline::headers::{Parser, Preview};

/// CSV-backed parser for local header previews.
#[derive(Debug, Default)]
pub struct CsvParser;

impl Parser for CsvParser {
    fn preview(
        &self,
        bytes: &[u8],
        format: FileFormat,
        max_rows: usize,
    ) -> anyhow::Result<Preview> {
        if format != FileFormat::Csv {
            anyhow::bail!("local previews only support CSV; {} is decoded server-side", format);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let header: Vec<String> = reader
            .headers()?
            .iter()
            .map(|field| field.trim().to_string())
            .collect();

        // An all-blank header row carries no names; report an empty preview
        // so the caller's raw-split fallback can synthesize the width.
        if header.iter().all(String::is_empty) {
            return Ok(Preview::default());
        }

        let mut first_row = None;
        if max_rows > 0 {
            if let Some(record) = reader.records().next() {
                let record = record?;
                first_row = Some(
                    header
                        .iter()
                        .cloned()
                        .zip(record.iter().map(|field| field.to_string()))
                        .collect(),
                );
            }
        }

        Ok(Preview {
            header: Some(header),
            first_row,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_preview_header_and_first_row() {
        let preview = CsvParser
            .preview(b"name,email,amount\nada,a@x.io,3\n", FileFormat::Csv, 1)
            .unwrap();

        assert_eq!(
            preview.header,
            Some(vec!["name".to_string(), "email".to_string(), "amount".to_string()])
        );
        let row = preview.first_row.unwrap();
        assert_eq!(row[0], ("name".to_string(), "ada".to_string()));
        assert_eq!(row[2], ("amount".to_string(), "3".to_string()));
    }

    #[test]
    fn test_csv_preview_trims_header_whitespace() {
        let preview = CsvParser
            .preview(b" name , email \n", FileFormat::Csv, 0)
            .unwrap();
        assert_eq!(
            preview.header,
            Some(vec!["name".to_string(), "email".to_string()])
        );
        assert!(preview.first_row.is_none());
    }

    #[test]
    fn test_quoted_fields_parse_correctly() {
        let preview = CsvParser
            .preview(b"\"full, name\",email\nada,a@x.io\n", FileFormat::Csv, 1)
            .unwrap();
        assert_eq!(
            preview.header,
            Some(vec!["full, name".to_string(), "email".to_string()])
        );
    }

    #[test]
    fn test_blank_header_row_is_dropped() {
        let preview = CsvParser.preview(b",,\na,b,c\n", FileFormat::Csv, 0).unwrap();
        assert!(preview.header.is_none());
    }

    #[test]
    fn test_xlsx_preview_is_rejected() {
        let result = CsvParser.preview(b"PK\x03\x04", FileFormat::Xlsx, 1);
        assert!(result.is_err());
    }
}
