use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};

use crate::errors::AuditError;
use crate::model::{row_of, AuditDocument, AuditRecord};

pub const CSV_HEADER: &str = "Row,URL,Status,Timestamp";

/// Write the document as `Row,URL,Status,Timestamp`, rows in numeric order.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(document: &AuditDocument, mut out: W) -> Result<usize, AuditError> {
    if document.entries.is_empty() {
        return Err(AuditError::Empty);
    }

    let mut rows: Vec<(&str, &AuditRecord)> = document
        .entries
        .iter()
        .map(|(key, record)| (row_of(key), record))
        .collect();
    rows.sort_by(|(a, _), (b, _)| {
        let parsed = |row: &str| row.parse::<u64>().unwrap_or(u64::MAX);
        parsed(a).cmp(&parsed(b)).then_with(|| a.cmp(b))
    });

    writeln!(out, "{CSV_HEADER}")?;
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(out);
    for (row, record) in &rows {
        writer.write_record([
            *row,
            record.url.as_str(),
            record.status.as_str(),
            record.iso_timestamp().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str, url: &str) -> AuditRecord {
        AuditRecord {
            status: status.into(),
            timestamp: 0,
            url: url.into(),
        }
    }

    #[test]
    fn rows_sort_numerically() {
        let mut document = AuditDocument::default();
        document
            .entries
            .insert("s:12".into(), record("Sent", "https://x/in/b"));
        document
            .entries
            .insert("s:5".into(), record("Pending", "https://x/in/a"));

        let mut out = Vec::new();
        assert_eq!(write_csv(&document, &mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("5,\"https://x/in/a\",\"Pending\""));
        assert!(lines[2].starts_with("12,"));
    }

    #[test]
    fn empty_log_is_reported() {
        let mut out = Vec::new();
        assert!(matches!(
            write_csv(&AuditDocument::default(), &mut out),
            Err(AuditError::Empty)
        ));
    }
}
