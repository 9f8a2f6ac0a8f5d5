//! CSV rendering and on-disk persistence of daily reports

use super::projector::{ReportRow, CSV_HEADER};
use chrono::NaiveDate;
use punchcard_core::{storage_error, PunchcardResult};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Render report rows into a CSV document with the fixed header
pub fn csv_bytes(rows: &[ReportRow]) -> PunchcardResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| storage_error!("Failed to render CSV header", "export", e))?;

    for row in rows {
        let break_count = row.break_count.to_string();
        writer
            .write_record([
                row.username.as_str(),
                row.full_name.as_str(),
                row.session_start.as_str(),
                row.session_end.as_str(),
                row.status.as_str(),
                row.duration.as_str(),
                break_count.as_str(),
                row.break_details.as_str(),
            ])
            .map_err(|e| storage_error!("Failed to render CSV row", "export", e))?;
    }

    writer
        .into_inner()
        .map_err(|e| storage_error!("Failed to finish CSV document", "export", e.into_error()))
}

/// Writes the per-date report files under the export directory.
///
/// Filenames follow `attendance_YYYY-MM-DD.csv`; writing the same date again
/// replaces the previous document.
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    export_dir: PathBuf,
}

impl CsvReportSink {
    pub fn new<P: Into<PathBuf>>(export_dir: P) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// Target file for the given report date
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.export_dir.join(format!("attendance_{}.csv", date))
    }

    /// Render and persist the report, creating the export directory on first use
    pub fn write(&self, date: NaiveDate, rows: &[ReportRow]) -> PunchcardResult<PathBuf> {
        fs::create_dir_all(&self.export_dir).map_err(|e| {
            storage_error!(
                format!(
                    "Failed to create export directory {}",
                    self.export_dir.display()
                ),
                "export",
                e
            )
        })?;

        let bytes = csv_bytes(rows)?;
        let path = self.path_for(date);
        fs::write(&path, bytes).map_err(|e| {
            storage_error!(format!("Failed to write report {}", path.display()), "export", e)
        })?;

        debug!("Wrote {} report rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use punchcard_core::PunchcardError;
    use tempfile::TempDir;

    fn sample_row() -> ReportRow {
        ReportRow {
            username: "alice".to_string(),
            full_name: "Alice Doe".to_string(),
            session_start: "09 Jan 2026, 08:05 PM".to_string(),
            session_end: "09 Jan 2026, 10:00 PM".to_string(),
            status: "Completed".to_string(),
            duration: "1h 55m".to_string(),
            break_count: 1,
            break_details: "08:10 PM → 08:20 PM".to_string(),
        }
    }

    #[test]
    fn document_starts_with_the_fixed_header() {
        let bytes = csv_bytes(&[sample_row()]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Username,Full Name,Session Start,Session End,Status,Duration,Break Count,Break Details"
        );
        assert!(lines.next().unwrap().starts_with("alice,Alice Doe,"));
    }

    #[test]
    fn multiline_break_details_are_quoted() {
        let mut row = sample_row();
        row.break_count = 2;
        row.break_details = "08:10 PM → 08:20 PM\n09:00 PM → —".to_string();

        let bytes = csv_bytes(&[row]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"08:10 PM → 08:20 PM\n09:00 PM → —\""));

        // the document still parses back into a single record
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][7], "08:10 PM → 08:20 PM\n09:00 PM → —");
    }

    #[test]
    fn write_creates_directory_and_dated_file() {
        let dir = TempDir::new().unwrap();
        let sink = CsvReportSink::new(dir.path().join("nested").join("csv"));
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();

        let path = sink.write(date, &[sample_row()]).unwrap();

        assert!(path.ends_with("attendance_2026-01-09.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn rewriting_a_date_replaces_the_document() {
        let dir = TempDir::new().unwrap();
        let sink = CsvReportSink::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();

        sink.write(date, &[sample_row(), sample_row()]).unwrap();
        let path = sink.write(date, &[sample_row()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        // header plus exactly one row
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn empty_report_is_just_the_header() {
        let bytes = csv_bytes(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.trim_end(),
            "Username,Full Name,Session Start,Session End,Status,Duration,Break Count,Break Details"
        );
    }

    #[test]
    fn unwritable_export_dir_surfaces_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"occupied").unwrap();

        // export dir nested under a regular file cannot be created
        let sink = CsvReportSink::new(blocker.join("csv"));
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        let err = sink.write(date, &[sample_row()]).unwrap_err();

        assert!(matches!(&err, PunchcardError::Storage { .. }));
        assert_eq!(err.context().map(|c| c.component.as_str()), Some("export"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
