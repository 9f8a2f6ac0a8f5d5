//! Daily report export
//!
//! Projection of stored sessions into presentation-ready report rows and
//! their rendering and persistence as per-date CSV documents.

pub mod projector;
pub mod sink;

pub use projector::{ExportProjector, ReportRow, CSV_HEADER};
pub use sink::{csv_bytes, CsvReportSink};
