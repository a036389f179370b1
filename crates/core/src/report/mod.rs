pub mod layout;
pub mod pdf;
pub mod table;

use crate::domain::bars::TimeSeries;
use anyhow::Context;
use chrono::{Duration, NaiveDateTime, Timelike};
use std::io::Write;
use std::path::{Path, PathBuf};
use table::TickerTable;

pub const REPORT_TITLE: &str = "Stock Market Report";
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DISPLAY_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes `Stock_Report_<YYYYMMDD_HHMMSS>.pdf` files into one reports directory.
///
/// Stamps handed out by one renderer are strictly increasing, and an existing file is never
/// overwritten.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    dir: PathBuf,
    last_stamp: Option<NaiveDateTime>,
}

impl ReportRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_stamp: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn render(&mut self, series: &[TimeSeries]) -> anyhow::Result<PathBuf> {
        self.render_at(series, chrono::Local::now().naive_local())
    }

    pub fn render_at(
        &mut self,
        series: &[TimeSeries],
        now: NaiveDateTime,
    ) -> anyhow::Result<PathBuf> {
        let stamp = self.next_stamp(now);

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create reports dir {}", self.dir.display()))?;

        let tables: Vec<TickerTable> = series.iter().map(TickerTable::from_series).collect();
        let generated = format!("Generated on: {}", stamp.format(DISPLAY_STAMP_FORMAT));
        let pages = layout::layout(REPORT_TITLE, &generated, &tables);
        let bytes = pdf::to_pdf_bytes(REPORT_TITLE, &pages)?;

        let path = self.dir.join(report_file_name(stamp));
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("failed to create report file {}", path.display()))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .with_context(|| format!("failed to write report file {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            tickers = tables.len(),
            pages = pages.len(),
            bytes = bytes.len(),
            "PDF report saved"
        );
        Ok(path)
    }

    fn next_stamp(&mut self, now: NaiveDateTime) -> NaiveDateTime {
        let now = now.with_nanosecond(0).unwrap_or(now);
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::seconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

pub fn report_file_name(stamp: NaiveDateTime) -> String {
    format!("Stock_Report_{}.pdf", stamp.format(FILE_STAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bars::PriceBar;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn series(ticker: &str) -> TimeSeries {
        TimeSeries::new(
            ticker,
            vec![PriceBar {
                date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
                open: 10.0,
                close: 11.0,
                high: 12.0,
                low: 9.0,
                volume: 1000,
            }],
        )
    }

    #[test]
    fn file_name_encodes_the_timestamp() {
        assert_eq!(report_file_name(at(9, 5, 7)), "Stock_Report_20260310_090507.pdf");
    }

    #[test]
    fn writes_one_pdf_under_a_created_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("reports");
        let mut renderer = ReportRenderer::new(&dir);

        let path = renderer.render_at(&[series("AAPL")], at(9, 0, 0)).unwrap();
        assert_eq!(path, dir.join("Stock_Report_20260310_090000.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[test]
    fn empty_input_still_renders_a_title_only_document() {
        let tmp = tempfile::tempdir().unwrap();
        let mut renderer = ReportRenderer::new(tmp.path());
        let path = renderer.render_at(&[], at(9, 0, 0)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn consecutive_stamps_never_go_backwards_or_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let mut renderer = ReportRenderer::new(tmp.path());

        let a = renderer.render_at(&[series("AAPL")], at(9, 0, 0)).unwrap();
        let b = renderer.render_at(&[series("AAPL")], at(9, 0, 0)).unwrap();
        let c = renderer.render_at(&[series("AAPL")], at(8, 59, 0)).unwrap();

        let names: Vec<String> = [&a, &b, &c]
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Stock_Report_20260310_090000.pdf",
                "Stock_Report_20260310_090001.pdf",
                "Stock_Report_20260310_090002.pdf",
            ]
        );
    }

    #[test]
    fn never_overwrites_an_existing_report() {
        let tmp = tempfile::tempdir().unwrap();
        let existing = tmp.path().join(report_file_name(at(9, 0, 0)));
        std::fs::write(&existing, b"keep me").unwrap();

        let mut renderer = ReportRenderer::new(tmp.path());
        assert!(renderer.render_at(&[series("AAPL")], at(9, 0, 0)).is_err());
        assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");
    }

    #[test]
    fn unwritable_dir_is_a_render_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("reports");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let mut renderer = ReportRenderer::new(&blocker);
        assert!(renderer.render_at(&[series("AAPL")], at(9, 0, 0)).is_err());
    }
}
