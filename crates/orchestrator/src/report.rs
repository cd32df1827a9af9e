//! Report rows and the sinks that persist them.
//!
//! Every configuration produces one customer table; the run produces one
//! summary table. Tables are rendered as CSV.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use journeysim_core::{Error, Result};

use crate::actors::{CustomerId, CustomerOutcome};
use crate::aggregation::AggregationByEndState;
use crate::experiment::ExperimentConfig;

/// File name of the summary table.
pub const SUMMARY_FILE: &str = "summary.csv";

const CUSTOMER_HEADER: &str = "customer_id,workflow,disobedience,end_state,steps,cost";
const SUMMARY_HEADER: &str = "workflow,disobedience,strategy,end_state,count,mean_steps,mean_cost";

/// One finished customer of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerReportRow {
    pub customer_id: CustomerId,
    pub workflow: String,
    pub disobedience: u32,
    pub end_state: String,
    pub steps: u64,
    pub cost: f64,
}

impl CustomerReportRow {
    #[must_use]
    pub fn from_outcome(config: &ExperimentConfig, outcome: &CustomerOutcome) -> Self {
        Self {
            customer_id: outcome.id,
            workflow: config.workflow.clone(),
            disobedience: config.disobedience.into(),
            end_state: outcome.end_state.clone(),
            steps: outcome.steps,
            cost: outcome.cost,
        }
    }
}

/// One end state of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReportRow {
    pub workflow: String,
    pub disobedience: u32,
    pub strategy: String,
    pub end_state: String,
    pub count: u64,
    pub mean_steps: f64,
    pub mean_cost: f64,
}

impl SummaryReportRow {
    /// Rows for every end state of `aggregation`, ordered by end state.
    #[must_use]
    pub fn from_aggregation(
        config: &ExperimentConfig,
        aggregation: &AggregationByEndState,
    ) -> Vec<Self> {
        aggregation
            .summaries()
            .into_iter()
            .map(|s| Self {
                workflow: config.workflow.clone(),
                disobedience: config.disobedience.into(),
                strategy: config.strategy_label().to_string(),
                end_state: s.end_state,
                count: s.count,
                mean_steps: s.mean_steps,
                mean_cost: s.mean_cost,
            })
            .collect()
    }
}

/// Destination for report tables.
pub trait ReportSink: Send {
    /// Persist the customer rows of one configuration.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the rows cannot be written.
    fn write_customers(&mut self, config: &ExperimentConfig, rows: &[CustomerReportRow])
    -> Result<()>;

    /// Persist the summary of the whole run.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the rows cannot be written.
    fn write_summary(&mut self, rows: &[SummaryReportRow]) -> Result<()>;
}

/// `{workflow}_{strategy}_{p}.csv`. Characters outside `[A-Za-z0-9._]` become `.`
/// so bundle headers stay splittable.
#[must_use]
pub fn customer_file_name(config: &ExperimentConfig) -> String {
    format!(
        "{}_{}_{}.csv",
        sanitize(&config.workflow),
        sanitize(config.strategy_label()),
        config.disobedience.percent()
    )
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '.'
            }
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render customer rows as CSV with a header line.
#[must_use]
pub fn render_customers(rows: &[CustomerReportRow]) -> String {
    rows.iter().fold(format!("{CUSTOMER_HEADER}\n"), |mut out, row| {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            row.customer_id,
            csv_field(&row.workflow),
            row.disobedience,
            csv_field(&row.end_state),
            row.steps,
            row.cost
        );
        out
    })
}

/// Render summary rows as CSV with a header line.
#[must_use]
pub fn render_summary(rows: &[SummaryReportRow]) -> String {
    rows.iter().fold(format!("{SUMMARY_HEADER}\n"), |mut out, row| {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            csv_field(&row.workflow),
            row.disobedience,
            csv_field(&row.strategy),
            csv_field(&row.end_state),
            row.count,
            row.mean_steps,
            row.mean_cost
        );
        out
    })
}

/// Writes one CSV file per table into a directory.
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    /// Create the sink, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryCreationFailed` if the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::directory_creation_failed(dir.clone(), e.to_string()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.dir.join(name);
        std::fs::write(&path, contents)
            .map_err(|e| Error::file_write_failed(path.clone(), e.to_string()))?;
        tracing::debug!(path = %path.display(), "Wrote report");
        Ok(())
    }
}

impl ReportSink for CsvDirectorySink {
    fn write_customers(
        &mut self,
        config: &ExperimentConfig,
        rows: &[CustomerReportRow],
    ) -> Result<()> {
        self.write_file(&customer_file_name(config), &render_customers(rows))
    }

    fn write_summary(&mut self, rows: &[SummaryReportRow]) -> Result<()> {
        self.write_file(SUMMARY_FILE, &render_summary(rows))
    }
}

/// Writes every table into one stream, each preceded by a
/// `===== <filename> =====` line.
pub struct BundleSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> BundleSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_section(&mut self, name: &str, contents: &str) -> Result<()> {
        writeln!(self.writer, "===== {name} =====")?;
        self.writer.write_all(contents.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> ReportSink for BundleSink<W> {
    fn write_customers(
        &mut self,
        config: &ExperimentConfig,
        rows: &[CustomerReportRow],
    ) -> Result<()> {
        self.write_section(&customer_file_name(config), &render_customers(rows))
    }

    fn write_summary(&mut self, rows: &[SummaryReportRow]) -> Result<()> {
        self.write_section(SUMMARY_FILE, &render_summary(rows))
    }
}

/// Keeps every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Customer tables keyed by experiment label, in write order.
    pub customers: Vec<(String, Vec<CustomerReportRow>)>,
    pub summary: Vec<SummaryReportRow>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn customers_for(&self, label: &str) -> Option<&[CustomerReportRow]> {
        self.customers
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, rows)| rows.as_slice())
    }
}

impl ReportSink for MemorySink {
    fn write_customers(
        &mut self,
        config: &ExperimentConfig,
        rows: &[CustomerReportRow],
    ) -> Result<()> {
        self.customers.push((config.label(), rows.to_vec()));
        Ok(())
    }

    fn write_summary(&mut self, rows: &[SummaryReportRow]) -> Result<()> {
        self.summary = rows.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use journeysim_core::Disobedience;

    fn config(strategy: Option<&str>, p: u32) -> ExperimentConfig {
        ExperimentConfig {
            workflow: "onboarding".to_string(),
            strategy: strategy.map(str::to_string),
            disobedience: Disobedience::new(p).unwrap_or(Disobedience::NEVER),
            customers: 2,
        }
    }

    fn row(id: CustomerId, end: &str) -> CustomerReportRow {
        CustomerReportRow {
            customer_id: id,
            workflow: "onboarding".to_string(),
            disobedience: 30,
            end_state: end.to_string(),
            steps: 2,
            cost: 1.5,
        }
    }

    #[test]
    fn should_name_files_after_configuration() {
        assert_eq!(customer_file_name(&config(Some("s1"), 30)), "onboarding_s1_30.csv");
        assert_eq!(
            customer_file_name(&config(None, 0)),
            "onboarding_permissive_0.csv"
        );
        assert_eq!(
            customer_file_name(&config(Some("a/b c"), 5)),
            "onboarding_a.b.c_5.csv"
        );
    }

    #[test]
    fn should_quote_fields_with_separators() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn should_render_header_and_rows() {
        let text = render_customers(&[row(1, "end"), row(2, "done,late")]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.first().copied(), Some(CUSTOMER_HEADER));
        assert_eq!(lines.get(1).copied(), Some("1,onboarding,30,end,2,1.5"));
        assert_eq!(lines.get(2).copied(), Some("2,onboarding,30,\"done,late\",2,1.5"));
    }

    #[test]
    fn given_directory_sink_when_writing_then_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvDirectorySink::create(dir.path().join("reports")).unwrap();

        sink.write_customers(&config(Some("s1"), 30), &[row(1, "end")])
            .unwrap();
        sink.write_summary(&[]).unwrap();

        let customers =
            std::fs::read_to_string(dir.path().join("reports/onboarding_s1_30.csv")).unwrap();
        assert!(customers.starts_with(CUSTOMER_HEADER));
        let summary = std::fs::read_to_string(dir.path().join("reports/summary.csv")).unwrap();
        assert_eq!(summary.trim_end(), SUMMARY_HEADER);
    }

    #[test]
    fn given_bundle_sink_when_writing_then_sections_are_delimited() {
        let mut sink = BundleSink::new(Vec::new());
        sink.write_customers(&config(None, 0), &[row(1, "end")])
            .unwrap();
        sink.write_summary(&[]).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let headers: Vec<_> = text.lines().filter(|l| l.starts_with("=====")).collect();
        assert_eq!(
            headers,
            vec![
                "===== onboarding_permissive_0.csv =====",
                "===== summary.csv =====",
            ]
        );
    }

    #[test]
    fn memory_sink_keeps_tables_by_label() {
        let mut sink = MemorySink::new();
        let cfg = config(Some("s1"), 30);
        sink.write_customers(&cfg, &[row(1, "end")]).unwrap();
        assert_eq!(sink.customers_for(&cfg.label()).map(<[_]>::len), Some(1));
        assert!(sink.customers_for("missing").is_none());
    }
}
