use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::app::{AnalysisReport, ProgressEvent, ProgressSink};
use crate::error::KiraError;
use crate::fs_util;

pub const REPORT_FILE: &str = "report.json";

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &AnalysisReport) -> io::Result<()> {
        Self::print_json(report)
    }

    /// Writes `report.json` into `out_dir`, which must be missing or empty.
    pub fn write_report(report: &AnalysisReport, out_dir: &Utf8Path) -> Result<(), KiraError> {
        fs_util::prepare_output_dir(out_dir)?;
        let content = serde_json::to_vec_pretty(report)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        fs_util::write_bytes_atomic(&out_dir.join(REPORT_FILE), &content)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Forwards progress events to the tracing subscriber.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message)
            }
            None => tracing::info!("{}", event.message),
        }
    }
}
