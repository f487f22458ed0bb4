use std::collections::HashMap;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::error::{KiraError, QuantError};
use crate::split::read_record;
use crate::table::{DELIMITER, read_table_text, table_lines};

/// Column positions consumed from a quantitative-data table (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantColumns {
    pub gene: usize,
    pub value: usize,
}

impl Default for QuantColumns {
    fn default() -> Self {
        Self { gene: 0, value: 1 }
    }
}

/// Per-gene values (e.g. log fold-change) of one experiment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantTable {
    pub experiment_id: String,
    pub values: HashMap<String, f64>,
}

impl QuantTable {
    pub fn read(
        path: &Utf8Path,
        experiment_id: &str,
        columns: QuantColumns,
    ) -> Result<Self, KiraError> {
        let text = read_table_text(path)?;
        Self::parse(&text, experiment_id, columns).map_err(|err| {
            warn!(%path, status = err.status(), "rejected quantitative data");
            KiraError::from(err)
        })
    }

    pub fn parse(
        text: &str,
        experiment_id: &str,
        columns: QuantColumns,
    ) -> Result<Self, QuantError> {
        let lines = table_lines(text);
        match lines.len() {
            0 => {
                return Err(QuantError::Empty {
                    experiment: experiment_id.to_string(),
                });
            }
            1 => {
                return Err(QuantError::HeaderOnly {
                    experiment: experiment_id.to_string(),
                });
            }
            _ => {}
        }

        let required = columns.gene.max(columns.value);
        let mut rows = Vec::with_capacity(lines.len() - 1);
        for (idx, line) in lines[1..].iter().enumerate() {
            let line_no = idx + 2;
            let record = read_record(line, DELIMITER);
            if record.len() <= required {
                return Err(QuantError::MissingColumn {
                    experiment: experiment_id.to_string(),
                    line: line_no,
                    required,
                    found: record.len(),
                });
            }
            let raw = record[columns.value].trim();
            let value = raw.parse::<f64>().map_err(|_| QuantError::InvalidValue {
                experiment: experiment_id.to_string(),
                line: line_no,
                value: raw.to_string(),
            })?;
            rows.push((record[columns.gene].trim().to_string(), value));
        }

        let mut values = HashMap::with_capacity(rows.len());
        for (gene, value) in rows {
            if values.contains_key(&gene) {
                return Err(QuantError::DuplicateGene {
                    experiment: experiment_id.to_string(),
                    gene,
                });
            }
            values.insert(gene, value);
        }

        debug!(
            experiment = experiment_id,
            genes = values.len(),
            "parsed quantitative data"
        );
        Ok(Self {
            experiment_id: experiment_id.to_string(),
            values,
        })
    }

    /// Values keyed by (experiment, gene).
    pub fn keyed_values(&self) -> impl Iterator<Item = ((&str, &str), f64)> {
        self.values
            .iter()
            .map(|(gene, value)| ((self.experiment_id.as_str(), gene.as_str()), *value))
    }
}
