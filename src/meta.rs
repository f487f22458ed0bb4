use std::collections::HashMap;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::error::{KiraError, MetaError};
use crate::split::read_record;
use crate::table::{DELIMITER, read_table_text, table_lines};

/// Experiment metadata: one headerless row per experiment, ID first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTable {
    pub descriptors: HashMap<String, Vec<String>>,
    /// Experiment IDs in file order.
    pub experiments: Vec<String>,
}

impl MetaTable {
    pub fn read(path: &Utf8Path) -> Result<Self, KiraError> {
        let text = read_table_text(path)?;
        Self::parse(&text).map_err(|err| {
            warn!(%path, status = err.status(), "rejected metadata table");
            KiraError::from(err)
        })
    }

    pub fn parse(text: &str) -> Result<Self, MetaError> {
        let lines = table_lines(text);
        let Some(first) = lines.first() else {
            return Err(MetaError::Empty);
        };
        let expected = read_record(first, DELIMITER).len();

        let mut rows = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                return Err(MetaError::EmptyLine { line: line_no });
            }
            let record = read_record(line, DELIMITER);
            let found = record.len();
            if found > expected {
                return Err(MetaError::TooManyFields {
                    line: line_no,
                    expected,
                    found,
                });
            }
            if found < expected {
                return Err(MetaError::TooFewFields {
                    line: line_no,
                    expected,
                    found,
                });
            }
            rows.push(record);
        }

        let mut table = MetaTable::default();
        for record in rows {
            let id = record[0].to_string();
            if table.descriptors.contains_key(&id) {
                return Err(MetaError::DuplicateExperiment { experiment: id });
            }
            let descriptor = record.iter().skip(1).map(str::to_string).collect();
            table.descriptors.insert(id.clone(), descriptor);
            table.experiments.push(id);
        }

        debug!(experiments = table.experiments.len(), "parsed metadata table");
        Ok(table)
    }

    pub fn contains(&self, experiment_id: &str) -> bool {
        self.descriptors.contains_key(experiment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_anomaly_in_file_order_wins() {
        let err = MetaTable::parse("a,b,c\nd,e\nf,g,h,i\n").unwrap_err();
        assert_eq!(err.status(), 2);
        let err = MetaTable::parse("a,b,c\nf,g,h,i\nd,e\n").unwrap_err();
        assert_eq!(err.status(), 1);
    }

    #[test]
    fn quoted_descriptor_keeps_its_comma() {
        let table = MetaTable::parse("a,\"mouse, C57\",x\nb,rat,y\n").unwrap();
        assert_eq!(table.descriptors["a"], vec!["mouse, C57", "x"]);
        assert_eq!(table.experiments, vec!["a", "b"]);
    }

    #[test]
    fn width_checked_before_duplicates() {
        let err = MetaTable::parse("a,b\na,c\nd,e,f\n").unwrap_err();
        assert_eq!(err.status(), 1);
    }
}
