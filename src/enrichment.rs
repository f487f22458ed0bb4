use std::collections::{BTreeSet, HashMap, HashSet};

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::domain::{PlotStatistic, Ratio, TermStat, round_to};
use crate::error::{EnrichmentError, KiraError};
use crate::split::{read_record, split_record};
use crate::table::{DELIMITER, read_table_text, table_lines};

/// Logical columns of an enrichment table row.
pub const ENRICHMENT_FIELDS: usize = 10;

const TYPE: usize = 0;
const ID: usize = 1;
const DESCRIPTION: usize = 2;
const GENE_RATIO: usize = 3;
const BG_RATIO: usize = 4;
const PADJ: usize = 6;
const GENES: usize = 8;
const COUNT: usize = 9;

/// Which rows of an enrichment table get plot statistics.
///
/// A row is selected when `term_stats` is absent, or when its term has an
/// entry whose `rank` is at most `gene_ratio_limit` and whose `count` is at
/// most `padj_limit`.
#[derive(Debug, Clone, Copy)]
pub struct PlotSelection<'a> {
    pub gene_ratio_limit: u32,
    pub padj_limit: u32,
    pub term_stats: Option<&'a HashMap<String, TermStat>>,
}

impl PlotSelection<'_> {
    pub fn accepts(&self, term: &str) -> bool {
        match self.term_stats {
            None => true,
            Some(stats) => stats.get(term).is_some_and(|stat| {
                stat.rank <= self.gene_ratio_limit && stat.count <= self.padj_limit
            }),
        }
    }
}

/// One experiment's enrichment results, keyed by term ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentTable {
    pub experiment_id: String,
    /// Term IDs in file order.
    pub terms: Vec<String>,
    pub term_types: HashMap<String, String>,
    pub definitions: HashMap<String, String>,
    pub genes: HashMap<String, BTreeSet<String>>,
    pub plot: HashMap<String, PlotStatistic>,
}

struct Row {
    line: usize,
    fields: Vec<String>,
}

impl EnrichmentTable {
    pub fn read(
        path: &Utf8Path,
        experiment_id: &str,
        plot: Option<&PlotSelection<'_>>,
    ) -> Result<Self, KiraError> {
        let text = read_table_text(path)?;
        Self::parse(&text, experiment_id, plot).map_err(|err| {
            warn!(%path, status = err.status(), "rejected enrichment table");
            KiraError::from(err)
        })
    }

    pub fn parse(
        text: &str,
        experiment_id: &str,
        plot: Option<&PlotSelection<'_>>,
    ) -> Result<Self, EnrichmentError> {
        let lines = table_lines(text);
        match lines.len() {
            0 => {
                return Err(EnrichmentError::Empty {
                    experiment: experiment_id.to_string(),
                });
            }
            1 => {
                return Err(EnrichmentError::HeaderOnly {
                    experiment: experiment_id.to_string(),
                });
            }
            _ => {}
        }

        let rows = split_rows(&lines[1..], experiment_id)?;
        check_duplicates(&rows, experiment_id)?;

        let mut table = EnrichmentTable {
            experiment_id: experiment_id.to_string(),
            ..Default::default()
        };
        for row in rows {
            let term = row.fields[ID].clone();
            if let Some(selection) = plot
                && selection.accepts(&term)
            {
                let stat = plot_statistic(&row, experiment_id)?;
                table.plot.insert(term.clone(), stat);
            }
            let genes = row.fields[GENES]
                .split('/')
                .map(str::trim)
                .filter(|gene| !gene.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>();
            let mut fields = row.fields;
            table.genes.insert(term.clone(), genes);
            table
                .definitions
                .insert(term.clone(), std::mem::take(&mut fields[DESCRIPTION]));
            table
                .term_types
                .insert(term.clone(), std::mem::take(&mut fields[TYPE]));
            table.terms.push(term);
        }

        debug!(
            experiment = experiment_id,
            terms = table.terms.len(),
            plotted = table.plot.len(),
            "parsed enrichment table"
        );
        Ok(table)
    }

    /// (experiment, term) → genes associations, in file order.
    pub fn gene_associations(&self) -> impl Iterator<Item = (&str, &str, &BTreeSet<String>)> {
        self.terms.iter().filter_map(|term| {
            self.genes
                .get(term)
                .map(|genes| (self.experiment_id.as_str(), term.as_str(), genes))
        })
    }
}

fn split_rows(lines: &[&str], experiment_id: &str) -> Result<Vec<Row>, EnrichmentError> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            // header is line 1
            let line_no = idx + 2;
            let record = read_record(line, DELIMITER);
            split_record(&record, DELIMITER, ENRICHMENT_FIELDS, DESCRIPTION)
                .map(|fields| Row {
                    line: line_no,
                    fields,
                })
                .ok_or_else(|| EnrichmentError::MalformedRow {
                    experiment: experiment_id.to_string(),
                    line: line_no,
                    expected: ENRICHMENT_FIELDS,
                    found: record.len(),
                })
        })
        .collect()
}

fn check_duplicates(rows: &[Row], experiment_id: &str) -> Result<(), EnrichmentError> {
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert(row.fields[ID].as_str()) {
            return Err(EnrichmentError::DuplicateTerm {
                experiment: experiment_id.to_string(),
                term: row.fields[ID].clone(),
            });
        }
    }
    Ok(())
}

fn plot_statistic(row: &Row, experiment_id: &str) -> Result<PlotStatistic, EnrichmentError> {
    let invalid = |field: &'static str, value: &str| EnrichmentError::MalformedPlotData {
        experiment: experiment_id.to_string(),
        line: row.line,
        field,
        value: value.to_string(),
    };

    let gene_ratio_raw = row.fields[GENE_RATIO].trim();
    let gene_ratio = gene_ratio_raw
        .parse::<Ratio>()
        .map_err(|_| invalid("gene ratio", gene_ratio_raw))?;
    let background_ratio_raw = row.fields[BG_RATIO].trim();
    background_ratio_raw
        .parse::<Ratio>()
        .map_err(|_| invalid("background ratio", background_ratio_raw))?;
    let padj_raw = row.fields[PADJ].trim();
    let padj = padj_raw
        .parse::<f64>()
        .ok()
        .filter(|padj| padj.is_finite() && *padj > 0.0)
        .ok_or_else(|| invalid("adjusted p-value", padj_raw))?;
    let count_raw = row.fields[COUNT].trim();
    let count = count_raw
        .parse::<u64>()
        .map_err(|_| invalid("count", count_raw))?;

    Ok(PlotStatistic {
        gene_ratio: round_to(gene_ratio.to_f64(), 3),
        neg_log10_padj: round_to(-padj.log10(), 1),
        count,
        gene_ratio_raw: gene_ratio_raw.to_string(),
        background_ratio_raw: background_ratio_raw.to_string(),
    })
}
