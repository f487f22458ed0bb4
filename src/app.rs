use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::config::{ExperimentRequest, ResolvedConfig};
use crate::consolidate::{Consolidation, collect_associations, consolidate};
use crate::domain::PlotStatistic;
use crate::enrichment::{EnrichmentTable, PlotSelection};
use crate::error::KiraError;
use crate::meta::MetaTable;
use crate::quant::QuantTable;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub min_support: usize,
    pub experiments: Vec<ExperimentSummary>,
    pub terms: Vec<TermSummary>,
    pub removed_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub id: String,
    pub descriptor: Vec<String>,
    pub terms: usize,
    pub retained_terms: usize,
    pub quant_genes: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TermSummary {
    pub id: String,
    pub term_type: String,
    pub definition: String,
    pub support: usize,
    pub genes: Vec<String>,
    pub hits: Vec<TermHit>,
}

/// One experiment's contribution to a retained term.
#[derive(Debug, Clone, Serialize)]
pub struct TermHit {
    pub experiment: String,
    pub genes: usize,
    pub plot: Option<PlotStatistic>,
    pub gene_values: BTreeMap<String, f64>,
}

/// Tables loaded for one analysis run, before consolidation.
#[derive(Debug, Clone)]
pub struct LoadedRun {
    pub meta: MetaTable,
    pub tables: Vec<EnrichmentTable>,
    pub quant: Vec<Option<QuantTable>>,
}

pub struct Pipeline;

impl Pipeline {
    pub fn run(
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<AnalysisReport, KiraError> {
        let start = Instant::now();
        let loaded = Self::load(config, sink)?;

        sink.event(ProgressEvent {
            message: format!(
                "phase=Consolidate; {} experiments, min_support={}",
                loaded.tables.len(),
                config.min_support
            ),
            elapsed: Some(start.elapsed()),
        });
        let associations = collect_associations(&loaded.tables);
        let consolidation = consolidate(&associations, config.min_support);
        info!(
            experiments = loaded.tables.len(),
            terms = consolidation.support.len(),
            removed = consolidation.removed.len(),
            "consolidated enrichment results"
        );

        let report = build_report(&loaded, &consolidation, config.min_support);
        sink.event(ProgressEvent {
            message: format!(
                "phase=Report; {} terms retained, {} removed",
                report.terms.len(),
                report.removed_terms.len()
            ),
            elapsed: Some(start.elapsed()),
        });
        Ok(report)
    }

    pub fn load(config: &ResolvedConfig, sink: &dyn ProgressSink) -> Result<LoadedRun, KiraError> {
        sink.event(ProgressEvent {
            message: format!("phase=Read; metadata {}", config.metadata),
            elapsed: None,
        });
        let meta = MetaTable::read(&config.metadata)?;
        let requests = experiment_requests(config, &meta)?;

        let selection = config.plot.as_ref().map(|plot| PlotSelection {
            gene_ratio_limit: plot.gene_ratio_limit,
            padj_limit: plot.padj_limit,
            term_stats: plot.term_stats.as_ref(),
        });

        let mut tables = Vec::with_capacity(requests.len());
        let mut quant = Vec::with_capacity(requests.len());
        for request in &requests {
            sink.event(ProgressEvent {
                message: format!("phase=Read; experiment {}", request.id),
                elapsed: None,
            });
            tables.push(EnrichmentTable::read(
                &request.enrichment,
                &request.id,
                selection.as_ref(),
            )?);
            let values = request
                .quant
                .as_ref()
                .map(|path| QuantTable::read(path, &request.id, config.quant_columns))
                .transpose()?;
            quant.push(values);
        }

        Ok(LoadedRun {
            meta,
            tables,
            quant,
        })
    }
}

fn experiment_requests(
    config: &ResolvedConfig,
    meta: &MetaTable,
) -> Result<Vec<ExperimentRequest>, KiraError> {
    if config.experiments.is_empty() {
        return Ok(meta
            .experiments
            .iter()
            .map(|id| config.default_request(id))
            .collect());
    }
    for request in &config.experiments {
        if !meta.contains(&request.id) {
            return Err(KiraError::InvalidExperimentId(request.id.clone()));
        }
    }
    Ok(config.experiments.clone())
}

fn build_report(
    loaded: &LoadedRun,
    consolidation: &Consolidation,
    min_support: usize,
) -> AnalysisReport {
    let experiments = loaded
        .tables
        .iter()
        .zip(&loaded.quant)
        .map(|(table, quant)| ExperimentSummary {
            id: table.experiment_id.clone(),
            descriptor: loaded
                .meta
                .descriptors
                .get(&table.experiment_id)
                .cloned()
                .unwrap_or_default(),
            terms: table.terms.len(),
            retained_terms: table
                .terms
                .iter()
                .filter(|term| consolidation.is_retained(term))
                .count(),
            quant_genes: quant.as_ref().map(|q| q.values.len()),
        })
        .collect();

    let mut terms = Vec::new();
    for (term, genes) in &consolidation.support {
        if !consolidation.is_retained(term) {
            continue;
        }
        let mut summary = TermSummary {
            id: term.clone(),
            term_type: String::new(),
            definition: String::new(),
            support: genes.len(),
            genes: genes.iter().cloned().collect(),
            hits: Vec::new(),
        };
        for (table, quant) in loaded.tables.iter().zip(&loaded.quant) {
            let Some(term_genes) = table.genes.get(term) else {
                continue;
            };
            if summary.term_type.is_empty() {
                summary.term_type = table.term_types.get(term).cloned().unwrap_or_default();
                summary.definition = table.definitions.get(term).cloned().unwrap_or_default();
            }
            let gene_values = quant
                .as_ref()
                .map(|q| {
                    term_genes
                        .iter()
                        .filter_map(|gene| q.values.get(gene).map(|v| (gene.clone(), *v)))
                        .collect()
                })
                .unwrap_or_default();
            summary.hits.push(TermHit {
                experiment: table.experiment_id.clone(),
                genes: term_genes.len(),
                plot: table.plot.get(term).cloned(),
                gene_values,
            });
        }
        terms.push(summary);
    }

    AnalysisReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        min_support,
        experiments,
        terms,
        removed_terms: consolidation.removed.clone(),
    }
}
