use std::collections::HashMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::TermStat;
use crate::error::KiraError;
use crate::quant::QuantColumns;

pub const DEFAULT_CONFIG_FILE: &str = "kira-enrich.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub metadata: Utf8PathBuf,
    #[serde(default)]
    pub enrichment_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub quant_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub experiments: Vec<ExperimentEntry>,
    #[serde(default)]
    pub min_support: Option<usize>,
    #[serde(default)]
    pub quant_columns: Option<QuantColumnsEntry>,
    #[serde(default)]
    pub plot: Option<PlotEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExperimentEntry {
    Shorthand(String),
    Detailed(ExperimentEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ExperimentEntryObject {
    pub id: String,
    #[serde(default)]
    pub enrichment: Option<Utf8PathBuf>,
    #[serde(default)]
    pub quant: Option<Utf8PathBuf>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuantColumnsEntry {
    pub gene: usize,
    pub value: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PlotEntry {
    pub gene_ratio_limit: u32,
    pub padj_limit: u32,
    #[serde(default)]
    pub term_stats: Option<HashMap<String, (u32, u32)>>,
}

#[derive(Debug, Clone)]
pub struct ExperimentRequest {
    pub id: String,
    pub enrichment: Utf8PathBuf,
    pub quant: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub gene_ratio_limit: u32,
    pub padj_limit: u32,
    pub term_stats: Option<HashMap<String, TermStat>>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub metadata: Utf8PathBuf,
    pub enrichment_dir: Utf8PathBuf,
    pub quant_dir: Option<Utf8PathBuf>,
    /// Explicit experiment list; empty means every experiment in the metadata table.
    pub experiments: Vec<ExperimentRequest>,
    pub min_support: usize,
    pub quant_columns: QuantColumns,
    pub plot: Option<PlotRequest>,
}

impl ResolvedConfig {
    /// Request for an experiment that the config did not list explicitly.
    pub fn default_request(&self, id: &str) -> ExperimentRequest {
        ExperimentRequest {
            id: id.to_string(),
            enrichment: self.enrichment_dir.join(format!("{id}.csv")),
            quant: self.quant_dir.as_ref().map(|dir| dir.join(format!("{id}.csv"))),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.as_std_path().exists() {
            return Err(KiraError::MissingConfig);
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        let base = config_path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        Self::resolve_config(config, &base)
    }

    /// Resolves relative paths against `base` (the config file's directory).
    pub fn resolve_config(config: Config, base: &Utf8Path) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(KiraError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let metadata = base.join(&config.metadata);
        let enrichment_dir = base.join(config.enrichment_dir.unwrap_or_default());
        let quant_dir = config.quant_dir.map(|dir| base.join(dir));

        let experiments = config
            .experiments
            .into_iter()
            .map(|entry| match entry {
                ExperimentEntry::Shorthand(id) => ExperimentRequest {
                    enrichment: enrichment_dir.join(format!("{id}.csv")),
                    quant: quant_dir.as_ref().map(|dir| dir.join(format!("{id}.csv"))),
                    id,
                },
                ExperimentEntry::Detailed(obj) => ExperimentRequest {
                    enrichment: obj
                        .enrichment
                        .map(|path| base.join(path))
                        .unwrap_or_else(|| enrichment_dir.join(format!("{}.csv", obj.id))),
                    quant: obj.quant.map(|path| base.join(path)),
                    id: obj.id,
                },
            })
            .collect::<Vec<_>>();

        let quant_columns = config
            .quant_columns
            .map(|cols| QuantColumns {
                gene: cols.gene,
                value: cols.value,
            })
            .unwrap_or_default();

        let plot = config.plot.map(|plot| PlotRequest {
            gene_ratio_limit: plot.gene_ratio_limit,
            padj_limit: plot.padj_limit,
            term_stats: plot.term_stats.map(|stats| {
                stats
                    .into_iter()
                    .map(|(term, pair)| (term, TermStat::from(pair)))
                    .collect()
            }),
        });

        Ok(ResolvedConfig {
            schema_version,
            metadata,
            enrichment_dir,
            quant_dir,
            experiments,
            min_support: config.min_support.unwrap_or(1),
            quant_columns,
            plot,
        })
    }
}
