use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Marker wrapped around every user-facing table validation message.
pub const ERROR_MARKER: &str = "[ERROR]";

fn marked(text: String) -> String {
    format!("{ERROR_MARKER} {text} {ERROR_MARKER}")
}

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Enrichment(#[from] EnrichmentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Quant(#[from] QuantError),

    #[error("missing config file kira-enrich.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("experiment {0} is not listed in the metadata table")]
    InvalidExperimentId(String),

    #[error("output directory {path} is not usable: {status}")]
    InvalidOutputDir { path: Utf8PathBuf, status: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

/// Rejections of the experiment metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MetaError {
    #[error(
        "Line {line} of the metadata table has too many fields ({found}, the first line has {expected}); every line must have the same number of fields."
    )]
    #[diagnostic(code(kira::meta::too_many_fields))]
    TooManyFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error(
        "Line {line} of the metadata table has too few fields ({found}, the first line has {expected}); every line must have the same number of fields."
    )]
    #[diagnostic(code(kira::meta::too_few_fields))]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line} of the metadata table is empty; blank lines are not allowed.")]
    #[diagnostic(code(kira::meta::empty_line))]
    EmptyLine { line: usize },

    #[error("The metadata table is empty; it must list at least one experiment.")]
    #[diagnostic(code(kira::meta::empty))]
    Empty,

    #[error(
        "Experiment ID {experiment} appears more than once in the metadata table; experiment IDs must be unique."
    )]
    #[diagnostic(code(kira::meta::duplicate))]
    DuplicateExperiment { experiment: String },
}

impl MetaError {
    pub fn status(&self) -> u8 {
        match self {
            MetaError::TooManyFields { .. } => 1,
            MetaError::TooFewFields { .. } | MetaError::EmptyLine { .. } | MetaError::Empty => 2,
            MetaError::DuplicateExperiment { .. } => 3,
        }
    }

    pub fn message(&self) -> String {
        marked(self.to_string())
    }
}

/// Rejections of one experiment's enrichment table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum EnrichmentError {
    #[error(
        "Line {line} of the enrichment table for experiment {experiment} has {found} fields; at least {expected} are required."
    )]
    #[diagnostic(code(kira::enrichment::malformed_row))]
    MalformedRow {
        experiment: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error(
        "Term {term} appears more than once in the enrichment table for experiment {experiment}; each term may be listed only once."
    )]
    #[diagnostic(code(kira::enrichment::duplicate))]
    DuplicateTerm { experiment: String, term: String },

    #[error(
        "Line {line} of the enrichment table for experiment {experiment} has an invalid {field} value '{value}'; plot data cannot be computed."
    )]
    #[diagnostic(code(kira::enrichment::plot_data))]
    MalformedPlotData {
        experiment: String,
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error(
        "The enrichment table for experiment {experiment} contains only a header line and no terms."
    )]
    #[diagnostic(code(kira::enrichment::header_only))]
    HeaderOnly { experiment: String },

    #[error("The enrichment table for experiment {experiment} is empty.")]
    #[diagnostic(code(kira::enrichment::empty))]
    Empty { experiment: String },
}

impl EnrichmentError {
    pub fn status(&self) -> u8 {
        match self {
            EnrichmentError::MalformedRow { .. } => 1,
            EnrichmentError::DuplicateTerm { .. } => 2,
            EnrichmentError::MalformedPlotData { .. } => 3,
            EnrichmentError::HeaderOnly { .. } => 4,
            EnrichmentError::Empty { .. } => 5,
        }
    }

    pub fn message(&self) -> String {
        marked(self.to_string())
    }
}

/// Rejections of one experiment's quantitative-data table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum QuantError {
    #[error(
        "Line {line} of the quantitative data for experiment {experiment} has {found} fields; column {required} is required."
    )]
    #[diagnostic(code(kira::quant::missing_column))]
    MissingColumn {
        experiment: String,
        line: usize,
        required: usize,
        found: usize,
    },

    #[error(
        "Line {line} of the quantitative data for experiment {experiment} has a non-numeric value '{value}'."
    )]
    #[diagnostic(code(kira::quant::invalid_value))]
    InvalidValue {
        experiment: String,
        line: usize,
        value: String,
    },

    #[error(
        "Gene {gene} appears more than once in the quantitative data for experiment {experiment}; each gene may be listed only once."
    )]
    #[diagnostic(code(kira::quant::duplicate))]
    DuplicateGene { experiment: String, gene: String },

    #[error(
        "The quantitative data for experiment {experiment} contains only a header line and no genes."
    )]
    #[diagnostic(code(kira::quant::header_only))]
    HeaderOnly { experiment: String },

    #[error("The quantitative data for experiment {experiment} is empty.")]
    #[diagnostic(code(kira::quant::empty))]
    Empty { experiment: String },
}

impl QuantError {
    pub fn status(&self) -> u8 {
        match self {
            QuantError::MissingColumn { .. } | QuantError::InvalidValue { .. } => 1,
            QuantError::DuplicateGene { .. } => 2,
            QuantError::HeaderOnly { .. } => 3,
            QuantError::Empty { .. } => 4,
        }
    }

    pub fn message(&self) -> String {
        marked(self.to_string())
    }
}
