//! Cross-experiment term consolidation.
//!
//! A term's support is the number of distinct genes annotated to it across
//! every experiment. Terms whose support is below a threshold are dropped
//! from downstream reporting.
//!
//! [`select_terms_for_removal_reference`] reaches the same answer by walking
//! the per-experiment tables directly; the two paths are kept separate so
//! each can be checked against the other.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::enrichment::EnrichmentTable;

/// (experiment, term) → genes.
pub type TermGeneMap = BTreeMap<(String, String), BTreeSet<String>>;

/// term → union of genes across experiments.
pub type TermSupport = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Consolidation {
    pub support: TermSupport,
    pub removed: Vec<String>,
}

impl Consolidation {
    pub fn is_retained(&self, term: &str) -> bool {
        self.support.contains_key(term)
            && self
                .removed
                .binary_search_by(|t| t.as_str().cmp(term))
                .is_err()
    }
}

/// Merges the associations of every table into one (experiment, term) keyed map.
pub fn collect_associations<'a, I>(tables: I) -> TermGeneMap
where
    I: IntoIterator<Item = &'a EnrichmentTable>,
{
    let mut map = TermGeneMap::new();
    for table in tables {
        for (experiment, term, genes) in table.gene_associations() {
            map.entry((experiment.to_string(), term.to_string()))
                .or_default()
                .extend(genes.iter().cloned());
        }
    }
    map
}

pub fn aggregate_term_support(associations: &TermGeneMap) -> TermSupport {
    let mut support = TermSupport::new();
    for ((_, term), genes) in associations {
        support
            .entry(term.clone())
            .or_default()
            .extend(genes.iter().cloned());
    }
    support
}

/// Terms whose aggregated gene count is strictly below `min_support`, sorted.
pub fn select_terms_for_removal(support: &TermSupport, min_support: usize) -> Vec<String> {
    support
        .iter()
        .filter(|(_, genes)| genes.len() < min_support)
        .map(|(term, _)| term.clone())
        .collect()
}

pub fn consolidate(associations: &TermGeneMap, min_support: usize) -> Consolidation {
    let support = aggregate_term_support(associations);
    let removed = select_terms_for_removal(&support, min_support);
    debug!(
        terms = support.len(),
        removed = removed.len(),
        min_support,
        "consolidated term support"
    );
    Consolidation { support, removed }
}

/// Removal set computed from the per-experiment tables without building the
/// aggregated map first. Returns the same sorted list as
/// [`select_terms_for_removal`] over [`aggregate_term_support`].
pub fn select_terms_for_removal_reference(
    tables: &[EnrichmentTable],
    min_support: usize,
) -> Vec<String> {
    let mut removed = Vec::new();
    for table in tables {
        for term in &table.terms {
            if removed.contains(term) {
                continue;
            }
            let mut genes = BTreeSet::new();
            for other in tables {
                if let Some(other_genes) = other.genes.get(term) {
                    genes.extend(other_genes.iter());
                }
            }
            if genes.len() < min_support {
                removed.push(term.clone());
            }
        }
    }
    removed.sort();
    removed
}
