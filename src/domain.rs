use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An `a/b` ratio as printed by enrichment tools (GeneRatio, BgRatio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRatio(pub String);

impl FromStr for Ratio {
    type Err = InvalidRatio;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (numerator, denominator) = value
            .trim()
            .split_once('/')
            .ok_or_else(|| InvalidRatio(value.to_string()))?;
        let numerator = numerator
            .trim()
            .parse::<u64>()
            .map_err(|_| InvalidRatio(value.to_string()))?;
        let denominator = denominator
            .trim()
            .parse::<u64>()
            .map_err(|_| InvalidRatio(value.to_string()))?;
        if denominator == 0 {
            return Err(InvalidRatio(value.to_string()));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

/// Externally computed ranking of a term, used to decide which rows get plot data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStat {
    pub rank: u32,
    pub count: u32,
}

impl From<(u32, u32)> for TermStat {
    fn from((rank, count): (u32, u32)) -> Self {
        Self { rank, count }
    }
}

/// Values kept per (experiment, term) for dot plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotStatistic {
    pub gene_ratio: f64,
    pub neg_log10_padj: f64,
    pub count: u64,
    pub gene_ratio_raw: String,
    pub background_ratio_raw: String,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
