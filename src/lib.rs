pub mod app;
pub mod config;
pub mod consolidate;
pub mod domain;
pub mod enrichment;
pub mod error;
pub mod fs_util;
pub mod meta;
pub mod output;
pub mod quant;
pub mod split;
pub mod table;
