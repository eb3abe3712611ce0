//! Shared utilities for summary table crates.
//!
//! This crate provides common utilities used across the workspace,
//! including Polars `AnyValue` conversions and cell number formatting.

pub mod format;
pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use crate::format::{format_fixed, format_numeric, format_pvalue};
pub use crate::polars::{
    MISSING_TOKENS, any_to_bool, any_to_f64, any_to_string, any_to_text, is_missing_text,
    logical_label, parse_bool, parse_f64,
};
