//! CLI library components for the summary table builder.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod options;
pub mod render;
