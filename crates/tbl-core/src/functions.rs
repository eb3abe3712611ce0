//! Statistic function trait and registry.
//!
//! Statistic expressions may name functions beyond the built-in tokens, for
//! example `{cv}` or `{geomean}`. Each such name must be registered in a
//! [`StatFunctionRegistry`] before the run; an unregistered name is a
//! configuration error, raised before any statistic is computed.
//!
//! # Example
//!
//! ```
//! use tbl_core::functions::StatFunctionRegistry;
//!
//! let mut registry = StatFunctionRegistry::new();
//! registry.register("range", |values: &[f64]| {
//!     let min = values.iter().copied().reduce(f64::min)?;
//!     let max = values.iter().copied().reduce(f64::max)?;
//!     Some(max - min)
//! });
//! assert!(registry.contains("range"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named scalar statistic over the non-missing values of a stratum.
///
/// Returning `None` marks the statistic as undefined for that stratum; the
/// cell shows the missing placeholder.
pub trait StatisticFunction: Send + Sync {
    fn compute(&self, values: &[f64]) -> Option<f64>;
}

impl<F> StatisticFunction for F
where
    F: Fn(&[f64]) -> Option<f64> + Send + Sync,
{
    fn compute(&self, values: &[f64]) -> Option<f64> {
        self(values)
    }
}

/// Registry of statistic functions indexed by the name used in expressions.
#[derive(Clone, Default)]
pub struct StatFunctionRegistry {
    functions: BTreeMap<String, Arc<dyn StatisticFunction>>,
}

impl StatFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, function: impl StatisticFunction + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&dyn StatisticFunction> {
        self.functions.get(name).map(AsRef::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for StatFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatFunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_closure_is_callable() {
        let mut registry = StatFunctionRegistry::new();
        registry.register("sum", |values: &[f64]| Some(values.iter().sum::<f64>()));
        let sum = registry.get("sum").expect("registered");
        assert_eq!(sum.compute(&[1.0, 2.0, 3.5]), Some(6.5));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn debug_lists_names() {
        let mut registry = StatFunctionRegistry::new();
        registry.register("cv", |_: &[f64]| None::<f64>);
        assert_eq!(
            format!("{registry:?}"),
            r#"StatFunctionRegistry { functions: ["cv"] }"#
        );
    }
}
