//! Cross-stratum comparison tests.
//!
//! # Architecture
//!
//! The [`ComparisonTest`] trait defines a common interface for every test.
//! Built-in tests are the variants of [`BuiltinTest`]; callers add their own
//! through [`TestRegistry::register`] and select them per column by name.
//!
//! Default selection:
//!
//! - continuous, two strata: Wilcoxon rank-sum (or Welch's t-test)
//! - continuous, more strata: Kruskal-Wallis (or one-way ANOVA)
//! - categorical and dichotomous: Pearson's chi-squared test, switching to
//!   Fisher's exact test when an expected cell count is below
//!   `fisher_min_expected`

mod contingency;
mod parametric;
mod rank;
mod resample;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tbl_model::{ComparatorOptions, MultiSampleTest, SpecError, TestError, TwoSampleTest, Variant};

pub use contingency::Contingency;

/// Non-missing values of one stratum.
#[derive(Debug, Clone, PartialEq)]
pub struct StratumSample {
    pub label: String,
    /// Numeric values; `None` for text columns.
    pub numbers: Option<Vec<f64>>,
    /// Level keys.
    pub keys: Vec<String>,
}

/// Data handed to a comparison test for one column.
#[derive(Debug, Clone, Copy)]
pub struct TestInput<'a> {
    pub column: &'a str,
    /// Grouping column.
    pub group: &'a str,
    pub variant: Variant,
    /// One sample per level stratum, in stratum order.
    pub samples: &'a [StratumSample],
    /// Level order of the column, used for contingency rows.
    pub levels: &'a [String],
    pub options: &'a ComparatorOptions,
}

impl<'a> TestInput<'a> {
    /// Numeric samples of the non-empty strata.
    ///
    /// # Errors
    ///
    /// [`TestError::NonNumeric`] for text columns and
    /// [`TestError::InsufficientStrata`] when fewer than two strata hold values.
    pub fn numeric_samples(&self, test: &str) -> Result<Vec<&'a [f64]>, TestError> {
        let mut samples = Vec::new();
        for sample in self.samples {
            let numbers = sample.numbers.as_deref().ok_or_else(|| TestError::NonNumeric {
                test: test.to_string(),
            })?;
            if !numbers.is_empty() {
                samples.push(numbers);
            }
        }
        if samples.len() < 2 {
            return Err(TestError::InsufficientStrata {
                found: samples.len(),
            });
        }
        Ok(samples)
    }

    /// Level-by-stratum count table over the non-empty strata.
    pub fn contingency(&self, test: &str) -> Result<Contingency, TestError> {
        if self.variant == Variant::Continuous {
            return Err(TestError::NonCategorical {
                test: test.to_string(),
            });
        }
        let samples: Vec<&[String]> = self
            .samples
            .iter()
            .map(|sample| sample.keys.as_slice())
            .collect();
        Contingency::from_samples(self.levels, &samples)
    }

    /// Number of level strata, empty ones included.
    pub fn stratum_count(&self) -> usize {
        self.samples.len()
    }
}

/// Result of a comparison test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub statistic: Option<f64>,
    pub p_value: f64,
    /// Overrides the test description in footnotes, e.g. when an exact test
    /// fell back to simulation.
    pub method: Option<String>,
}

impl TestOutcome {
    pub fn new(statistic: Option<f64>, p_value: f64) -> Self {
        Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
            method: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// A statistical test comparing the strata of one column.
pub trait ComparisonTest: Send + Sync {
    /// Human-readable test name used in footnotes.
    fn description(&self) -> String;

    fn run(&self, input: &TestInput<'_>) -> Result<TestOutcome, TestError>;
}

/// A test backed by a closure.
///
/// # Example
///
/// ```
/// use tbl_core::compare::{FnTest, TestOutcome};
///
/// let test = FnTest::new("Always significant", |_input| Ok(TestOutcome::new(None, 0.0)));
/// ```
pub struct FnTest<F> {
    description: String,
    function: F,
}

impl<F> FnTest<F>
where
    F: Fn(&TestInput<'_>) -> Result<TestOutcome, TestError> + Send + Sync,
{
    pub fn new(description: impl Into<String>, function: F) -> Self {
        Self {
            description: description.into(),
            function,
        }
    }
}

impl<F> ComparisonTest for FnTest<F>
where
    F: Fn(&TestInput<'_>) -> Result<TestOutcome, TestError> + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn run(&self, input: &TestInput<'_>) -> Result<TestOutcome, TestError> {
        (self.function)(input)
    }
}

/// Tests shipped with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTest {
    Wilcoxon,
    WelchT,
    StudentT,
    Kruskal,
    Anova,
    ChiSquare,
    Fisher,
    Permutation,
}

impl BuiltinTest {
    pub const ALL: [BuiltinTest; 8] = [
        BuiltinTest::Wilcoxon,
        BuiltinTest::WelchT,
        BuiltinTest::StudentT,
        BuiltinTest::Kruskal,
        BuiltinTest::Anova,
        BuiltinTest::ChiSquare,
        BuiltinTest::Fisher,
        BuiltinTest::Permutation,
    ];

    /// Identifier used in per-column overrides.
    pub fn id(&self) -> &'static str {
        match self {
            BuiltinTest::Wilcoxon => "wilcoxon",
            BuiltinTest::WelchT => "welch-t",
            BuiltinTest::StudentT => "student-t",
            BuiltinTest::Kruskal => "kruskal",
            BuiltinTest::Anova => "anova",
            BuiltinTest::ChiSquare => "chi-square",
            BuiltinTest::Fisher => "fisher",
            BuiltinTest::Permutation => "permutation",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTest::Wilcoxon => "Wilcoxon rank sum test",
            BuiltinTest::WelchT => "Welch two sample t-test",
            BuiltinTest::StudentT => "Two sample t-test",
            BuiltinTest::Kruskal => "Kruskal-Wallis rank sum test",
            BuiltinTest::Anova => "One-way ANOVA",
            BuiltinTest::ChiSquare => "Pearson's chi-squared test",
            BuiltinTest::Fisher => "Fisher's exact test",
            BuiltinTest::Permutation => "Permutation test",
        }
    }

    /// Default test for a column, decided from its variant, the number of
    /// strata and, for count-based columns, the expected cell counts.
    pub fn default_for(input: &TestInput<'_>) -> BuiltinTest {
        match input.variant {
            Variant::Continuous if input.stratum_count() <= 2 => match input.options.two_sample {
                TwoSampleTest::Wilcoxon => BuiltinTest::Wilcoxon,
                TwoSampleTest::WelchT => BuiltinTest::WelchT,
            },
            Variant::Continuous => match input.options.multi_sample {
                MultiSampleTest::Kruskal => BuiltinTest::Kruskal,
                MultiSampleTest::Anova => BuiltinTest::Anova,
            },
            Variant::Categorical | Variant::Dichotomous => {
                let sparse = input
                    .contingency(BuiltinTest::ChiSquare.id())
                    .is_ok_and(|table| table.min_expected() < input.options.fisher_min_expected);
                if sparse {
                    BuiltinTest::Fisher
                } else {
                    BuiltinTest::ChiSquare
                }
            }
        }
    }
}

impl fmt::Display for BuiltinTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BuiltinTest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        BuiltinTest::ALL
            .into_iter()
            .find(|test| test.id() == normalized)
            .ok_or_else(|| format!("Unknown comparison test: {s}"))
    }
}

impl ComparisonTest for BuiltinTest {
    fn description(&self) -> String {
        self.name().to_string()
    }

    fn run(&self, input: &TestInput<'_>) -> Result<TestOutcome, TestError> {
        let id = self.id();
        let options = input.options;
        match self {
            BuiltinTest::Wilcoxon => match input.numeric_samples(id)?.as_slice() {
                [x, y] => rank::wilcoxon(x, y),
                samples => Err(TestError::Failed(format!(
                    "wilcoxon compares 2 strata, found {}",
                    samples.len()
                ))),
            },
            BuiltinTest::WelchT => match input.numeric_samples(id)?.as_slice() {
                [x, y] => parametric::welch_t(x, y),
                samples => Err(TestError::Failed(format!(
                    "welch-t compares 2 strata, found {}",
                    samples.len()
                ))),
            },
            BuiltinTest::StudentT => match input.numeric_samples(id)?.as_slice() {
                [x, y] => parametric::student_t(x, y),
                samples => Err(TestError::Failed(format!(
                    "student-t compares 2 strata, found {}",
                    samples.len()
                ))),
            },
            BuiltinTest::Kruskal => rank::kruskal_wallis(&input.numeric_samples(id)?),
            BuiltinTest::Anova => parametric::one_way_anova(&input.numeric_samples(id)?),
            BuiltinTest::ChiSquare => contingency::chi_square(&input.contingency(id)?),
            BuiltinTest::Fisher => contingency::fisher_exact(
                &input.contingency(id)?,
                options.exact_table_limit,
                options.seed,
                options.permutation_replicates,
            ),
            BuiltinTest::Permutation => match input.variant {
                Variant::Continuous => resample::numeric_permutation(
                    &input.numeric_samples(id)?,
                    options.seed,
                    options.permutation_replicates,
                ),
                Variant::Categorical | Variant::Dichotomous => resample::table_permutation(
                    &input.contingency(id)?,
                    options.seed,
                    options.permutation_replicates,
                ),
            },
        }
    }
}

/// Comparison tests indexed by the name used in per-column overrides.
///
/// The default registry holds every [`BuiltinTest`] under its id. Registering
/// a test under a built-in id replaces the built-in.
#[derive(Clone)]
pub struct TestRegistry {
    tests: BTreeMap<String, Arc<dyn ComparisonTest>>,
}

impl TestRegistry {
    /// Creates a registry without any tests.
    pub fn empty() -> Self {
        Self {
            tests: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, test: impl ComparisonTest + 'static) {
        self.tests.insert(name.into(), Arc::new(test));
    }

    /// Looks up a test by name; built-in ids are matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ComparisonTest>> {
        if let Some(test) = self.tests.get(name) {
            return Some(Arc::clone(test));
        }
        let builtin = BuiltinTest::from_str(name).ok()?;
        self.tests.get(builtin.id()).map(Arc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names with their descriptions.
    pub fn entries(&self) -> impl Iterator<Item = (&str, String)> {
        self.tests
            .iter()
            .map(|(name, test)| (name.as_str(), test.description()))
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Picks the test for a column: the named override when given, else the
    /// default for the column's data.
    ///
    /// # Errors
    ///
    /// [`SpecError::UnknownTest`] when the override names no registered test.
    pub fn select(
        &self,
        input: &TestInput<'_>,
        name: Option<&str>,
    ) -> Result<Arc<dyn ComparisonTest>, SpecError> {
        match name {
            Some(name) => self.get(name).ok_or_else(|| SpecError::UnknownTest {
                name: name.to_string(),
                column: input.column.to_string(),
            }),
            None => {
                let default = BuiltinTest::default_for(input);
                Ok(self
                    .tests
                    .get(default.id())
                    .map_or_else(|| Arc::new(default) as Arc<dyn ComparisonTest>, Arc::clone))
            }
        }
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for test in BuiltinTest::ALL {
            registry.register(test.id(), test);
        }
        registry
    }
}

impl fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRegistry")
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Outcome of comparing one column, with the name of the test that ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub test: String,
    pub statistic: Option<f64>,
    pub p_value: f64,
}

/// Runs `test` on `input`.
pub fn compare(test: &dyn ComparisonTest, input: &TestInput<'_>) -> Result<Comparison, TestError> {
    if input.stratum_count() < 2 {
        return Err(TestError::InsufficientStrata {
            found: input.stratum_count(),
        });
    }
    let outcome = test.run(input)?;
    if !outcome.p_value.is_finite() {
        return Err(TestError::Failed("test returned a non-finite p-value".to_string()));
    }
    Ok(Comparison {
        test: outcome.method.unwrap_or_else(|| test.description()),
        statistic: outcome.statistic,
        p_value: outcome.p_value,
    })
}
