//! Statistic expression parsing.
//!
//! An expression such as `"{median} ({p25}, {p75})"` is literal text with
//! `{token}` placeholders. `{{` and `}}` stand for literal braces. Tokens
//! form a closed set ([`StatToken`]); any other name refers to a function in
//! the [`StatFunctionRegistry`].

use std::fmt;

use tbl_model::{SpecError, Variant};

use crate::functions::StatFunctionRegistry;

/// A placeholder in a statistic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatToken {
    /// `n`: rows at the level.
    Count,
    /// `N`: non-missing rows in the stratum.
    Total,
    /// `p`: level percentage of non-missing rows.
    Percent,
    Median,
    Mean,
    Sd,
    Var,
    Min,
    Max,
    /// `p<NN>`: percentile, 0..=100.
    Percentile(u8),
    /// `N_obs`: rows in the stratum.
    NObs,
    NMiss,
    NNonmiss,
    PMiss,
    PNonmiss,
    /// Registered statistic function.
    Function(String),
}

impl StatToken {
    /// Resolves a placeholder name. Names that are not built-in become
    /// [`StatToken::Function`]; registry lookup happens in validation.
    fn from_name(name: &str, template: &str) -> Result<Self, SpecError> {
        let token = match name {
            "n" => StatToken::Count,
            "N" => StatToken::Total,
            "p" => StatToken::Percent,
            "median" => StatToken::Median,
            "mean" => StatToken::Mean,
            "sd" => StatToken::Sd,
            "var" => StatToken::Var,
            "min" => StatToken::Min,
            "max" => StatToken::Max,
            "N_obs" => StatToken::NObs,
            "N_miss" => StatToken::NMiss,
            "N_nonmiss" => StatToken::NNonmiss,
            "p_miss" => StatToken::PMiss,
            "p_nonmiss" => StatToken::PNonmiss,
            _ => {
                if let Some(digits) = name.strip_prefix('p')
                    && !digits.is_empty()
                    && digits.chars().all(|ch| ch.is_ascii_digit())
                {
                    return match digits.parse::<u8>() {
                        Ok(value) if value <= 100 => Ok(StatToken::Percentile(value)),
                        _ => Err(SpecError::PercentileRange {
                            token: name.to_string(),
                        }),
                    };
                }
                if !is_identifier(name) {
                    return Err(SpecError::UnknownToken {
                        token: name.to_string(),
                        template: template.to_string(),
                    });
                }
                StatToken::Function(name.to_string())
            }
        };
        Ok(token)
    }

    /// Name as written inside the braces; also the component key in
    /// [`tbl_model::SummaryCell`].
    pub fn name(&self) -> String {
        match self {
            StatToken::Count => "n".to_string(),
            StatToken::Total => "N".to_string(),
            StatToken::Percent => "p".to_string(),
            StatToken::Median => "median".to_string(),
            StatToken::Mean => "mean".to_string(),
            StatToken::Sd => "sd".to_string(),
            StatToken::Var => "var".to_string(),
            StatToken::Min => "min".to_string(),
            StatToken::Max => "max".to_string(),
            StatToken::Percentile(value) => format!("p{value}"),
            StatToken::NObs => "N_obs".to_string(),
            StatToken::NMiss => "N_miss".to_string(),
            StatToken::NNonmiss => "N_nonmiss".to_string(),
            StatToken::PMiss => "p_miss".to_string(),
            StatToken::PNonmiss => "p_nonmiss".to_string(),
            StatToken::Function(name) => name.clone(),
        }
    }

    /// Missingness tokens are valid for every variant.
    pub fn is_missingness(&self) -> bool {
        matches!(
            self,
            StatToken::NObs
                | StatToken::NMiss
                | StatToken::NNonmiss
                | StatToken::PMiss
                | StatToken::PNonmiss
        )
    }

    pub fn applies_to(&self, variant: Variant) -> bool {
        if self.is_missingness() {
            return true;
        }
        let level_token = matches!(
            self,
            StatToken::Count | StatToken::Total | StatToken::Percent
        );
        level_token == variant.is_count_based()
    }

    /// Printed as an integer.
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            StatToken::Count
                | StatToken::Total
                | StatToken::NObs
                | StatToken::NMiss
                | StatToken::NNonmiss
        )
    }

    /// Printed with the percentage precision.
    pub fn is_percent(&self) -> bool {
        matches!(
            self,
            StatToken::Percent | StatToken::PMiss | StatToken::PNonmiss
        )
    }

    /// Reader-facing name used in table footnotes.
    pub fn legend(&self) -> String {
        match self {
            StatToken::Count => "n".to_string(),
            StatToken::Total => "N".to_string(),
            StatToken::Percent => "%".to_string(),
            StatToken::Median | StatToken::Percentile(50) => "Median".to_string(),
            StatToken::Mean => "Mean".to_string(),
            StatToken::Sd => "SD".to_string(),
            StatToken::Var => "Variance".to_string(),
            StatToken::Min => "Min".to_string(),
            StatToken::Max => "Max".to_string(),
            StatToken::Percentile(25) => "Q1".to_string(),
            StatToken::Percentile(75) => "Q3".to_string(),
            StatToken::Percentile(value) => format!("P{value}"),
            StatToken::NObs => "N".to_string(),
            StatToken::NMiss => "N missing".to_string(),
            StatToken::NNonmiss => "N non-missing".to_string(),
            StatToken::PMiss => "% missing".to_string(),
            StatToken::PNonmiss => "% non-missing".to_string(),
            StatToken::Function(name) => name.clone(),
        }
    }
}

impl fmt::Display for StatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Literal(String),
    Token(StatToken),
}

/// A parsed statistic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatTemplate {
    source: String,
    pieces: Vec<Piece>,
}

impl StatTemplate {
    /// Splits an expression into literal text and placeholders, left to right.
    ///
    /// # Errors
    ///
    /// [`SpecError::MalformedTemplate`] for an unclosed `{`, a stray `}`, a
    /// nested `{` or an empty placeholder; [`SpecError::PercentileRange`] and
    /// [`SpecError::UnknownToken`] for bad placeholder names.
    pub fn parse(source: &str) -> Result<Self, SpecError> {
        let malformed = |reason: &str| SpecError::MalformedTemplate {
            template: source.to_string(),
            reason: reason.to_string(),
        };
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(malformed("unmatched '}'")),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(malformed("nested '{'")),
                            Some(inner) => name.push(inner),
                            None => return Err(malformed("unclosed '{'")),
                        }
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(malformed("empty placeholder"));
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Token(StatToken::from_name(name, source)?));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self {
            source: source.to_string(),
            pieces,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn tokens(&self) -> impl Iterator<Item = &StatToken> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Token(token) => Some(token),
            Piece::Literal(_) => None,
        })
    }

    /// Checks every placeholder against the column's variant and the
    /// function registry.
    ///
    /// Functions are only defined over numeric values, so they are valid for
    /// continuous columns only.
    pub fn validate(
        &self,
        variant: Variant,
        column: &str,
        functions: &StatFunctionRegistry,
    ) -> Result<(), SpecError> {
        for token in self.tokens() {
            if let StatToken::Function(name) = token
                && !functions.contains(name)
            {
                return Err(SpecError::UnknownToken {
                    token: name.clone(),
                    template: self.source.clone(),
                });
            }
            if !token.applies_to(variant) {
                return Err(SpecError::TokenNotApplicable {
                    token: token.name(),
                    variant,
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Substitutes each placeholder with `value(token)`.
    pub fn render(&self, mut value: impl FnMut(&StatToken) -> String) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Token(token) => out.push_str(&value(token)),
            }
        }
        out
    }

    /// Reader-facing description, e.g. `Median (Q1, Q3)` or `n (%)`.
    pub fn legend(&self) -> String {
        let mut out = String::new();
        let mut after_percent = false;
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => {
                    let text = if after_percent {
                        text.strip_prefix('%').unwrap_or(text)
                    } else {
                        text
                    };
                    out.push_str(text);
                    after_percent = false;
                }
                Piece::Token(token) => {
                    out.push_str(&token.legend());
                    after_percent = token.is_percent();
                }
            }
        }
        out
    }
}

impl fmt::Display for StatTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_continuous_expression() {
        let template = StatTemplate::parse("{median} ({p25}, {p75})").expect("parse");
        let tokens: Vec<_> = template.tokens().cloned().collect();
        assert_eq!(
            tokens,
            vec![
                StatToken::Median,
                StatToken::Percentile(25),
                StatToken::Percentile(75)
            ]
        );
        assert_eq!(template.legend(), "Median (Q1, Q3)");
    }

    #[test]
    fn percent_legend_drops_duplicate_sign() {
        let template = StatTemplate::parse("{n} ({p}%)").expect("parse");
        assert_eq!(template.legend(), "n (%)");
    }

    #[test]
    fn escaped_braces_are_literal() {
        let template = StatTemplate::parse("{{{mean}}}").expect("parse");
        assert_eq!(
            template.pieces(),
            &[
                Piece::Literal("{".to_string()),
                Piece::Token(StatToken::Mean),
                Piece::Literal("}".to_string()),
            ]
        );
        assert_eq!(template.render(|_| "2.5".to_string()), "{2.5}");
    }

    #[test]
    fn malformed_expressions() {
        for source in ["{median", "median}", "{}", "{me{an}"] {
            assert!(
                matches!(
                    StatTemplate::parse(source),
                    Err(SpecError::MalformedTemplate { .. })
                ),
                "{source} should be malformed"
            );
        }
    }

    #[test]
    fn percentile_range() {
        assert!(StatTemplate::parse("{p100}").is_ok());
        assert_eq!(
            StatTemplate::parse("{p101}"),
            Err(SpecError::PercentileRange {
                token: "p101".to_string()
            })
        );
    }

    #[test]
    fn tokens_checked_against_variant() {
        let registry = StatFunctionRegistry::new();
        let template = StatTemplate::parse("{mean} ({sd})").expect("parse");
        assert!(template.validate(Variant::Continuous, "mpg", &registry).is_ok());
        assert!(matches!(
            template.validate(Variant::Categorical, "am", &registry),
            Err(SpecError::TokenNotApplicable { .. })
        ));
        let missing = StatTemplate::parse("{N_miss} / {N_obs}").expect("parse");
        assert!(missing.validate(Variant::Categorical, "am", &registry).is_ok());
        assert!(missing.validate(Variant::Continuous, "mpg", &registry).is_ok());
    }

    #[test]
    fn unregistered_function_is_unknown() {
        let mut registry = StatFunctionRegistry::new();
        let template = StatTemplate::parse("{geomean}").expect("parse");
        assert_eq!(
            template.validate(Variant::Continuous, "mpg", &registry),
            Err(SpecError::UnknownToken {
                token: "geomean".to_string(),
                template: "{geomean}".to_string(),
            })
        );
        registry.register("geomean", |_: &[f64]| Some(1.0));
        assert!(template.validate(Variant::Continuous, "mpg", &registry).is_ok());
    }

    #[test]
    fn non_identifier_is_unknown() {
        assert!(matches!(
            StatTemplate::parse("{mean sd}"),
            Err(SpecError::UnknownToken { .. })
        ));
    }
}
