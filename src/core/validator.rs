//! Pre-flight screening of user input.
//!
//! Every backend runs the validator before contacting its remote API. Rules
//! are evaluated in the order they were declared and the first match wins.

use crate::core::config::ValidationRule;
use regex::Regex;
use std::error::Error as StdError;
use std::fmt;
use tracing::info;

#[derive(Debug)]
pub struct ValidatorError {
    pub rule: String,
    pub source: regex::Error,
}

impl fmt::Display for ValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid pattern for validation rule '{}': {}",
            self.rule, self.source
        )
    }
}

impl StdError for ValidatorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Rejected { rule: String, message: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// User-facing message; empty when the input is valid.
    pub fn message(&self) -> &str {
        match self {
            Validation::Valid => "",
            Validation::Rejected { message, .. } => message,
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    name: String,
    regex: Regex,
}

#[derive(Debug, Default)]
pub struct Validator {
    rules: Vec<CompiledRule>,
}

impl Validator {
    /// Compile every rule up front so a bad pattern fails at startup.
    pub fn new(rules: &[ValidationRule]) -> Result<Self, ValidatorError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledRule {
                        name: rule.name.clone(),
                        regex,
                    })
                    .map_err(|source| ValidatorError {
                        rule: rule.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn validate(&self, input: &str) -> Validation {
        info!(rules_count = self.rules.len(), "found validation rules");

        match self.rules.iter().find(|rule| rule.regex.is_match(input)) {
            Some(rule) => {
                info!(name = %rule.name, "validation matched");
                Validation::Rejected {
                    rule: rule.name.clone(),
                    message: rejection_message(&rule.name),
                }
            }
            None => Validation::Valid,
        }
    }
}

pub fn rejection_message(rule_name: &str) -> String {
    format!(
        "Your input contains Personal Identifiable Information: {}. Please try again!",
        rule_name
    )
}
