//! Validator seam and the declarative `Rules` validator.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::collections::BTreeMap;

use super::value::{FieldValue, Snapshot};

/// Field key -> messages for one rejected submit.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Clone, Debug, PartialEq)]
pub enum Validation {
    /// Accepted; carries the cleaned snapshot that will be committed.
    Valid(Snapshot),
    Invalid(FieldErrors),
}

pub trait Validator {
    fn validate(&self, snapshot: &Snapshot) -> Validation;
}

impl<F> Validator for F
where
    F: Fn(&Snapshot) -> Validation,
{
    fn validate(&self, snapshot: &Snapshot) -> Validation {
        self(snapshot)
    }
}

/// Accepts every snapshot unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, snapshot: &Snapshot) -> Validation {
        Validation::Valid(snapshot.clone())
    }
}

#[derive(Clone, Debug)]
enum Rule {
    RequiredText { key: String, message: String },
    RequiredDate { key: String, message: String },
    RequiredId { key: String, message: String },
    MinNumber { key: String, min: f64, message: String },
    PruneEmptyRows { key: String },
}

/// Declarative validator built from a list of rules.
///
/// Pruning runs first so required checks see the cleaned snapshot; all
/// failing rules report, a field may collect several messages.
#[derive(Clone, Debug, Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text must be present and not blank.
    #[must_use]
    pub fn required_text(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule::RequiredText { key: key.into(), message: message.into() });
        self
    }

    #[must_use]
    pub fn required_date(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule::RequiredDate { key: key.into(), message: message.into() });
        self
    }

    #[must_use]
    pub fn required_id(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule::RequiredId { key: key.into(), message: message.into() });
        self
    }

    /// Number, when present, must be at least `min`.
    #[must_use]
    pub fn min_number(mut self, key: impl Into<String>, min: f64, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MinNumber { key: key.into(), min, message: message.into() });
        self
    }

    /// Drop list rows with no input before committing.
    #[must_use]
    pub fn prune_empty_rows(mut self, key: impl Into<String>) -> Self {
        self.rules.push(Rule::PruneEmptyRows { key: key.into() });
        self
    }
}

impl Validator for Rules {
    fn validate(&self, snapshot: &Snapshot) -> Validation {
        let mut cleaned = snapshot.clone();
        for rule in &self.rules {
            if let Rule::PruneEmptyRows { key } = rule {
                let rows = snapshot.get(key).as_rows();
                if !rows.is_empty() {
                    let kept = rows.iter().filter(|row| row.has_input()).cloned().collect();
                    cleaned.set(key.clone(), FieldValue::List(kept));
                }
            }
        }

        let mut errors = FieldErrors::new();
        for rule in &self.rules {
            let failure = match rule {
                Rule::RequiredText { key, message } => cleaned
                    .get(key)
                    .as_text()
                    .is_none_or(|t| t.trim().is_empty())
                    .then_some((key, message)),
                Rule::RequiredDate { key, message } => cleaned.get(key).as_date().is_none().then_some((key, message)),
                Rule::RequiredId { key, message } => cleaned.get(key).as_id().is_none().then_some((key, message)),
                Rule::MinNumber { key, min, message } => cleaned
                    .get(key)
                    .as_number()
                    .is_some_and(|n| n < *min)
                    .then_some((key, message)),
                Rule::PruneEmptyRows { .. } => None,
            };
            if let Some((key, message)) = failure {
                errors.entry(key.clone()).or_default().push(message.clone());
            }
        }

        if errors.is_empty() {
            Validation::Valid(cleaned)
        } else {
            Validation::Invalid(errors)
        }
    }
}
