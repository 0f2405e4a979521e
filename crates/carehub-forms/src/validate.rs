//! Response validation.
//!
//! The only place type-specific response rules live. Every other part of
//! the engine treats a value's correctness as already decided here.

use std::collections::BTreeMap;

use carehub_core::models::ids::ItemId;
use carehub_core::models::response::{is_blank, ResponseSet, ResponseValue};
use carehub_core::models::template::{Item, ItemKind, ResponseOption, TemplateDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ValidationErrorKind {
    MissingRequiredValue,
    OutOfRange,
    InvalidOption,
    InvalidType,
    InvalidFormat,
}

/// Why a single response value was rejected. Advisory: blocks submission
/// only, and is cleared as soon as the value changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Item identity to its validation error, for one submission attempt.
pub type ErrorMap = BTreeMap<ItemId, ValidationError>;

/// Validate a candidate value against an item's type and constraints.
///
/// A blank value (missing, null, empty string, empty list) fails only when
/// `required`; otherwise it passes without further checks.
pub fn validate(
    kind: &ItemKind,
    value: Option<&ResponseValue>,
    required: bool,
) -> Result<(), ValidationError> {
    let value = match value {
        Some(v) if !is_blank(Some(v)) => v,
        _ if required => {
            return Err(ValidationError::new(
                ValidationErrorKind::MissingRequiredValue,
                "a response is required",
            ));
        }
        _ => return Ok(()),
    };

    match kind {
        ItemKind::Scale {
            min_value,
            max_value,
            ..
        } => {
            check_range(value, *min_value, *max_value)?;
            check_whole(value)
        }
        ItemKind::Number {
            min_value,
            max_value,
        } => check_range(value, *min_value, *max_value),
        ItemKind::SingleChoice { options } => match value {
            ResponseValue::Text(selected) => check_option(options, selected),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidOption,
                format!("expected a single option, got {}", other.shape()),
            )),
        },
        ItemKind::MultipleChoice { options } => match value {
            ResponseValue::List(selected) => selected
                .iter()
                .try_for_each(|s| check_option(options, s)),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidOption,
                format!("expected a list of options, got {}", other.shape()),
            )),
        },
        ItemKind::YesNo => match value {
            ResponseValue::Bool(_) => Ok(()),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidType,
                format!("expected yes or no, got {}", other.shape()),
            )),
        },
        ItemKind::Text => match value {
            ResponseValue::Text(_) => Ok(()),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidFormat,
                format!("expected text, got {}", other.shape()),
            )),
        },
        ItemKind::Date => match value {
            ResponseValue::Text(s) if parse_canonical_date(s).is_some() => Ok(()),
            ResponseValue::Text(s) => Err(ValidationError::new(
                ValidationErrorKind::InvalidFormat,
                format!("'{s}' is not a calendar date in YYYY-MM-DD form"),
            )),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidFormat,
                format!("expected a date, got {}", other.shape()),
            )),
        },
    }
}

/// Validate the value an item currently holds in a response set.
pub fn validate_item(item: &Item, responses: &ResponseSet) -> Result<(), ValidationError> {
    validate(&item.kind, responses.get(item.id), item.required)
}

/// Validate every item of the template, touched or not. Orphaned entries
/// (keys with no item in the template) are never reported.
pub fn validate_all(template: &TemplateDefinition, responses: &ResponseSet) -> ErrorMap {
    template
        .items_in_order()
        .into_iter()
        .filter_map(|item| {
            validate_item(item, responses)
                .err()
                .map(|error| (item.id, error))
        })
        .collect()
}

/// The first item, in template order, that has an error.
pub fn first_invalid(template: &TemplateDefinition, errors: &ErrorMap) -> Option<ItemId> {
    template
        .items_in_order()
        .into_iter()
        .map(|item| item.id)
        .find(|id| errors.contains_key(id))
}

/// Parse a date only in its canonical `YYYY-MM-DD` form.
pub fn parse_canonical_date(s: &str) -> Option<jiff::civil::Date> {
    let shaped = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    s.parse().ok()
}

fn check_range(
    value: &ResponseValue,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    let n = match value {
        ResponseValue::Number(n) if n.is_finite() => *n,
        other => {
            return Err(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                format!("expected a number, got {other}"),
            ));
        }
    };

    match (min, max) {
        (Some(min), Some(max)) if n < min || n > max => Err(ValidationError::new(
            ValidationErrorKind::OutOfRange,
            format!("{n} is outside the range [{min}, {max}]"),
        )),
        (Some(min), _) if n < min => Err(ValidationError::new(
            ValidationErrorKind::OutOfRange,
            format!("{n} is below the minimum {min}"),
        )),
        (_, Some(max)) if n > max => Err(ValidationError::new(
            ValidationErrorKind::OutOfRange,
            format!("{n} is above the maximum {max}"),
        )),
        _ => Ok(()),
    }
}

/// Scale values are the whole steps a scale offers.
fn check_whole(value: &ResponseValue) -> Result<(), ValidationError> {
    match value.as_number() {
        Some(n) if n.fract() != 0.0 => Err(ValidationError::new(
            ValidationErrorKind::OutOfRange,
            format!("{n} is not a whole scale value"),
        )),
        _ => Ok(()),
    }
}

fn check_option(options: &[ResponseOption], selected: &str) -> Result<(), ValidationError> {
    if options.iter().any(|o| o.value == selected) {
        Ok(())
    } else {
        Err(ValidationError::new(
            ValidationErrorKind::InvalidOption,
            format!("'{selected}' is not one of the options"),
        ))
    }
}
