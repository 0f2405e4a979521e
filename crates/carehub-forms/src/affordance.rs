use carehub_core::models::template::{ItemKind, ResponseOption};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Upper bound on the buttons a scale renders.
pub const MAX_SCALE_BUTTONS: usize = 101;

/// The input control an item is rendered with. Selected purely by the
/// item's response type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "control", rename_all = "snake_case")]
#[ts(export)]
pub enum Affordance {
    /// Yes / No pair.
    TogglePair,
    /// One button per whole value in the scale's range.
    ScaleButtons { values: Vec<f64> },
    FreeText,
    DatePicker,
    NumericInput { min: Option<f64>, max: Option<f64> },
    SingleSelectChips { options: Vec<ResponseOption> },
    MultiSelectChips { options: Vec<ResponseOption> },
}

pub fn affordance_for(kind: &ItemKind) -> Affordance {
    match kind {
        ItemKind::YesNo => Affordance::TogglePair,
        ItemKind::Scale {
            min_value,
            max_value,
            ..
        } => Affordance::ScaleButtons {
            values: scale_values(*min_value, *max_value),
        },
        ItemKind::Text => Affordance::FreeText,
        ItemKind::Date => Affordance::DatePicker,
        ItemKind::Number {
            min_value,
            max_value,
        } => Affordance::NumericInput {
            min: *min_value,
            max: *max_value,
        },
        ItemKind::SingleChoice { options } => Affordance::SingleSelectChips {
            options: options.clone(),
        },
        ItemKind::MultipleChoice { options } => Affordance::MultiSelectChips {
            options: options.clone(),
        },
    }
}

/// Whole values from `ceil(min)` to `floor(max)`. Empty for an unbounded or
/// inverted scale.
fn scale_values(min: Option<f64>, max: Option<f64>) -> Vec<f64> {
    let (Some(min), Some(max)) = (min, max) else {
        return Vec::new();
    };
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }

    let first = min.ceil();
    let last = max.floor();
    (0..MAX_SCALE_BUTTONS)
        .map(|step| first + step as f64)
        .take_while(|v| *v <= last)
        .collect()
}
