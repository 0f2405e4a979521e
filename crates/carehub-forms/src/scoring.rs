//! Completion progress and instrument scoring.
//!
//! Both walk the template, never the response set, so orphaned responses
//! are ignored. "Answered" uses the same blank predicate as required-value
//! validation.

use std::collections::HashSet;

use carehub_core::models::ids::SectionId;
use carehub_core::models::response::{is_blank, ResponseSet, ResponseValue};
use carehub_core::models::template::{Item, ItemKind, Section, TemplateDefinition};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Progress {
    pub answered_count: u32,
    pub total_count: u32,
    pub required_outstanding: u32,
}

impl Progress {
    /// Answered share of all items, 0.0 for a template without items.
    pub fn fraction(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            f64::from(self.answered_count) / f64::from(self.total_count)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.required_outstanding == 0
    }
}

pub fn progress(template: &TemplateDefinition, responses: &ResponseSet) -> Progress {
    template
        .items_in_order()
        .into_iter()
        .fold(Progress::default(), |mut p, item| {
            p.total_count += 1;
            if is_blank(responses.get(item.id)) {
                if item.required {
                    p.required_outstanding += 1;
                }
            } else {
                p.answered_count += 1;
            }
            p
        })
}

/// Sum of every answered item's resolved score.
///
/// `None` when no item declares scoring, which keeps "not a scored
/// instrument" apart from a genuine zero.
pub fn score(template: &TemplateDefinition, responses: &ResponseSet) -> Option<f64> {
    sum_scores(template.items_in_order(), responses)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionScore {
    pub section_id: SectionId,
    pub title: String,
    pub score: Option<f64>,
}

/// Per-section subtotals in template order. A section with no scored item
/// gets `None`.
pub fn section_scores(template: &TemplateDefinition, responses: &ResponseSet) -> Vec<SectionScore> {
    template
        .sections_in_order()
        .into_iter()
        .map(|section: &Section| SectionScore {
            section_id: section.id,
            title: section.title.clone(),
            score: sum_scores(section.items_in_order(), responses),
        })
        .collect()
}

fn sum_scores(items: Vec<&Item>, responses: &ResponseSet) -> Option<f64> {
    let scored: Vec<&Item> = items
        .into_iter()
        .filter(|item| item.kind.declares_scoring())
        .collect();
    if scored.is_empty() {
        return None;
    }

    Some(
        scored
            .into_iter()
            .filter_map(|item| {
                let value = responses.get(item.id).filter(|v| !v.is_empty())?;
                resolve_score(&item.kind, value)
            })
            .sum(),
    )
}

/// The scored weight of one answer, if the item and the value resolve to one.
pub fn resolve_score(kind: &ItemKind, value: &ResponseValue) -> Option<f64> {
    match kind {
        ItemKind::Scale {
            score_mapping: Some(mapping),
            ..
        } => {
            let n = value.as_number()?;
            mapping
                .iter()
                .find(|(key, _)| key.parse::<f64>().is_ok_and(|k| k == n))
                .map(|(_, weight)| *weight)
        }
        ItemKind::SingleChoice { options } => {
            let selected = value.as_text()?;
            options.iter().find(|o| o.value == selected)?.score
        }
        ItemKind::MultipleChoice { options } => {
            let mut seen = HashSet::new();
            let total: f64 = value
                .as_list()?
                .iter()
                .filter(|s| seen.insert(s.as_str()))
                .filter_map(|s| options.iter().find(|o| o.value == *s)?.score)
                .sum();
            Some(total)
        }
        ItemKind::Scale { .. }
        | ItemKind::YesNo
        | ItemKind::Text
        | ItemKind::Date
        | ItemKind::Number { .. } => None,
    }
}
