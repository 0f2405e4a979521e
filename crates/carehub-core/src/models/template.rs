use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::ids::{ItemId, SectionId, TemplateId};
use crate::error::CoreError;

/// Lifecycle status. `Draft --publish--> Active`; there is no reverse edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TemplateStatus {
    Draft,
    Active,
}

/// Partitions templates by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TemplateCategory {
    ClientProfile,
    StaffProfile,
    VisitNote,
    Assessment,
}

impl TemplateCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            TemplateCategory::ClientProfile => "CLIENT_PROFILE",
            TemplateCategory::StaffProfile => "STAFF_PROFILE",
            TemplateCategory::VisitNote => "VISIT_NOTE",
            TemplateCategory::Assessment => "ASSESSMENT",
        }
    }
}

impl FromStr for TemplateCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            TemplateCategory::ClientProfile,
            TemplateCategory::StaffProfile,
            TemplateCategory::VisitNote,
            TemplateCategory::Assessment,
        ]
        .into_iter()
        .find(|c| c.as_str() == s)
        .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// The declared response type of an item, without its constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ResponseType {
    Scale,
    YesNo,
    SingleChoice,
    MultipleChoice,
    Text,
    Date,
    Number,
}

impl ResponseType {
    /// Every declared response type, in declaration order.
    pub const ALL: [ResponseType; 7] = [
        ResponseType::Scale,
        ResponseType::YesNo,
        ResponseType::SingleChoice,
        ResponseType::MultipleChoice,
        ResponseType::Text,
        ResponseType::Date,
        ResponseType::Number,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ResponseType::Scale => "SCALE",
            ResponseType::YesNo => "YES_NO",
            ResponseType::SingleChoice => "SINGLE_CHOICE",
            ResponseType::MultipleChoice => "MULTIPLE_CHOICE",
            ResponseType::Text => "TEXT",
            ResponseType::Date => "DATE",
            ResponseType::Number => "NUMBER",
        }
    }

    const fn ordinal(self) -> usize {
        match self {
            ResponseType::Scale => 0,
            ResponseType::YesNo => 1,
            ResponseType::SingleChoice => 2,
            ResponseType::MultipleChoice => 3,
            ResponseType::Text => 4,
            ResponseType::Date => 5,
            ResponseType::Number => 6,
        }
    }
}

// `ALL` must list every variant exactly once, in ordinal order.
const _: () = {
    let mut i = 0;
    while i < ResponseType::ALL.len() {
        assert!(ResponseType::ALL[i].ordinal() == i);
        i += 1;
    }
};

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResponseType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownResponseType(s.to_string()))
    }
}

/// One selectable option of a choice item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ResponseOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            score: None,
        }
    }

    pub fn scored(value: impl Into<String>, label: impl Into<String>, score: f64) -> Self {
        Self {
            score: Some(score),
            ..Self::new(value, label)
        }
    }
}

/// An item's response type together with the constraints that only make
/// sense for that type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "response_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ItemKind {
    Scale {
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
        /// Stringified scale value to scored weight.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score_mapping: Option<BTreeMap<String, f64>>,
    },
    YesNo,
    SingleChoice {
        options: Vec<ResponseOption>,
    },
    MultipleChoice {
        options: Vec<ResponseOption>,
    },
    Text,
    Date,
    Number {
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
    },
}

impl ItemKind {
    pub const fn response_type(&self) -> ResponseType {
        match self {
            ItemKind::Scale { .. } => ResponseType::Scale,
            ItemKind::YesNo => ResponseType::YesNo,
            ItemKind::SingleChoice { .. } => ResponseType::SingleChoice,
            ItemKind::MultipleChoice { .. } => ResponseType::MultipleChoice,
            ItemKind::Text => ResponseType::Text,
            ItemKind::Date => ResponseType::Date,
            ItemKind::Number { .. } => ResponseType::Number,
        }
    }

    /// An unconstrained kind of the given type, as a fresh item starts out.
    pub fn unconstrained(response_type: ResponseType) -> Self {
        match response_type {
            ResponseType::Scale => ItemKind::Scale {
                min_value: None,
                max_value: None,
                score_mapping: None,
            },
            ResponseType::YesNo => ItemKind::YesNo,
            ResponseType::SingleChoice => ItemKind::SingleChoice {
                options: Vec::new(),
            },
            ResponseType::MultipleChoice => ItemKind::MultipleChoice {
                options: Vec::new(),
            },
            ResponseType::Text => ItemKind::Text,
            ResponseType::Date => ItemKind::Date,
            ResponseType::Number => ItemKind::Number {
                min_value: None,
                max_value: None,
            },
        }
    }

    pub fn options(&self) -> Option<&[ResponseOption]> {
        match self {
            ItemKind::SingleChoice { options } | ItemKind::MultipleChoice { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    /// Declared `(min, max)` for SCALE and NUMBER.
    pub fn bounds(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self {
            ItemKind::Scale {
                min_value,
                max_value,
                ..
            }
            | ItemKind::Number {
                min_value,
                max_value,
            } => Some((*min_value, *max_value)),
            _ => None,
        }
    }

    /// Whether this item contributes to an instrument score.
    pub fn declares_scoring(&self) -> bool {
        match self {
            ItemKind::Scale { score_mapping, .. } => {
                score_mapping.as_ref().is_some_and(|m| !m.is_empty())
            }
            ItemKind::SingleChoice { options } | ItemKind::MultipleChoice { options } => {
                options.iter().any(|o| o.score.is_some())
            }
            _ => false,
        }
    }
}

/// A single question/field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: ItemId,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub order: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn response_type(&self) -> ResponseType {
        self.kind.response_type()
    }

    /// Defects in this item's constraints that no response could satisfy
    /// or that scoring could never resolve.
    pub fn problems(&self) -> Vec<TemplateProblem> {
        let mut problems = Vec::new();
        let mut report = |message: String| {
            problems.push(TemplateProblem {
                item_id: self.id,
                message: format!("{}: {message}", self.label),
            });
        };

        match &self.kind {
            ItemKind::Scale {
                min_value,
                max_value,
                score_mapping,
            } => match (min_value, max_value) {
                (Some(min), Some(max)) if min > max => {
                    report(format!("scale minimum {min} exceeds maximum {max}"));
                }
                (Some(min), Some(max)) => {
                    for key in score_mapping.iter().flat_map(|m| m.keys()) {
                        match key.parse::<f64>() {
                            Ok(v) if v >= *min && v <= *max => {}
                            _ => report(format!(
                                "score mapping key '{key}' is not a value in [{min}, {max}]"
                            )),
                        }
                    }
                }
                _ => report("scale requires both a minimum and a maximum".to_string()),
            },
            ItemKind::Number {
                min_value: Some(min),
                max_value: Some(max),
            } if min > max => {
                report(format!("minimum {min} exceeds maximum {max}"));
            }
            ItemKind::SingleChoice { options } | ItemKind::MultipleChoice { options } => {
                if options.is_empty() {
                    report("choice item has no options".to_string());
                }
                let mut seen = HashSet::new();
                for option in options {
                    if !seen.insert(option.value.as_str()) {
                        report(format!("duplicate option value '{}'", option.value));
                    }
                }
            }
            ItemKind::Number { .. } | ItemKind::YesNo | ItemKind::Text | ItemKind::Date => {}
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Display grouping label only.
    #[serde(default)]
    pub section_type: Option<String>,
    pub order: u32,
    pub items: Vec<Item>,
}

impl Section {
    /// Items sorted by `order`; ties keep their stored position.
    pub fn items_in_order(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|i| i.order);
        items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// A versioned, lifecycle-managed schema of sections and items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TemplateDefinition {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub status: TemplateStatus,
    pub version: u32,
    pub is_enabled: bool,
    pub sections: Vec<Section>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl TemplateDefinition {
    /// A new, empty template: `Draft`, version 1, disabled.
    pub fn new(name: impl Into<String>, category: TemplateCategory) -> Self {
        let now = jiff::Timestamp::now();
        Self {
            id: TemplateId::new(),
            name: name.into(),
            description: None,
            category,
            status: TemplateStatus::Draft,
            version: 1,
            is_enabled: false,
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Published and switched on: eligible for new response instances.
    pub fn is_instantiable(&self) -> bool {
        self.status == TemplateStatus::Active && self.is_enabled
    }

    /// Sections sorted by `order`; ties keep their stored position.
    pub fn sections_in_order(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Every item in rendering order: sections by order, then items by order.
    pub fn items_in_order(&self) -> Vec<&Item> {
        self.sections_in_order()
            .into_iter()
            .flat_map(|s| s.items_in_order())
            .collect()
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.sections.iter().find_map(|s| s.item(id))
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.items.iter_mut())
            .find(|i| i.id == id)
    }

    /// The section owning an item.
    pub fn section_of(&self, item: ItemId) -> Option<&Section> {
        self.sections.iter().find(|s| s.item(item).is_some())
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Rewrite stored positions and `order` values into a dense, zero-based
    /// sequence that preserves the current rendering order.
    pub fn normalize_order(&mut self) {
        self.sections.sort_by_key(|s| s.order);
        for (position, section) in self.sections.iter_mut().enumerate() {
            section.order = position as u32;
            section.items.sort_by_key(|i| i.order);
            for (position, item) in section.items.iter_mut().enumerate() {
                item.order = position as u32;
            }
        }
    }

    /// Structural problems that make the template unfit to publish.
    pub fn problems(&self) -> Vec<TemplateProblem> {
        self.items_in_order()
            .into_iter()
            .flat_map(Item::problems)
            .collect()
    }
}

/// A structural defect found by [`TemplateDefinition::problems`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TemplateProblem {
    pub item_id: ItemId,
    pub message: String,
}

impl fmt::Display for TemplateProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
