//! Template editing and lifecycle.
//!
//! Every mutation leaves section and item `order` values dense and
//! zero-based. Identities are allocated once and never reused.
//!
//! A structural edit (adding or removing a section or item, replacing an
//! item's kind and constraints, or flipping its required flag) on an
//! `Active` template bumps `version`: responses already filled against the
//! old shape stay tied to the old version. Relabeling and reordering are
//! not structural.
//!
//! An `Active` template stays publishable: edits that would introduce an
//! integrity problem or remove its last item are refused before anything
//! changes.

use std::collections::HashSet;

use carehub_core::models::ids::{ItemId, SectionId};
use carehub_core::models::template::{
    Item, ItemKind, Section, TemplateCategory, TemplateDefinition, TemplateStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::error::BuilderError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSection {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub kind: ItemKind,
}

/// Field-level edits. `None` leaves a field alone; an empty description
/// clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
}

/// A single editing request, as it arrives from the template editor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "op", rename_all = "snake_case")]
#[ts(export)]
pub enum TemplateEdit {
    AddSection {
        section: NewSection,
    },
    UpdateSection {
        section_id: SectionId,
        patch: SectionPatch,
    },
    RemoveSection {
        section_id: SectionId,
    },
    ReorderSections {
        order: Vec<SectionId>,
    },
    AddItem {
        section_id: SectionId,
        item: NewItem,
    },
    UpdateItem {
        item_id: ItemId,
        patch: ItemPatch,
    },
    SetItemKind {
        item_id: ItemId,
        kind: ItemKind,
    },
    RemoveItem {
        item_id: ItemId,
    },
    ReorderItems {
        section_id: SectionId,
        order: Vec<ItemId>,
    },
}

/// What an applied edit produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "result", rename_all = "snake_case")]
#[ts(export)]
pub enum Applied {
    SectionAdded { section_id: SectionId },
    ItemAdded { item_id: ItemId },
    Changed,
}

/// Owns one template while it is being edited.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    template: TemplateDefinition,
}

impl TemplateBuilder {
    pub fn create(name: impl Into<String>, category: TemplateCategory) -> Self {
        Self {
            template: TemplateDefinition::new(name, category),
        }
    }

    /// Start editing an existing template. Its order values are normalized
    /// first, so colliding or sparse orders from storage are repaired.
    pub fn edit(mut template: TemplateDefinition) -> Self {
        template.normalize_order();
        Self { template }
    }

    pub fn template(&self) -> &TemplateDefinition {
        &self.template
    }

    pub fn into_template(self) -> TemplateDefinition {
        self.template
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.template.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.template.description = description.filter(|d| !d.is_empty());
        self.touch();
    }

    pub fn add_section(&mut self, new: NewSection) -> SectionId {
        let id = SectionId::new();
        self.template.sections.push(Section {
            id,
            title: new.title,
            description: new.description.filter(|d| !d.is_empty()),
            section_type: new.section_type.filter(|t| !t.is_empty()),
            order: self.template.sections.len() as u32,
            items: Vec::new(),
        });
        self.touch_structure();
        id
    }

    pub fn update_section(&mut self, id: SectionId, patch: SectionPatch) -> Result<(), BuilderError> {
        let section = self
            .template
            .section_mut(id)
            .ok_or(BuilderError::SectionNotFound(id))?;
        if let Some(title) = patch.title {
            section.title = title;
        }
        if let Some(description) = patch.description {
            section.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(section_type) = patch.section_type {
            section.section_type = Some(section_type).filter(|t| !t.is_empty());
        }
        self.touch();
        Ok(())
    }

    pub fn remove_section(&mut self, id: SectionId) -> Result<Section, BuilderError> {
        let position = self
            .template
            .sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(BuilderError::SectionNotFound(id))?;
        let remaining = self.template.item_count() - self.template.sections[position].items.len();
        self.check_not_emptied(remaining)?;
        let removed = self.template.sections.remove(position);
        self.touch_structure();
        Ok(removed)
    }

    /// Reorder sections. `order` must name every section exactly once.
    pub fn reorder_sections(&mut self, order: &[SectionId]) -> Result<(), BuilderError> {
        let current: Vec<SectionId> = self.template.sections.iter().map(|s| s.id).collect();
        check_permutation(&current, order)?;
        for section in &mut self.template.sections {
            section.order = position_of(order, &section.id);
        }
        self.touch();
        Ok(())
    }

    pub fn add_item(&mut self, section: SectionId, new: NewItem) -> Result<ItemId, BuilderError> {
        let active = self.is_active();
        let target = self
            .template
            .section_mut(section)
            .ok_or(BuilderError::SectionNotFound(section))?;
        let id = ItemId::new();
        let item = Item {
            id,
            label: new.label,
            description: new.description.filter(|d| !d.is_empty()),
            required: new.required,
            order: target.items.len() as u32,
            kind: new.kind,
        };
        if active {
            check_item(&item)?;
        }
        target.items.push(item);
        self.touch_structure();
        Ok(id)
    }

    pub fn update_item(&mut self, id: ItemId, patch: ItemPatch) -> Result<(), BuilderError> {
        let item = self
            .template
            .item_mut(id)
            .ok_or(BuilderError::ItemNotFound(id))?;
        if let Some(label) = patch.label {
            item.label = label;
        }
        if let Some(description) = patch.description {
            item.description = Some(description).filter(|d| !d.is_empty());
        }
        let required_changed = patch.required.is_some_and(|r| r != item.required);
        if let Some(required) = patch.required {
            item.required = required;
        }
        if required_changed {
            self.touch_structure();
        } else {
            self.touch();
        }
        Ok(())
    }

    /// Replace an item's response type and constraints.
    pub fn set_item_kind(&mut self, id: ItemId, kind: ItemKind) -> Result<(), BuilderError> {
        let active = self.is_active();
        let item = self
            .template
            .item_mut(id)
            .ok_or(BuilderError::ItemNotFound(id))?;
        if item.kind == kind {
            return Ok(());
        }
        if active {
            check_item(&Item {
                kind: kind.clone(),
                ..item.clone()
            })?;
        }
        item.kind = kind;
        self.touch_structure();
        Ok(())
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, BuilderError> {
        if self.template.item(id).is_none() {
            return Err(BuilderError::ItemNotFound(id));
        }
        self.check_not_emptied(self.template.item_count() - 1)?;
        let removed = self
            .template
            .sections
            .iter_mut()
            .find_map(|s| {
                let position = s.items.iter().position(|i| i.id == id)?;
                Some(s.items.remove(position))
            })
            .ok_or(BuilderError::ItemNotFound(id))?;
        self.touch_structure();
        Ok(removed)
    }

    /// Reorder a section's items. `order` must name every item of the
    /// section exactly once.
    pub fn reorder_items(&mut self, section: SectionId, order: &[ItemId]) -> Result<(), BuilderError> {
        let target = self
            .template
            .section_mut(section)
            .ok_or(BuilderError::SectionNotFound(section))?;
        let current: Vec<ItemId> = target.items.iter().map(|i| i.id).collect();
        check_permutation(&current, order)?;
        for item in &mut target.items {
            item.order = position_of(order, &item.id);
        }
        self.touch();
        Ok(())
    }

    /// `Draft -> Active`, switching the template on. Refuses templates with
    /// structural problems or no items.
    pub fn publish(&mut self) -> Result<(), BuilderError> {
        if self.template.status == TemplateStatus::Active {
            return Err(BuilderError::AlreadyPublished(self.template.id));
        }
        if self.template.item_count() == 0 {
            return Err(BuilderError::EmptyTemplate(self.template.id));
        }
        let problems = self.template.problems();
        if !problems.is_empty() {
            return Err(BuilderError::InvalidTemplate(problems));
        }

        self.template.status = TemplateStatus::Active;
        self.template.is_enabled = true;
        self.touch();
        info!(
            template_id = %self.template.id,
            version = self.template.version,
            "template published"
        );
        Ok(())
    }

    /// Allow or block new instances. Independent of status; existing
    /// instances are unaffected.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.template.is_enabled == enabled {
            return;
        }
        self.template.is_enabled = enabled;
        self.touch();
        info!(template_id = %self.template.id, enabled, "template availability changed");
    }

    pub fn apply(&mut self, edit: TemplateEdit) -> Result<Applied, BuilderError> {
        match edit {
            TemplateEdit::AddSection { section } => Ok(Applied::SectionAdded {
                section_id: self.add_section(section),
            }),
            TemplateEdit::UpdateSection { section_id, patch } => {
                self.update_section(section_id, patch).map(|()| Applied::Changed)
            }
            TemplateEdit::RemoveSection { section_id } => {
                self.remove_section(section_id).map(|_| Applied::Changed)
            }
            TemplateEdit::ReorderSections { order } => {
                self.reorder_sections(&order).map(|()| Applied::Changed)
            }
            TemplateEdit::AddItem { section_id, item } => self
                .add_item(section_id, item)
                .map(|item_id| Applied::ItemAdded { item_id }),
            TemplateEdit::UpdateItem { item_id, patch } => {
                self.update_item(item_id, patch).map(|()| Applied::Changed)
            }
            TemplateEdit::SetItemKind { item_id, kind } => {
                self.set_item_kind(item_id, kind).map(|()| Applied::Changed)
            }
            TemplateEdit::RemoveItem { item_id } => {
                self.remove_item(item_id).map(|_| Applied::Changed)
            }
            TemplateEdit::ReorderItems { section_id, order } => self
                .reorder_items(section_id, &order)
                .map(|()| Applied::Changed),
        }
    }

    fn is_active(&self) -> bool {
        self.template.status == TemplateStatus::Active
    }

    fn check_not_emptied(&self, remaining_items: usize) -> Result<(), BuilderError> {
        if self.is_active() && remaining_items == 0 {
            return Err(BuilderError::EmptyTemplate(self.template.id));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.template.normalize_order();
        self.template.updated_at = jiff::Timestamp::now();
    }

    fn touch_structure(&mut self) {
        if self.is_active() {
            self.template.version += 1;
            info!(
                template_id = %self.template.id,
                version = self.template.version,
                "structural edit to published template, version bumped"
            );
        }
        self.touch();
    }
}

fn check_item(item: &Item) -> Result<(), BuilderError> {
    let problems = item.problems();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(BuilderError::InvalidTemplate(problems))
    }
}

fn check_permutation<T: Copy + Eq + std::hash::Hash + std::fmt::Display>(
    current: &[T],
    requested: &[T],
) -> Result<(), BuilderError> {
    if requested.len() != current.len() {
        return Err(BuilderError::InvalidReorder(format!(
            "expected {} ids, got {}",
            current.len(),
            requested.len()
        )));
    }
    let known: HashSet<T> = current.iter().copied().collect();
    let mut seen = HashSet::new();
    for id in requested {
        if !known.contains(id) {
            return Err(BuilderError::InvalidReorder(format!("unknown id {id}")));
        }
        if !seen.insert(*id) {
            return Err(BuilderError::InvalidReorder(format!("id {id} listed twice")));
        }
    }
    Ok(())
}

fn position_of<T: PartialEq>(order: &[T], id: &T) -> u32 {
    order.iter().position(|o| o == id).unwrap_or(order.len()) as u32
}
