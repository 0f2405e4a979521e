use carehub_core::keys;
use carehub_core::models::ids::{ItemId, SectionId, TemplateId};
use carehub_core::models::response::{is_blank, ResponseSet, ResponseValue};
use carehub_core::models::template::{
    Item, ItemKind, ResponseOption, ResponseType, Section, TemplateCategory, TemplateDefinition,
    TemplateStatus,
};

fn item(label: &str, order: u32, kind: ItemKind) -> Item {
    Item {
        id: ItemId::new(),
        label: label.to_string(),
        description: None,
        required: false,
        order,
        kind,
    }
}

fn section(title: &str, order: u32, items: Vec<Item>) -> Section {
    Section {
        id: SectionId::new(),
        title: title.to_string(),
        description: None,
        section_type: None,
        order,
        items,
    }
}

#[test]
fn new_template_starts_as_disabled_draft_version_one() {
    let template = TemplateDefinition::new("Intake", TemplateCategory::ClientProfile);
    assert_eq!(template.status, TemplateStatus::Draft);
    assert_eq!(template.version, 1);
    assert!(!template.is_enabled);
    assert!(!template.is_instantiable());
    assert!(template.sections.is_empty());
}

#[test]
fn response_type_parses_every_declared_tag() {
    for response_type in ResponseType::ALL {
        let parsed: ResponseType = response_type.as_str().parse().unwrap();
        assert_eq!(parsed, response_type);
    }
}

#[test]
fn unknown_response_type_is_rejected_not_defaulted() {
    assert!("SLIDER".parse::<ResponseType>().is_err());

    let json = r#"{
        "id": "7f1c6b8e-3d6a-4a53-9a0e-2b5f3f1f9a10",
        "label": "Pain",
        "order": 0,
        "response_type": "SLIDER"
    }"#;
    assert!(serde_json::from_str::<Item>(json).is_err());
}

#[test]
fn item_kind_serializes_flat_with_type_tag() {
    let scale = item(
        "Pain level",
        0,
        ItemKind::Scale {
            min_value: Some(0.0),
            max_value: Some(3.0),
            score_mapping: None,
        },
    );
    let json = serde_json::to_value(&scale).unwrap();
    assert_eq!(json["response_type"], "SCALE");
    assert_eq!(json["min_value"], 0.0);
    assert_eq!(json["max_value"], 3.0);

    let back: Item = serde_json::from_value(json).unwrap();
    assert_eq!(back, scale);
}

#[test]
fn choice_item_deserializes_with_scored_options() {
    let json = r#"{
        "id": "7f1c6b8e-3d6a-4a53-9a0e-2b5f3f1f9a10",
        "label": "Mobility",
        "required": true,
        "order": 2,
        "response_type": "SINGLE_CHOICE",
        "options": [
            {"value": "independent", "label": "Independent", "score": 0},
            {"value": "assisted", "label": "Needs assistance", "score": 2}
        ]
    }"#;
    let parsed: Item = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.response_type(), ResponseType::SingleChoice);
    assert!(parsed.required);
    assert!(parsed.kind.declares_scoring());
    assert_eq!(parsed.kind.options().unwrap()[1].score, Some(2.0));
}

#[test]
fn response_values_deserialize_by_shape() {
    let a = ItemId::new();
    let b = ItemId::new();
    let c = ItemId::new();
    let d = ItemId::new();
    let e = ItemId::new();
    let json = format!(
        r#"{{"{a}": true, "{b}": 2, "{c}": "ok", "{d}": ["x", "y"], "{e}": null}}"#
    );
    let set: ResponseSet = serde_json::from_str(&json).unwrap();
    assert_eq!(set.get(a), Some(&ResponseValue::Bool(true)));
    assert_eq!(set.get(b), Some(&ResponseValue::Number(2.0)));
    assert_eq!(set.get(c), Some(&ResponseValue::Text("ok".to_string())));
    assert_eq!(set.get(d), Some(&ResponseValue::from(vec!["x", "y"])));
    assert_eq!(set.get(e), Some(&ResponseValue::Null));
}

#[test]
fn blank_covers_missing_null_empty_string_and_empty_list() {
    assert!(is_blank(None));
    assert!(is_blank(Some(&ResponseValue::Null)));
    assert!(is_blank(Some(&ResponseValue::from(""))));
    assert!(is_blank(Some(&ResponseValue::List(Vec::new()))));
    assert!(!is_blank(Some(&ResponseValue::Bool(false))));
    assert!(!is_blank(Some(&ResponseValue::Number(0.0))));
    assert!(!is_blank(Some(&ResponseValue::from(" "))));
}

#[test]
fn ordering_breaks_ties_by_stored_position() {
    let mut template = TemplateDefinition::new("Visit", TemplateCategory::VisitNote);
    template.sections = vec![
        section("second", 5, Vec::new()),
        section("first", 1, Vec::new()),
        section("third", 5, Vec::new()),
    ];

    let titles: Vec<&str> = template
        .sections_in_order()
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, ["first", "second", "third"]);

    template.normalize_order();
    let orders: Vec<u32> = template.sections.iter().map(|s| s.order).collect();
    assert_eq!(orders, [0, 1, 2]);
    assert_eq!(template.sections[0].title, "first");
}

#[test]
fn items_in_order_walks_sections_then_items() {
    let mut template = TemplateDefinition::new("Visit", TemplateCategory::VisitNote);
    template.sections = vec![
        section(
            "B",
            1,
            vec![item("b2", 1, ItemKind::Text), item("b1", 0, ItemKind::Text)],
        ),
        section("A", 0, vec![item("a1", 0, ItemKind::YesNo)]),
    ];

    let labels: Vec<&str> = template
        .items_in_order()
        .iter()
        .map(|i| i.label.as_str())
        .collect();
    assert_eq!(labels, ["a1", "b1", "b2"]);
    assert_eq!(template.item_count(), 3);
}

#[test]
fn problems_flag_unbounded_scales_and_empty_choices() {
    let mut template = TemplateDefinition::new("Fall risk", TemplateCategory::Assessment);
    template.sections = vec![section(
        "Risk",
        0,
        vec![
            item("no bounds", 0, ItemKind::unconstrained(ResponseType::Scale)),
            item("no options", 1, ItemKind::unconstrained(ResponseType::MultipleChoice)),
            item(
                "dupes",
                2,
                ItemKind::SingleChoice {
                    options: vec![ResponseOption::new("a", "A"), ResponseOption::new("a", "A")],
                },
            ),
            item(
                "fine",
                3,
                ItemKind::Number {
                    min_value: Some(0.0),
                    max_value: None,
                },
            ),
        ],
    )];

    let problems = template.problems();
    assert_eq!(problems.len(), 3);
    assert!(problems[0].message.contains("minimum and a maximum"));
    assert!(problems[1].message.contains("no options"));
    assert!(problems[2].message.contains("duplicate option value 'a'"));
}

#[test]
fn problems_flag_score_mapping_outside_scale() {
    let mut template = TemplateDefinition::new("Pain", TemplateCategory::Assessment);
    template.sections = vec![section(
        "Pain",
        0,
        vec![item(
            "pain",
            0,
            ItemKind::Scale {
                min_value: Some(0.0),
                max_value: Some(3.0),
                score_mapping: Some([("3".to_string(), 10.0), ("7".to_string(), 1.0)].into()),
            },
        )],
    )];

    let problems = template.problems();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains("'7'"));
}

#[test]
fn version_snapshots_have_distinct_keys() {
    let id = TemplateId::new();
    assert_ne!(keys::template_version(id, 1), keys::template_version(id, 2));
    assert!(keys::template(id).starts_with(keys::TEMPLATES_PREFIX));
}
