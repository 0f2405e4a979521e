mod support;

use carehub_core::models::ids::ItemId;
use carehub_core::models::response::{ResponseSet, ResponseValue};
use carehub_core::models::template::{ItemKind, ResponseOption, ResponseType};
use carehub_forms::scoring::{progress, resolve_score, score, section_scores};
use carehub_forms::builder::TemplateBuilder;
use carehub_core::models::template::TemplateCategory;

use support::{new_item, new_section, published};

fn scored_choice() -> ItemKind {
    ItemKind::SingleChoice {
        options: vec![
            ResponseOption::scored("never", "Never", 0.0),
            ResponseOption::scored("often", "Often", 5.0),
        ],
    }
}

#[test]
fn progress_counts_answered_and_outstanding_required() {
    let template = published(vec![
        ("Bathing", true, ItemKind::YesNo),
        ("Notes", false, ItemKind::Text),
        ("Visit date", true, ItemKind::Date),
    ]);
    let ids: Vec<ItemId> = template.items_in_order().iter().map(|i| i.id).collect();

    let mut responses = ResponseSet::new();
    let p = progress(&template, &responses);
    assert_eq!((p.answered_count, p.total_count, p.required_outstanding), (0, 3, 2));
    assert_eq!(p.fraction(), 0.0);

    responses.set(ids[0], false);
    responses.set(ids[1], "");
    let p = progress(&template, &responses);
    assert_eq!((p.answered_count, p.total_count, p.required_outstanding), (1, 3, 1));
    assert!(!p.is_complete());
}

#[test]
fn answering_an_empty_item_strictly_increases_answered_count() {
    let template = published(vec![
        ("a", false, ItemKind::Text),
        ("b", true, ItemKind::unconstrained(ResponseType::Number)),
        ("c", false, ItemKind::YesNo),
    ]);
    let mut responses = ResponseSet::new();
    let mut last = progress(&template, &responses);

    let answers: [ResponseValue; 3] = ["text".into(), 7.0.into(), true.into()];
    for (item, value) in template.items_in_order().iter().zip(answers) {
        responses.set(item.id, value);
        let next = progress(&template, &responses);
        assert!(next.answered_count > last.answered_count);
        assert_eq!(next.total_count, last.total_count);
        last = next;
    }
    assert_eq!(last.fraction(), 1.0);
    assert!(last.is_complete());
}

#[test]
fn orphaned_responses_are_ignored() {
    let template = published(vec![("only", true, scored_choice())]);
    let mut responses = ResponseSet::new();
    responses.set(ItemId::new(), "often");

    let p = progress(&template, &responses);
    assert_eq!((p.answered_count, p.total_count), (0, 1));
    assert_eq!(score(&template, &responses), Some(0.0));
}

#[test]
fn unscored_template_has_no_score() {
    let template = published(vec![("a", false, ItemKind::YesNo), ("b", false, ItemKind::Text)]);
    let mut responses = ResponseSet::new();
    for item in template.items_in_order() {
        responses.set(item.id, ResponseValue::from(true));
    }
    assert_eq!(score(&template, &responses), None);
}

#[test]
fn score_ignores_unscored_items() {
    let template = published(vec![
        ("Frequency", true, scored_choice()),
        ("Comment", false, ItemKind::Text),
        ("Seen", false, ItemKind::YesNo),
    ]);
    let ids: Vec<ItemId> = template.items_in_order().iter().map(|i| i.id).collect();

    let mut responses = ResponseSet::new();
    responses.set(ids[0], "often");
    assert_eq!(score(&template, &responses), Some(5.0));

    responses.set(ids[1], "unrelated");
    responses.set(ids[2], true);
    assert_eq!(score(&template, &responses), Some(5.0));
}

#[test]
fn unanswered_scored_instrument_scores_zero() {
    let template = published(vec![("Frequency", true, scored_choice())]);
    assert_eq!(score(&template, &ResponseSet::new()), Some(0.0));
}

#[test]
fn scale_mapping_overrides_displayed_value() {
    let kind = ItemKind::Scale {
        min_value: Some(1.0),
        max_value: Some(3.0),
        score_mapping: Some(
            [("1".to_string(), 0.0), ("2".to_string(), 10.0), ("3".to_string(), 25.0)].into(),
        ),
    };
    assert_eq!(resolve_score(&kind, &2.0.into()), Some(10.0));
    assert_eq!(resolve_score(&kind, &3.0.into()), Some(25.0));
    assert_eq!(resolve_score(&kind, &2.5.into()), None);

    let unmapped = ItemKind::Scale {
        min_value: Some(1.0),
        max_value: Some(3.0),
        score_mapping: None,
    };
    assert!(!unmapped.declares_scoring());
    assert_eq!(resolve_score(&unmapped, &2.0.into()), None);
}

#[test]
fn multiple_choice_sums_each_selected_option_once() {
    let kind = ItemKind::MultipleChoice {
        options: vec![
            ResponseOption::scored("falls", "Recent falls", 2.0),
            ResponseOption::scored("meds", "Four or more medications", 1.0),
            ResponseOption::new("none", "None of these"),
        ],
    };
    assert_eq!(resolve_score(&kind, &vec!["falls", "meds"].into()), Some(3.0));
    assert_eq!(resolve_score(&kind, &vec!["falls", "falls"].into()), Some(2.0));
    assert_eq!(resolve_score(&kind, &vec!["none"].into()), Some(0.0));
}

#[test]
fn section_scores_follow_section_order() {
    let mut builder = TemplateBuilder::create("Fall risk", TemplateCategory::Assessment);
    let history = builder.add_section(new_section("History"));
    let notes = builder.add_section(new_section("Notes"));
    let frequency = builder
        .add_item(history, new_item("Frequency", true, scored_choice()))
        .unwrap();
    builder
        .add_item(notes, new_item("Comment", false, ItemKind::Text))
        .unwrap();
    builder.reorder_sections(&[notes, history]).unwrap();
    let template = builder.into_template();

    let mut responses = ResponseSet::new();
    responses.set(frequency, "often");

    let scores = section_scores(&template, &responses);
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].title, "Notes");
    assert_eq!(scores[0].score, None);
    assert_eq!(scores[1].title, "History");
    assert_eq!(scores[1].score, Some(5.0));
}
