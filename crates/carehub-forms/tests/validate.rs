use carehub_core::models::response::ResponseValue;
use carehub_core::models::template::{ItemKind, ResponseOption, ResponseType};
use carehub_forms::validate::{parse_canonical_date, validate, ValidationErrorKind};

fn options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("a", "A"),
        ResponseOption::new("b", "B"),
        ResponseOption::new("c", "C"),
    ]
}

fn kind_of(response_type: ResponseType) -> ItemKind {
    match response_type {
        ResponseType::SingleChoice => ItemKind::SingleChoice { options: options() },
        ResponseType::MultipleChoice => ItemKind::MultipleChoice { options: options() },
        other => ItemKind::unconstrained(other),
    }
}

fn empty_value_for(response_type: ResponseType) -> ResponseValue {
    match response_type {
        ResponseType::MultipleChoice => ResponseValue::List(Vec::new()),
        ResponseType::Text | ResponseType::Date | ResponseType::SingleChoice => {
            ResponseValue::from("")
        }
        _ => ResponseValue::Null,
    }
}

fn kind_err(kind: &ItemKind, value: impl Into<ResponseValue>) -> ValidationErrorKind {
    validate(kind, Some(&value.into()), false).unwrap_err().kind
}

#[test]
fn required_empty_fails_for_every_type() {
    for response_type in ResponseType::ALL {
        let kind = kind_of(response_type);
        let empty = empty_value_for(response_type);

        let err = validate(&kind, Some(&empty), true).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingRequiredValue, "{response_type}");
        assert!(validate(&kind, None, true).is_err(), "{response_type}");

        assert!(validate(&kind, Some(&empty), false).is_ok(), "{response_type}");
        assert!(validate(&kind, None, false).is_ok(), "{response_type}");
    }
}

#[test]
fn range_boundaries_are_inclusive() {
    for kind in [
        ItemKind::Scale {
            min_value: Some(0.0),
            max_value: Some(3.0),
            score_mapping: None,
        },
        ItemKind::Number {
            min_value: Some(0.0),
            max_value: Some(3.0),
        },
    ] {
        assert!(validate(&kind, Some(&0.0.into()), true).is_ok());
        assert!(validate(&kind, Some(&3.0.into()), true).is_ok());
        assert_eq!(kind_err(&kind, -1.0), ValidationErrorKind::OutOfRange);
        assert_eq!(kind_err(&kind, 4.0), ValidationErrorKind::OutOfRange);
    }
}

#[test]
fn scale_values_must_be_whole_steps() {
    let kind = ItemKind::Scale {
        min_value: Some(0.0),
        max_value: Some(3.0),
        score_mapping: None,
    };
    assert!(validate(&kind, Some(&2.0.into()), true).is_ok());
    assert_eq!(kind_err(&kind, 1.5), ValidationErrorKind::OutOfRange);

    let number = ItemKind::Number {
        min_value: Some(0.0),
        max_value: Some(3.0),
    };
    assert!(validate(&number, Some(&1.5.into()), true).is_ok());
}

#[test]
fn lone_number_bound_is_still_enforced() {
    let at_least_one = ItemKind::Number {
        min_value: Some(1.0),
        max_value: None,
    };
    assert!(validate(&at_least_one, Some(&1000.0.into()), false).is_ok());
    assert_eq!(kind_err(&at_least_one, 0.5), ValidationErrorKind::OutOfRange);

    let unbounded = ItemKind::unconstrained(ResponseType::Number);
    assert!(validate(&unbounded, Some(&(-42.5).into()), false).is_ok());
}

#[test]
fn non_numeric_range_values_fail() {
    let kind = ItemKind::unconstrained(ResponseType::Number);
    assert_eq!(kind_err(&kind, "3"), ValidationErrorKind::OutOfRange);
    assert_eq!(kind_err(&kind, true), ValidationErrorKind::OutOfRange);
    assert_eq!(kind_err(&kind, f64::NAN), ValidationErrorKind::OutOfRange);
}

#[test]
fn single_choice_membership() {
    let kind = kind_of(ResponseType::SingleChoice);
    assert!(validate(&kind, Some(&"b".into()), true).is_ok());
    assert_eq!(kind_err(&kind, "z"), ValidationErrorKind::InvalidOption);
    assert_eq!(kind_err(&kind, vec!["a"]), ValidationErrorKind::InvalidOption);
}

#[test]
fn multiple_choice_membership() {
    let kind = kind_of(ResponseType::MultipleChoice);
    assert!(validate(&kind, Some(&vec!["a", "c"].into()), true).is_ok());
    assert_eq!(kind_err(&kind, vec!["a", "z"]), ValidationErrorKind::InvalidOption);
    assert_eq!(kind_err(&kind, "a"), ValidationErrorKind::InvalidOption);
}

#[test]
fn multiple_choice_tolerates_duplicates() {
    let kind = kind_of(ResponseType::MultipleChoice);
    assert!(validate(&kind, Some(&vec!["a", "a"].into()), true).is_ok());
}

#[test]
fn yes_no_must_be_boolean() {
    let kind = ItemKind::YesNo;
    assert!(validate(&kind, Some(&false.into()), true).is_ok());
    assert_eq!(kind_err(&kind, "yes"), ValidationErrorKind::InvalidType);
    assert_eq!(kind_err(&kind, 1.0), ValidationErrorKind::InvalidType);
}

#[test]
fn text_must_be_a_string() {
    let kind = ItemKind::Text;
    assert!(validate(&kind, Some(&"Client resting comfortably".into()), true).is_ok());
    assert_eq!(kind_err(&kind, 12.0), ValidationErrorKind::InvalidFormat);
}

#[test]
fn dates_must_be_canonical_calendar_dates() {
    let kind = ItemKind::Date;
    assert!(validate(&kind, Some(&"2024-02-29".into()), true).is_ok());
    for bad in ["2023-02-29", "2024-13-01", "02/03/2024", "2024-2-3", "2024-02-03T10:00"] {
        assert_eq!(kind_err(&kind, bad), ValidationErrorKind::InvalidFormat, "{bad}");
    }
    assert_eq!(kind_err(&kind, 20240203.0), ValidationErrorKind::InvalidFormat);
}

#[test]
fn canonical_date_parser_returns_the_date() {
    let date = parse_canonical_date("2025-07-04").unwrap();
    assert_eq!((date.year(), date.month(), date.day()), (2025, 7, 4));
    assert!(parse_canonical_date("2025-07-4").is_none());
}

#[test]
fn error_messages_name_the_offending_value() {
    let kind = kind_of(ResponseType::SingleChoice);
    let err = validate(&kind, Some(&"z".into()), false).unwrap_err();
    assert_eq!(err.to_string(), "'z' is not one of the options");
}
