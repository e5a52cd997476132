//! Response picker tests against category documents on disk.

use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use rstest::rstest;

use crate::core::picker::{PickerError, SubstitutionPolicy};
use crate::tests::common::{create_response_dir, picker_in};

const WORK: &str = r#"{"work": ["Earned {dinero} coins", "{user} got paid {dinero} coins"]}"#;

#[tokio::test]
async fn test_raw_policy_returns_template_verbatim() {
    let dir = create_response_dir(&[("work", WORK)]);
    let picker = picker_in(dir.path());

    for _ in 0..20 {
        let response = picker.pick("work", SubstitutionPolicy::Raw).await.unwrap();
        assert!(
            response == "Earned {dinero} coins" || response == "{user} got paid {dinero} coins"
        );
    }
}

#[tokio::test]
async fn test_substituted_policy_fills_amount_in_range() {
    let dir = create_response_dir(&[("work", r#"{"work": ["Earned {dinero} coins"]}"#)]);
    let picker = picker_in(dir.path());
    let pattern = Regex::new(r"^Earned (\d+) coins$").unwrap();

    for _ in 0..50 {
        let response = picker
            .pick("work", SubstitutionPolicy::Substituted)
            .await
            .unwrap();
        let captures = pattern.captures(&response).unwrap();
        let amount: u32 = captures[1].parse().unwrap();
        assert!((50..=500).contains(&amount), "amount {amount} out of range");
    }
}

#[tokio::test]
async fn test_draws_are_uniform_enough() {
    let dir = create_response_dir(&[("rob", r#"{"rob": ["a", "b", "c"]}"#)]);
    let picker = picker_in(dir.path());
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = std::collections::HashSet::new();

    for _ in 0..100 {
        let response = picker
            .pick_with_rng("rob", "rob", SubstitutionPolicy::Raw, &mut rng)
            .await
            .unwrap();
        seen.insert(response);
    }
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn test_pick_first_uses_document_order() {
    let dir = create_response_dir(&[(
        "mixed",
        r#"{"zeta": ["from zeta"], "alpha": ["from alpha"]}"#,
    )]);
    let picker = picker_in(dir.path());

    let pick = picker.pick_first("mixed", SubstitutionPolicy::Raw).await.unwrap();
    assert_eq!(pick.document, "mixed.json");
    assert_eq!(pick.category, "zeta");
    assert_eq!(pick.response, "from zeta");
}

#[tokio::test]
async fn test_pick_from_named_category() {
    let dir = create_response_dir(&[(
        "mixed",
        r#"{"zeta": ["from zeta"], "alpha": ["from alpha"]}"#,
    )]);
    let picker = picker_in(dir.path());

    let response = picker
        .pick_from("mixed", "alpha", SubstitutionPolicy::Raw)
        .await
        .unwrap();
    assert_eq!(response, "from alpha");
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let dir = create_response_dir(&[]);
    let picker = picker_in(dir.path());

    let result = picker.pick("heal", SubstitutionPolicy::Raw).await;
    assert!(matches!(result, Err(PickerError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_category_is_not_found() {
    let dir = create_response_dir(&[("heal", r#"{"other": ["x"]}"#)]);
    let picker = picker_in(dir.path());

    let result = picker.pick("heal", SubstitutionPolicy::Raw).await;
    assert!(matches!(result, Err(PickerError::NotFound(_))));
}

#[tokio::test]
async fn test_empty_category_is_an_error() {
    let dir = create_response_dir(&[("pay", r#"{"pay": []}"#)]);
    let picker = picker_in(dir.path());

    let result = picker.pick("pay", SubstitutionPolicy::Substituted).await;
    assert!(matches!(result, Err(PickerError::EmptyCategory(c)) if c == "pay"));
}

#[tokio::test]
async fn test_empty_document_has_no_first_category() {
    let dir = create_response_dir(&[("empty", "{}")]);
    let picker = picker_in(dir.path());

    let result = picker.pick_first("empty", SubstitutionPolicy::Raw).await;
    assert!(matches!(result, Err(PickerError::NotFound(_))));
}

#[rstest]
#[case("not json")]
#[case(r#"["a", "b"]"#)]
#[case(r#"{"crime": "not a list"}"#)]
#[case(r#"{"crime": [1, 2]}"#)]
#[tokio::test]
async fn test_corrupt_document(#[case] body: &str) {
    let dir = create_response_dir(&[("crime", body)]);
    let picker = picker_in(dir.path());

    let result = picker.pick("crime", SubstitutionPolicy::Raw).await;
    assert!(matches!(result, Err(PickerError::CorruptDocument { .. })));
}

#[rstest]
#[case("../secrets")]
#[case("nested/work")]
#[case("..%2fwork")]
#[case("")]
#[tokio::test]
async fn test_invalid_document_names(#[case] name: &str) {
    let dir = create_response_dir(&[("work", WORK)]);
    let picker = picker_in(dir.path());

    let result = picker.pick_first(name, SubstitutionPolicy::Raw).await;
    assert!(matches!(result, Err(PickerError::InvalidName(_))));
}
