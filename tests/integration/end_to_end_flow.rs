use apiassert::{AssertionError, ResponseValidator, RuleSet, TestResponse};
use serde_json::json;

fn response() -> TestResponse {
    TestResponse::new(
        200,
        r#"{"data":[{"id":1,"active":true}],"meta":{"pagination":{"total":1}}}"#,
    )
}

#[test]
fn collection_and_pagination_pass_then_total_mismatch_is_reported() {
    let response = response();
    let mut validator = ResponseValidator::new(&response);

    validator
        .see_collection(
            &RuleSet::new()
                .field("id", ["required", "integer"])
                .field("active", ["required", "strict_boolean"]),
        )
        .expect("collection matches rules");

    validator
        .under_pagination_namespace("meta.pagination")
        .see_total_results(1)
        .expect("one result");

    let error = validator.see_total_results(2).expect_err("total is 1");
    match error {
        AssertionError::ValueMismatch {
            path,
            expected,
            actual,
        } => {
            assert_eq!(path, "meta.pagination.total");
            assert_eq!(expected, json!(2));
            assert_eq!(actual, json!(1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_paths_are_missing_key_for_every_helper() {
    let response = response();
    let mut validator = ResponseValidator::new(&response);

    let failures = [
        validator.value_at_key("meta.links").map(|_| ()),
        validator.see_value_at_key("meta.pagination.count", 1).map(|_| ()),
        validator.see_current_page(1).map(|_| ()),
        validator
            .see_collection_at(&RuleSet::new(), "included")
            .map(|_| ()),
        validator.see_item_at(&RuleSet::new(), "data.1").map(|_| ()),
    ];
    for failure in failures {
        assert!(
            matches!(failure, Err(AssertionError::MissingKey { .. })),
            "expected missing key, got {failure:?}"
        );
    }

    validator.under_pagination_namespace("meta.pagination");
    assert!(matches!(
        validator.see_results_per_page(15),
        Err(AssertionError::MissingKey { ref path }) if path == "meta.pagination.per_page"
    ));
}

#[test]
fn paths_with_empty_segments_use_flat_keys_or_report_missing_key() {
    let response = TestResponse::json(200, &json!({"a..b": 1, "meta": {}}));
    let mut validator = ResponseValidator::new(&response);

    assert_eq!(validator.value_at_key("a..b").expect("flat key"), json!(1));
    validator
        .see_value_at_key("a..b", 1)
        .expect("flat key equals 1");

    let failures = [
        validator.value_at_key("meta..total").map(|_| ()),
        validator.see_value_at_key("meta..total", 1).map(|_| ()),
        validator.value_at_key(".meta").map(|_| ()),
        validator
            .see_collection_at(&RuleSet::new(), "meta.")
            .map(|_| ()),
    ];
    for failure in failures {
        assert!(
            matches!(failure, Err(AssertionError::MissingKey { .. })),
            "expected missing key, got {failure:?}"
        );
    }

    validator.under_pagination_namespace("meta.");
    assert!(matches!(
        validator.see_total_results(1),
        Err(AssertionError::MissingKey { ref path }) if path == "meta.total"
    ));
}

#[test]
fn one_bad_record_fails_the_whole_collection() {
    let response = TestResponse::json(
        200,
        &json!({"data": [
            {"id": 1, "active": true},
            {"id": 2, "active": 1},
            {"id": "3", "active": false}
        ]}),
    );
    let rules = RuleSet::new()
        .field("id", ["required", "integer"])
        .field("active", ["required", "strict_boolean"]);

    let error = ResponseValidator::new(&response)
        .see_collection(&rules)
        .expect_err("second record has an integer flag");
    match error {
        AssertionError::Validation { path, errors } => {
            assert_eq!(path, "data.1");
            assert_eq!(
                errors.get("active"),
                Some(&["The active field must be a strict boolean.".to_string()][..])
            );
            assert!(!errors.has("id"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
