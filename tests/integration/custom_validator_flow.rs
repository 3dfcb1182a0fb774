use std::sync::Arc;
use std::thread;

use apiassert::{
    AssertionError, FieldErrors, FieldValidator, ResponseValidator, RuleError, RuleSet,
    RuleValidator, TestResponse,
};
use serde_json::{Value, json};

/// Validator that only understands `required`, to exercise the trait seam.
#[derive(Debug)]
struct RequiredOnly;

impl FieldValidator for RequiredOnly {
    fn validate(&self, record: &Value, rules: &RuleSet) -> Result<FieldErrors, RuleError> {
        self.check_rules(rules)?;
        let mut errors = FieldErrors::new();
        for field in rules.fields() {
            if record.get(&field.path).is_none_or(Value::is_null) {
                errors.add(field.path.clone(), "missing");
            }
        }
        Ok(errors)
    }

    fn check_rules(&self, rules: &RuleSet) -> Result<(), RuleError> {
        for field in rules.fields() {
            if let Some(rule) = field.rules.iter().find(|rule| rule.name() != "required") {
                return Err(RuleError::UnknownRule {
                    field: field.path.clone(),
                    rule: rule.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[test]
fn custom_field_validators_plug_into_assertions() {
    let response = TestResponse::json(200, &json!({"data": [{"id": 1}, {"name": "x"}]}));
    let validator = ResponseValidator::with_validator(&response, RequiredOnly);

    let error = validator
        .see_collection(&RuleSet::new().field("id", ["required"]))
        .expect_err("second record lacks id");
    match error {
        AssertionError::Validation { path, errors } => {
            assert_eq!(path, "data.1");
            assert_eq!(errors.get("id"), Some(&["missing".to_string()][..]));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        validator.see_collection(&RuleSet::new().field("id", ["integer"])),
        Err(AssertionError::Rule(RuleError::UnknownRule { .. }))
    ));
}

#[test]
fn registered_extensions_are_shared_across_tests() {
    let validator = Arc::new(
        RuleValidator::builder()
            .extension(apiassert::engine::validate::extensions::strict_boolean())
            .extend_implicit(
                "currency",
                "The :attribute field must be a three-letter currency code.",
                |value| {
                    value.and_then(Value::as_str).is_some_and(|code| {
                        code.len() == 3 && code.chars().all(|ch| ch.is_ascii_uppercase())
                    })
                },
            )
            .build(),
    );

    let handles: Vec<_> = [("AUD", true), ("aud", false)]
        .into_iter()
        .map(|(currency, should_pass)| {
            let validator = Arc::clone(&validator);
            thread::spawn(move || {
                let response = TestResponse::json(
                    200,
                    &json!({"price": {"amount": 450, "currency": currency, "taxed": true}}),
                );
                let rules = RuleSet::new()
                    .field("amount", ["required", "integer", "min:1"])
                    .field("currency", ["currency"])
                    .field("taxed", ["strict_boolean"]);
                let passed = ResponseValidator::with_validator(&response, validator)
                    .see_item_at(&rules, "price")
                    .is_ok();
                (passed, should_pass)
            })
        })
        .collect();

    for handle in handles {
        let (passed, should_pass) = handle.join().expect("validation thread");
        assert_eq!(passed, should_pass);
    }
}

#[test]
fn builtin_only_validator_rejects_api_predicates() {
    let response = TestResponse::json(200, &json!({"id": 1}));
    let error = ResponseValidator::with_validator(&response, RuleValidator::new())
        .see_item(&RuleSet::new().field("deleted_at", ["not_present"]))
        .expect_err("not_present must be registered explicitly");

    assert_eq!(
        error.to_string(),
        "rule `not_present` on field `deleted_at` is not registered with the validator"
    );
}
