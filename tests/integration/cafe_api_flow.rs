use apiassert::{AssertionError, ResponseValidator, RuleSet, TestResponse};
use serde_json::{Value, json};

/// In-memory stand-in for the cafe API under test.
fn get(uri: &str) -> TestResponse {
    let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
    let include_photos = query.split('&').any(|pair| pair == "include=photos");

    match path {
        "/api/v2/cafes" => {
            let data: Vec<Value> = (1..=15).map(|id| cafe(id, include_photos)).collect();
            TestResponse::json(
                200,
                &json!({
                    "data": data,
                    "meta": {
                        "pagination": {
                            "total": 100,
                            "count": 15,
                            "per_page": 15,
                            "current_page": 1,
                            "total_pages": 7,
                            "links": {"next": "https://cafes.test/api/v2/cafes?page=2"}
                        }
                    }
                }),
            )
        }
        "/api/v2/cafes/1" => {
            let mut body = cafe(1, true);
            if let Value::Object(map) = &mut body {
                map.insert("photos".to_string(), photos(1));
            }
            TestResponse::json(200, &body)
        }
        _ => TestResponse::json(404, &json!({"error": "not found"})),
    }
}

fn cafe(id: u64, include_photos: bool) -> Value {
    let mut cafe = json!({
        "id": id,
        "name": format!("Cafe {id}"),
        "description": "Single origin pour-overs",
        "address": format!("{id} Laneway St"),
        "food_options": {"vegan": id % 2 == 0, "vegetarian": true}
    });
    if include_photos {
        if let Value::Object(map) = &mut cafe {
            map.insert("photos".to_string(), photos(id));
        }
    }
    cafe
}

fn photos(cafe_id: u64) -> Value {
    json!({
        "data": [
            {"id": cafe_id * 10, "path": format!("https://cdn.cafes.test/{cafe_id}/front.jpg")},
            {"id": cafe_id * 10 + 1, "path": format!("https://cdn.cafes.test/{cafe_id}/bar.jpg")}
        ]
    })
}

fn cafe_rules() -> RuleSet {
    RuleSet::new()
        .field("id", ["required", "integer"])
        .field("name", ["required", "string"])
        .field("description", ["required", "string"])
        .field("address", ["required", "string"])
        .field("food_options.vegan", ["required", "strict_boolean"])
        .field("food_options.vegetarian", ["required", "strict_boolean"])
        .field("created_at", ["not_present"])
        .field("updated_at", ["not_present"])
}

fn photo_rules() -> RuleSet {
    RuleSet::new()
        .field("id", ["required", "integer"])
        .field("path", ["required", "url"])
}

#[test]
fn shows_a_paginated_index_of_all_cafes() -> Result<(), AssertionError> {
    let response = get("/api/v2/cafes");
    let mut validator = ResponseValidator::new(&response);

    validator
        .under_pagination_namespace("meta.pagination")
        .see_status_code(200)?
        .see_current_page(1)?
        .see_total_results(100)?
        .see_results_per_page(15)?
        .see_total_pages_at(7, "total_pages")?
        .see_collection(&cafe_rules().field("photos", ["not_present"]))?;
    Ok(())
}

#[test]
fn shows_photos_in_cafe_index_if_requested() -> Result<(), AssertionError> {
    let response = get("/api/v2/cafes?include=photos");

    ResponseValidator::new(&response)
        .see_status_code(200)?
        .see_collection(&RuleSet::new().field("photos", ["required"]))?
        .see_collection_at(&photo_rules(), "data.0.photos.data")?
        .see_collection(&RuleSet::new().pipe("photos.data.*.path", "required|url"))?;
    Ok(())
}

#[test]
fn shows_a_single_cafe_page() -> Result<(), AssertionError> {
    let response = get("/api/v2/cafes/1");

    ResponseValidator::new(&response)
        .see_status_code(200)?
        .see_item(&cafe_rules())?
        .see_collection_at(&photo_rules(), "photos.data")?
        .see_value_at_key("photos.data.1.id", 11)?;
    Ok(())
}

#[test]
fn index_without_photos_fails_photo_requirement() {
    let response = get("/api/v2/cafes");
    let error = ResponseValidator::new(&response)
        .see_collection(&RuleSet::new().field("photos", ["required"]))
        .expect_err("photos are only included on request");

    assert_eq!(
        error.to_string(),
        "record at `data.0` failed validation:\n  photos: The photos field is required."
    );
}

#[test]
fn unknown_cafe_returns_not_found() {
    let response = get("/api/v2/cafes/999");
    let validator = ResponseValidator::new(&response);

    assert!(matches!(
        validator.see_status_code(200),
        Err(AssertionError::StatusMismatch {
            expected: 200,
            actual: 404
        })
    ));
    validator
        .see_status_code(404)
        .expect("not found status")
        .see_value_at_key("error", "not found")
        .expect("error body");
}
