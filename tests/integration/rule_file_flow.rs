use std::fs;

use apiassert::io::IoError;
use apiassert::{ResponseValidator, RuleError, RuleSet, TestResponse};
use tempfile::tempdir;

#[test]
fn rule_files_load_identically_across_formats() {
    let dir = tempdir().expect("tempdir");
    let json_path = dir.path().join("cafe.json");
    let yaml_path = dir.path().join("cafe.yaml");
    let toml_path = dir.path().join("cafe.toml");

    fs::write(
        &json_path,
        r#"{
            "id": ["required", "integer"],
            "food_options.vegan": "required|strict_boolean",
            "created_at": ["not_present"]
        }"#,
    )
    .expect("write json rules");
    fs::write(
        &yaml_path,
        "id: [required, integer]\nfood_options.vegan: required|strict_boolean\ncreated_at:\n  - not_present\n",
    )
    .expect("write yaml rules");
    fs::write(
        &toml_path,
        "id = [\"required\", \"integer\"]\n\"food_options.vegan\" = \"required|strict_boolean\"\ncreated_at = [\"not_present\"]\n",
    )
    .expect("write toml rules");

    let from_json = RuleSet::from_path(&json_path).expect("json rules");
    let from_yaml = RuleSet::from_path(&yaml_path).expect("yaml rules");
    let from_toml = RuleSet::from_path(&toml_path).expect("toml rules");

    assert_eq!(from_json.len(), 3);
    for rules in [&from_yaml, &from_toml] {
        for field in from_json.fields() {
            assert_eq!(rules.get(&field.path), Some(field.rules.as_slice()));
        }
        assert_eq!(rules.len(), from_json.len());
    }
}

#[test]
fn loaded_rules_drive_collection_assertions() {
    let dir = tempdir().expect("tempdir");
    let rules_path = dir.path().join("photos.yml");
    fs::write(&rules_path, "id: required|integer\npath: [required, url]\n").expect("write rules");
    let fixture_path = dir.path().join("cafe.yaml");
    fs::write(
        &fixture_path,
        "photos:\n  data:\n    - id: 10\n      path: https://cdn.cafes.test/1/front.jpg\n    - id: 11\n      path: ftp://cdn.cafes.test/1/bar.jpg\n",
    )
    .expect("write fixture");

    let rules = RuleSet::from_path(&rules_path).expect("rules");
    let response = TestResponse::from_fixture(200, &fixture_path).expect("fixture");

    ResponseValidator::new(&response)
        .see_collection_at(&rules, "photos.data")
        .expect("photos match rules");
}

#[test]
fn rule_file_errors_are_reported() {
    let dir = tempdir().expect("tempdir");

    let unsupported = dir.path().join("rules.csv");
    fs::write(&unsupported, "id,required").expect("write rules");
    assert!(matches!(
        RuleSet::from_path(&unsupported),
        Err(IoError::UnsupportedPathExtension { .. })
    ));

    let malformed = dir.path().join("rules.json");
    fs::write(&malformed, r#"{"id": {"required": true}}"#).expect("write rules");
    match RuleSet::from_path(&malformed) {
        Err(IoError::InvalidRules { source, .. }) => {
            assert_eq!(
                source,
                RuleError::InvalidDefinition {
                    field: "id".to_string()
                }
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(matches!(
        RuleSet::from_path(dir.path().join("missing.json")),
        Err(IoError::Io(_))
    ));
}
