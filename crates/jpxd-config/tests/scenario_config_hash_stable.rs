//! Configuration hashing determinism.
//!
//! GREEN when:
//! - the same YAML input always hashes identically
//! - key order in the source document does not affect the hash
//! - different values produce different hashes
//! - merged layers hash stably

use jpxd_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
exchange:
  timezone: Asia/Tokyo
trading_hours:
  day: { start: "8:45", end: "15:40" }
  day_closing: { start: "15:40", end: "15:45" }
  night: { start: "17:00", end: "5:55" }
  night_closing: { start: "5:55", end: "6:00" }
provider:
  static_source: github
  contract_frequency: monthly
  product_count: 8
"#;

/// Same content as BASE_YAML with sections and keys reordered.
const BASE_YAML_REORDERED: &str = r#"
provider:
  product_count: 8
  contract_frequency: monthly
  static_source: github
trading_hours:
  night_closing: { start: "5:55", end: "6:00" }
  night: { start: "17:00", end: "5:55" }
  day_closing: { start: "15:40", end: "15:45" }
  day: { start: "8:45", end: "15:40" }
exchange:
  timezone: Asia/Tokyo
"#;

const OVERLAY_YAML: &str = r#"
provider:
  product_count: 4
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(original.config_hash, reordered.config_hash);
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);

    let count = b
        .config_json
        .pointer("/provider/product_count")
        .and_then(|v| v.as_u64())
        .unwrap();
    assert_eq!(count, 4, "overlay should override product_count");
}

#[test]
fn merged_layers_produce_stable_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}
