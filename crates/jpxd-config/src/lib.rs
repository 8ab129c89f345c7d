//! jpxd-config
//!
//! Layered YAML configuration for the calendar workspace. Documents merge
//! in order (later layers override earlier ones), the merged value is
//! canonicalized to JSON and hashed, and the typed market configuration is
//! extracted from it. The hash identifies exactly which configuration a
//! calendar snapshot was built under.
//!
//! Core crates never read configuration themselves; everything they need
//! (schedule, holiday set, provider settings) is built here and threaded in
//! as explicit values.

mod market;

pub use market::{load_market_config, MarketConfig, ProviderSettings};

use std::fs;

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Merged configuration plus its identity.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 of the canonical JSON, hex encoded.
    pub config_hash: String,
    /// Canonical (key-sorted, compact) JSON rendering of the merged value.
    pub canonical_json: String,
    /// The merged value itself.
    pub config_json: Value,
}

/// Read YAML documents from disk and merge them in order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for path in paths {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read yaml path: {path}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// Merge YAML documents in order: earlier docs are base, later docs
/// override. Scalars and arrays replace; maps merge recursively.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let as_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let as_json = serde_json::to_value(as_yaml).context("yaml->json conversion failed")?;
        merged = merge_layer(merged, as_json);
    }

    // serde_json's default map is ordered by key, so serialization of the
    // merged value is canonical without extra work.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());

    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn merge_layer(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let base_val = base_map.remove(&key).unwrap_or(Value::Null);
                base_map.insert(key, merge_layer(base_val, overlay_val));
            }
            Value::Object(base_map)
        }
        (_, overlay_other) => overlay_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layer_overrides_earlier_scalars() {
        let base = "provider:\n  product_count: 4\n  static_source: github\n";
        let overlay = "provider:\n  product_count: 8\n";
        let loaded = load_layered_yaml_from_strings(&[base, overlay]).unwrap();
        assert_eq!(
            loaded.config_json.pointer("/provider/product_count"),
            Some(&serde_json::json!(8))
        );
        assert_eq!(
            loaded
                .config_json
                .pointer("/provider/static_source")
                .and_then(|v| v.as_str()),
            Some("github")
        );
    }

    #[test]
    fn hash_is_sha256_hex() {
        let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
        assert_eq!(loaded.config_hash.len(), 64);
        assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(load_layered_yaml_from_strings(&["foo: [unclosed"]).is_err());
    }
}
