//! Hashing System - SHA-256 for Build Manifests
//!
//! Same source, same profile, same engine: same job hash.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// SHA-256 of bytes as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), sort_value(v))).collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Hash of a manifest's canonical form.
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(manifest)?.as_bytes()))
}

/// job_hash = sha256(profile_id:template_version:source_hash:canonical_profile:engine_version)
pub fn compute_job_hash(
    profile_id: &str,
    template_version: &str,
    source_hash: &str,
    profile: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}:{}:{}",
        profile_id,
        template_version,
        source_hash,
        canonical_json(profile)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}
