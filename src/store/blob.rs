// Tag BLOB encoding: [version: u8][wincode payload].

use std::collections::BTreeMap;

use wincode::{SchemaRead, SchemaWrite};

use super::{StoreError, StoreResult};

pub(super) const BLOB_VERSION: u8 = 1;

#[derive(SchemaRead, SchemaWrite)]
struct TagPair {
    key: String,
    value: String,
}

#[derive(SchemaRead, SchemaWrite)]
struct StoredTags {
    pairs: Vec<TagPair>,
}

pub(super) fn encode_tags(tags: &BTreeMap<String, String>) -> StoreResult<Vec<u8>> {
    let stored = StoredTags {
        pairs: tags
            .iter()
            .map(|(k, v)| TagPair {
                key: k.clone(),
                value: v.clone(),
            })
            .collect(),
    };
    let payload =
        wincode::serialize(&stored).map_err(|e| StoreError::Codec(format!("wincode: {}", e)))?;
    Ok(with_version_prefix(BLOB_VERSION, payload))
}

pub(super) fn decode_tags(bytes: &[u8]) -> StoreResult<BTreeMap<String, String>> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }
    if bytes[0] != BLOB_VERSION {
        return Err(StoreError::Codec(format!(
            "unknown tag blob version {}",
            bytes[0]
        )));
    }
    let stored: StoredTags = wincode::deserialize(&bytes[1..])
        .map_err(|e| StoreError::Codec(format!("wincode deserialize tags: {}", e)))?;
    Ok(stored
        .pairs
        .into_iter()
        .map(|p| (p.key, p.value))
        .collect())
}

fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}
