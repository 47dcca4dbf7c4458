// Tag filters from the `tags` query parameter: "key:value,key2:value2".

use std::collections::BTreeMap;

use super::ParamError;

/// Tag key to value pattern. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, ParamError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let mut map = BTreeMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = split_pair(pair)?;
            if map.insert(key.to_string(), value.to_string()).is_some() {
                return Err(ParamError(format!("Duplicate tag key [{key}]")));
            }
        }
        Ok(Some(Self(map)))
    }

    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Splits on the first ':' or '='.
fn split_pair(pair: &str) -> Result<(&str, &str), ParamError> {
    let idx = pair
        .find([':', '='])
        .ok_or_else(|| ParamError(format!("Invalid tag [{pair}], expected key:value")))?;
    let key = pair[..idx].trim();
    let value = pair[idx + 1..].trim();
    if key.is_empty() {
        return Err(ParamError(format!("Invalid tag [{pair}], key is empty")));
    }
    if value.is_empty() {
        return Err(ParamError(format!("Invalid tag [{pair}], value is empty")));
    }
    Ok((key, value))
}
