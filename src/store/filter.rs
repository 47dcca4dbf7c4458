// Tag filter matching. A value of "*" matches any value; anything else is a regex that must
// match the whole tag value.

use std::collections::BTreeMap;

use regex::Regex;

use super::{StoreError, StoreResult};
use crate::params::Tags;

enum ValueMatcher {
    Any,
    Pattern(Regex),
}

pub struct TagFilter {
    matchers: Vec<(String, ValueMatcher)>,
}

impl TagFilter {
    /// Compiles every pattern up front; a malformed one is `InvalidPattern`.
    pub fn compile(tags: &Tags) -> StoreResult<Self> {
        let mut matchers = Vec::with_capacity(tags.len());
        for (key, value) in tags.as_map() {
            let matcher = if value == "*" {
                ValueMatcher::Any
            } else {
                let re = Regex::new(&format!("^(?:{value})$")).map_err(|e| {
                    StoreError::InvalidPattern(format!(
                        "Invalid pattern [{value}] for tag [{key}]: {e}"
                    ))
                })?;
                ValueMatcher::Pattern(re)
            };
            matchers.push((key.clone(), matcher));
        }
        Ok(Self { matchers })
    }

    /// All filter keys must be present and match.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        self.matchers.iter().all(|(key, m)| match tags.get(key) {
            None => false,
            Some(v) => match m {
                ValueMatcher::Any => true,
                ValueMatcher::Pattern(re) => re.is_match(v),
            },
        })
    }
}
