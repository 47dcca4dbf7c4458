// Multi-metric selection: by tag filters or by explicit names, never both.

use super::{ParamError, Tags};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSelector {
    Tags(Tags),
    Names(Vec<String>),
}

impl MetricSelector {
    pub fn resolve(names: Vec<String>, tags: Option<Tags>) -> Result<Self, ParamError> {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let tags = tags.filter(|t| !t.is_empty());
        match (names.is_empty(), tags) {
            (true, None) => Err(ParamError::new(
                "Either metrics or tags parameter must be used",
            )),
            (false, Some(_)) => Err(ParamError::new(
                "Cannot use both the metrics and tags parameters",
            )),
            (true, Some(tags)) => Ok(MetricSelector::Tags(tags)),
            (false, None) => Ok(MetricSelector::Names(names)),
        }
    }
}
