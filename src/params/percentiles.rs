// Requested percentile columns, in request order.

use super::ParamError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Percentiles(Vec<f64>);

impl Percentiles {
    /// Comma-separated floats. Absent or blank input yields no percentiles.
    /// Range and duplicates are left to the store.
    pub fn parse(raw: Option<&str>) -> Result<Self, ParamError> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let mut out = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let v: f64 = part
                .parse()
                .map_err(|_| ParamError(format!("Invalid percentile value [{part}]")))?;
            out.push(v);
        }
        Ok(Self(out))
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
