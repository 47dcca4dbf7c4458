// bucketDuration values: "<n><unit>" with unit ms, s, mn/min, h or d.

use std::str::FromStr;

use super::ParamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketDuration {
    millis: i64,
}

impl BucketDuration {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, ParamError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

impl FromStr for BucketDuration {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParamError(format!("Invalid bucketDuration [{s}]"));
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (amount, unit) = s.split_at(split);
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        let unit_ms: i64 = match unit {
            "ms" => 1,
            "s" => 1_000,
            "mn" | "min" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            _ => return Err(invalid()),
        };
        let millis = amount.checked_mul(unit_ms).ok_or_else(invalid)?;
        Ok(Self { millis })
    }
}
