use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Stored in place of an average when either score is missing or non-numeric.
pub const UNAVAILABLE_SENTINEL: &str = "N/A";

/// Mean of the two model scores, or an explicit marker that it could not be computed.
///
/// Serialized as a bare number or as the string `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageScore {
    Score(f64),
    Unavailable,
}

impl AverageScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            AverageScore::Score(v) => Some(*v),
            AverageScore::Unavailable => None,
        }
    }

    pub fn band(&self) -> ScoreBand {
        match self {
            AverageScore::Score(v) if *v >= 8.0 => ScoreBand::Strong,
            AverageScore::Score(v) if *v >= 5.0 => ScoreBand::Moderate,
            AverageScore::Score(_) => ScoreBand::Weak,
            AverageScore::Unavailable => ScoreBand::Unscored,
        }
    }
}

impl Serialize for AverageScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AverageScore::Score(v) => serializer.serialize_f64(*v),
            AverageScore::Unavailable => serializer.serialize_str(UNAVAILABLE_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for AverageScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_f64()
            .map(AverageScore::Score)
            .unwrap_or(AverageScore::Unavailable))
    }
}

/// Display band for an average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
    Unscored,
}

/// Integer coercion for a score value found in model output or stored data.
///
/// Integers pass through, floats only when they have no fractional part,
/// strings only when they parse as an integer. Everything else is `None`.
pub fn coerce_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parses the review model's reply, which is asked to be a bare number.
/// Tolerates a trailing period and an `/10` suffix; anything else is unavailable.
pub fn parse_review_score(text: &str) -> Option<i64> {
    let trimmed = text.trim().trim_end_matches('.');
    let trimmed = trimmed.strip_suffix("/10").unwrap_or(trimmed).trim();
    trimmed.parse::<i64>().ok()
}

/// Scores are on a 1 to 10 scale.
pub const SCORE_RANGE: RangeInclusive<i64> = 1..=10;

/// Mean of two in-range scores. A missing or out-of-range score makes the
/// average unavailable.
pub fn average_scores(first: Option<i64>, second: Option<i64>) -> AverageScore {
    let in_range = |s: Option<i64>| s.filter(|v| SCORE_RANGE.contains(v));
    match (in_range(first), in_range(second)) {
        (Some(a), Some(b)) => AverageScore::Score((a + b) as f64 / 2.0),
        _ => AverageScore::Unavailable,
    }
}
