use crate::error::{validation_error, AppError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    // each item is one-hot encoded on its own
    TextList(Vec<String>),
}

pub type Record = BTreeMap<String, FeatureValue>;

// Booleans become 0/1. `null`, nested objects and lists of non-strings
// cannot be encoded and are rejected; an absent field is simply omitted.
pub fn record_from_json(object: &Map<String, Value>) -> Result<Record, AppError> {
    let mut record = Record::new();
    for (key, value) in object {
        let feature = match value {
            Value::Null => {
                return Err(validation_error(&format!(
                    "field '{}' has unsupported value null",
                    key
                )))
            }
            Value::Bool(flag) => FeatureValue::Number(if *flag { 1.0 } else { 0.0 }),
            Value::Number(n) => FeatureValue::Number(n.as_f64().ok_or_else(|| {
                validation_error(&format!("field '{}' is not a finite number", key))
            })?),
            Value::String(s) => FeatureValue::Text(s.clone()),
            Value::Array(items) => FeatureValue::TextList(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(validation_error(&format!(
                            "field '{}' contains unsupported list item {}",
                            key, other
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Object(_) => {
                return Err(validation_error(&format!(
                    "field '{}' has unsupported value type object",
                    key
                )))
            }
        };
        record.insert(key.clone(), feature);
    }
    Ok(record)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionInput {
    pub age: i64,
    pub gender: String,
    pub academic_level: String,
    pub avg_daily_usage_hours: f64,
    pub most_used_platform: String,
    pub sleep_hours_per_night: f64,
    pub mental_health_score: i64,
    pub conflicts_over_social_media: i64,
    pub affects_academic_performance: String,
    pub relationship_status: String,
}

impl From<PredictionInput> for Record {
    fn from(input: PredictionInput) -> Self {
        let mut record = Record::new();
        let mut number = |key: &str, v: f64| {
            record.insert(key.to_string(), FeatureValue::Number(v));
        };
        number("age", input.age as f64);
        number("avg_daily_usage_hours", input.avg_daily_usage_hours);
        number("sleep_hours_per_night", input.sleep_hours_per_night);
        number("mental_health_score", input.mental_health_score as f64);
        number(
            "conflicts_over_social_media",
            input.conflicts_over_social_media as f64,
        );

        for (key, value) in [
            ("gender", input.gender),
            ("academic_level", input.academic_level),
            ("most_used_platform", input.most_used_platform),
            (
                "affects_academic_performance",
                input.affects_academic_performance,
            ),
            ("relationship_status", input.relationship_status),
        ] {
            record.insert(key.to_string(), FeatureValue::Text(value));
        }
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddictionStatus {
    #[serde(rename = "Addicted")]
    Addicted,
    #[serde(rename = "Not Addicted")]
    NotAddicted,
}

impl AddictionStatus {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            AddictionStatus::Addicted
        } else {
            AddictionStatus::NotAddicted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddictionStatus::Addicted => "Addicted",
            AddictionStatus::NotAddicted => "Not Addicted",
        }
    }
}

impl fmt::Display for AddictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: u8,
    pub probability: f64,
}

impl Prediction {
    pub fn status(&self) -> AddictionStatus {
        AddictionStatus::from_label(self.label)
    }
}

// HTTP shape carries the probability, the handler shape does not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: u8,
    pub probability: f64,
    pub addiction_status: AddictionStatus,
}

impl PredictionResponse {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        Self {
            prediction: prediction.label,
            probability: prediction.probability,
            addiction_status: prediction.status(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerPrediction {
    pub prediction: u8,
    pub addiction_status: AddictionStatus,
}

impl HandlerPrediction {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        Self {
            prediction: prediction.label,
            addiction_status: prediction.status(),
        }
    }
}
