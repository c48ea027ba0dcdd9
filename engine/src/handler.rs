// The envelope carries the request as a JSON-encoded string in `body`.
// Validation stops at "is a JSON object" and the response omits the probability.

use crate::engine::Predictor;
use crate::types::{record_from_json, HandlerPrediction};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    fn json(status_code: u16, payload: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: payload.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::json(400, &json!({ "error": message }))
    }

    pub fn internal_error(err: &anyhow::Error) -> Self {
        Self::json(
            500,
            &json!({ "error": err.to_string(), "trace": format!("{:?}", err) }),
        )
    }

    pub fn ok(prediction: &HandlerPrediction) -> Self {
        let payload = serde_json::to_value(prediction).unwrap_or(Value::Null);
        Self::json(200, &payload)
    }
}

enum Failure {
    BadRequest(&'static str),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Internal(err)
    }
}

pub fn handle_event(predictor: &Predictor, event: &Value) -> HandlerResponse {
    match process(predictor, event) {
        Ok(prediction) => {
            info!(
                "Handled invocation: prediction={} status={}",
                prediction.prediction, prediction.addiction_status
            );
            HandlerResponse::ok(&prediction)
        }
        Err(Failure::BadRequest(message)) => {
            warn!("Rejected invocation: {}", message);
            HandlerResponse::bad_request(message)
        }
        Err(Failure::Internal(err)) => {
            error!("Invocation failed: {:#}", err);
            HandlerResponse::internal_error(&err)
        }
    }
}

// Artifacts load before the event is read; a load failure writes nothing.
pub fn invoke<W, F>(artifacts_dir: &Path, read_event: F, output: &mut W) -> anyhow::Result<()>
where
    W: Write,
    F: FnOnce() -> anyhow::Result<String>,
{
    let predictor = Predictor::load(artifacts_dir).with_context(|| {
        format!(
            "failed to load model artifacts from {}",
            artifacts_dir.display()
        )
    })?;

    let event = read_event().and_then(|raw| {
        serde_json::from_str::<Value>(&raw).context("event is not valid JSON")
    });
    let response = match event {
        Ok(event) => handle_event(&predictor, &event),
        Err(err) => {
            error!("Invocation failed: {:#}", err);
            HandlerResponse::internal_error(&err)
        }
    };

    serde_json::to_writer(&mut *output, &response)?;
    writeln!(output)?;
    Ok(())
}

fn process(predictor: &Predictor, event: &Value) -> Result<HandlerPrediction, Failure> {
    let event = event
        .as_object()
        .ok_or_else(|| anyhow!("invocation event must be a JSON object"))?;

    let body = match event.get("body") {
        Some(body) if !is_falsy(body) => body,
        _ => return Err(Failure::BadRequest("Missing request body")),
    };
    let body = body
        .as_str()
        .ok_or_else(|| anyhow!("request body must be a JSON-encoded string, got {}", body))?;

    let payload: Value = serde_json::from_str(body).context("failed to decode request body")?;
    let payload = payload
        .as_object()
        .ok_or(Failure::BadRequest("Request body must be a JSON object"))?;

    let record = record_from_json(payload).context("failed to read record")?;
    let prediction = predictor.predict(&record).context("prediction failed")?;
    Ok(HandlerPrediction::from_prediction(&prediction))
}

// same truthiness gateways apply to an absent or empty body
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
