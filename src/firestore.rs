use crate::http_client::create_http_client;
use crate::store::DocumentStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Number, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Read-only client for documents hosted in Cloud Firestore
pub struct FirestoreStore {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn with_endpoint(
        endpoint: &str,
        project_id: &str,
        api_key: Option<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if project_id.trim().is_empty() {
            bail!("Firestore project id is required");
        }

        Ok(Self {
            client: create_http_client(user_agent, timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key,
        })
    }

    fn document_url(&self, collection: &str, key: &str) -> String {
        let mut url = format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.endpoint,
            urlencoding::encode(&self.project_id),
            urlencoding::encode(collection),
            urlencoding::encode(key),
        );

        if let Some(api_key) = &self.api_key {
            url.push_str("?key=");
            url.push_str(&urlencoding::encode(api_key));
        }

        url
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let url = self.document_url(collection, key);
        tracing::debug!("Fetching Firestore document {}/{}", collection, key);

        let response = self.client.get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch Firestore document {}/{}", collection, key))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Firestore returned {} for {}/{}: {}", status, collection, key, body);
        }

        let document: Value = response.json().await
            .context("Failed to parse Firestore response body")?;

        decode_document(&document).map(Some)
    }
}

/// Flattens a Firestore REST document (`{"fields": {...}}`) into plain JSON
pub fn decode_document(document: &Value) -> Result<Value> {
    match document.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields),
        Some(other) => bail!("Unexpected Firestore fields payload: {}", other),
        // Documents without fields come back with no `fields` key at all
        None => Ok(Value::Object(Map::new())),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Value> {
    let mut decoded = Map::with_capacity(fields.len());
    for (name, value) in fields {
        let value = decode_value(value)
            .with_context(|| format!("Failed to decode field '{}'", name))?;
        decoded.insert(name.clone(), value);
    }
    Ok(Value::Object(decoded))
}

/// Decodes one typed Firestore value (`{"stringValue": "..."}` and friends)
pub fn decode_value(value: &Value) -> Result<Value> {
    let Some(typed) = value.as_object() else {
        bail!("Firestore value is not an object: {}", value);
    };
    let Some((kind, inner)) = typed.iter().next() else {
        bail!("Firestore value carries no type");
    };

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().context("booleanValue is not a bool")?),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Value::String(inner.as_str().context("string-like value is not a string")?.to_string())
        }
        // int64 values travel as decimal strings
        "integerValue" => match inner {
            Value::String(s) => Value::Number(
                s.parse::<i64>()
                    .with_context(|| format!("integerValue '{}' is not an integer", s))?
                    .into(),
            ),
            Value::Number(n) => Value::Number(n.clone()),
            other => bail!("integerValue has unexpected payload {}", other),
        },
        // NaN and Infinity arrive as strings and have no JSON number form
        "doubleValue" => match inner {
            Value::Number(n) => Value::Number(n.clone()),
            Value::String(s) => s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            other => bail!("doubleValue has unexpected payload {}", other),
        },
        "geoPointValue" => {
            let lat = inner.get("latitude").and_then(Value::as_f64).unwrap_or(0.0);
            let lng = inner.get("longitude").and_then(Value::as_f64).unwrap_or(0.0);
            serde_json::json!({ "lat": lat, "lng": lng })
        }
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Value::Array(values)
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields)?,
            _ => Value::Object(Map::new()),
        },
        other => bail!("Unsupported Firestore value type '{}'", other),
    };

    Ok(decoded)
}
