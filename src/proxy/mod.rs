use std::env;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

pub const ROUTE: &str = "/.netlify/functions/getCompanies";
pub const DEFAULT_API_ROOT: &str = "https://api.airtable.com/v0";
pub const DEFAULT_TABLE_NAME: &str = "Companies";

pub const API_KEY_VAR: &str = "AIRTABLE_API_KEY";
pub const BASE_ID_VAR: &str = "AIRTABLE_BASE_ID";
pub const TABLE_NAME_VAR: &str = "AIRTABLE_TABLE_NAME";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing Airtable configuration.")]
    MissingConfiguration,

    #[error("invalid Airtable URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Airtable API responded with status {status}")]
    UpstreamStatus { status: u16 },

    #[error("{source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("{source}")]
    Decode {
        #[source]
        source: reqwest::Error,
    },
}

/// Raw configuration values as read at request time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table_name: Option<String>,
}

impl ProxySettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup(API_KEY_VAR),
            base_id: lookup(BASE_ID_VAR),
            table_name: lookup(TABLE_NAME_VAR),
        }
    }

    /// Empty values count as missing. The table name falls back to the default.
    pub fn resolve(&self) -> Result<AirtableTable, ProxyError> {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let api_key = present(&self.api_key).ok_or(ProxyError::MissingConfiguration)?;
        let base_id = present(&self.base_id).ok_or(ProxyError::MissingConfiguration)?;
        let table_name =
            present(&self.table_name).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
        Ok(AirtableTable {
            api_key,
            base_id,
            table_name,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AirtableTable {
    pub api_key: String,
    pub base_id: String,
    pub table_name: String,
}

impl AirtableTable {
    /// `{api_root}/{base_id}/{table_name}` with each identifier encoded as a
    /// single path segment.
    pub fn url(&self, api_root: &str) -> Result<reqwest::Url, ProxyError> {
        let invalid = |message: String| ProxyError::InvalidUrl {
            url: api_root.to_string(),
            message,
        };
        let mut url = reqwest::Url::parse(api_root).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table_name);
        Ok(url)
    }
}

/// `records` from an upstream body; anything absent or falsy becomes `[]`.
pub fn extract_records(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("records") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => json!([]),
            Some(Value::String(s)) if s.is_empty() => json!([]),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => json!([]),
            Some(records) => records,
        },
        _ => json!([]),
    }
}

pub async fn fetch_records(
    client: &reqwest::Client,
    api_root: &str,
    table: &AirtableTable,
) -> Result<Value, ProxyError> {
    let url = table.url(api_root)?;
    debug!(%url, "fetching Airtable records");
    let resp = client
        .get(url)
        .bearer_auth(&table.api_key)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .send()
        .await
        .map_err(|e| ProxyError::Transport { source: e })?;
    if !resp.status().is_success() {
        return Err(ProxyError::UpstreamStatus {
            status: resp.status().as_u16(),
        });
    }
    let body = resp
        .json::<Value>()
        .await
        .map_err(|e| ProxyError::Decode { source: e })?;
    Ok(extract_records(body))
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProxyReply {
    pub status: u16,
    pub body: Value,
    pub allow_any_origin: bool,
}

impl ProxyReply {
    fn ok(records: Value) -> Self {
        Self {
            status: 200,
            body: records,
            allow_any_origin: true,
        }
    }

    fn error(err: &ProxyError) -> Self {
        Self {
            status: 500,
            body: json!({ "error": err.to_string() }),
            allow_any_origin: false,
        }
    }
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = (status, Json(self.body)).into_response();
        if self.allow_any_origin {
            resp.headers_mut().insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
        resp
    }
}

/// One proxied request: resolve config, call upstream once, shape the reply.
pub async fn get_companies(
    client: &reqwest::Client,
    api_root: &str,
    settings: &ProxySettings,
) -> ProxyReply {
    let result = match settings.resolve() {
        Ok(table) => fetch_records(client, api_root, &table).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(records) => ProxyReply::ok(records),
        Err(e) => {
            error!(error = %e, "getCompanies failed");
            ProxyReply::error(&e)
        }
    }
}

#[derive(Clone, Debug)]
pub enum SettingsSource {
    Environment,
    Fixed(ProxySettings),
}

impl SettingsSource {
    pub fn current(&self) -> ProxySettings {
        match self {
            SettingsSource::Environment => ProxySettings::from_env(),
            SettingsSource::Fixed(settings) => settings.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProxyState {
    pub client: reqwest::Client,
    pub api_root: String,
    pub settings: SettingsSource,
}

impl ProxyState {
    pub fn new(client: reqwest::Client, api_root: &str, settings: SettingsSource) -> Self {
        Self {
            client,
            api_root: api_root.to_string(),
            settings,
        }
    }
}

async fn get_companies_handler(State(state): State<Arc<ProxyState>>) -> ProxyReply {
    let settings = state.settings.current();
    get_companies(&state.client, &state.api_root, &settings).await
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(ROUTE, get(get_companies_handler))
        .with_state(state)
}
