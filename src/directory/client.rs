use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// What the data proxy handed back, before any grouping.
#[derive(Clone, Debug, PartialEq)]
pub enum LivePayload {
    Records(Vec<Value>),
    Empty,
    NotAList,
}

impl LivePayload {
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Array(records) if records.is_empty() => LivePayload::Empty,
            Value::Array(records) => LivePayload::Records(records),
            _ => LivePayload::NotAList,
        }
    }
}

/// One GET against the data proxy. No retry.
pub async fn fetch_live_payload(
    client: &reqwest::Client,
    url: &str,
) -> Result<LivePayload, FetchError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = resp.json::<Value>().await.map_err(|e| FetchError::Decode {
        url: url.to_string(),
        source: e,
    })?;
    Ok(LivePayload::from_body(body))
}
