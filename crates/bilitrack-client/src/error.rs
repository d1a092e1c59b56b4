use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("throttled by upstream for {endpoint} (code {code})")]
    Throttled { endpoint: String, code: i64 },

    #[error("content gone: {id} (code {code})")]
    Gone { id: String, code: i64 },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
