use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid search service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not connect to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("{}", format_status(.status, .url, .body))]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to parse search response JSON (url={url}): {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected search response: {0}")]
    Response(String),

    #[error("record is missing field `{field}`")]
    MissingField { field: String },

    #[error("{0}")]
    Usage(String),

    #[error("index {index} out of range for result set of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Connection,
    Timeout,
    ResponseFormat,
    Usage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Url(_) | Error::Config(_) => ErrorKind::Config,
            Error::Connection { .. } | Error::Status { .. } => ErrorKind::Connection,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::InvalidJson { .. } | Error::Response(_) | Error::MissingField { .. } => {
                ErrorKind::ResponseFormat
            }
            Error::Usage(_) | Error::IndexOutOfRange { .. } => ErrorKind::Usage,
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        Error::MissingField {
            field: field.to_string(),
        }
    }
}

// Solr replies to bad queries with {"responseHeader":{...},"error":{"msg":...,"code":...}}
#[derive(Debug, serde::Deserialize)]
struct SolrErrorResponse {
    error: SolrError,
}

#[derive(Debug, serde::Deserialize)]
struct SolrError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    code: Option<u16>,
}

const MAX_BODY_IN_ERROR: usize = 512;

fn format_status(status: &u16, url: &str, body: &str) -> String {
    let status = *status;
    if let Ok(err) = serde_json::from_str::<SolrErrorResponse>(body) {
        let code = err.error.code.unwrap_or(status);
        let msg = err.error.msg.as_deref().unwrap_or("");
        return format!(
            "search request failed: HTTP {} for url ({})\nServer message: {}",
            code, url, msg
        );
    }

    let hint = match StatusCode::from_u16(status) {
        Ok(StatusCode::NOT_FOUND) => {
            "\n- The configured service URL may be wrong; it usually ends in /esg-search/search"
        }
        _ => "",
    };

    let mut text = body.trim();
    if text.len() > MAX_BODY_IN_ERROR {
        let mut end = MAX_BODY_IN_ERROR;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text = &text[..end];
    }

    format!(
        "search request failed: HTTP {} for url ({}){}\n{}",
        status, url, hint, text
    )
}
