use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("could not parse GitHub repo from URL: {0}")]
    RemoteUrl(String),

    #[error("{0}")]
    Credential(String),

    #[error("GitHub API error: {status} - {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<git2::Error> for TidyError {
    fn from(error: git2::Error) -> Self {
        TidyError::Git(error.message().to_string())
    }
}

pub type Result<T> = std::result::Result<T, TidyError>;
