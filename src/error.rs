use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("API error: {0}")]
    Api(String),

    /// A successful response whose body is not the JSON we asked for.
    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for LabError {
    fn from(err: reqwest::Error) -> Self {
        LabError::Api(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LabError>;
