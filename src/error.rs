use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewTaskError {
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("Missing required pipeline variable: {0}")]
    MissingVariable(&'static str),

    #[error("Azure DevOps API {method} returned {status}: {body}")]
    Api {
        method: &'static str,
        status: u16,
        body: String,
    },

    #[error("AI handler error: {0}")]
    AiHandler(String),

    #[error("Git diff failed: {0}")]
    GitDiff(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<figment::Error> for ReviewTaskError {
    fn from(err: figment::Error) -> Self {
        ReviewTaskError::Config(Box::new(err))
    }
}
