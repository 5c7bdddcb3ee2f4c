use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Action log error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not render configuration: {0}")]
    Toml(#[from] toml::ser::Error),
}
