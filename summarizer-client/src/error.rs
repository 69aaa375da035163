use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("Bad backend response: {message}")]
    BadResponse { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid backend preset: {0}")]
    InvalidPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BackendError {
    /// Whether this error indicates the backend could not be reached at all,
    /// as opposed to reaching it and getting a response we could not use.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackendError::Unavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
