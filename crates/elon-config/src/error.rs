#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse elon.toml: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
