/// Errors raised while loading or validating a study configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The configuration file could not be read.
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  /// The configuration document is not valid JSON for a study.
  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_json::Error),

  /// A field holds a value the study cannot run with.
  #[error("invalid config field '{field}': {message}")]
  Invalid { field: String, message: String },
}

impl ConfigError {
  pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Invalid {
      field: field.into(),
      message: message.into(),
    }
  }
}
