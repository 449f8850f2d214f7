use thiserror::Error;

/// Failure of a single analysis, search or export operation.
///
/// None of these leave the session in a half-updated state: the previously
/// displayed batch stays in place whatever goes wrong.
#[derive(Error, Debug)]
pub enum ReviewError {
  /// Bad or missing input, reported in place and never retried
  #[error("{message}")]
  Validation { message: String },

  #[error(transparent)]
  Transport(#[from] TransportError),

  /// The analysis backend answered with its own error payload
  #[error("{message}")]
  Upstream { message: String },
}

#[derive(Error, Debug)]
pub enum TransportError {
  #[error("Analysis timed out after {secs} seconds. Try a smaller file or try again later.")]
  Timeout { secs: u64 },

  #[error("The analysis service returned an unreadable response: {message}")]
  MalformedResponse { message: String },

  #[error("Could not reach the analysis service: {message}")]
  Connectivity { message: String },
}

impl ReviewError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation { message: message.into() }
  }

  pub fn upstream(message: impl Into<String>) -> Self {
    Self::Upstream { message: message.into() }
  }

  pub fn timeout(secs: u64) -> Self {
    Self::Transport(TransportError::Timeout { secs })
  }

  pub fn malformed(message: impl Into<String>) -> Self {
    Self::Transport(TransportError::MalformedResponse { message: message.into() })
  }

  pub fn connectivity(message: impl Into<String>) -> Self {
    Self::Transport(TransportError::Connectivity { message: message.into() })
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation { .. })
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::Transport(TransportError::Timeout { .. }))
  }
}

impl From<serde_json::Error> for ReviewError {
  fn from(err: serde_json::Error) -> Self {
    Self::malformed(err.to_string())
  }
}

impl From<reqwest::Error> for ReviewError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() || err.is_body() {
      Self::malformed(err.to_string())
    } else {
      Self::connectivity(err.to_string())
    }
  }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
