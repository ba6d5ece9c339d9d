use std::time::Duration;
use thiserror::Error;

/// Failure surfaced by a provider call after construction succeeded.
///
/// Kept separate from [`SolverError`] so call sites can classify a failure
/// (transient vs permanent) before deciding whether the attempt is salvageable.
#[derive(Debug, Clone)]
pub enum ProviderError {
    RateLimited {
        retry_after_secs: Option<u64>,
    },
    Server {
        status: u16,
        message: String,
    },
    Api {
        status: u16,
        message: String,
    },
    Network(String),
    /// Response arrived but did not contain a usable completion.
    MalformedResponse(String),
    /// Conversation session misuse (missing or duplicate session id).
    Session(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network(_)
        )
    }

    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    pub fn suggested_delay(&self) -> Duration {
        match self {
            Self::RateLimited { retry_after_secs } => {
                Duration::from_secs(retry_after_secs.unwrap_or(30))
            }
            Self::Server { .. } | Self::Network(_) => Duration::from_secs(5),
            _ => Duration::from_secs(0),
        }
    }

    /// Classify an HTTP error response. 429 and 5xx are transient, other
    /// 4xx are permanent API rejections.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited {
                retry_after_secs: Self::extract_retry_after(&body),
            },
            s if s >= 500 => Self::Server {
                status: s,
                message: body,
            },
            s => Self::Api {
                status: s,
                message: body,
            },
        }
    }

    fn extract_retry_after(msg: &str) -> Option<u64> {
        let msg_lower = msg.to_lowercase();
        for pattern in ["retry after ", "retry-after: ", "retry_after="] {
            if let Some(idx) = msg_lower.find(pattern) {
                let after_pattern = &msg_lower[idx + pattern.len()..];
                let num_str: String = after_pattern
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                if let Ok(secs) = num_str.parse() {
                    return Some(secs);
                }
            }
        }
        None
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "Rate limited, retry after {}s", secs)
                } else {
                    write!(f, "Rate limited")
                }
            }
            Self::Server { status, message } => {
                write!(f, "Server error {}: {}", status, message)
            }
            Self::Api { status, message } => {
                write!(f, "API error {}: {}", status, message)
            }
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            Self::Session(msg) => write!(f, "Session error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("Unknown provider kind: {0}")]
    UnknownProviderKind(String),

    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("System message must be the first entry in session: {0}")]
    MisplacedSystemMessage(String),

    #[error("Attempt budget must be at least 1, got {0}")]
    InvalidAttemptBudget(u32),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Judge error: {0}")]
    Judge(String),

    #[error("Compiler not available: {0}")]
    CompilerNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid phase transition: {from} -> {to} (allowed: {allowed})")]
    InvalidPhaseTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("Solve cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

impl From<ProviderError> for SolverError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited { retry_after_secs } => {
                let msg = retry_after_secs
                    .map(|s| format!("rate limited, retry after {}s", s))
                    .unwrap_or_else(|| "rate limited".to_string());
                SolverError::Generation(msg)
            }
            ProviderError::Server { status, message } => {
                SolverError::Generation(format!("server error {}: {}", status, message))
            }
            ProviderError::Api { status, message } => {
                SolverError::Generation(format!("API error {}: {}", status, message))
            }
            ProviderError::Network(msg) => {
                SolverError::Generation(format!("network: {}", msg))
            }
            ProviderError::MalformedResponse(msg) => {
                SolverError::Generation(format!("malformed response: {}", msg))
            }
            ProviderError::Session(msg) => SolverError::Generation(format!("session: {}", msg)),
        }
    }
}
