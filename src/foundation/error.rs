pub type ReelResult<T> = Result<T, ReelError>;

/// Every failure an export can surface to its caller.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("resource fetch error: {resource}: {message}")]
    ResourceFetch { resource: String, message: String },

    #[error("encoder initialization error: {0}")]
    Initialization(String),

    #[error("capture error at frame {frame}: {message}")]
    Capture { frame: u64, message: String },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("data error: {0}")]
    Data(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource_fetch(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ResourceFetch {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    pub fn capture(frame: u64, msg: impl Into<String>) -> Self {
        Self::Capture {
            frame,
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Short machine-friendly name of the failure class, used in progress events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ResourceFetch { .. } => "resource_fetch",
            Self::Initialization(_) => "initialization",
            Self::Capture { .. } => "capture",
            Self::Encode(_) => "encode",
            Self::Data(_) => "data",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
