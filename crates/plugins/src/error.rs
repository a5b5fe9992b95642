use herald_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing argument: {name}")]
    MissingArgument { name: String },

    #[error("arguments are not of the {expected} shape")]
    WrongShape { expected: &'static str },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }

    #[must_use]
    pub fn wrong_shape(expected: &'static str) -> Self {
        Self::WrongShape { expected }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

herald_common::impl_context!();

pub type Result<T> = std::result::Result<T, Error>;
