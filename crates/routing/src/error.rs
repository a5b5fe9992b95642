use crate::kind::Namespace;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two modules claim the same name or alias in one namespace.
    #[error("`{name}` is already registered in the {namespace} namespace")]
    RegistrationConflict { name: String, namespace: Namespace },

    #[error("module `{name}` rejected by init plugin `{plugin}`: {reason}")]
    ModuleRejectedAtInit {
        name: String,
        plugin: String,
        reason: String,
    },

    #[error("module `{name}` declares unknown type `{given}`")]
    InvalidModuleType { name: String, given: String },
}

impl Error {
    #[must_use]
    pub fn conflict(name: impl Into<String>, namespace: Namespace) -> Self {
        Self::RegistrationConflict {
            name: name.into(),
            namespace,
        }
    }

    #[must_use]
    pub fn rejected(
        name: impl Into<String>,
        plugin: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ModuleRejectedAtInit {
            name: name.into(),
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invalid_type(name: impl Into<String>, given: impl Into<String>) -> Self {
        Self::InvalidModuleType {
            name: name.into(),
            given: given.into(),
        }
    }

    /// Only conflicts abort boot; everything else drops the one module.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RegistrationConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
