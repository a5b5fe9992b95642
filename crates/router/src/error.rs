use herald_channels::PayloadKind;

/// Why one dispatch did not complete normally.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no {kind} module named `{name}`")]
    ModuleNotFound { name: String, kind: PayloadKind },

    #[error("module `{module}` rejected its arguments")]
    ArgumentParseFailure { module: String },

    #[error("plugin `{plugin}` failed in module `{module}`: {source}")]
    PluginFailed {
        module: String,
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("module `{module}` failed during {stage}: {source}")]
    ExecutionThrew {
        module: String,
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    #[must_use]
    pub fn not_found(name: impl Into<String>, kind: PayloadKind) -> Self {
        Self::ModuleNotFound {
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub fn plugin_failed(
        module: impl Into<String>,
        plugin: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::PluginFailed {
            module: module.into(),
            plugin: plugin.into(),
            source,
        }
    }

    #[must_use]
    pub fn threw(module: impl Into<String>, stage: &'static str, source: anyhow::Error) -> Self {
        Self::ExecutionThrew {
            module: module.into(),
            stage,
            source,
        }
    }

    /// Module the failure belongs to, when one was resolved.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::ModuleNotFound { .. } => None,
            Self::ArgumentParseFailure { module }
            | Self::PluginFailed { module, .. }
            | Self::ExecutionThrew { module, .. } => Some(module),
        }
    }

    /// Dispatch step the failure happened in.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ModuleNotFound { .. } => "resolve",
            Self::ArgumentParseFailure { .. } => "parse",
            Self::PluginFailed { .. } => "plugins",
            Self::ExecutionThrew { stage, .. } => stage,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
