//! Control protocol between plugins and the pipeline.

use herald_common::Reply;

/// What a plugin tells the pipeline after running.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Signal {
    /// Hand over to the next plugin (or to `execute` after the last one).
    #[default]
    Next,
    /// Abort silently.
    Stop,
    /// Abort and send this reply.
    StopWith(Reply),
}

impl Signal {
    pub fn stop_with(reply: impl Into<Reply>) -> Self {
        Self::StopWith(reply.into())
    }

    pub fn is_next(&self) -> bool {
        matches!(self, Self::Next)
    }
}

/// Result of running a whole plugin chain.
#[derive(Debug)]
pub enum Outcome {
    /// Every plugin returned [`Signal::Next`].
    Proceed,
    /// A plugin stopped the chain, optionally with a reply.
    Halted {
        plugin: String,
        reply: Option<Reply>,
    },
    /// A plugin returned an error or panicked.
    Failed {
        plugin: String,
        error: anyhow::Error,
    },
}

impl Outcome {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}
