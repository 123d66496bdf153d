use thiserror::Error;

use crate::feed::ArticleId;

/// Why a poll cycle stopped early. None of these are fatal to the process;
/// the next cycle recomputes everything from the stored cursor.
#[derive(Error, Debug)]
pub enum CycleError {
    /// Feed unreachable or malformed. Nothing was sent, cursor untouched.
    #[error("fetch failed: {0}")]
    Fetch(#[source] crate::Error),

    /// Sending `article` failed after `delivered` earlier articles went out.
    /// The cursor points at the last of those.
    #[error("send failed for {article} after {delivered} delivered: {source}")]
    Send {
        delivered: usize,
        article: ArticleId,
        #[source]
        source: crate::Error,
    },

    /// Cursor could not be read or written; progress cannot be trusted.
    #[error("cursor store failed after {delivered} delivered: {source}")]
    State {
        delivered: usize,
        #[source]
        source: crate::Error,
    },
}

impl CycleError {
    /// Stage name for logs and scheduler events
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Fetch(_) => "fetch",
            CycleError::Send { .. } => "send",
            CycleError::State { .. } => "state",
        }
    }

    /// Articles successfully sent before the failure
    pub fn delivered(&self) -> usize {
        match self {
            CycleError::Fetch(_) => 0,
            CycleError::Send { delivered, .. } | CycleError::State { delivered, .. } => *delivered,
        }
    }

    pub(crate) fn state(source: crate::Error) -> Self {
        CycleError::State {
            delivered: 0,
            source,
        }
    }
}
