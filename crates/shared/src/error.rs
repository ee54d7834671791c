use thiserror::Error;

use crate::domain::{Kind, Periodicity};

/// Reasons a homepage launch is abandoned. Every variant is reported to the
/// user as a transient notice; none of them escape the engine.
#[derive(Debug, Error)]
pub enum HomepageError {
    #[error("Homepage cannot be opened due to plugin unavailability.")]
    Unavailable { kind: Kind },
    #[error("Homepage \"{target}\" does not exist.")]
    MissingFile { target: String },
    #[error("Cannot find the saved layout \"{name}\" to use as the homepage.")]
    MissingLayout { name: String },
    #[error("Could not resolve the {kind} note for the homepage: {source}")]
    Periodic {
        kind: Periodicity,
        source: anyhow::Error,
    },
    #[error("Homepage could not be placed ({operation}): {source}")]
    Host {
        operation: &'static str,
        source: anyhow::Error,
    },
}

impl HomepageError {
    pub fn host(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Host { operation, source }
    }

    /// Text shown to the user in a notice.
    pub fn notice(&self) -> String {
        self.to_string()
    }

    /// Whether the failure happened before any pane was touched.
    pub fn is_pre_placement(&self) -> bool {
        matches!(
            self,
            HomepageError::Unavailable { .. }
                | HomepageError::MissingFile { .. }
                | HomepageError::MissingLayout { .. }
                | HomepageError::Periodic { .. }
        )
    }
}
