use std::fmt;

/// Result of one mirror invocation, rendered as the function's return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Synced {
        source_url: String,
        branch: String,
    },
    Unsynced {
        source_url: String,
        branch: String,
        reason: String,
    },
}

impl MirrorOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Synced { source_url, branch } => format!(
                "Successfully synced repository {source_url} (branch {branch}) to CodeCommit."
            ),
            Self::Unsynced {
                source_url, branch, ..
            } => format!("Unable to sync repository {source_url} (branch {branch}) to CodeCommit."),
        }
    }
}

impl fmt::Display for MirrorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
