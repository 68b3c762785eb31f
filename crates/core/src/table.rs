//! Table lifecycle states and the pure decisions taken while polling them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Table status as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableStatus {
    Creating,
    Updating,
    Active,
    Deleting,
    Archiving,
    Archived,
    InaccessibleEncryptionCredentials,
    Unknown(String),
}

impl TableStatus {
    /// Parses the wire representation (`"ACTIVE"`, `"CREATING"`, ...).
    pub fn parse(value: &str) -> Self {
        match value {
            "CREATING" => Self::Creating,
            "UPDATING" => Self::Updating,
            "ACTIVE" => Self::Active,
            "DELETING" => Self::Deleting,
            "ARCHIVING" => Self::Archiving,
            "ARCHIVED" => Self::Archived,
            "INACCESSIBLE_ENCRYPTION_CREDENTIALS" => Self::InaccessibleEncryptionCredentials,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Active => "ACTIVE",
            Self::Deleting => "DELETING",
            Self::Archiving => "ARCHIVING",
            Self::Archived => "ARCHIVED",
            Self::InaccessibleEncryptionCredentials => "INACCESSIBLE_ENCRYPTION_CREDENTIALS",
            Self::Unknown(other) => other,
        }
    }

    /// True while the table is transitioning towards `Active`.
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Creating | Self::Updating)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a table returned by a describe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub table_name: String,
    pub status: TableStatus,
    pub item_count: Option<i64>,
}

/// What the activation poll loop should do after one describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// The table is usable.
    Ready,
    /// The table is still transitioning; poll again.
    Wait,
    /// The table will not become usable; give up.
    Abort(AbortReason),
}

/// Why the poll loop gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Describe returned no table.
    Missing,
    /// The table reached a status it cannot leave on its own.
    Unusable(TableStatus),
    /// The poll budget ran out before the table became active.
    Timeout { polls: u32 },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "table not found while waiting for activation"),
            Self::Unusable(status) => write!(f, "table entered unrecoverable status {status}"),
            Self::Timeout { polls } => write!(f, "table not active after {polls} polls"),
        }
    }
}

/// Pure function: Decide the next step from the status seen on a poll.
///
/// `attempt` is zero-based; the loop aborts on the last attempt of the
/// budget rather than polling one extra time.
pub fn poll_decision(status: Option<&TableStatus>, attempt: u32, max_polls: u32) -> PollDecision {
    match status {
        None => PollDecision::Abort(AbortReason::Missing),
        Some(TableStatus::Active) => PollDecision::Ready,
        Some(status) if status.is_transitional() => {
            if attempt + 1 >= max_polls {
                PollDecision::Abort(AbortReason::Timeout { polls: max_polls })
            } else {
                PollDecision::Wait
            }
        }
        Some(status) => PollDecision::Abort(AbortReason::Unusable(status.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            TableStatus::Creating,
            TableStatus::Updating,
            TableStatus::Active,
            TableStatus::Deleting,
            TableStatus::Archiving,
            TableStatus::Archived,
            TableStatus::InaccessibleEncryptionCredentials,
        ] {
            assert_eq!(TableStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_status_parse_unknown() {
        assert_eq!(
            TableStatus::parse("REPLICATING"),
            TableStatus::Unknown("REPLICATING".to_string())
        );
        assert_eq!(TableStatus::parse("REPLICATING").to_string(), "REPLICATING");
    }

    #[test]
    fn test_transitional_statuses() {
        assert!(TableStatus::Creating.is_transitional());
        assert!(TableStatus::Updating.is_transitional());
        assert!(!TableStatus::Active.is_transitional());
        assert!(!TableStatus::Deleting.is_transitional());
    }

    #[test]
    fn test_poll_decision_missing_table_aborts() {
        assert_eq!(
            poll_decision(None, 0, 16),
            PollDecision::Abort(AbortReason::Missing)
        );
    }

    #[test]
    fn test_poll_decision_active_is_ready() {
        assert_eq!(
            poll_decision(Some(&TableStatus::Active), 3, 16),
            PollDecision::Ready
        );
    }

    #[test]
    fn test_poll_decision_creating_waits_until_budget() {
        assert_eq!(
            poll_decision(Some(&TableStatus::Creating), 0, 16),
            PollDecision::Wait
        );
        assert_eq!(
            poll_decision(Some(&TableStatus::Updating), 14, 16),
            PollDecision::Wait
        );
        assert_eq!(
            poll_decision(Some(&TableStatus::Creating), 15, 16),
            PollDecision::Abort(AbortReason::Timeout { polls: 16 })
        );
    }

    #[test]
    fn test_poll_decision_active_on_last_attempt_is_ready() {
        assert_eq!(
            poll_decision(Some(&TableStatus::Active), 15, 16),
            PollDecision::Ready
        );
    }

    #[test]
    fn test_poll_decision_other_status_aborts() {
        assert_eq!(
            poll_decision(Some(&TableStatus::Deleting), 0, 16),
            PollDecision::Abort(AbortReason::Unusable(TableStatus::Deleting))
        );
    }

    #[test]
    fn test_abort_reason_display() {
        assert_eq!(
            AbortReason::Timeout { polls: 16 }.to_string(),
            "table not active after 16 polls"
        );
        assert_eq!(
            AbortReason::Unusable(TableStatus::Archived).to_string(),
            "table entered unrecoverable status ARCHIVED"
        );
    }
}
