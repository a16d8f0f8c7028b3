//! Purchase state machine.

use serde::{Deserialize, Serialize};

/// Progress of a single purchase attempt.
///
/// State transitions:
/// ```text
/// Start ──► ReservationChecked ──► Locked ──► Decremented ──► Committed ──► ReservationCleared
///   │               │                 │             │
///   └───────────────┴─────────────────┴─────────────┴──► Aborted
/// ```
///
/// `Committed` is already a successful purchase. Clearing the reservation is
/// best-effort, so a purchase may finish in `Committed` without reaching
/// `ReservationCleared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PurchaseState {
    #[default]
    Start,
    ReservationChecked,
    Locked,
    Decremented,
    Committed,
    ReservationCleared,
    Aborted,
}

impl PurchaseState {
    /// Returns the state reached when the current step succeeds.
    pub fn next(&self) -> Option<PurchaseState> {
        match self {
            PurchaseState::Start => Some(PurchaseState::ReservationChecked),
            PurchaseState::ReservationChecked => Some(PurchaseState::Locked),
            PurchaseState::Locked => Some(PurchaseState::Decremented),
            PurchaseState::Decremented => Some(PurchaseState::Committed),
            PurchaseState::Committed => Some(PurchaseState::ReservationCleared),
            PurchaseState::ReservationCleared | PurchaseState::Aborted => None,
        }
    }

    /// Returns true if a failure in this state aborts the purchase.
    pub fn can_abort(&self) -> bool {
        matches!(
            self,
            PurchaseState::Start
                | PurchaseState::ReservationChecked
                | PurchaseState::Locked
                | PurchaseState::Decremented
        )
    }

    /// Returns true once the stock decrement is durable.
    pub fn is_purchased(&self) -> bool {
        matches!(
            self,
            PurchaseState::Committed | PurchaseState::ReservationCleared
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseState::ReservationCleared | PurchaseState::Aborted
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseState::Start => "Start",
            PurchaseState::ReservationChecked => "ReservationChecked",
            PurchaseState::Locked => "Locked",
            PurchaseState::Decremented => "Decremented",
            PurchaseState::Committed => "Committed",
            PurchaseState::ReservationCleared => "ReservationCleared",
            PurchaseState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_start() {
        assert_eq!(PurchaseState::default(), PurchaseState::Start);
    }

    #[test]
    fn test_happy_path_order() {
        let mut state = PurchaseState::Start;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            state = next;
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                PurchaseState::Start,
                PurchaseState::ReservationChecked,
                PurchaseState::Locked,
                PurchaseState::Decremented,
                PurchaseState::Committed,
                PurchaseState::ReservationCleared,
            ]
        );
    }

    #[test]
    fn test_abort_only_before_commit() {
        assert!(PurchaseState::Start.can_abort());
        assert!(PurchaseState::Decremented.can_abort());
        assert!(!PurchaseState::Committed.can_abort());
        assert!(!PurchaseState::ReservationCleared.can_abort());
        assert!(!PurchaseState::Aborted.can_abort());
    }

    #[test]
    fn test_purchased_states() {
        assert!(!PurchaseState::Decremented.is_purchased());
        assert!(PurchaseState::Committed.is_purchased());
        assert!(PurchaseState::ReservationCleared.is_purchased());
        assert!(!PurchaseState::Aborted.is_purchased());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PurchaseState::Committed.is_terminal());
        assert!(PurchaseState::ReservationCleared.is_terminal());
        assert!(PurchaseState::Aborted.is_terminal());
        assert_eq!(PurchaseState::Aborted.next(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PurchaseState::Locked.to_string(), "Locked");
        assert_eq!(
            PurchaseState::ReservationCleared.to_string(),
            "ReservationCleared"
        );
    }

    #[test]
    fn test_serialization() {
        let state = PurchaseState::Decremented;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: PurchaseState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
