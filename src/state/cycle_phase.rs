/// Sync cycle phase definitions
///
/// A cycle walks `Idle -> Enumerating -> ScrapingBatch -> Pruning` once per
/// active source and returns to `Idle` when every source has been handled.
use crate::SyncError;
use std::fmt;

/// Phase of the sync cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CyclePhase {
    /// Waiting for the next tick
    #[default]
    Idle,

    /// Walking a source's listing API
    Enumerating,

    /// Upserting the enumerated listings
    ScrapingBatch,

    /// Removing listings that disappeared from the source
    Pruning,
}

impl CyclePhase {
    /// Returns true if `next` may follow this phase
    pub fn can_transition_to(&self, next: CyclePhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Enumerating)
                | (Self::Enumerating, Self::ScrapingBatch)
                | (Self::ScrapingBatch, Self::Pruning)
                | (Self::Pruning, Self::Enumerating)
                | (Self::Pruning, Self::Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Enumerating => "enumerating",
            Self::ScrapingBatch => "scraping_batch",
            Self::Pruning => "pruning",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the phase of one running cycle and rejects illegal transitions
#[derive(Debug, Default)]
pub struct CycleMachine {
    phase: CyclePhase,
}

impl CycleMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Moves to `next`, or fails without changing phase
    pub fn advance(&mut self, next: CyclePhase) -> Result<(), SyncError> {
        if !self.phase.can_transition_to(next) {
            return Err(SyncError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Cycle phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle_over_two_sources() {
        let mut machine = CycleMachine::new();
        for next in [
            CyclePhase::Enumerating,
            CyclePhase::ScrapingBatch,
            CyclePhase::Pruning,
            CyclePhase::Enumerating,
            CyclePhase::ScrapingBatch,
            CyclePhase::Pruning,
            CyclePhase::Idle,
        ] {
            machine.advance(next).unwrap();
        }
        assert_eq!(machine.phase(), CyclePhase::Idle);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut machine = CycleMachine::new();
        assert!(machine.advance(CyclePhase::Pruning).is_err());
        assert_eq!(machine.phase(), CyclePhase::Idle);

        machine.advance(CyclePhase::Enumerating).unwrap();
        assert!(machine.advance(CyclePhase::Idle).is_err());
        assert!(machine.advance(CyclePhase::Pruning).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CyclePhase::ScrapingBatch.to_string(), "scraping_batch");
    }
}
