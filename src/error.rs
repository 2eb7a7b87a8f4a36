/// Outcome of a single admission attempt. Mirrors the tagged-result shape the
/// broker's state machine is specified in terms of, rather than threading a
/// generic error type through every admission step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Accepted,
    RejectedDuplicate,
    RejectedQuorum,
    RejectedFull,
}

impl AdmitOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, AdmitOutcome::Accepted)
    }
}
