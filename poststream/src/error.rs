use crate::LoadTicket;

/// Rejected host input. The engine's own scroll paths never fail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("window [{start}, {end}) is outside [0, {count}]")]
    WindowOutOfRange {
        start: usize,
        end: usize,
        count: usize,
    },
    #[error("load ticket {0:?} is not pending")]
    UnknownTicket(LoadTicket),
    #[error("load {ticket:?} expected a page starting at {expected}, got {actual}")]
    PageStartMismatch {
        ticket: LoadTicket,
        expected: usize,
        actual: usize,
    },
    #[error("load {ticket:?} expected {expected} posts, got {actual}")]
    PageLengthMismatch {
        ticket: LoadTicket,
        expected: usize,
        actual: usize,
    },
}
