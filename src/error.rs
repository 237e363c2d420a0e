use std::fmt;

/// Errors surfaced by bus dispatch and the request/response layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A queued message's kind has no subscriber-table entry at all.
    ///
    /// Fatal to the dispatch step that hit it: the message is consumed and
    /// the step aborts instead of silently dropping it. Reachable on
    /// [`RegistryBus`](crate::RegistryBus) whenever a kind is sent before
    /// anything ever subscribed to it; on
    /// [`ClosedBus`](crate::ClosedBus) it would only surface as a defect in
    /// a hand-written [`MessageSet`](crate::MessageSet) impl.
    UnknownKind { kind: &'static str },
    /// A type-erased callback received a payload of the wrong type.
    ///
    /// Should never happen when registration and dispatch derive the kind
    /// key the same way; reported rather than ignored so a broken key
    /// derivation fails loudly.
    KindMismatch { expected: &'static str },
    /// A request's single-shot reply callback was already invoked.
    ReplyConsumed,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::UnknownKind { kind } => {
                write!(f, "no subscriber table entry for message kind {}", kind)
            }
            BusError::KindMismatch { expected } => {
                write!(f, "queued payload does not match expected kind {}", expected)
            }
            BusError::ReplyConsumed => write!(f, "request reply callback already consumed"),
        }
    }
}

impl std::error::Error for BusError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        let err = BusError::UnknownKind { kind: "OrderPlaced" };
        assert_eq!(
            err.to_string(),
            "no subscriber table entry for message kind OrderPlaced"
        );

        let err = BusError::KindMismatch { expected: "OrderPlaced" };
        assert!(err.to_string().contains("OrderPlaced"));

        assert_eq!(
            BusError::ReplyConsumed.to_string(),
            "request reply callback already consumed"
        );
    }
}
