/// The lifecycle state of a stream.
///
/// ```text
/// Init -> Open -> Ended
///              -> Errored
///              -> Destroyed
/// ```
///
/// The terminal states ([Self::Ended], [Self::Errored], [Self::Destroyed]) are final. Once a
/// stream reached one of them, it never produces data again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// The stream has not been read from yet.
    Init,
    /// The stream may produce items.
    Open,
    /// All items have been produced.
    Ended,
    /// The stream failed. The error has been emitted exactly once.
    Errored,
    /// The stream has been cancelled by its consumer.
    Destroyed,
}

impl StreamState {
    /// Returns whether the state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Errored | Self::Destroyed)
    }

    /// Moves to the terminal state `next`. Returns `false` (and keeps the current state) if the
    /// stream has already terminated.
    pub fn terminate(&mut self, next: StreamState) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = next;
        true
    }

    /// Marks a stream that produced an item as [Self::Open].
    pub fn open(&mut self) {
        if *self == Self::Init {
            *self = Self::Open;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_is_final() {
        let mut state = StreamState::Init;
        state.open();
        assert_eq!(state, StreamState::Open);

        assert!(state.terminate(StreamState::Ended));
        assert!(!state.terminate(StreamState::Destroyed));
        state.open();
        assert_eq!(state, StreamState::Ended);
    }
}
