use tilewar_protocol::UnitType;

/// Audible feedback events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Select,
    /// Unit-specific move sound (walk, tank, jet).
    Move(UnitType),
    /// End of turn with at least one tile changing hands.
    Combat,
    /// End of turn with no ownership change.
    QuietTurn,
}

/// Output device for cues. Injected into the session; implementations own
/// their resources between `init` and `dispose`.
pub trait FeedbackSink: Send {
    fn init(&mut self) {}

    fn play(&mut self, cue: Cue);

    /// Silences anything currently playing.
    fn stop(&mut self) {}

    fn dispose(&mut self) {}
}

/// Sink that discards every cue.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn play(&mut self, _cue: Cue) {}
}
