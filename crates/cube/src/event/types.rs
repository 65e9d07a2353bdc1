#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Requests a graceful quit.
    Left,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    EnteredForeground,
    EnteredBackground,
    KeyDown(Key),
    Quit,
}
