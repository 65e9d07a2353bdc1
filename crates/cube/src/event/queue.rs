use std::collections::VecDeque;

use super::types::{AppEvent, Key};

/// FIFO of platform events, drained once per loop iteration.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<AppEvent>,
}

/// What the result of one drain says about the next iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Drained {
    /// `Some(true)` / `Some(false)` if a foreground / background transition was seen.
    pub foreground: Option<bool>,
    pub quit: bool,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AppEvent) {
        self.pending.push_back(event);
    }

    /// Processes queued events in order until the queue is empty or a quit is seen.
    ///
    /// `KeyDown(Left)` queues a `Quit` behind whatever is already pending. Once a
    /// quit is handled the rest of the queue is discarded.
    pub fn drain(&mut self) -> Drained {
        let mut drained = Drained::default();

        while let Some(event) = self.pending.pop_front() {
            match event {
                AppEvent::EnteredForeground => drained.foreground = Some(true),
                AppEvent::EnteredBackground => drained.foreground = Some(false),
                AppEvent::KeyDown(Key::Left) => {
                    log::debug!("quit key pressed");
                    self.pending.push_back(AppEvent::Quit);
                }
                AppEvent::KeyDown(Key::Other) => {}
                AppEvent::Quit => {
                    drained.quit = true;
                    if !self.pending.is_empty() {
                        log::debug!("discarding {} events after quit", self.pending.len());
                    }
                    self.pending.clear();
                    break;
                }
            }
        }

        drained
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_drain_changes_nothing() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.drain(), Drained::default());
    }

    #[test]
    fn last_transition_wins() {
        let mut queue = EventQueue::new();
        queue.push(AppEvent::EnteredBackground);
        queue.push(AppEvent::EnteredForeground);
        queue.push(AppEvent::EnteredBackground);

        let drained = queue.drain();
        assert_eq!(drained.foreground, Some(false));
        assert!(!drained.quit);
        assert!(queue.is_empty());
    }

    #[test]
    fn left_key_requests_quit_after_pending_events() {
        let mut queue = EventQueue::new();
        queue.push(AppEvent::KeyDown(Key::Left));
        queue.push(AppEvent::EnteredBackground);

        let drained = queue.drain();
        assert!(drained.quit);
        assert_eq!(drained.foreground, Some(false));
    }

    #[test]
    fn quit_discards_the_rest() {
        let mut queue = EventQueue::new();
        queue.push(AppEvent::Quit);
        queue.push(AppEvent::EnteredBackground);
        queue.push(AppEvent::KeyDown(Key::Other));

        let drained = queue.drain();
        assert!(drained.quit);
        assert_eq!(drained.foreground, None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut queue = EventQueue::new();
        queue.push(AppEvent::KeyDown(Key::Other));
        assert_eq!(queue.drain(), Drained::default());
    }
}
