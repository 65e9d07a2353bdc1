mod queue;
mod types;

use std::time::Duration;

pub use queue::{Drained, EventQueue};
pub use types::{AppEvent, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Render,
    /// Skip rendering and wait this long before polling again.
    Throttle(Duration),
    Exit,
}

/// Foreground/quit state carried between loop iterations.
#[derive(Debug)]
pub struct LoopState {
    foreground: bool,
    quit: bool,
    background_delay: Duration,
    events: EventQueue,
}

impl LoopState {
    pub fn new(background_delay: Duration) -> Self {
        Self {
            foreground: true,
            quit: false,
            background_delay,
            events: EventQueue::new(),
        }
    }

    pub fn push(&mut self, event: AppEvent) {
        self.events.push(event);
    }

    /// Drains the queue and decides what this iteration does.
    pub fn poll(&mut self) -> LoopAction {
        if !self.quit {
            let drained = self.events.drain();
            if let Some(foreground) = drained.foreground {
                if foreground != self.foreground {
                    log::info!(
                        "entered {}",
                        if foreground { "foreground" } else { "background" }
                    );
                }
                self.foreground = foreground;
            }
            self.quit |= drained.quit;
        }

        if self.quit {
            LoopAction::Exit
        } else if self.foreground {
            LoopAction::Render
        } else {
            LoopAction::Throttle(self.background_delay)
        }
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}
