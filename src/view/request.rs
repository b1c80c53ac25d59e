//! Render request bookkeeping.
//!
//! Every render request gets a [`Ticket`]. Issuing a new request retires all
//! earlier tickets of the same view, so a completion that arrives late for a
//! superseded `(name, code)` pair can be recognized and dropped.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one render request of one view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    view: u64,
    generation: u64,
}

impl Ticket {
    /// The view instance that issued this ticket.
    pub const fn view_id(self) -> u64 {
        self.view
    }

    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Issues tickets for a single view and remembers which one is live.
#[derive(Debug)]
pub struct RequestTracker {
    view: u64,
    latest: u64,
}

impl RequestTracker {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            view: NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed),
            latest: 0,
        }
    }

    /// Start a new request, invalidating every ticket issued before.
    pub const fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket {
            view: self.view,
            generation: self.latest,
        }
    }

    /// The ticket of the live request, if any was issued.
    pub const fn current(&self) -> Option<Ticket> {
        if self.latest == 0 {
            None
        } else {
            Some(Ticket {
                view: self.view,
                generation: self.latest,
            })
        }
    }

    pub const fn is_current(&self, ticket: Ticket) -> bool {
        self.latest != 0 && ticket.view == self.view && ticket.generation == self.latest
    }
}
