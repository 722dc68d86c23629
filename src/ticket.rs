//! Request tickets
//!
//! Each flow has at most one content request in flight. Starting a request
//! issues a [`Ticket`]; its result is applied only when presented with the
//! ticket of the request still outstanding, so a late reply to an abandoned
//! request is dropped instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket numbers, unique across all flows
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Token identifying one content request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Tracks the single outstanding request of a flow
#[derive(Debug, Clone, Default)]
pub(crate) struct Outstanding {
    pending: Option<Ticket>,
}

impl Outstanding {
    /// Issues a fresh ticket and marks it outstanding
    pub(crate) fn issue(&mut self) -> Ticket {
        let ticket = Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed));
        self.pending = Some(ticket);
        ticket
    }

    /// Consumes `ticket` if it is the outstanding one
    pub(crate) fn redeem(&mut self, ticket: Ticket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Forgets the outstanding request, if any
    pub(crate) fn cancel(&mut self) {
        self.pending = None;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
