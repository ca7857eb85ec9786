//! # Reliability Layer
//!
//! Sequencing, acknowledgement, resend, and in-order release of data
//! frames. Socket-free: callers feed it frames and clock readings and send
//! whatever it hands back.
//!
//! A message larger than one frame travels as a run of consecutive
//! sequence numbers. Every frame but the last is a fragment; the layer
//! joins the run once the last frame is released in order.
//!
//! ```text
//! sender                                receiver
//!   track(seq 7) ── DATA 7 ──────X        (lost)
//!   track(seq 8) ── DATA 8 ─────────────> accept(8): buffered, ACK 8
//!   resend 7     ── DATA 7 ─────────────> accept(7): release 7, 8; ACK 7
//!   acknowledge(7), acknowledge(8)
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// Sequence numbers further ahead than this are dropped, not buffered.
pub const RECEIVE_WINDOW: u16 = 256;

/// Most frames one message may span.
pub const MAX_FRAGMENTS: usize = RECEIVE_WINDOW as usize;

/// A data frame waiting for its acknowledgement.
#[derive(Clone, Debug)]
struct PendingFrame {
    /// Sequence number.
    sequence: u16,
    /// Encoded frame, header included.
    frame: Vec<u8>,
    /// Time of the last transmission.
    sent_time: Instant,
    /// Number of resends so far.
    resends: u32,
}

/// Outcome of feeding a received data frame to the layer.
#[derive(Debug, PartialEq, Eq)]
pub enum Accepted {
    /// Messages now deliverable, in sequence order. May be empty when the
    /// frame was buffered or only extended a partial message.
    Deliver(Vec<Vec<u8>>),
    /// Already delivered or already buffered.
    Duplicate,
    /// Too far ahead of the expected sequence.
    OutOfWindow,
}

/// The peer stopped acknowledging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerLost {
    /// Sequence that exhausted its resends.
    pub sequence: u16,
}

/// Per-connection reliability state.
#[derive(Debug)]
pub struct ReliabilityLayer {
    /// Frames sent but not yet acknowledged.
    pending: Vec<PendingFrame>,
    /// Next outbound sequence number.
    next_send: u16,
    /// Next inbound sequence number to release.
    next_receive: u16,
    /// Inbound frames that arrived ahead of `next_receive`, with their
    /// last-fragment flag.
    out_of_order: HashMap<u16, (Vec<u8>, bool)>,
    /// Released fragments of a message whose last frame is still missing.
    partial: Vec<u8>,
    /// Fragments in `partial`, counted past `MAX_FRAGMENTS` while an
    /// oversized message is discarded.
    partial_fragments: usize,
    /// Resend timeout.
    resend_timeout: Duration,
    /// Resends before the peer is declared lost.
    max_resends: u32,
}

impl ReliabilityLayer {
    /// Creates a fresh layer for a new connection.
    #[must_use]
    pub fn new(resend_timeout: Duration, max_resends: u32) -> Self {
        Self {
            pending: Vec::with_capacity(32),
            next_send: 0,
            next_receive: 0,
            out_of_order: HashMap::new(),
            partial: Vec::new(),
            partial_fragments: 0,
            resend_timeout,
            max_resends,
        }
    }

    /// Reserves the next outbound sequence number.
    pub fn next_sequence(&mut self) -> u16 {
        let sequence = self.next_send;
        self.next_send = self.next_send.wrapping_add(1);
        sequence
    }

    /// Tracks an encoded frame until it is acknowledged.
    pub fn track(&mut self, sequence: u16, frame: Vec<u8>, now: Instant) {
        self.pending.push(PendingFrame {
            sequence,
            frame,
            sent_time: now,
            resends: 0,
        });
    }

    /// Stops tracking an acknowledged frame.
    pub fn acknowledge(&mut self, sequence: u16) {
        self.pending.retain(|p| p.sequence != sequence);
    }

    /// Returns the number of unacknowledged frames.
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Returns the number of buffered out-of-order frames.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.out_of_order.len()
    }

    /// Accepts an inbound data frame and releases whatever became
    /// deliverable. `last` is false for every fragment of a split message
    /// except the final one.
    pub fn accept(&mut self, sequence: u16, payload: Vec<u8>, last: bool) -> Accepted {
        let ahead = sequence.wrapping_sub(self.next_receive);
        if ahead >= u16::MAX / 2 {
            return Accepted::Duplicate;
        }
        if ahead >= RECEIVE_WINDOW {
            return Accepted::OutOfWindow;
        }
        if ahead > 0 {
            if self.out_of_order.contains_key(&sequence) {
                return Accepted::Duplicate;
            }
            self.out_of_order.insert(sequence, (payload, last));
            return Accepted::Deliver(Vec::new());
        }

        let mut ready = Vec::new();
        self.release(payload, last, &mut ready);
        self.next_receive = self.next_receive.wrapping_add(1);
        while let Some((next, next_last)) = self.out_of_order.remove(&self.next_receive) {
            self.release(next, next_last, &mut ready);
            self.next_receive = self.next_receive.wrapping_add(1);
        }
        Accepted::Deliver(ready)
    }

    /// Appends one in-order frame to the message being assembled.
    fn release(&mut self, payload: Vec<u8>, last: bool, ready: &mut Vec<Vec<u8>>) {
        if last && self.partial_fragments == 0 {
            ready.push(payload);
            return;
        }

        self.partial_fragments += 1;
        if self.partial_fragments <= MAX_FRAGMENTS {
            self.partial.extend_from_slice(&payload);
        } else {
            self.partial.clear();
        }
        if !last {
            return;
        }

        let message = std::mem::take(&mut self.partial);
        if self.partial_fragments <= MAX_FRAGMENTS {
            ready.push(message);
        } else {
            debug!(
                "Dropping message of {} fragments, limit is {}",
                self.partial_fragments, MAX_FRAGMENTS
            );
        }
        self.partial_fragments = 0;
    }

    /// Returns frames due for a resend, or the first frame whose resends
    /// are exhausted.
    pub fn due_resends(&mut self, now: Instant) -> Result<Vec<Vec<u8>>, PeerLost> {
        let mut resends = Vec::new();

        for frame in &mut self.pending {
            if now.saturating_duration_since(frame.sent_time) < self.resend_timeout {
                continue;
            }
            if frame.resends >= self.max_resends {
                return Err(PeerLost {
                    sequence: frame.sequence,
                });
            }
            frame.sent_time = now;
            frame.resends += 1;
            resends.push(frame.frame.clone());
        }

        Ok(resends)
    }
}
