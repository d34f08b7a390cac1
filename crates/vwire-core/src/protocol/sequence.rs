//! Per-circuit packet sequence numbers.
//!
//! The codec treats the header's sequence field as opaque; this counter is
//! a convenience for senders that need to stamp outgoing packets.  The
//! field is 32 bits on the wire, so the counter wraps at `u32::MAX`.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::protocol::header::{PacketFlags, PacketHeader};

/// Lock-free, wrapping sequence counter.
///
/// # Examples
///
/// ```rust
/// use vwire_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU32,
}

impl SequenceCounter {
    /// Creates a counter whose first value is 1.
    ///
    /// Sequence 0 is never sent by a fresh circuit, so receivers can use it
    /// as "nothing seen yet".
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a counter whose first value is `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            inner: AtomicU32::new(first),
        }
    }

    /// Returns the next sequence number, wrapping from `u32::MAX` to 0.
    ///
    /// Relaxed ordering: the value orders packets, it does not publish memory.
    pub fn next(&self) -> u32 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// The value the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Builds a header with `flags` and a freshly allocated sequence number.
    pub fn next_header(&self, flags: PacketFlags) -> PacketHeader {
        PacketHeader::new(flags, self.next())
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
