//! Allocation interface for encoded messages.

use crate::message::Message;
use bytes::BytesMut;

/// Supplies the single contiguous block each factory encodes into.
///
/// Factories request exactly the message size and verify the returned
/// block has at least that much capacity.
pub trait MessageAllocator {
    /// Returns an empty buffer with capacity for `size` bytes.
    fn allocate(&self, size: usize) -> BytesMut;

    /// Takes back a message the caller is done with.
    fn release(&self, message: Message) {
        drop(message);
    }
}

/// Allocates every message from the global heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl MessageAllocator for HeapAllocator {
    fn allocate(&self, size: usize) -> BytesMut {
        BytesMut::with_capacity(size)
    }
}

impl<A: MessageAllocator + ?Sized> MessageAllocator for &A {
    fn allocate(&self, size: usize) -> BytesMut {
        (**self).allocate(size)
    }

    fn release(&self, message: Message) {
        (**self).release(message)
    }
}
