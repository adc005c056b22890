//! I/O buffer with inline storage and heap growth.
//!
//! [`IoBuffer<C>`] keeps up to `C` bytes inline and moves to a single heap
//! block when the caller asks for more with [`IoBuffer::reallocate`]. A
//! producer appends at the write cursor, a consumer takes bytes from the
//! read cursor:
//!
//! ```text
//! begin            read             write             end
//!   |---consumed----|-----unread------|------free-------|
//!                    \____ size() ___/ \_ available() _/
//! ```
//!
//! `begin <= read <= write <= end` holds after every operation. Slices
//! handed out by [`read`](IoBuffer::read), [`unread`](IoBuffer::unread)
//! and [`write_region`](IoBuffer::write_region) borrow the buffer, so they
//! cannot outlive the next `reallocate`, `reset` or `crunch`.

use crate::error::ProtocolError;

enum Storage<const C: usize> {
    Inline([u8; C]),
    Heap(Box<[u8]>),
}

impl<const C: usize> Storage<C> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Inline(data) => &data[..],
            Storage::Heap(data) => &data[..],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Inline(data) => &mut data[..],
            Storage::Heap(data) => &mut data[..],
        }
    }
}

/// Byte buffer with `C` bytes of inline space and independent read/write
/// cursors.
pub struct IoBuffer<const C: usize> {
    storage: Storage<C>,
    rd: usize,
    wr: usize,
}

impl<const C: usize> IoBuffer<C> {
    /// Creates an empty buffer backed by inline storage.
    pub const fn new() -> Self {
        Self {
            storage: Storage::Inline([0; C]),
            rd: 0,
            wr: 0,
        }
    }

    /// Releases any heap block and returns to the initial inline state.
    pub fn reset(&mut self) {
        if self.is_allocated() {
            tracing::trace!(capacity = self.capacity(), "releasing heap block");
            self.storage = Storage::Inline([0; C]);
        }
        self.rd = 0;
        self.wr = 0;
    }

    /// Grows the buffer to exactly `n` bytes if it is smaller.
    ///
    /// Written bytes keep their offsets, so `size()` and the unread
    /// content are unchanged. The previous heap block, if any, is freed
    /// after the copy.
    pub fn reallocate(&mut self, n: usize) {
        if n <= self.capacity() {
            return;
        }

        let mut block = vec![0u8; n].into_boxed_slice();
        block[..self.wr].copy_from_slice(&self.storage.as_slice()[..self.wr]);

        tracing::debug!(from = self.capacity(), to = n, "reallocating io buffer");
        self.storage = Storage::Heap(block);
    }

    /// Total bytes of storage (`end - begin`).
    pub fn capacity(&self) -> usize {
        self.storage.as_slice().len()
    }

    /// Bytes written but not yet read (`write - read`).
    pub fn size(&self) -> usize {
        self.wr - self.rd
    }

    /// Free space after the write cursor (`end - write`).
    pub fn available(&self) -> usize {
        self.capacity() - self.wr
    }

    pub fn is_empty(&self) -> bool {
        self.rd == self.wr
    }

    /// Whether storage has moved to the heap.
    pub fn is_allocated(&self) -> bool {
        matches!(self.storage, Storage::Heap(_))
    }

    /// Offset of the read cursor from the start of storage.
    pub fn read_offset(&self) -> usize {
        self.rd
    }

    /// Offset of the write cursor from the start of storage.
    pub fn write_offset(&self) -> usize {
        self.wr
    }

    /// Takes the next `n` unread bytes.
    ///
    /// Fails with [`ProtocolError::OutOfData`] and leaves the cursors alone
    /// if fewer than `n` bytes are available.
    pub fn read(&mut self, n: usize) -> Result<&[u8], ProtocolError> {
        if self.size() < n {
            return Err(ProtocolError::OutOfData {
                need: n,
                have: self.size(),
            });
        }
        let start = self.rd;
        self.rd += n;
        Ok(&self.storage.as_slice()[start..self.rd])
    }

    /// The unread region, without consuming it.
    pub fn unread(&self) -> &[u8] {
        &self.storage.as_slice()[self.rd..self.wr]
    }

    /// Copies `src` at the write cursor and returns the remaining free space.
    ///
    /// # Panics
    ///
    /// Panics if `src` does not fit in [`available`](Self::available).
    /// Callers check space, or `reallocate`, first.
    pub fn write(&mut self, src: &[u8]) -> usize {
        assert!(
            src.len() <= self.available(),
            "io buffer overflow: writing {} bytes with {} available",
            src.len(),
            self.available()
        );
        let start = self.wr;
        self.wr += src.len();
        self.storage.as_mut_slice()[start..self.wr].copy_from_slice(src);
        self.available()
    }

    /// The free region after the write cursor, for a transport to fill
    /// before calling [`commit`](Self::commit).
    pub fn write_region(&mut self) -> &mut [u8] {
        let wr = self.wr;
        &mut self.storage.as_mut_slice()[wr..]
    }

    /// Advances the write cursor over `n` bytes already placed in
    /// [`write_region`](Self::write_region).
    ///
    /// # Panics
    ///
    /// Panics if the cursor would move past the end of storage.
    pub fn commit(&mut self, n: usize) {
        assert!(
            n <= self.available(),
            "io buffer commit past end: {} bytes with {} available",
            n,
            self.available()
        );
        self.wr += n;
    }

    /// Moves unread bytes to the start of storage to reclaim consumed space.
    pub fn crunch(&mut self) {
        if self.rd == 0 {
            return;
        }
        let size = self.size();
        if size > 0 {
            self.storage.as_mut_slice().copy_within(self.rd..self.wr, 0);
        }
        tracing::trace!(reclaimed = self.rd, size, "crunched io buffer");
        self.rd = 0;
        self.wr = size;
    }
}

impl<const C: usize> Default for IoBuffer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize> std::fmt::Debug for IoBuffer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoBuffer")
            .field("capacity", &self.capacity())
            .field("read", &self.rd)
            .field("write", &self.wr)
            .field("allocated", &self.is_allocated())
            .finish()
    }
}

/// Input and output buffers for one channel.
#[derive(Debug, Default)]
pub struct IoBuffers<const IN: usize, const OUT: usize = IN> {
    pub input: IoBuffer<IN>,
    pub output: IoBuffer<OUT>,
}

impl<const IN: usize, const OUT: usize> IoBuffers<IN, OUT> {
    pub const fn new() -> Self {
        Self {
            input: IoBuffer::new(),
            output: IoBuffer::new(),
        }
    }

    /// Resets both directions.
    pub fn reset(&mut self) {
        self.input.reset();
        self.output.reset();
    }
}
