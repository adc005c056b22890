//! Stream reader and writer for replication messages.
//!
//! A transport pushes raw bytes into a [`MessageReader`] and pulls
//! borrowed [`MessageView`]s out; it drains outgoing bytes from a
//! [`MessageWriter`]. Neither side needs to know where one message ends
//! and the next begins.

use crate::buffer::IoBuffer;
use crate::config::{CodecConfig, GrowthPolicy};
use crate::error::ProtocolError;
use crate::header::{decode_header, HEADER_SIZE};
use crate::message::{decode, Message, MessageView};

/// Inline capacity used when none is given.
pub const DEFAULT_INLINE_CAPACITY: usize = 1024;

/// Makes room for `n` more bytes, compacting before growing.
fn ensure_available<const C: usize>(buffer: &mut IoBuffer<C>, growth: GrowthPolicy, n: usize) {
    if buffer.available() >= n {
        return;
    }
    buffer.crunch();
    if buffer.available() >= n {
        return;
    }
    let needed = buffer.size() + n;
    buffer.reallocate(growth.next_capacity(buffer.capacity(), needed));
}

/// Accumulates incoming bytes and decodes messages from them.
pub struct MessageReader<const C: usize = DEFAULT_INLINE_CAPACITY> {
    buffer: IoBuffer<C>,
    config: CodecConfig,
}

impl<const C: usize> MessageReader<C> {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buffer: IoBuffer::new(),
            config,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        ensure_available(&mut self.buffer, self.config.growth, data.len());
        self.buffer.write(data);
    }

    /// Free space with room for at least `min` bytes, to be filled by a
    /// transport read and then passed to [`commit`](Self::commit).
    pub fn write_region(&mut self, min: usize) -> &mut [u8] {
        ensure_available(&mut self.buffer, self.config.growth, min);
        self.buffer.write_region()
    }

    /// Marks `n` bytes of the write region as received.
    pub fn commit(&mut self, n: usize) {
        self.buffer.commit(n);
    }

    /// Attempts to decode the next message from the buffer.
    ///
    /// Returns `Ok(None)` if more data is needed. A malformed header is
    /// reported without consuming anything.
    pub fn next_message(&mut self) -> Result<Option<MessageView<'_>>, ProtocolError> {
        let (size, have) = {
            let unread = self.buffer.unread();
            if unread.len() < HEADER_SIZE {
                return Ok(None);
            }

            let header = decode_header(unread).map_err(|e| {
                tracing::warn!(error = %e, "rejected message header");
                e
            })?;

            let size = header.size() as usize;
            if size > self.config.max_message_size {
                tracing::warn!(
                    size,
                    max = self.config.max_message_size,
                    "rejected oversized message"
                );
                return Err(ProtocolError::MessageTooLarge {
                    size,
                    max: self.config.max_message_size,
                });
            }
            (size, unread.len())
        };

        if have < size {
            ensure_available(&mut self.buffer, self.config.growth, size - have);
            return Ok(None);
        }

        let view = decode(self.buffer.read(size)?)?;
        tracing::trace!(command = ?view.command(), size, "decoded message");
        Ok(Some(view))
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.size()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Drops buffered data and any heap growth.
    pub fn clear(&mut self) {
        self.buffer.reset();
    }
}

impl<const C: usize> Default for MessageReader<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Queues encoded messages for a transport to drain.
pub struct MessageWriter<const C: usize = DEFAULT_INLINE_CAPACITY> {
    buffer: IoBuffer<C>,
    growth: GrowthPolicy,
}

impl<const C: usize> MessageWriter<C> {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            buffer: IoBuffer::new(),
            growth: config.growth,
        }
    }

    /// Appends a message to the outgoing bytes.
    pub fn queue(&mut self, message: &Message) {
        ensure_available(&mut self.buffer, self.growth, message.len());
        self.buffer.write(message.as_bytes());
        tracing::trace!(command = ?message.command(), size = message.len(), "queued message");
    }

    /// Bytes waiting to be sent.
    pub fn pending(&self) -> &[u8] {
        self.buffer.unread()
    }

    /// Marks `n` pending bytes as sent.
    pub fn consume(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.buffer.read(n)?;
        if self.buffer.is_empty() {
            self.buffer.crunch();
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buffer.size()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl<const C: usize> Default for MessageWriter<C> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::message::{Append, Encode};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_any_chunking_yields_every_message(
            count in 1u32..20,
            chunk in 1usize..64,
        ) {
            let mut stream = Vec::new();
            for id in 0..count {
                let msg = Append {
                    id,
                    name_hash: 7,
                    dst_fd: 1,
                    src_offset: u64::from(id),
                    chunk_size: 512,
                }
                .encode()
                .unwrap();
                stream.extend_from_slice(msg.as_bytes());
            }

            let mut reader = MessageReader::<16>::new();
            let mut ids = Vec::new();
            for part in stream.chunks(chunk) {
                reader.extend(part);
                while let Some(view) = reader.next_message().unwrap() {
                    ids.push(view.header().id());
                }
            }

            prop_assert_eq!(ids, (0..count).collect::<Vec<_>>());
            prop_assert_eq!(reader.buffered(), 0);
        }
    }
}
