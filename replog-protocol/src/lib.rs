//! # replog-protocol
//!
//! Wire protocol for replog, a file replication stream between a source
//! that tails log files and a destination that mirrors them.
//!
//! This crate provides:
//! - The 12-byte common header and its validation
//! - Encoders and borrowed decoders for each message variant
//! - Fixed-width big-endian fields and helpers
//! - An I/O buffer with inline storage and heap growth
//! - A stream reader/writer that splits bytes into messages

pub mod alloc;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod endian;
pub mod error;
pub mod field;
pub mod hash;
pub mod header;
pub mod message;

pub use alloc::{HeapAllocator, MessageAllocator};
pub use buffer::{IoBuffer, IoBuffers};
pub use codec::{MessageReader, MessageWriter};
pub use config::{CodecConfig, GrowthPolicy};
pub use error::{ConfigError, ProtocolError};
pub use field::BigEndianField;
pub use hash::name_hash;
pub use header::{decode_header, Command, HeaderView, HEADER_SIZE, MAGIC};
pub use message::{
    decode, Append, AppendView, Encode, ErrorResponse, ErrorResponseView, GetSize,
    GetSizeResponse, GetSizeResponseView, GetSizeView, Message, MessageView, ResendRequest,
    ResendRequestView,
};

/// Largest size a message can declare in its 16-bit size field.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;
