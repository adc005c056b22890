//! Common message header.
//!
//! Header layout (12 bytes), all integers big-endian:
//!
//! ```text
//! +---------+----------+---------+---------+-----------+
//! | size    | magic    | command | id      | name_hash |
//! | 2 bytes | 1 (=132) | 1 byte  | 4 bytes | 4 bytes   |
//! +---------+----------+---------+---------+-----------+
//! ```
//!
//! `size` is the total encoded length of the message, header included.

use crate::endian;
use crate::error::ProtocolError;
use crate::field::BigEndianField;
use bytes::{BufMut, BytesMut};

/// Marker byte that every message carries after its size.
pub const MAGIC: u8 = 132;

/// Size of the common header in bytes (2+1+1+4+4 = 12).
pub const HEADER_SIZE: usize = 12;

pub(crate) const SIZE_OFFSET: usize = 0;
pub(crate) const MAGIC_OFFSET: usize = 2;
pub(crate) const COMMAND_OFFSET: usize = 3;
pub(crate) const ID_OFFSET: usize = 4;
pub(crate) const NAME_HASH_OFFSET: usize = 8;

/// Message command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Ask the destination for the current size of a file.
    GetSize = b'S',
    /// Destination's answer to `GetSize`.
    GetSizeResponse = b's',
    /// Reserved; payload not defined yet.
    MoveFile = b'M',
    /// Reserved; payload not defined yet.
    DeleteFile = b'D',
    /// A chunk of file data follows.
    Append = b'A',
    /// Destination asks the source to resend from a given size.
    ResendRequest = b'r',
    /// A command failed on the remote side.
    ErrorResponse = b'e',
}

impl Command {
    /// Wire byte for this command.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Smallest declared size a message of this command may carry.
    pub fn min_size(self) -> usize {
        match self {
            Command::GetSize => crate::message::GET_SIZE_FIXED,
            Command::GetSizeResponse => crate::message::GET_SIZE_RESPONSE_SIZE,
            Command::Append => crate::message::APPEND_SIZE,
            Command::ResendRequest => crate::message::RESEND_REQUEST_SIZE,
            Command::ErrorResponse => crate::message::ERROR_RESPONSE_FIXED,
            Command::MoveFile | Command::DeleteFile => HEADER_SIZE,
        }
    }

    /// Whether the command has no payload layout yet.
    pub fn is_reserved(self) -> bool {
        matches!(self, Command::MoveFile | Command::DeleteFile)
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'S' => Ok(Command::GetSize),
            b's' => Ok(Command::GetSizeResponse),
            b'M' => Ok(Command::MoveFile),
            b'D' => Ok(Command::DeleteFile),
            b'A' => Ok(Command::Append),
            b'r' => Ok(Command::ResendRequest),
            b'e' => Ok(Command::ErrorResponse),
            _ => Err(ProtocolError::UnknownCommand(value)),
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd.code()
    }
}

/// Writes the common header. `size` is the full message length.
pub(crate) fn encode_header(
    buf: &mut BytesMut,
    command: Command,
    size: u16,
    id: u32,
    name_hash: u32,
) {
    buf.put_slice(BigEndianField::<2>::from_int(size).as_bytes());
    buf.put_u8(MAGIC);
    buf.put_u8(command.code());
    buf.put_slice(BigEndianField::<4>::from_int(id).as_bytes());
    buf.put_slice(BigEndianField::<4>::from_int(name_hash).as_bytes());
}

/// A validated header borrowed from a received byte block.
///
/// The block may hold only the header prefix; use
/// [`HeaderView::message`] to get at variant fields once the full
/// declared size is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderView<'a> {
    bytes: &'a [u8],
    command: Command,
    size: u16,
}

impl<'a> HeaderView<'a> {
    /// Declared total message size.
    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn magic(&self) -> u8 {
        self.bytes[MAGIC_OFFSET]
    }

    pub fn command(&self) -> Command {
        self.command
    }

    /// Correlation id.
    pub fn id(&self) -> u32 {
        let mut cur = &self.bytes[ID_OFFSET..];
        endian::get32be(&mut cur)
    }

    pub fn name_hash(&self) -> u32 {
        let mut cur = &self.bytes[NAME_HASH_OFFSET..];
        endian::get32be(&mut cur)
    }

    /// Whether the block holds the whole declared message.
    pub fn is_complete(&self) -> bool {
        self.bytes.len() >= self.size as usize
    }

    /// The block this view was decoded from.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The same header over exactly its declared bytes.
    pub(crate) fn narrowed(&self) -> Result<HeaderView<'a>, ProtocolError> {
        let size = self.size as usize;
        let bytes = self.bytes.get(..size).ok_or(ProtocolError::SizeError {
            len: self.bytes.len(),
            min: size,
        })?;
        Ok(HeaderView { bytes, ..*self })
    }
}

/// Validates the header at the start of `buf`.
///
/// Checks, in order: enough bytes for a header, the magic byte, a known
/// command code, and a declared size no smaller than the command's
/// minimum. Only the header prefix needs to be present.
pub fn decode_header(buf: &[u8]) -> Result<HeaderView<'_>, ProtocolError> {
    if buf.len() < HEADER_SIZE {
        return Err(ProtocolError::SizeError {
            len: buf.len(),
            min: HEADER_SIZE,
        });
    }

    // Length checked above, so every peek below is in bounds
    let magic = endian::peek8(buf, MAGIC_OFFSET).unwrap_or_default();
    if magic != MAGIC {
        return Err(ProtocolError::MagicMismatch(magic));
    }

    let command = Command::try_from(endian::peek8(buf, COMMAND_OFFSET).unwrap_or_default())?;

    let size = endian::peek16be(buf, SIZE_OFFSET).unwrap_or_default();
    let min_size = command.min_size();
    if (size as usize) < min_size {
        return Err(ProtocolError::HeaderSizeError {
            command,
            got: size,
            expected: min_size as u16,
        });
    }

    Ok(HeaderView {
        bytes: buf,
        command,
        size,
    })
}
