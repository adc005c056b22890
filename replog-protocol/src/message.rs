//! Replication messages.
//!
//! Every message is the common [header](crate::header) followed by fixed
//! command fields and, for `GetSize` and `ErrorResponse`, a NUL-terminated
//! string:
//!
//! ```text
//! GetSize         'S': header | mode:4 | src_fd:4 | src_size:8 | name\0
//! GetSizeResponse 's': header | dst_fd:4 | dst_size:8
//! Append          'A': header | dst_fd:4 | src_offset:8 | chunk_size:4
//! ResendRequest   'r': header | dst_size:8
//! ErrorResponse   'e': header | last_cmd:1 | error\0
//! ```
//!
//! Senders fill one of the factory structs ([`GetSize`], [`Append`], ...)
//! and call [`Encode::encode`] to get an owned, immutable [`Message`].
//! Receivers call [`decode`] and get a [`MessageView`] borrowing the
//! received bytes.

use crate::alloc::{HeapAllocator, MessageAllocator};
use crate::endian::{self, BeInt};
use crate::error::ProtocolError;
use crate::hash;
use crate::header::{self, decode_header, Command, HeaderView, HEADER_SIZE};
use crate::MAX_MESSAGE_SIZE;
use bytes::{BufMut, Bytes, BytesMut};

/// `GetSize` without its name.
pub const GET_SIZE_FIXED: usize = HEADER_SIZE + 4 + 4 + 8;
pub const GET_SIZE_RESPONSE_SIZE: usize = HEADER_SIZE + 4 + 8;
pub const APPEND_SIZE: usize = HEADER_SIZE + 4 + 8 + 4;
pub const RESEND_REQUEST_SIZE: usize = HEADER_SIZE + 8;
/// `ErrorResponse` without its error text.
pub const ERROR_RESPONSE_FIXED: usize = HEADER_SIZE + 1;

const GET_SIZE_MODE: usize = HEADER_SIZE;
const GET_SIZE_SRC_FD: usize = HEADER_SIZE + 4;
const GET_SIZE_SRC_SIZE: usize = HEADER_SIZE + 8;

const GET_SIZE_RESPONSE_DST_FD: usize = HEADER_SIZE;
const GET_SIZE_RESPONSE_DST_SIZE: usize = HEADER_SIZE + 4;

const APPEND_DST_FD: usize = HEADER_SIZE;
const APPEND_SRC_OFFSET: usize = HEADER_SIZE + 4;
const APPEND_CHUNK_SIZE: usize = HEADER_SIZE + 12;

const RESEND_REQUEST_DST_SIZE: usize = HEADER_SIZE;

const ERROR_RESPONSE_LAST_CMD: usize = HEADER_SIZE;

/// An encoded message, owned and immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    bytes: Bytes,
    command: Command,
}

impl Message {
    pub fn command(&self) -> Command {
        self.command
    }

    /// Encoded length, equal to the declared size in the header.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Decodes the message back into a typed view.
    pub fn view(&self) -> Result<MessageView<'_>, ProtocolError> {
        decode(&self.bytes)
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Message factories.
pub trait Encode {
    fn command(&self) -> Command;

    /// Exact number of bytes the encoded message occupies.
    fn encoded_len(&self) -> usize;

    /// Encodes into a block obtained from `alloc`.
    fn encode_in<A: MessageAllocator + ?Sized>(&self, alloc: &A) -> Result<Message, ProtocolError>;

    /// Encodes into a heap block.
    fn encode(&self) -> Result<Message, ProtocolError> {
        self.encode_in(&HeapAllocator)
    }
}

fn tail_len(tail: Option<&[u8]>) -> usize {
    tail.map_or(0, |t| t.len() + 1)
}

/// Allocates exactly `fixed` + tail bytes, writes the header, the command
/// fields via `body`, then the NUL-terminated tail.
fn build<A, F>(
    alloc: &A,
    command: Command,
    id: u32,
    name_hash: u32,
    fixed: usize,
    tail: Option<&[u8]>,
    body: F,
) -> Result<Message, ProtocolError>
where
    A: MessageAllocator + ?Sized,
    F: FnOnce(&mut BytesMut),
{
    if tail.is_some_and(|t| t.contains(&0)) {
        return Err(ProtocolError::InteriorNul);
    }

    let size = fixed + tail_len(tail);
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = alloc.allocate(size);
    buf.clear();
    if buf.capacity() < size {
        return Err(ProtocolError::AllocationFailed {
            requested: size,
            got: buf.capacity(),
        });
    }

    header::encode_header(&mut buf, command, size as u16, id, name_hash);
    body(&mut buf);
    if let Some(tail) = tail {
        buf.put_slice(tail);
        buf.put_u8(0);
    }

    tracing::trace!(command = ?command, id, size, "encoded message");
    freeze(buf, command, size)
}

/// Seals an encoded block, checking it against the size written in its
/// header.
fn freeze(buf: BytesMut, command: Command, size: usize) -> Result<Message, ProtocolError> {
    if buf.len() != size {
        return Err(ProtocolError::EncodedSizeMismatch {
            expected: size,
            got: buf.len(),
        });
    }
    Ok(Message {
        bytes: buf.freeze(),
        command,
    })
}

/// Asks the destination for the size of `name`. The name hash is derived
/// from `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSize<'a> {
    pub id: u32,
    pub name: &'a str,
    pub src_size: u64,
    pub src_fd: i32,
    pub mode: u32,
}

impl Encode for GetSize<'_> {
    fn command(&self) -> Command {
        Command::GetSize
    }

    fn encoded_len(&self) -> usize {
        GET_SIZE_FIXED + tail_len(Some(self.name.as_bytes()))
    }

    fn encode_in<A: MessageAllocator + ?Sized>(&self, alloc: &A) -> Result<Message, ProtocolError> {
        let name = self.name.as_bytes();
        build(
            alloc,
            Command::GetSize,
            self.id,
            hash::name_hash(name),
            GET_SIZE_FIXED,
            Some(name),
            |buf| {
                endian::put32be(buf, self.mode);
                endian::put_be(buf, self.src_fd);
                endian::put64be(buf, self.src_size);
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSizeResponse {
    pub id: u32,
    pub name_hash: u32,
    pub dst_fd: i32,
    /// Current size of the destination file.
    pub dst_size: u64,
}

impl Encode for GetSizeResponse {
    fn command(&self) -> Command {
        Command::GetSizeResponse
    }

    fn encoded_len(&self) -> usize {
        GET_SIZE_RESPONSE_SIZE
    }

    fn encode_in<A: MessageAllocator + ?Sized>(&self, alloc: &A) -> Result<Message, ProtocolError> {
        build(
            alloc,
            Command::GetSizeResponse,
            self.id,
            self.name_hash,
            GET_SIZE_RESPONSE_SIZE,
            None,
            |buf| {
                endian::put_be(buf, self.dst_fd);
                endian::put64be(buf, self.dst_size);
            },
        )
    }
}

/// Announces `chunk_size` bytes of file data read at `src_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Append {
    pub id: u32,
    pub name_hash: u32,
    pub dst_fd: i32,
    pub src_offset: u64,
    pub chunk_size: u32,
}

impl Encode for Append {
    fn command(&self) -> Command {
        Command::Append
    }

    fn encoded_len(&self) -> usize {
        APPEND_SIZE
    }

    fn encode_in<A: MessageAllocator + ?Sized>(&self, alloc: &A) -> Result<Message, ProtocolError> {
        build(
            alloc,
            Command::Append,
            self.id,
            self.name_hash,
            APPEND_SIZE,
            None,
            |buf| {
                endian::put_be(buf, self.dst_fd);
                endian::put64be(buf, self.src_offset);
                endian::put32be(buf, self.chunk_size);
            },
        )
    }
}

/// Asks the source to resend data starting at `dst_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendRequest {
    pub id: u32,
    pub name_hash: u32,
    pub dst_size: u64,
}

impl Encode for ResendRequest {
    fn command(&self) -> Command {
        Command::ResendRequest
    }

    fn encoded_len(&self) -> usize {
        RESEND_REQUEST_SIZE
    }

    fn encode_in<A: MessageAllocator + ?Sized>(&self, alloc: &A) -> Result<Message, ProtocolError> {
        build(
            alloc,
            Command::ResendRequest,
            self.id,
            self.name_hash,
            RESEND_REQUEST_SIZE,
            None,
            |buf| endian::put64be(buf, self.dst_size),
        )
    }
}

/// Reports that `last_cmd` failed with `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse<'a> {
    pub id: u32,
    pub name_hash: u32,
    pub last_cmd: Command,
    pub error: &'a str,
}

impl Encode for ErrorResponse<'_> {
    fn command(&self) -> Command {
        Command::ErrorResponse
    }

    fn encoded_len(&self) -> usize {
        ERROR_RESPONSE_FIXED + tail_len(Some(self.error.as_bytes()))
    }

    fn encode_in<A: MessageAllocator + ?Sized>(&self, alloc: &A) -> Result<Message, ProtocolError> {
        build(
            alloc,
            Command::ErrorResponse,
            self.id,
            self.name_hash,
            ERROR_RESPONSE_FIXED,
            Some(self.error.as_bytes()),
            |buf| endian::put8(buf, self.last_cmd.code()),
        )
    }
}

// Views only exist over blocks at least `command.min_size()` long, so
// fixed-offset reads stay in bounds.
fn field<T: BeInt>(bytes: &[u8], offset: usize) -> T {
    let mut cur = &bytes[offset..];
    endian::get_be(&mut cur)
}

/// Bytes from `offset` up to the first NUL or the end of the message.
fn tail(bytes: &[u8], offset: usize) -> &[u8] {
    let rest = &bytes[offset..];
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    &rest[..end]
}

fn utf8(bytes: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
}

macro_rules! header_accessors {
    ($lt:lifetime) => {
        pub fn header(&self) -> HeaderView<$lt> {
            self.header
        }

        pub fn id(&self) -> u32 {
            self.header.id()
        }

        pub fn name_hash(&self) -> u32 {
            self.header.name_hash()
        }

        /// Declared size, equal to `as_bytes().len()`.
        pub fn size(&self) -> u16 {
            self.header.size()
        }

        pub fn as_bytes(&self) -> &$lt [u8] {
            self.header.as_bytes()
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSizeView<'a> {
    header: HeaderView<'a>,
}

impl<'a> GetSizeView<'a> {
    header_accessors!('a);

    pub fn mode(&self) -> u32 {
        field(self.as_bytes(), GET_SIZE_MODE)
    }

    pub fn src_fd(&self) -> i32 {
        field(self.as_bytes(), GET_SIZE_SRC_FD)
    }

    pub fn src_size(&self) -> u64 {
        field(self.as_bytes(), GET_SIZE_SRC_SIZE)
    }

    pub fn name_bytes(&self) -> &'a [u8] {
        tail(self.as_bytes(), GET_SIZE_FIXED)
    }

    pub fn name(&self) -> Result<&'a str, ProtocolError> {
        utf8(self.name_bytes())
    }

    /// Whether the header's name hash matches the carried name.
    pub fn name_hash_matches(&self) -> bool {
        hash::name_hash(self.name_bytes()) == self.name_hash()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSizeResponseView<'a> {
    header: HeaderView<'a>,
}

impl<'a> GetSizeResponseView<'a> {
    header_accessors!('a);

    pub fn dst_fd(&self) -> i32 {
        field(self.as_bytes(), GET_SIZE_RESPONSE_DST_FD)
    }

    pub fn dst_size(&self) -> u64 {
        field(self.as_bytes(), GET_SIZE_RESPONSE_DST_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendView<'a> {
    header: HeaderView<'a>,
}

impl<'a> AppendView<'a> {
    header_accessors!('a);

    pub fn dst_fd(&self) -> i32 {
        field(self.as_bytes(), APPEND_DST_FD)
    }

    pub fn src_offset(&self) -> u64 {
        field(self.as_bytes(), APPEND_SRC_OFFSET)
    }

    pub fn chunk_size(&self) -> u32 {
        field(self.as_bytes(), APPEND_CHUNK_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendRequestView<'a> {
    header: HeaderView<'a>,
}

impl<'a> ResendRequestView<'a> {
    header_accessors!('a);

    pub fn dst_size(&self) -> u64 {
        field(self.as_bytes(), RESEND_REQUEST_DST_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponseView<'a> {
    header: HeaderView<'a>,
}

impl<'a> ErrorResponseView<'a> {
    header_accessors!('a);

    pub fn last_cmd_raw(&self) -> u8 {
        field(self.as_bytes(), ERROR_RESPONSE_LAST_CMD)
    }

    pub fn last_cmd(&self) -> Result<Command, ProtocolError> {
        Command::try_from(self.last_cmd_raw())
    }

    pub fn error_bytes(&self) -> &'a [u8] {
        tail(self.as_bytes(), ERROR_RESPONSE_FIXED)
    }

    pub fn error(&self) -> Result<&'a str, ProtocolError> {
        utf8(self.error_bytes())
    }
}

/// A decoded message borrowing its source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageView<'a> {
    GetSize(GetSizeView<'a>),
    GetSizeResponse(GetSizeResponseView<'a>),
    Append(AppendView<'a>),
    ResendRequest(ResendRequestView<'a>),
    ErrorResponse(ErrorResponseView<'a>),
    /// Reserved; only the header is defined.
    MoveFile(HeaderView<'a>),
    /// Reserved; only the header is defined.
    DeleteFile(HeaderView<'a>),
}

impl<'a> MessageView<'a> {
    pub fn header(&self) -> HeaderView<'a> {
        match self {
            MessageView::GetSize(v) => v.header(),
            MessageView::GetSizeResponse(v) => v.header(),
            MessageView::Append(v) => v.header(),
            MessageView::ResendRequest(v) => v.header(),
            MessageView::ErrorResponse(v) => v.header(),
            MessageView::MoveFile(h) | MessageView::DeleteFile(h) => *h,
        }
    }

    pub fn command(&self) -> Command {
        self.header().command()
    }

    /// Exactly the declared bytes of this message.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.header().as_bytes()
    }
}

impl<'a> HeaderView<'a> {
    /// Types the view by its command once the whole declared message is
    /// present. Bytes past the declared size are not part of the result.
    pub fn message(&self) -> Result<MessageView<'a>, ProtocolError> {
        let header = self.narrowed()?;
        Ok(match header.command() {
            Command::GetSize => MessageView::GetSize(GetSizeView { header }),
            Command::GetSizeResponse => {
                MessageView::GetSizeResponse(GetSizeResponseView { header })
            }
            Command::Append => MessageView::Append(AppendView { header }),
            Command::ResendRequest => MessageView::ResendRequest(ResendRequestView { header }),
            Command::ErrorResponse => MessageView::ErrorResponse(ErrorResponseView { header }),
            Command::MoveFile => MessageView::MoveFile(header),
            Command::DeleteFile => MessageView::DeleteFile(header),
        })
    }
}

/// Validates the header of `buf` and returns the typed message it holds.
pub fn decode(buf: &[u8]) -> Result<MessageView<'_>, ProtocolError> {
    decode_header(buf)?.message()
}
