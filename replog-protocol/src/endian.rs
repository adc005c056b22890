//! Big-endian integer codec.
//!
//! Writers take any [`BufMut`] and advance it, so the same functions encode
//! into a `BytesMut` or through a `&mut [u8]` cursor. Readers take any
//! [`Buf`] (usually a `&[u8]` cursor) and advance it. The `peek*` family
//! reads at a fixed offset without touching a cursor and returns `None`
//! instead of reading out of bounds.
//!
//! ```text
//! let mut cur: &mut [u8] = &mut raw[..];
//! put16be(&mut cur, 37);       // raw = [0, 37, ..], cur advanced by 2
//! let mut rd: &[u8] = &raw[..];
//! assert_eq!(get16be(&mut rd), 37);
//! ```

use bytes::{Buf, BufMut};

mod sealed {
    pub trait Sealed {}
}

/// Integer types that have a fixed-width big-endian wire form.
pub trait BeInt: Copy + sealed::Sealed {
    /// Encoded width in bytes.
    const WIDTH: usize;

    fn put_be<B: BufMut + ?Sized>(self, buf: &mut B);

    fn get_be<B: Buf + ?Sized>(buf: &mut B) -> Self;
}

macro_rules! impl_be_int {
    ($($t:ty => $put:ident, $get:ident;)*) => {
        $(
            impl sealed::Sealed for $t {}

            impl BeInt for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[inline]
                fn put_be<B: BufMut + ?Sized>(self, buf: &mut B) {
                    buf.$put(self);
                }

                #[inline]
                fn get_be<B: Buf + ?Sized>(buf: &mut B) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

impl_be_int! {
    u8  => put_u8,  get_u8;
    i8  => put_i8,  get_i8;
    u16 => put_u16, get_u16;
    i16 => put_i16, get_i16;
    u32 => put_u32, get_u32;
    i32 => put_i32, get_i32;
    u64 => put_u64, get_u64;
    i64 => put_i64, get_i64;
}

/// Writes `n` in network order and advances `buf`.
///
/// Panics if `buf` has less than `T::WIDTH` bytes of room.
#[inline]
pub fn put_be<T: BeInt, B: BufMut + ?Sized>(buf: &mut B, n: T) {
    n.put_be(buf);
}

/// Reads a network-order `T` and advances `buf`.
///
/// Panics if fewer than `T::WIDTH` bytes remain; callers validate length
/// first.
#[inline]
pub fn get_be<T: BeInt, B: Buf + ?Sized>(buf: &mut B) -> T {
    T::get_be(buf)
}

/// Writes `n` at the start of `dst` without a cursor.
#[inline]
pub fn store_be<T: BeInt>(dst: &mut [u8], n: T) {
    let mut cur = dst;
    n.put_be(&mut cur);
}

/// Reads a `T` at `offset` of `src`, or `None` if it does not fit.
#[inline]
pub fn peek_be<T: BeInt>(src: &[u8], offset: usize) -> Option<T> {
    let end = offset.checked_add(T::WIDTH)?;
    let mut cur = src.get(offset..end)?;
    Some(T::get_be(&mut cur))
}

#[inline]
pub fn put8<B: BufMut + ?Sized>(buf: &mut B, n: u8) {
    put_be(buf, n);
}

#[inline]
pub fn put16be<B: BufMut + ?Sized>(buf: &mut B, n: u16) {
    put_be(buf, n);
}

#[inline]
pub fn put32be<B: BufMut + ?Sized>(buf: &mut B, n: u32) {
    put_be(buf, n);
}

#[inline]
pub fn put64be<B: BufMut + ?Sized>(buf: &mut B, n: u64) {
    put_be(buf, n);
}

#[inline]
pub fn get8<B: Buf + ?Sized>(buf: &mut B) -> u8 {
    get_be(buf)
}

#[inline]
pub fn get16be<B: Buf + ?Sized>(buf: &mut B) -> u16 {
    get_be(buf)
}

#[inline]
pub fn get32be<B: Buf + ?Sized>(buf: &mut B) -> u32 {
    get_be(buf)
}

#[inline]
pub fn get64be<B: Buf + ?Sized>(buf: &mut B) -> u64 {
    get_be(buf)
}

#[inline]
pub fn peek8(src: &[u8], offset: usize) -> Option<u8> {
    src.get(offset).copied()
}

#[inline]
pub fn peek16be(src: &[u8], offset: usize) -> Option<u16> {
    peek_be(src, offset)
}

#[inline]
pub fn peek32be(src: &[u8], offset: usize) -> Option<u32> {
    peek_be(src, offset)
}

#[inline]
pub fn peek64be(src: &[u8], offset: usize) -> Option<u64> {
    peek_be(src, offset)
}
