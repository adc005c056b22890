//! Fixed-width big-endian field.
//!
//! A [`BigEndianField<N>`] is an N-byte cell holding either an integer of
//! exactly N bytes in network order or a short string, NUL-padded to the
//! full width. Assigning an integer whose width differs from `N` is
//! rejected at compile time:
//!
//! ```compile_fail
//! use replog_protocol::field::BigEndianField;
//! let _ = BigEndianField::<4>::from_int(1u16);
//! ```

use crate::endian::{self, BeInt};
use std::fmt;

struct WidthCheck<T, const N: usize>(std::marker::PhantomData<T>);

impl<T: BeInt, const N: usize> WidthCheck<T, N> {
    const OK: () = assert!(
        T::WIDTH == N && N <= 8,
        "integer width does not match field width"
    );
}

/// An N-byte field stored in network byte order.
///
/// `Display` (and so `to_string()`) renders the dump form; use
/// [`to_string_lossy`](Self::to_string_lossy) for the text up to the
/// first NUL.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigEndianField<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> BigEndianField<N> {
    /// A field with all bytes zero.
    pub const fn zeroed() -> Self {
        Self { data: [0; N] }
    }

    /// Builds a field holding `n` in network order.
    pub fn from_int<T: BeInt>(n: T) -> Self {
        let mut field = Self::zeroed();
        field.set(n);
        field
    }

    /// Builds a field from a string; see [`set_bytes`](Self::set_bytes).
    pub fn from_str_lossy(s: &str) -> Self {
        let mut field = Self::zeroed();
        field.set_bytes(s.as_bytes());
        field
    }

    /// Builds a field from exactly `N` raw bytes, copied verbatim.
    pub const fn from_raw(data: [u8; N]) -> Self {
        Self { data }
    }

    /// Stores `n` in network order.
    pub fn set<T: BeInt>(&mut self, n: T) {
        #[allow(clippy::let_unit_value)]
        let () = WidthCheck::<T, N>::OK;
        endian::store_be(&mut self.data, n);
    }

    /// Decodes the field as a `T` of the same width.
    pub fn get<T: BeInt>(&self) -> T {
        #[allow(clippy::let_unit_value)]
        let () = WidthCheck::<T, N>::OK;
        let mut cur: &[u8] = &self.data;
        endian::get_be(&mut cur)
    }

    /// Copies `src` plus its terminating NUL, truncated to `N` bytes, and
    /// zero-fills the rest. When `src.len() >= N` the NUL is dropped.
    pub fn set_bytes(&mut self, src: &[u8]) {
        let copied = N.min(src.len() + 1);
        let from_src = copied.min(src.len());
        self.data[..from_src].copy_from_slice(&src[..from_src]);
        self.fill(0, from_src);
    }

    /// Overwrites every byte from `offset` to the end with `byte`.
    pub fn fill(&mut self, byte: u8, offset: usize) {
        if offset < N {
            self.data[offset..].fill(byte);
        }
    }

    /// Content up to the first NUL, or the whole field if there is none.
    pub fn as_str_bytes(&self) -> &[u8] {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(N);
        &self.data[..end]
    }

    /// Lossy string form of [`as_str_bytes`](Self::as_str_bytes).
    ///
    /// `Display` prints the field for diagnostics instead, which falls back
    /// to byte values for binary content.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_str_bytes()).into_owned()
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.data
    }

    pub const fn width(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for BigEndianField<N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> From<[u8; N]> for BigEndianField<N> {
    fn from(data: [u8; N]) -> Self {
        Self::from_raw(data)
    }
}

impl<const N: usize> AsRef<[u8]> for BigEndianField<N> {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Printable ASCII is shown as text up to a terminating NUL; anything else
/// is shown as comma-separated byte values.
impl<const N: usize> fmt::Display for BigEndianField<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut end = N;
        let mut printable = true;
        for (i, &b) in self.data.iter().enumerate() {
            // NUL padding after text ends it rather than forcing the byte form
            if i > 0 && b == 0 {
                end = i;
                break;
            }
            if !(b' '..=b'~').contains(&b) {
                printable = false;
                break;
            }
        }

        if printable {
            for &b in &self.data[..end] {
                write!(f, "{}", b as char)?;
            }
            return Ok(());
        }

        for (i, b) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", b)?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for BigEndianField<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigEndianField<{}>({:?})", N, self.data)
    }
}
