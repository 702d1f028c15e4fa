//! Cursor-based binary reader and writer for the wire format.
//!
//! Every integer on the wire is big-endian and fixed-width; there are
//! no varints.  [`KdkReader`] walks a borrowed byte slice and fails
//! without advancing when fewer bytes remain than a read needs, so a
//! caller can report the exact position of a truncated buffer.
//! [`KdkWriter`] appends to an owned buffer.
//!
//! Ported from the Kodiak JS SDK (`utils/serialization`).

use crate::ids::{Address, Id, NodeId, ID_LEN, SHORT_ID_LEN};
use crate::PrimitivesError;

/// A cursor over a byte slice for decoding wire data.
pub struct KdkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> KdkReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        KdkReader { data, pos: 0 }
    }

    /// Current cursor position in bytes from the start of the buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor back to a position previously returned by
    /// [`KdkReader::pos`].
    ///
    /// Lets a decoder that rejects what it finds leave the cursor
    /// where it started.  Only rewinding is supported.
    pub fn rewind_to(&mut self, pos: usize) {
        debug_assert!(pos <= self.pos);
        self.pos = pos;
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the reader has consumed the whole buffer.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read `len` bytes, advancing the cursor.
    ///
    /// # Arguments
    /// * `len` - Number of bytes to read.
    ///
    /// # Returns
    /// A borrowed slice of the next `len` bytes, or
    /// [`PrimitivesError::UnexpectedEof`] if fewer remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PrimitivesError> {
        if self.remaining() < len {
            return Err(PrimitivesError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, PrimitivesError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, PrimitivesError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a big-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, PrimitivesError> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Read a 32-byte [`Id`].
    pub fn read_id(&mut self) -> Result<Id, PrimitivesError> {
        let bytes = self.read_bytes(ID_LEN)?;
        Id::from_slice(bytes)
    }

    /// Read a 20-byte [`NodeId`].
    pub fn read_node_id(&mut self) -> Result<NodeId, PrimitivesError> {
        let bytes = self.read_bytes(SHORT_ID_LEN)?;
        NodeId::from_slice(bytes)
    }

    /// Read a 20-byte [`Address`].
    pub fn read_address(&mut self) -> Result<Address, PrimitivesError> {
        let bytes = self.read_bytes(SHORT_ID_LEN)?;
        Address::from_slice(bytes)
    }
}

/// An append-only buffer for encoding wire data.
#[derive(Default)]
pub struct KdkWriter {
    buf: Vec<u8>,
}

impl KdkWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        KdkWriter { buf: Vec::new() }
    }

    /// Create a writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        KdkWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a big-endian u16.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Append a big-endian u32.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Append a big-endian u64.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Append a 32-byte [`Id`].
    pub fn write_id(&mut self, id: &Id) {
        self.buf.extend_from_slice(id.as_bytes());
    }

    /// Append a 20-byte [`NodeId`].
    pub fn write_node_id(&mut self, id: &NodeId) {
        self.buf.extend_from_slice(id.as_bytes());
    }

    /// Append a 20-byte [`Address`].
    pub fn write_address(&mut self, addr: &Address) {
        self.buf.extend_from_slice(addr.as_bytes());
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
