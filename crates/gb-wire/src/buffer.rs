use bytes::{BufMut, BytesMut};

use crate::error::WireError;
use crate::handle::Handle;
use crate::opcode::{Opcode, Sort, ValueKind};

/// Upper bound of a single record, matching the engine-side scratch buffer.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Position of a reserved `i32` that is filled in after the record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

/// Append-only, fixed-capacity, big-endian record writer.
///
/// The buffer is reused across requests: [`ByteBuffer::rewind`] resets the
/// cursor without releasing memory. Writes past the capacity fail instead of
/// growing, so a record never exceeds what the engine can receive.
#[derive(Debug)]
pub struct ByteBuffer {
    inner: BytesMut,
    capacity: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ByteBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    pub fn rewind(&mut self) {
        self.inner.clear();
    }

    fn ensure(&self, needed: usize) -> Result<(), WireError> {
        if self.inner.len() + needed > self.capacity {
            return Err(WireError::Overflow {
                offset: self.inner.len(),
                needed,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Reserves an `i32` to be written later with [`ByteBuffer::patch_i32`].
    pub fn reserve_i32(&mut self) -> Result<Slot, WireError> {
        let slot = Slot(self.inner.len());
        self.put_i32(0)?;
        Ok(slot)
    }

    pub fn patch_i32(&mut self, slot: Slot, value: i32) {
        self.inner[slot.0..slot.0 + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn put_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.ensure(1)?;
        self.inner.put_u8(value);
        Ok(())
    }

    pub fn put_i8(&mut self, value: i8) -> Result<(), WireError> {
        self.ensure(1)?;
        self.inner.put_i8(value);
        Ok(())
    }

    pub fn put_bool(&mut self, value: bool) -> Result<(), WireError> {
        self.put_u8(value as u8)
    }

    pub fn put_i16(&mut self, value: i16) -> Result<(), WireError> {
        self.ensure(2)?;
        self.inner.put_i16(value);
        Ok(())
    }

    pub fn put_u16(&mut self, value: u16) -> Result<(), WireError> {
        self.ensure(2)?;
        self.inner.put_u16(value);
        Ok(())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<(), WireError> {
        self.ensure(4)?;
        self.inner.put_i32(value);
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.ensure(4)?;
        self.inner.put_u32(value);
        Ok(())
    }

    pub fn put_i64(&mut self, value: i64) -> Result<(), WireError> {
        self.ensure(8)?;
        self.inner.put_i64(value);
        Ok(())
    }

    pub fn put_u64(&mut self, value: u64) -> Result<(), WireError> {
        self.ensure(8)?;
        self.inner.put_u64(value);
        Ok(())
    }

    pub fn put_f32(&mut self, value: f32) -> Result<(), WireError> {
        self.ensure(4)?;
        self.inner.put_f32(value);
        Ok(())
    }

    pub fn put_f64(&mut self, value: f64) -> Result<(), WireError> {
        self.ensure(8)?;
        self.inner.put_f64(value);
        Ok(())
    }

    /// Writes `value` as an `i32` count followed by one `i32` per code point.
    pub fn put_string(&mut self, value: &str) -> Result<(), WireError> {
        let count = value.chars().count();
        self.ensure(4 + 4 * count)?;
        self.inner.put_i32(count as i32);
        for ch in value.chars() {
            self.inner.put_i32(ch as i32);
        }
        Ok(())
    }

    pub fn put_handle(&mut self, handle: Handle) -> Result<(), WireError> {
        self.put_i64(handle.to_wire())
    }

    pub fn put_opcode(&mut self, opcode: Opcode) -> Result<(), WireError> {
        self.put_u8(opcode.tag())
    }

    pub fn put_sort(&mut self, sort: Sort) -> Result<(), WireError> {
        self.put_u8(sort.tag())
    }

    pub fn put_value_kind(&mut self, kind: ValueKind) -> Result<(), WireError> {
        self.put_u8(kind.tag())
    }
}
