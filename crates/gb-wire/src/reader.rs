use bytes::Buf;

use crate::error::WireError;
use crate::handle::Handle;
use crate::opcode::{BinaryOperator, Builtin, Opcode, Sort, UnaryOperator, ValueKind};

/// Cursor over a record produced by [`crate::ByteBuffer`]; the engine-side
/// mirror of the writer.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.bytes.is_empty()
    }

    fn need(&self, wanted: usize) -> Result<(), WireError> {
        if self.bytes.remaining() < wanted {
            return Err(WireError::Truncated {
                offset: self.offset,
                wanted,
            });
        }
        Ok(())
    }

    fn advance_by(&mut self, width: usize) {
        self.offset += width;
    }

    pub fn get_u8(&mut self) -> Result<u8, WireError> {
        self.need(1)?;
        self.advance_by(1);
        Ok(self.bytes.get_u8())
    }

    pub fn get_i8(&mut self) -> Result<i8, WireError> {
        self.need(1)?;
        self.advance_by(1);
        Ok(self.bytes.get_i8())
    }

    pub fn get_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.get_u8()? != 0)
    }

    pub fn get_i16(&mut self) -> Result<i16, WireError> {
        self.need(2)?;
        self.advance_by(2);
        Ok(self.bytes.get_i16())
    }

    pub fn get_u16(&mut self) -> Result<u16, WireError> {
        self.need(2)?;
        self.advance_by(2);
        Ok(self.bytes.get_u16())
    }

    pub fn get_i32(&mut self) -> Result<i32, WireError> {
        self.need(4)?;
        self.advance_by(4);
        Ok(self.bytes.get_i32())
    }

    pub fn get_u32(&mut self) -> Result<u32, WireError> {
        self.need(4)?;
        self.advance_by(4);
        Ok(self.bytes.get_u32())
    }

    pub fn get_i64(&mut self) -> Result<i64, WireError> {
        self.need(8)?;
        self.advance_by(8);
        Ok(self.bytes.get_i64())
    }

    pub fn get_u64(&mut self) -> Result<u64, WireError> {
        self.need(8)?;
        self.advance_by(8);
        Ok(self.bytes.get_u64())
    }

    pub fn get_f32(&mut self) -> Result<f32, WireError> {
        self.need(4)?;
        self.advance_by(4);
        Ok(self.bytes.get_f32())
    }

    pub fn get_f64(&mut self) -> Result<f64, WireError> {
        self.need(8)?;
        self.advance_by(8);
        Ok(self.bytes.get_f64())
    }

    pub fn get_string(&mut self) -> Result<String, WireError> {
        let count = self.get_i32()?.max(0) as usize;
        self.need(count * 4)?;
        let mut out = String::with_capacity(count);
        for _ in 0..count {
            let raw = self.get_i32()?;
            let ch = u32::try_from(raw)
                .ok()
                .and_then(char::from_u32)
                .ok_or(WireError::InvalidCodePoint(raw))?;
            out.push(ch);
        }
        Ok(out)
    }

    pub fn get_handle(&mut self) -> Result<Handle, WireError> {
        Ok(Handle::from_wire(self.get_i64()?))
    }

    pub fn get_opcode(&mut self) -> Result<Opcode, WireError> {
        Opcode::try_from(self.get_u8()?)
    }

    pub fn get_sort(&mut self) -> Result<Sort, WireError> {
        Sort::try_from(self.get_u8()?)
    }

    pub fn get_value_kind(&mut self) -> Result<ValueKind, WireError> {
        ValueKind::try_from(self.get_u8()?)
    }

    pub fn get_unary_operator(&mut self) -> Result<UnaryOperator, WireError> {
        UnaryOperator::try_from(self.get_u8()?)
    }

    pub fn get_binary_operator(&mut self) -> Result<BinaryOperator, WireError> {
        BinaryOperator::try_from(self.get_u8()?)
    }

    pub fn get_builtin(&mut self) -> Result<Builtin, WireError> {
        Builtin::try_from(self.get_u8()?)
    }
}
