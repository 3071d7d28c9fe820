//! Operand encoding: `[u8 kind][i64 type][i64 underlying][u8 sort][payload]`.

use gb_ssa::{BasicKind, Literal, TypeId, Value};
use gb_wire::{Handle, Sort, ValueKind};

use crate::encoder::Encoder;
use crate::error::StepResult;
use crate::sort::sort_of;

impl Encoder<'_> {
    pub(crate) fn type_handle(&mut self, ty: TypeId) -> Handle {
        self.registry.ty(ty)
    }

    fn write_value_header(&mut self, kind: ValueKind, ty: TypeId) -> StepResult<Sort> {
        let types = self.program.types();
        let sort = sort_of(types, ty, false);
        let ty_handle = self.registry.ty(ty);
        let underlying_handle = self.registry.ty(types.underlying(ty));
        self.buf.put_value_kind(kind)?;
        self.buf.put_handle(ty_handle)?;
        self.buf.put_handle(underlying_handle)?;
        self.buf.put_sort(sort)?;
        Ok(sort)
    }

    pub(crate) fn write_value(&mut self, value: &Value) -> StepResult<()> {
        let ty = self.program.value_type(self.func, value);
        match value {
            Value::Const(constant) => self.write_const(constant.ty, &constant.literal),
            Value::Parameter(index) => {
                self.write_value_header(ValueKind::Parameter, ty)?;
                self.buf.put_i32(*index as i32)?;
                Ok(())
            }
            Value::FreeVar(index) => {
                self.write_value_header(ValueKind::FreeVariable, ty)?;
                self.buf.put_i32(*index as i32)?;
                Ok(())
            }
            Value::Register(iref) => {
                self.write_value_header(ValueKind::Local, ty)?;
                let handle = self.registry.instruction(*iref);
                self.buf.put_handle(handle)?;
                Ok(())
            }
            // function values outside call position
            Value::Function(_) | Value::Builtin(_) => self.write_const(ty, &Literal::Nil),
        }
    }

    pub(crate) fn write_values(&mut self, values: &[Value]) -> StepResult<()> {
        for value in values {
            self.write_value(value)?;
        }
        Ok(())
    }

    /// The current instruction's own register.
    pub(crate) fn write_result(&mut self) -> StepResult<()> {
        self.write_value(&Value::Register(self.iref))
    }

    pub(crate) fn write_const(&mut self, ty: TypeId, literal: &Literal) -> StepResult<()> {
        let sort = self.write_value_header(ValueKind::Const, ty)?;
        self.write_literal(sort, literal)
    }

    pub(crate) fn write_int_const(&mut self, value: i64) -> StepResult<()> {
        let int = self.program.types().basic(BasicKind::Int);
        self.write_const(int, &Literal::Int(value))
    }

    pub(crate) fn write_string_const(&mut self, text: &str) -> StepResult<()> {
        let string = self.program.types().basic(BasicKind::String);
        self.write_const(string, &Literal::Str(text.to_string()))
    }

    pub(crate) fn write_nil(&mut self, ty: TypeId) -> StepResult<()> {
        self.write_const(ty, &Literal::Nil)
    }

    fn write_literal(&mut self, sort: Sort, literal: &Literal) -> StepResult<()> {
        match sort {
            Sort::Bool => self.buf.put_bool(matches!(literal, Literal::Bool(true)))?,
            Sort::Int8 => self.buf.put_i8(as_i64(literal) as i8)?,
            Sort::Int16 => self.buf.put_i16(as_i64(literal) as i16)?,
            Sort::Int32 => self.buf.put_i32(as_i64(literal) as i32)?,
            Sort::Int64 => self.buf.put_i64(as_i64(literal))?,
            Sort::Uint8 => self.buf.put_u8(as_u64(literal) as u8)?,
            Sort::Uint16 => self.buf.put_u16(as_u64(literal) as u16)?,
            Sort::Uint32 => self.buf.put_u32(as_u64(literal) as u32)?,
            Sort::Uint64 => self.buf.put_u64(as_u64(literal))?,
            Sort::Float32 => self.buf.put_f32(as_f64(literal) as f32)?,
            Sort::Float64 => self.buf.put_f64(as_f64(literal))?,
            Sort::String => match literal {
                Literal::Str(text) => self.buf.put_string(text)?,
                _ => self.buf.put_string("")?,
            },
            // nil of a composite, pointer or unknown sort
            _ => {}
        }
        Ok(())
    }
}

fn as_i64(literal: &Literal) -> i64 {
    match literal {
        Literal::Int(value) => *value,
        Literal::Uint(value) => *value as i64,
        Literal::Float(value) => *value as i64,
        Literal::Bool(value) => i64::from(*value),
        Literal::Nil | Literal::Str(_) => 0,
    }
}

fn as_u64(literal: &Literal) -> u64 {
    match literal {
        Literal::Uint(value) => *value,
        Literal::Int(value) => *value as u64,
        Literal::Float(value) => *value as u64,
        Literal::Bool(value) => u64::from(*value),
        Literal::Nil | Literal::Str(_) => 0,
    }
}

fn as_f64(literal: &Literal) -> f64 {
    match literal {
        Literal::Float(value) => *value,
        Literal::Int(value) => *value as f64,
        Literal::Uint(value) => *value as f64,
        Literal::Bool(_) | Literal::Nil | Literal::Str(_) => 0.0,
    }
}
