//! Per-instruction record layouts.
//!
//! Each arm writes the opcode followed by its payload. Operand encoding is
//! in [`crate::value`], call targets in [`crate::call`].

use gb_ssa::{
    CallCommon, FuncId, InstrKind, InstrRef, Instruction, Program, Type, TypeId, TypeTable, Value,
};
use gb_wire::{Builtin, ByteBuffer, Handle, Opcode, Sort};
use tracing::warn;

use crate::error::{StepError, StepResult};
use crate::registry::HandleRegistry;
use crate::sort::{element_sort, field_type, map_types, sort_of};

/// Writes one instruction into the session buffer.
pub(crate) struct Encoder<'a> {
    pub(crate) program: &'a Program,
    pub(crate) registry: &'a mut HandleRegistry,
    pub(crate) buf: &'a mut ByteBuffer,
    /// Function the instruction belongs to; operands are resolved in it.
    pub(crate) func: FuncId,
    pub(crate) iref: InstrRef,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(
        program: &'a Program,
        registry: &'a mut HandleRegistry,
        buf: &'a mut ByteBuffer,
        iref: InstrRef,
    ) -> Self {
        Self {
            program,
            registry,
            buf,
            func: iref.func,
            iref,
        }
    }

    fn types(&self) -> &'a TypeTable {
        self.program.types()
    }

    fn value_type(&self, value: &Value) -> TypeId {
        self.program.value_type(self.func, value)
    }

    fn result_type(&self, instr: &Instruction) -> TypeId {
        instr
            .result_type()
            .unwrap_or_else(|| self.program.types().void())
    }

    fn pointee(&self, ty: TypeId) -> TypeId {
        let types = self.program.types();
        match types.get(types.underlying(ty)) {
            Type::Pointer(elem) => *elem,
            _ => types.void(),
        }
    }

    fn block_entry_handle(&mut self, block: u32) -> Handle {
        self.program
            .function(self.func)
            .and_then(|function| function.block_entry(block))
            .map_or(Handle::NONE, |entry| self.registry.instruction(entry))
    }

    pub(crate) fn encode(&mut self, instr: &'a Instruction, last_block: i32) -> StepResult<()> {
        let types = self.types();
        match &instr.kind {
            InstrKind::UnOp { op, x, .. } => {
                self.buf.put_opcode(Opcode::UnOp)?;
                self.write_result()?;
                self.buf.put_u8(op.tag())?;
                self.write_value(x)?;
            }
            InstrKind::BinOp { op, x, y } => {
                self.buf.put_opcode(Opcode::BinOp)?;
                self.write_result()?;
                self.write_value(x)?;
                self.buf.put_u8(op.tag())?;
                self.write_value(y)?;
            }
            InstrKind::Call(call) => match &call.callee {
                Value::Builtin(builtin) => self.encode_builtin(*builtin, call)?,
                _ => {
                    self.buf.put_opcode(Opcode::Call)?;
                    self.write_result()?;
                    self.write_call_common(call)?;
                }
            },
            InstrKind::ChangeInterface { x } => self.encode_conversion(Opcode::ChangeInterface, x)?,
            InstrKind::ChangeType { x } => self.encode_conversion(Opcode::ChangeType, x)?,
            InstrKind::Convert { x } | InstrKind::MultiConvert { x } => {
                self.encode_conversion(Opcode::Convert, x)?
            }
            InstrKind::MakeInterface { x } => self.encode_conversion(Opcode::MakeInterface, x)?,
            InstrKind::SliceToArrayPointer { x } => {
                let array = self.pointee(self.result_type(instr));
                let len = match types.get(types.underlying(array)) {
                    Type::Array { len, .. } => *len as i64,
                    _ => 0,
                };
                let array_handle = self.type_handle(array);
                self.buf.put_opcode(Opcode::SliceToArrayPointer)?;
                self.write_result()?;
                self.buf.put_handle(array_handle)?;
                self.buf.put_sort(element_sort(types, array))?;
                self.buf.put_i64(len)?;
                self.write_value(x)?;
            }
            InstrKind::Store { addr, value } => {
                self.buf.put_opcode(Opcode::Store)?;
                self.write_value(addr)?;
                self.write_value(value)?;
            }
            InstrKind::If { cond } => {
                let succs = self
                    .program
                    .block(self.iref)
                    .map(|block| block.succs.as_slice())
                    .unwrap_or_default();
                let on_true = succs.first().copied();
                let on_false = succs.get(1).copied();
                self.buf.put_opcode(Opcode::If)?;
                self.write_value(cond)?;
                let on_true = on_true.map_or(Handle::NONE, |block| self.block_entry_handle(block));
                let on_false = on_false.map_or(Handle::NONE, |block| self.block_entry_handle(block));
                self.buf.put_handle(on_true)?;
                self.buf.put_handle(on_false)?;
            }
            InstrKind::Jump => self.buf.put_opcode(Opcode::Jump)?,
            InstrKind::Defer(call) => {
                self.buf.put_opcode(Opcode::Defer)?;
                self.write_call_common(call)?;
                // a deferred builtin trails its tag and extras
                if let Value::Builtin(builtin) = &call.callee {
                    self.buf.put_u8(builtin.tag())?;
                    self.write_builtin_extras(*builtin, call)?;
                }
            }
            InstrKind::Alloc { .. } => {
                let pointee = self.pointee(self.result_type(instr));
                let sort = sort_of(types, pointee, false);
                let pointee_handle = self.type_handle(pointee);
                self.buf.put_opcode(Opcode::Alloc)?;
                self.write_result()?;
                self.buf.put_sort(sort)?;
                self.buf.put_handle(pointee_handle)?;
                if let Type::Array { len, elem } = types.get(types.underlying(pointee)) {
                    let elem_handle = self.type_handle(*elem);
                    self.buf.put_i64(*len as i64)?;
                    self.buf.put_handle(elem_handle)?;
                }
            }
            InstrKind::MakeSlice { len, cap } => {
                let slice = self.type_handle(self.result_type(instr));
                self.buf.put_opcode(Opcode::MakeSlice)?;
                self.write_result()?;
                self.buf.put_handle(slice)?;
                self.write_value(len)?;
                self.write_value(cap)?;
            }
            InstrKind::MakeMap { reserve } => {
                let map = self.type_handle(self.result_type(instr));
                self.buf.put_opcode(Opcode::MakeMap)?;
                self.write_result()?;
                self.buf.put_handle(map)?;
                match reserve {
                    Some(reserve) => self.write_value(reserve)?,
                    None => self.write_int_const(0)?,
                }
            }
            InstrKind::Extract { tuple, index } => {
                self.buf.put_opcode(Opcode::Extract)?;
                self.write_result()?;
                self.write_value(tuple)?;
                self.buf.put_i32(*index as i32)?;
            }
            InstrKind::Slice { x, low, high, max } => {
                let sort = element_sort(types, self.value_type(x));
                self.buf.put_opcode(Opcode::Slice)?;
                self.write_result()?;
                self.buf.put_sort(sort)?;
                self.write_value(x)?;
                for (bound, missing) in [(low, 0), (high, -1), (max, -1)] {
                    match bound {
                        Some(bound) => self.write_value(bound)?,
                        None => self.write_int_const(missing)?,
                    }
                }
            }
            InstrKind::Return { results } => {
                self.buf.put_opcode(Opcode::Return)?;
                self.buf.put_i32(results.len() as i32)?;
                if results.is_empty() {
                    self.write_nil(types.void())?;
                } else {
                    self.write_values(results)?;
                }
            }
            InstrKind::RunDefers => self.buf.put_opcode(Opcode::RunDefers)?,
            InstrKind::Panic { x } => {
                self.buf.put_opcode(Opcode::Panic)?;
                self.write_panic_cause(x)?;
            }
            InstrKind::Phi { edges } => {
                let edge = self
                    .program
                    .block(self.iref)
                    .and_then(|block| {
                        block
                            .preds
                            .iter()
                            .position(|pred| i64::from(*pred) == i64::from(last_block))
                    })
                    .and_then(|position| edges.get(position))
                    .ok_or(StepError::PhiEdgeMissing {
                        instr: self.iref,
                        last_block,
                    })?;
                self.buf.put_opcode(Opcode::Variable)?;
                self.write_result()?;
                self.write_value(edge)?;
            }
            InstrKind::Range { x } => {
                self.buf.put_opcode(Opcode::Range)?;
                self.write_result()?;
                self.write_value(x)?;
                if let Some((key, value)) = map_types(types, self.value_type(x)) {
                    self.buf.put_sort(sort_of(types, key, false))?;
                    self.buf.put_sort(sort_of(types, value, false))?;
                }
            }
            InstrKind::Next { iter, is_string } => {
                self.buf.put_opcode(Opcode::Next)?;
                self.write_result()?;
                self.write_value(iter)?;
                self.buf.put_bool(*is_string)?;
                if !*is_string {
                    let (key, value) = self.ranged_map_sorts(iter);
                    self.buf.put_sort(key)?;
                    self.buf.put_sort(value)?;
                }
            }
            InstrKind::FieldAddr { x, field } => {
                self.encode_field(Opcode::FieldAddr, x, *field)?
            }
            InstrKind::Field { x, field } => self.encode_field(Opcode::Field, x, *field)?,
            InstrKind::IndexAddr { x, index } => {
                self.encode_index(Opcode::IndexAddr, x, index)?
            }
            InstrKind::Index { x, index } => self.encode_index(Opcode::Index, x, index)?,
            InstrKind::Lookup { x, key, comma_ok } => {
                let sort = element_sort(types, self.value_type(x));
                self.buf.put_opcode(Opcode::Lookup)?;
                self.write_result()?;
                self.buf.put_sort(sort)?;
                self.write_value(x)?;
                self.write_value(key)?;
                self.buf.put_bool(*comma_ok)?;
            }
            InstrKind::MapUpdate { map, key, value } => {
                self.buf.put_opcode(Opcode::MapUpdate)?;
                self.write_value(map)?;
                self.write_value(key)?;
                self.write_value(value)?;
            }
            InstrKind::TypeAssert {
                x,
                asserted,
                comma_ok,
            } => {
                let asserted = self.type_handle(*asserted);
                self.buf.put_opcode(Opcode::TypeAssert)?;
                self.write_result()?;
                self.write_value(x)?;
                self.buf.put_handle(asserted)?;
                self.buf.put_bool(*comma_ok)?;
            }
            InstrKind::MakeClosure { func, bindings } => {
                let function = self.registry.function(*func);
                self.buf.put_opcode(Opcode::MakeClosure)?;
                self.write_result()?;
                self.buf.put_handle(function)?;
                self.buf.put_i32(bindings.len() as i32)?;
                self.write_values(bindings)?;
            }
            InstrKind::Send { .. }
            | InstrKind::Go(_)
            | InstrKind::MakeChan { .. }
            | InstrKind::Select { .. }
            | InstrKind::DebugRef { .. } => {
                warn!(instr = %self.iref, op = instr.kind.name(), "encoding as no-op");
                self.buf.put_opcode(Opcode::Noop)?;
            }
            InstrKind::Unsupported { op } => {
                return Err(StepError::UnknownOpcode {
                    op: op.clone(),
                    instr: self.iref,
                })
            }
        }
        Ok(())
    }

    fn encode_conversion(&mut self, opcode: Opcode, x: &Value) -> StepResult<()> {
        self.buf.put_opcode(opcode)?;
        self.write_result()?;
        self.write_value(x)
    }

    fn encode_field(&mut self, opcode: Opcode, x: &Value, field: u32) -> StepResult<()> {
        let types = self.types();
        let sort = field_type(types, self.value_type(x), field)
            .map_or(Sort::Unknown, |ty| sort_of(types, ty, false));
        self.buf.put_opcode(opcode)?;
        self.write_result()?;
        self.buf.put_sort(sort)?;
        self.write_value(x)?;
        self.buf.put_i32(field as i32)?;
        Ok(())
    }

    fn encode_index(&mut self, opcode: Opcode, x: &Value, index: &Value) -> StepResult<()> {
        let sort = element_sort(self.types(), self.value_type(x));
        self.buf.put_opcode(opcode)?;
        self.write_result()?;
        self.buf.put_sort(sort)?;
        self.write_value(x)?;
        self.write_value(index)
    }

    /// `u8 builtin, i32 argc, args…` plus the per-builtin extras.
    fn encode_builtin(&mut self, builtin: Builtin, call: &CallCommon) -> StepResult<()> {
        self.buf.put_opcode(Opcode::CallBuiltin)?;
        self.write_result()?;
        self.buf.put_u8(builtin.tag())?;
        self.buf.put_i32(call.args.len() as i32)?;
        self.write_values(&call.args)?;
        self.write_builtin_extras(builtin, call)
    }

    /// Element sort for `append` and `copy`; owning function and recovery
    /// entry for `recover`.
    fn write_builtin_extras(&mut self, builtin: Builtin, call: &CallCommon) -> StepResult<()> {
        if builtin.carries_element_sort() {
            let sort = call.args.first().map_or(Sort::Unknown, |slice| {
                element_sort(self.types(), self.value_type(slice))
            });
            self.buf.put_sort(sort)?;
        }
        if builtin == Builtin::Recover {
            let function = self.registry.function(self.func);
            let recover = self
                .program
                .function(self.func)
                .and_then(|function| function.recover_entry())
                .map_or(Handle::NONE, |entry| self.registry.instruction(entry));
            self.buf.put_handle(function)?;
            self.buf.put_handle(recover)?;
        }
        Ok(())
    }

    /// Panics with an interface-boxed value carry the boxed operand; any
    /// other cause travels as its text.
    fn write_panic_cause(&mut self, x: &Value) -> StepResult<()> {
        let boxed = x
            .as_register()
            .and_then(|iref| self.program.instruction(iref))
            .and_then(|producer| match &producer.kind {
                InstrKind::MakeInterface { x } => Some(x),
                _ => None,
            });
        match boxed {
            Some(inner) => self.write_value(inner),
            None => {
                let text = self.program.value_text(self.func, x);
                self.write_string_const(&text)
            }
        }
    }

    /// Key and value sorts of the map a `Next` iterates, found through the
    /// `Range` that produced its iterator.
    fn ranged_map_sorts(&self, iter: &Value) -> (Sort, Sort) {
        let types = self.types();
        iter.as_register()
            .and_then(|iref| self.program.instruction(iref))
            .and_then(|range| match &range.kind {
                InstrKind::Range { x } => map_types(types, self.value_type(x)),
                _ => None,
            })
            .map_or((Sort::Unknown, Sort::Unknown), |(key, value)| {
                (sort_of(types, key, false), sort_of(types, value, false))
            })
    }
}
