use gb_ssa::{CallCommon, FuncId, Function, InstrKind, Program, TypeId, Value};
use gb_wire::Handle;

use crate::encoder::Encoder;
use crate::error::StepResult;

/// What a call site transfers control to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// A known function, or `None` when the callee is a computed value.
    Static { function: Option<FuncId> },
    /// An interface method resolved against the receiver's dynamic type.
    Dynamic { iface: TypeId, method: String },
}

impl CallTarget {
    pub fn of(program: &Program, func: FuncId, call: &CallCommon) -> Self {
        match &call.method {
            Some(method) => CallTarget::Dynamic {
                iface: program.value_type(func, &call.callee),
                method: method.clone(),
            },
            None => CallTarget::Static {
                function: static_callee(program, &call.callee),
            },
        }
    }

    /// Every function the call may reach. Dynamic targets use class
    /// hierarchy analysis over the package's named types.
    pub fn candidates(&self, program: &Program) -> Vec<FuncId> {
        match self {
            CallTarget::Static { function } => function.iter().copied().collect(),
            CallTarget::Dynamic { iface, method } => program.implementations(*iface, method),
        }
    }
}

/// A function named directly or through the closure that wraps it.
pub fn static_callee(program: &Program, callee: &Value) -> Option<FuncId> {
    match callee {
        Value::Function(id) => Some(*id),
        Value::Register(iref) => match &program.instruction(*iref)?.kind {
            InstrKind::MakeClosure { func, .. } => Some(*func),
            _ => None,
        },
        _ => None,
    }
}

impl Encoder<'_> {
    /// `i32 argc, args…, bool isDynamic, (i64 function, i64 entry) | i64 method`.
    pub(crate) fn write_call_common(&mut self, call: &CallCommon) -> StepResult<()> {
        match CallTarget::of(self.program, self.func, call) {
            CallTarget::Static { function } => {
                self.buf.put_i32(call.args.len() as i32)?;
                self.write_values(&call.args)?;
                self.buf.put_bool(false)?;
                let (function, entry) = match function {
                    Some(id) => {
                        let entry = self
                            .program
                            .function(id)
                            .and_then(Function::entry)
                            .map_or(Handle::NONE, |entry| self.registry.instruction(entry));
                        (self.registry.function(id), entry)
                    }
                    None => (Handle::NONE, Handle::NONE),
                };
                self.buf.put_handle(function)?;
                self.buf.put_handle(entry)?;
            }
            CallTarget::Dynamic { iface, method } => {
                self.buf.put_i32(call.args.len() as i32 + 1)?;
                self.write_value(&call.callee)?;
                self.write_values(&call.args)?;
                self.buf.put_bool(true)?;
                let descriptor = self.registry.method(iface, method);
                self.buf.put_handle(descriptor)?;
            }
        }
        Ok(())
    }
}
