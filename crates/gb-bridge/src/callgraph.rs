//! Call edges: who a call site may reach and who reaches a function.

use std::collections::HashMap;

use gb_ssa::{FuncId, InstrRef, Program};
use gb_wire::Handle;
use itertools::Itertools;
use tracing::debug;

use crate::bridge::Bridge;
use crate::call::CallTarget;

/// Reverse call edges, computed once per session.
#[derive(Debug, Default)]
pub struct CallIndex {
    callers: HashMap<FuncId, Vec<InstrRef>>,
}

impl CallIndex {
    pub fn build(program: &Program) -> Self {
        let mut callers: HashMap<FuncId, Vec<InstrRef>> = HashMap::new();
        let mut edges = 0usize;
        for instr in program.instructions() {
            let Some(call) = instr.kind.call_common() else {
                continue;
            };
            for callee in CallTarget::of(program, instr.id().func, call).candidates(program) {
                callers.entry(callee).or_default().push(instr.id());
                edges += 1;
            }
        }
        debug!(edges, "call index built");
        Self { callers }
    }

    pub fn callers(&self, func: FuncId) -> &[InstrRef] {
        self.callers.get(&func).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Bridge {
    /// Functions a call, defer or go instruction may transfer to; empty for
    /// other instructions and for calls through computed values.
    pub fn callees(&mut self, instruction: Handle) -> Vec<Handle> {
        let Some(iref) = self.registry.resolve_instruction(instruction) else {
            return vec![];
        };
        let targets = self
            .program
            .instruction(iref)
            .and_then(|instr| instr.kind.call_common())
            .map(|call| CallTarget::of(&self.program, iref.func, call).candidates(&self.program))
            .unwrap_or_default();
        targets
            .into_iter()
            .map(|func| self.registry.function(func))
            .collect()
    }

    /// Call sites whose callee set contains the function.
    pub fn callers(&mut self, function: Handle) -> Vec<Handle> {
        let Some(func) = self.registry.resolve_function(function) else {
            return vec![];
        };
        let sites = self.calls.callers(func).to_vec();
        sites
            .into_iter()
            .sorted()
            .map(|site| self.registry.instruction(site))
            .collect()
    }

    /// Concrete method selected by a dynamic call descriptor for a receiver
    /// of the given type, or [`Handle::NONE`].
    pub fn method_implementation(&mut self, method: Handle, receiver_type: Handle) -> Handle {
        let Some((_, name)) = self.registry.resolve_method(method) else {
            return Handle::NONE;
        };
        let Some(receiver) = self.registry.resolve_type(receiver_type) else {
            return Handle::NONE;
        };
        let implementation = self
            .program
            .types()
            .lookup_method(receiver, name)
            .and_then(|method| method.function);
        implementation.map_or(Handle::NONE, |func| self.registry.function(func))
    }
}
