//! Control-flow queries over instructions and functions.

use gb_ssa::{FuncId, Function, InstrKind, InstrRef, Instruction};
use gb_wire::Handle;
use itertools::Itertools;

use crate::bridge::Bridge;

/// Parameter and local counts of a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo {
    pub parameters: u32,
    /// Instructions that define a register.
    pub locals: u32,
}

impl Bridge {
    fn instruction_of(&self, handle: Handle) -> Option<&Instruction> {
        let iref = self.registry.resolve_instruction(handle)?;
        self.program.instruction(iref)
    }

    fn function_of(&self, handle: Handle) -> Option<&Function> {
        let func = self.registry.resolve_function(handle)?;
        self.program.function(func)
    }

    fn instruction_handles(&mut self, irefs: Vec<InstrRef>) -> Vec<Handle> {
        irefs
            .into_iter()
            .map(|iref| self.registry.instruction(iref))
            .collect()
    }

    /// Every instruction of every predecessor block, then the instructions
    /// before `handle` in its own block.
    pub fn predecessors(&mut self, handle: Handle) -> Vec<Handle> {
        let Some(iref) = self.registry.resolve_instruction(handle) else {
            return vec![];
        };
        let Some(function) = self.program.function(iref.func) else {
            return vec![];
        };
        let Some(block) = function.block(iref.block) else {
            return vec![];
        };
        let irefs = block
            .preds
            .iter()
            .filter_map(|pred| function.block(*pred))
            .flat_map(|pred| pred.instrs.iter().map(Instruction::id))
            .chain(
                block
                    .instrs
                    .iter()
                    .take(iref.index as usize)
                    .map(Instruction::id),
            )
            .collect_vec();
        self.instruction_handles(irefs)
    }

    /// The instructions after `handle` in its block, then every instruction
    /// of every successor block.
    pub fn successors(&mut self, handle: Handle) -> Vec<Handle> {
        let Some(iref) = self.registry.resolve_instruction(handle) else {
            return vec![];
        };
        let Some(function) = self.program.function(iref.func) else {
            return vec![];
        };
        let Some(block) = function.block(iref.block) else {
            return vec![];
        };
        let irefs = block
            .instrs
            .iter()
            .skip(iref.index as usize + 1)
            .map(Instruction::id)
            .chain(
                block
                    .succs
                    .iter()
                    .filter_map(|succ| function.block(*succ))
                    .flat_map(|succ| succ.instrs.iter().map(Instruction::id)),
            )
            .collect_vec();
        self.instruction_handles(irefs)
    }

    pub fn entry_points(&mut self, function: Handle) -> Vec<Handle> {
        let entry = self.function_of(function).and_then(Function::entry);
        self.instruction_handles(entry.into_iter().collect())
    }

    /// Every `Return` and `Panic` of the function.
    pub fn exit_points(&mut self, function: Handle) -> Vec<Handle> {
        let irefs = self
            .function_of(function)
            .map(|function| {
                function
                    .instructions()
                    .filter(|instr| {
                        matches!(instr.kind, InstrKind::Return { .. } | InstrKind::Panic { .. })
                    })
                    .map(Instruction::id)
                    .collect_vec()
            })
            .unwrap_or_default();
        self.instruction_handles(irefs)
    }

    pub fn statements_of(&mut self, function: Handle) -> Vec<Handle> {
        let irefs = self
            .function_of(function)
            .map(|function| function.instructions().map(Instruction::id).collect_vec())
            .unwrap_or_default();
        self.instruction_handles(irefs)
    }

    /// The function containing the instruction.
    pub fn method_of(&mut self, instruction: Handle) -> Handle {
        let func: Option<FuncId> = self.instruction_of(instruction).map(|instr| instr.id().func);
        func.map_or(Handle::NONE, |func| self.registry.function(func))
    }

    pub fn method_info(&self, function: Handle) -> Option<MethodInfo> {
        let function = self.function_of(function)?;
        Some(MethodInfo {
            parameters: function.params.len() as u32,
            locals: function
                .instructions()
                .filter(|instr| instr.produces_result())
                .count() as u32,
        })
    }
}
