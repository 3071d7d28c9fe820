//! Single-step walk over the control-flow graph.

use gb_ssa::{InstrKind, InstrRef, Instruction, Program};
use gb_wire::Handle;
use tracing::debug;

use crate::bridge::Bridge;
use crate::encoder::Encoder;
use crate::error::{StepError, StepResult};
use crate::registry::Node;

/// Where control goes after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Next instruction in the block, falling through to the first successor.
    Next,
    /// First instruction of the only successor.
    Jump,
    /// Leaves the function.
    Return,
    /// The engine picks a branch from the record.
    Suspend,
}

pub fn continuation(kind: &InstrKind) -> Continuation {
    match kind {
        InstrKind::Jump => Continuation::Jump,
        InstrKind::Return { .. } | InstrKind::Panic { .. } => Continuation::Return,
        InstrKind::If { .. } => Continuation::Suspend,
        _ => Continuation::Next,
    }
}

/// Block recorded as last executed once `instr` has run. `Phi` and `If`
/// keep the incoming value so the engine can still pick an edge.
pub fn resolved_last_block(instr: &Instruction, last_block: i32) -> i32 {
    match instr.kind {
        InstrKind::Phi { .. } | InstrKind::If { .. } => last_block,
        _ => instr.id().block as i32,
    }
}

pub fn next_instruction(program: &Program, instr: &Instruction) -> Option<InstrRef> {
    let iref = instr.id();
    let function = program.function(iref.func)?;
    let block = function.block(iref.block)?;
    let first_successor = || {
        block
            .succs
            .first()
            .and_then(|succ| function.block_entry(*succ))
    };
    match continuation(&instr.kind) {
        Continuation::Next => {
            let following = iref.index + 1;
            if (following as usize) < block.instrs.len() {
                Some(InstrRef::new(iref.func, iref.block, following))
            } else {
                first_successor()
            }
        }
        Continuation::Jump => first_successor(),
        Continuation::Return | Continuation::Suspend => None,
    }
}

impl Bridge {
    /// Encodes the instruction behind `handle` into the output buffer and
    /// returns the handle of the instruction to run next, or
    /// [`Handle::NONE`] when the engine has to decide.
    ///
    /// On error the buffer is left empty.
    pub fn step(&mut self, handle: Handle, last_block: i32) -> StepResult<Handle> {
        self.buffer.rewind();
        let result = self.step_into_buffer(handle, last_block);
        if result.is_err() {
            self.buffer.rewind();
        }
        result
    }

    fn step_into_buffer(&mut self, handle: Handle, last_block: i32) -> StepResult<Handle> {
        let iref = match self.registry.resolve(handle) {
            Some(Node::Instruction(iref)) => *iref,
            Some(_) => return Err(StepError::NotAnInstruction(handle)),
            None => return Err(StepError::UnknownHandle(handle)),
        };
        let program = &self.program;
        let instr = program
            .instruction(iref)
            .ok_or(StepError::UnknownHandle(handle))?;

        let slot = self.buffer.reserve_i32()?;
        Encoder::new(program, &mut self.registry, &mut self.buffer, iref).encode(instr, last_block)?;
        let resolved = resolved_last_block(instr, last_block);
        self.buffer.patch_i32(slot, resolved);

        let next = next_instruction(program, instr)
            .map_or(Handle::NONE, |next| self.registry.instruction(next));
        debug!(
            %handle,
            instr = %iref,
            op = instr.kind.name(),
            last_block = resolved,
            bytes = self.buffer.len(),
            %next,
            "step"
        );
        Ok(next)
    }
}
