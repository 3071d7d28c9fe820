use gb_ssa::InstrRef;
use gb_wire::{Handle, WireError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),
    #[error("handle {0} does not name an instruction")]
    NotAnInstruction(Handle),
    #[error("phi {instr} has no edge for predecessor block {last_block}")]
    PhiEdgeMissing { instr: InstrRef, last_block: i32 },
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("no encoding for opcode `{op}` at {instr}")]
    UnknownOpcode { op: String, instr: InstrRef },
}

impl StepError {
    /// An opcode the encoder has no table entry for is a translator bug,
    /// never a property of the analyzed program.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepError::UnknownOpcode { .. })
    }
}

pub type StepResult<T> = std::result::Result<T, StepError>;
