//! Typed SSA control-flow graph of one Go package, as consumed by the bridge.
//!
//! The graph is produced elsewhere and arrives as a program document
//! ([`document`]); [`loader`] links it into an immutable [`Program`].

pub mod document;
pub mod error;
pub mod instr;
pub mod loader;
pub mod program;
pub mod type_expr;
pub mod types;

pub use error::{LoadError, LoadResult};
pub use instr::{CallCommon, Const, InstrHeader, InstrKind, Instruction, Literal, Register, Value};
pub use loader::{link, JsonLoader, ProgramLoader};
pub use program::{BasicBlock, FuncId, Function, InstrRef, Program, Variable};
pub use type_expr::parse_type;
pub use types::{BasicKind, ChanDir, Field, Method, MethodSig, Type, TypeId, TypeTable};
