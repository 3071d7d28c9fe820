//! Wire-level building blocks shared by the bridge and by engine-side tooling.
//!
//! Every record the bridge produces is a sequence of big-endian fixed-width
//! scalars. Strings travel as an `i32` length followed by that many `i32`
//! code points.

pub mod buffer;
pub mod error;
pub mod handle;
pub mod opcode;
pub mod reader;

pub use buffer::{ByteBuffer, Slot, DEFAULT_CAPACITY};
pub use error::WireError;
pub use handle::Handle;
pub use opcode::{BinaryOperator, Builtin, Opcode, Sort, UnaryOperator, ValueKind};
pub use reader::WireReader;
