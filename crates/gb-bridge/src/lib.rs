//! On-demand translation of a typed SSA program into per-instruction wire
//! records for an external symbolic-execution engine.
//!
//! A [`Bridge`] owns the loaded program and hands out [`gb_wire::Handle`]s.
//! The engine drives it with [`Bridge::step`], one instruction at a time,
//! and asks the graph and type queries as it needs them.

pub mod bridge;
pub mod call;
pub mod callgraph;
pub mod config;
mod encoder;
pub mod error;
pub mod ffi;
pub mod graph;
pub mod logging;
pub mod registry;
pub mod sort;
pub mod stepper;
pub mod typesys;
mod value;

pub use bridge::Bridge;
pub use call::CallTarget;
pub use config::BridgeConfig;
pub use error::{StepError, StepResult};
pub use graph::MethodInfo;
pub use registry::{HandleRegistry, Node};
pub use sort::sort_of;
pub use stepper::Continuation;
