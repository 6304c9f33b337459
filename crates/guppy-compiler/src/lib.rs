//! The Guppy function-body compiler pipeline: builds a control-flow graph
//! out of a function's statement list, runs liveness and assignment
//! analyses over it, type-checks and linearity-checks each block, and
//! lowers the result to a dataflow region.
//!
//! The six stages run in sequence through [`pipeline::compile_function_body`];
//! each stage's module also exposes its pieces individually for testing.

pub mod analyses;
pub mod cfg;
pub mod compile_options;
pub mod linearity;
pub mod lower;
pub mod pipeline;
pub mod reconcile;
pub mod typecheck;

pub use compile_options::CompileOptions;
pub use pipeline::{compile_function_body, CompiledFunction};
pub use typecheck::CheckedCfg;
