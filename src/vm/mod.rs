//! The stack-based bytecode virtual machine (`SPEC_FULL.md` §4.5): the
//! instruction encoding (`opcode`), the opcode handlers grouped by
//! instruction category (`opcodes`), dispatch from a decoded instruction to
//! its handler (`executor`), the operand stack (`stack`), error reporting
//! (`error`), and the `Vm` struct tying them to a `core::Heap`.

pub mod error;
pub(crate) mod executor;
pub mod machine;
pub mod opcode;
pub(crate) mod opcodes;
pub mod stack;

pub use machine::Vm;
