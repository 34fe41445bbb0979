//! Audio assembly: optional merging of per-chunk files into one audiobook.

pub mod assembler;
pub mod capability;

pub use assembler::{Assembler, AssemblyOutcome, select_assembler};
pub use capability::{Capabilities, Capability};
