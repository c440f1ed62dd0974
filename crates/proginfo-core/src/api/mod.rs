//! API implementation submodules.
//!
//! Each submodule contains `impl ProgramInfoApi` blocks. The struct itself
//! lives in `lib.rs`.

mod actions;
mod backup;
mod builder;
mod programs;

pub use builder::ProgramInfoApiBuilder;
