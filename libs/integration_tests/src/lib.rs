//! End-to-end tests for the code generator.
//!
//! Programs are built as syntax trees, compiled, and the emitted instructions
//! are executed on a small register-machine simulator so that run-time
//! behavior can be checked without an external assembler.

#[cfg(test)]
mod common;
#[cfg(test)]
mod control_flow_tests;
#[cfg(test)]
mod folding_tests;
