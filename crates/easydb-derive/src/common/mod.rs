//! Helpers shared by the derive expansions.

pub mod syn_types;
