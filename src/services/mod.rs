// src/services/mod.rs

pub mod ai;
pub mod assembler;
pub mod difficulty;
pub mod level;
pub mod purpose;
pub mod scorer;
