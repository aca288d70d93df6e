//! The stack machine that runs compiled programs.

mod error;
mod machine;
mod roller;
mod rule;
mod trace;
mod value;

pub use error::EvalError;
pub(crate) use machine::Machine;
pub use roller::{roll_die, roll_die64, Roller};
pub use rule::{BigFailRule, MaxFace};
pub use trace::{
    BinaryStep, Face, LoadStep, Render, RollStep, Step, StoreStep, Trace, UnaryStep,
};
pub use value::{Value, ValueType};

#[cfg(test)]
pub(crate) use roller::StepRoller;
