//! A small dice-roll expression language for chat bots.
//!
//! Source text such as `4d6kh3 + str / 10` is parsed, compiled to a flat
//! [`Program`] and run on a stack machine against a [`Context`] of named
//! values. Every evaluation returns its [`Value`] together with a [`Trace`]
//! that records each roll and each intermediate step, so a result can be
//! audited by the players who see it.
//!
//! ```
//! use roll_expr::{eval, EmptyContext, Value};
//!
//! let result = eval("2 + 3 * 4", &mut EmptyContext).unwrap();
//! assert_eq!(result.value, Value::Number(14));
//! assert_eq!(result.detail(), "3*4=12, 2+12=14");
//! ```

pub mod common;
pub mod compile;
mod config;
mod context;
mod error;
mod eval;
pub mod parse;
pub mod sheet;
pub mod vm;

pub use compile::{Compiler, Instruction, Program};
pub use config::EvalConfig;
pub use context::{Context, EmptyContext};
pub use error::Error;
pub use eval::{
    eval, eval_as_text, eval_template, eval_value, DefaultRoller, Evaluation, Evaluator,
};
pub use parse::{ParseError, ParseErrorKind};
pub use vm::{roll_die, roll_die64, BigFailRule, EvalError, MaxFace, Roller, Trace, Value, ValueType};
