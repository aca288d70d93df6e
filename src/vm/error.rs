use super::value::ValueType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("undefined variable {0:?}")]
    UndefinedVariable(String),
    #[error("cannot apply '{op}' to a {found}")]
    TypeMismatch { op: String, found: ValueType },
    #[error("cannot divide by zero")]
    DivideByZero,
    #[error("too many dice rolled (limit is {limit})")]
    TooManyRolls { limit: usize },
    #[error("integer overflow")]
    Overflow,
    #[error("{0}")]
    Other(String),
}

impl EvalError {
    pub(crate) fn type_mismatch(op: impl ToString, found: ValueType) -> Self {
        Self::TypeMismatch {
            op: op.to_string(),
            found,
        }
    }

    pub(crate) fn other(msg: impl ToString) -> Self {
        Self::Other(msg.to_string())
    }
}
