use crate::parse::ParseError;
use crate::vm::{EvalError, ValueType};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Eval(#[from] EvalError),
    #[error("expected a {expected} result, found a {found}")]
    WrongResultType {
        expected: ValueType,
        found: ValueType,
    },
}

impl Error {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    pub fn is_eval(&self) -> bool {
        matches!(self, Self::Eval(_))
    }
}
