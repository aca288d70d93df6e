use super::error::EvalError;
use crate::common::*;
use std::cmp::Ordering;
use std::fmt;

type VResult = Result<Value, EvalError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Number(Int),
    String(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Number,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::String => "string",
        })
    }
}

impl Value {
    pub(crate) const FALSE: Self = Self::Number(0);
    pub(crate) const TRUE: Self = Self::Number(1);

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
        }
    }

    pub fn as_number(&self) -> Option<Int> {
        match self {
            Self::Number(x) => Some(*x),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::String(s) => Some(s),
        }
    }

    pub fn into_string(self) -> Result<String, Self> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other),
        }
    }

    /// Non-zero numbers and non-empty strings are true.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Number(x) => *x != 0,
            Self::String(s) => !s.is_empty(),
        }
    }

    pub(crate) fn from_bool(b: bool) -> Self {
        if b {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// How the value is written inside a trace: strings quoted, numbers bare.
    pub(crate) fn render(&self) -> String {
        match self {
            Self::Number(x) => x.to_string(),
            Self::String(s) => format!("{:?}", s),
        }
    }

    fn number(&self, op: impl fmt::Display) -> Result<Int, EvalError> {
        self.as_number()
            .ok_or_else(|| EvalError::type_mismatch(op, self.value_type()))
    }

    pub(crate) fn unary(op: UnaryOperator, x: &Self) -> VResult {
        match op {
            UnaryOperator::Pos => x.number(op).map(Self::Number),
            UnaryOperator::Neg => x
                .number(op)?
                .checked_neg()
                .map(Self::Number)
                .ok_or(EvalError::Overflow),
            UnaryOperator::Not => Ok(Self::from_bool(!x.truthy())),
        }
    }

    pub(crate) fn binary(l: &Self, op: BinaryOperator, r: &Self) -> VResult {
        if op.is_comparison() {
            return Self::compare(l, op, r);
        }

        let (x, y) = (l.number(op)?, r.number(op)?);
        let result = match op {
            BinaryOperator::Add => x.checked_add(y),
            BinaryOperator::Sub => x.checked_sub(y),
            BinaryOperator::Mul => x.checked_mul(y),
            // both truncate toward zero; the remainder keeps the dividend's sign
            BinaryOperator::Div | BinaryOperator::Rem if y == 0 => {
                return Err(EvalError::DivideByZero)
            }
            BinaryOperator::Div => x.checked_div(y),
            BinaryOperator::Rem => x.checked_rem(y),
            _ => unreachable!("comparisons handled above"),
        };
        result.map(Self::Number).ok_or(EvalError::Overflow)
    }

    fn compare(l: &Self, op: BinaryOperator, r: &Self) -> VResult {
        let ord = match (l, r) {
            (Self::Number(x), Self::Number(y)) => x.cmp(y),
            (Self::String(x), Self::String(y)) => x.cmp(y),
            // mixed operands: blame the string side, as arithmetic does
            _ => return Err(EvalError::type_mismatch(op, ValueType::String)),
        };
        let b = match op {
            BinaryOperator::Lt => ord == Ordering::Less,
            BinaryOperator::Gt => ord == Ordering::Greater,
            BinaryOperator::Le => ord != Ordering::Greater,
            BinaryOperator::Ge => ord != Ordering::Less,
            BinaryOperator::Eq => ord == Ordering::Equal,
            BinaryOperator::Ne => ord != Ordering::Equal,
            _ => unreachable!("not a comparison"),
        };
        Ok(Self::from_bool(b))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => fmt::Display::fmt(x, f),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<Int> for Value {
    fn from(x: Int) -> Self {
        Self::Number(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryOperator::*;

    fn bin(l: impl Into<Value>, op: BinaryOperator, r: impl Into<Value>) -> VResult {
        Value::binary(&l.into(), op, &r.into())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(bin(2, Add, 3), Ok(Value::Number(5)));
        assert_eq!(bin(2, Sub, 3), Ok(Value::Number(-1)));
        assert_eq!(bin(-4, Mul, 3), Ok(Value::Number(-12)));
    }

    #[test]
    fn test_division_truncates() {
        assert_eq!(bin(7, Div, 2), Ok(Value::Number(3)));
        assert_eq!(bin(-7, Div, 2), Ok(Value::Number(-3)));
        assert_eq!(bin(-7, Rem, 2), Ok(Value::Number(-1)));
        assert_eq!(bin(7, Rem, -2), Ok(Value::Number(1)));
        assert_eq!(bin(1, Div, 0), Err(EvalError::DivideByZero));
        assert_eq!(bin(1, Rem, 0), Err(EvalError::DivideByZero));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(bin(Int::MAX, Add, 1), Err(EvalError::Overflow));
        assert_eq!(bin(Int::MIN, Div, -1), Err(EvalError::Overflow));
        assert_eq!(
            Value::unary(UnaryOperator::Neg, &Value::Number(Int::MIN)),
            Err(EvalError::Overflow)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(bin(3, Lt, 4), Ok(Value::TRUE));
        assert_eq!(bin(3, Ge, 4), Ok(Value::FALSE));
        assert_eq!(bin(4, Eq, 4), Ok(Value::TRUE));
        assert_eq!(bin("a", Lt, "b"), Ok(Value::TRUE));
        assert_eq!(bin("a", Ne, "a"), Ok(Value::FALSE));
        assert_eq!(
            bin(1, Eq, "1"),
            Err(EvalError::type_mismatch(Eq, ValueType::String))
        );
        assert_eq!(
            bin("a", Lt, 1),
            Err(EvalError::type_mismatch(Lt, ValueType::String))
        );
    }

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            bin("a", Add, 1),
            Err(EvalError::type_mismatch(Add, ValueType::String))
        );
        assert_eq!(
            Value::unary(UnaryOperator::Neg, &"x".into()),
            Err(EvalError::type_mismatch(UnaryOperator::Neg, ValueType::String))
        );
    }

    #[test]
    fn test_not_and_truthiness() {
        assert_eq!(Value::unary(UnaryOperator::Not, &0.into()), Ok(Value::TRUE));
        assert_eq!(Value::unary(UnaryOperator::Not, &"".into()), Ok(Value::TRUE));
        assert_eq!(Value::unary(UnaryOperator::Not, &"x".into()), Ok(Value::FALSE));
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::from(12).render(), "12");
        assert_eq!(Value::from("a\"b").render(), r#""a\"b""#);
        assert_eq!(Value::from("a\"b").to_string(), "a\"b");
    }
}
