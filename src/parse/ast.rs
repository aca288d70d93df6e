use crate::common::*;
use std::fmt;
use std::str::FromStr;

/// A parsed source text: one or more `;`-separated expressions whose value
/// is the value of the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression<'a> {
    pub(crate) body: NonEmpty<Node<'a>>,
}

impl<'a> Expression<'a> {
    pub(crate) fn new(body: NonEmpty<Node<'a>>) -> Self {
        Self { body }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    LiteralInt(Int),
    LiteralStr(String),
    Dice(DiceTerm),
    Variable(&'a str),
    Template(Vec<Segment<'a>>),
    Parenthetical(Box<Node<'a>>),
    Unary(UnaryOperator, Box<Node<'a>>),
    Binary(Box<Node<'a>>, BinaryOperator, Box<Node<'a>>),
    Logical(Box<Node<'a>>, LogicalOperator, Box<Node<'a>>),
    Conditional(Box<Node<'a>>, Box<Node<'a>>, Box<Node<'a>>),
    Assign(&'a str, Box<Node<'a>>),
}

impl<'a> Node<'a> {
    pub(crate) fn new_parenthetical(x: Self) -> Self {
        Self::Parenthetical(Box::new(x))
    }

    pub(crate) fn new_unary(op: UnaryOperator, x: Self) -> Self {
        Self::Unary(op, Box::new(x))
    }

    pub(crate) fn new_binary(op: BinaryOperator, l: Self, r: Self) -> Self {
        Self::Binary(Box::new(l), op, Box::new(r))
    }

    pub(crate) fn new_logical(op: LogicalOperator, l: Self, r: Self) -> Self {
        Self::Logical(Box::new(l), op, Box::new(r))
    }

    pub(crate) fn new_conditional(cond: Self, then: Self, otherwise: Self) -> Self {
        Self::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    pub(crate) fn new_assign(name: &'a str, value: Self) -> Self {
        Self::Assign(name, Box::new(value))
    }
}

/// One piece of a backtick template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Expr(Expression<'a>),
}

/// `NdM` with an optional keep/drop operator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DiceTerm {
    pub num: NonZeroUInt,
    pub sides: Sides,
    pub op: Option<DiceOperator>,
}

impl DiceTerm {
    pub const fn new(num: NonZeroUInt, sides: Sides) -> Self {
        Self {
            num,
            sides,
            op: None,
        }
    }

    pub fn with_op(mut self, op: DiceOperator) -> Self {
        self.op = Some(op);
        self
    }

    pub fn count(&self) -> usize {
        self.num.get() as usize
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.num, self.sides)?;
        if let Some(op) = &self.op {
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

impl FromStr for DiceTerm {
    type Err = ParseDiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, rest) = s
            .split_once(|c: char| c == 'd' || c == 'D')
            .ok_or(ParseDiceError::NoDelimiter)?;

        let num = if num.is_empty() {
            1
        } else {
            num.parse::<UInt>().map_err(ParseDiceError::InvalidNum)?
        };
        let num = NonZeroUInt::new(num).ok_or(ParseDiceError::ZeroDice)?;

        let op_start = rest.find(|c: char| c == 'k' || c == 'p').unwrap_or(rest.len());
        let (sides, op) = rest.split_at(op_start);
        let sides = if sides == "%" {
            Sides::Percentile
        } else {
            let sides = sides.parse::<UInt>().map_err(ParseDiceError::InvalidSize)?;
            NonZeroUInt::new(sides)
                .map(Sides::Poly)
                .ok_or(ParseDiceError::ZeroSides)?
        };

        let term = Self::new(num, sides);
        if op.is_empty() {
            Ok(term)
        } else {
            parse_dice_op(op).map(|op| term.with_op(op))
        }
    }
}

fn parse_dice_op(s: &str) -> Result<DiceOperator, ParseDiceError> {
    let mut chars = s.chars();
    let keep = match chars.next() {
        Some('k') => true,
        Some('p') => false,
        _ => return Err(ParseDiceError::InvalidOperator(s.to_string())),
    };
    let rest = chars.as_str();

    // `k` alone keeps the highest dice, `p` alone drops the lowest
    let (highest, count) = match rest.strip_prefix('h') {
        Some(count) => (true, count),
        None => match rest.strip_prefix('l') {
            Some(count) => (false, count),
            None => (keep, rest),
        },
    };
    let n = if count.is_empty() {
        1
    } else {
        count.parse().map_err(ParseDiceError::InvalidNum)?
    };

    let selector = if highest {
        Selector::Highest(n)
    } else {
        Selector::Lowest(n)
    };
    Ok(if keep {
        DiceOperator::Keep(selector)
    } else {
        DiceOperator::Drop(selector)
    })
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseDiceError {
    #[error("cannot parse string as dice without 'd' delimiter")]
    NoDelimiter,
    #[error("at least one die must be rolled")]
    ZeroDice,
    #[error("a die must have at least one face")]
    ZeroSides,
    #[error("{0}")]
    InvalidNum(std::num::ParseIntError),
    #[error("{0}")]
    InvalidSize(std::num::ParseIntError),
    #[error("unknown dice operator {0:?}")]
    InvalidOperator(String),
}
