use std::fmt::{self, Write};
use std::num::NonZeroU32;
use std::str::FromStr;
pub use vec1::vec1;

pub type Int = i64;
pub type UInt = u32;
pub type NonZeroUInt = NonZeroU32;

pub type NonEmpty<T> = vec1::Vec1<T>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Sides {
    Poly(NonZeroUInt),
    Percentile,
}

const PERCENTILE: NonZeroUInt = match NonZeroUInt::new(100) {
    Some(x) => x,
    None => panic!("100 is not zero"),
};

impl Sides {
    /// The highest face of a die with these sides.
    pub fn get(self) -> Int {
        Int::from(self.faces().get())
    }

    pub fn faces(self) -> NonZeroUInt {
        match self {
            Self::Poly(x) => x,
            Self::Percentile => PERCENTILE,
        }
    }
}

impl fmt::Display for Sides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poly(x) => fmt::Display::fmt(x, f),
            Self::Percentile => f.write_char('%'),
        }
    }
}

impl From<NonZeroUInt> for Sides {
    fn from(x: NonZeroUInt) -> Self {
        Self::Poly(x)
    }
}

impl FromStr for Sides {
    type Err = <NonZeroUInt as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "%" {
            Ok(Self::Percentile)
        } else {
            s.parse().map(Self::Poly)
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnaryOperator {
    Pos,
    Neg,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Pos => '+',
            Self::Neg => '-',
            Self::Not => '!',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOperator {
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::Eq | Self::Ne
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        };
        f.write_str(s)
    }
}

/// Short-circuiting operators. They never reach the VM as an instruction;
/// the compiler lowers them to forward jumps.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "&&",
            Self::Or => "||",
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DiceOperator {
    Keep(Selector),
    Drop(Selector),
}

impl DiceOperator {
    /// Marks every face that this operator removes from the total.
    ///
    /// Ties are broken by roll order, so the earlier of two equal faces is
    /// considered "higher" for `h` and "lower" for `l`.
    pub(crate) fn select_dropped(&self, faces: &[Int]) -> Vec<bool> {
        let mut order: Vec<usize> = (0..faces.len()).collect();
        let (selector, keep) = match self {
            Self::Keep(sel) => (sel, true),
            Self::Drop(sel) => (sel, false),
        };
        let n = match *selector {
            Selector::Highest(n) => {
                order.sort_by(|&a, &b| faces[b].cmp(&faces[a]));
                n
            }
            Selector::Lowest(n) => {
                order.sort_by(|&a, &b| faces[a].cmp(&faces[b]));
                n
            }
        } as usize;

        let mut dropped = vec![keep; faces.len()];
        for &i in order.iter().take(n) {
            dropped[i] = !keep;
        }
        dropped
    }
}

impl fmt::Display for DiceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep(sel) => write!(f, "k{}", sel),
            Self::Drop(sel) => write!(f, "p{}", sel),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Selector {
    Highest(UInt),
    Lowest(UInt),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Highest(n) => write!(f, "h{}", n),
            Self::Lowest(n) => write!(f, "l{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sides() {
        assert_eq!("%".parse::<Sides>().unwrap().get(), 100);
        assert_eq!("20".parse::<Sides>().unwrap().get(), 20);
        assert!("0".parse::<Sides>().is_err());
        assert_eq!(Sides::Percentile.to_string(), "%");
    }

    #[test]
    fn test_keep_highest() {
        let dropped = DiceOperator::Keep(Selector::Highest(2)).select_dropped(&[3, 6, 1, 4]);
        assert_eq!(dropped, vec![true, false, true, false]);
    }

    #[test]
    fn test_drop_lowest() {
        let dropped = DiceOperator::Drop(Selector::Lowest(1)).select_dropped(&[3, 6, 1, 4]);
        assert_eq!(dropped, vec![false, false, true, false]);
    }

    #[test]
    fn test_ties_prefer_earlier() {
        let dropped = DiceOperator::Keep(Selector::Highest(1)).select_dropped(&[5, 5, 2]);
        assert_eq!(dropped, vec![false, true, true]);
        let dropped = DiceOperator::Keep(Selector::Lowest(1)).select_dropped(&[2, 5, 2]);
        assert_eq!(dropped, vec![false, true, true]);
    }

    #[test]
    fn test_select_more_than_rolled() {
        let dropped = DiceOperator::Keep(Selector::Highest(9)).select_dropped(&[1, 2]);
        assert_eq!(dropped, vec![false, false]);
        let dropped = DiceOperator::Drop(Selector::Highest(9)).select_dropped(&[1, 2]);
        assert_eq!(dropped, vec![true, true]);
    }

    #[test]
    fn test_display_ops() {
        assert_eq!(DiceOperator::Keep(Selector::Highest(3)).to_string(), "kh3");
        assert_eq!(DiceOperator::Drop(Selector::Lowest(1)).to_string(), "pl1");
        assert_eq!(BinaryOperator::Ge.to_string(), ">=");
        assert!(BinaryOperator::Ne.is_comparison());
        assert!(!BinaryOperator::Rem.is_comparison());
    }
}
