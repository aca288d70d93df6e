use super::value::Value;
use crate::common::*;
use crate::parse::ast::DiceTerm;
use std::fmt;

#[enum_dispatch::enum_dispatch]
pub trait Render {
    fn render(&self) -> String;
}

/// One recorded sub-computation.
#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch::enum_dispatch(Render)]
pub enum Step {
    Roll(RollStep),
    Unary(UnaryStep),
    Binary(BinaryStep),
    Load(LoadStep),
    Store(StoreStep),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Face {
    pub value: Int,
    pub dropped: bool,
    pub big_fail: bool,
}

impl Face {
    pub(crate) fn new(value: Int) -> Self {
        Self {
            value,
            dropped: false,
            big_fail: false,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.big_fail { "!" } else { "" };
        if self.dropped {
            write!(f, "({}{})", self.value, mark)
        } else {
            write!(f, "{}{}", self.value, mark)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollStep {
    pub term: DiceTerm,
    pub faces: NonEmpty<Face>,
    pub total: Int,
}

impl RollStep {
    pub fn kept(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().filter(|face| !face.dropped)
    }
}

impl Render for RollStep {
    fn render(&self) -> String {
        let faces = self
            .faces
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}=[{}]={}", self.term, faces, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryStep {
    pub op: UnaryOperator,
    pub operand: Value,
    pub result: Value,
}

impl Render for UnaryStep {
    fn render(&self) -> String {
        format!("{}{}={}", self.op, self.operand.render(), self.result.render())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryStep {
    pub lhs: Value,
    pub op: BinaryOperator,
    pub rhs: Value,
    pub result: Value,
}

impl Render for BinaryStep {
    fn render(&self) -> String {
        format!(
            "{}{}{}={}",
            self.lhs.render(),
            self.op,
            self.rhs.render(),
            self.result.render()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadStep {
    pub name: String,
    pub value: Value,
}

impl Render for LoadStep {
    fn render(&self) -> String {
        format!("{}={}", self.name, self.value.render())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreStep {
    pub name: String,
    pub value: Value,
}

impl Render for StoreStep {
    fn render(&self) -> String {
        format!("{}:={}", self.name, self.value.render())
    }
}

/// Every step of one evaluation, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, step: impl Into<Step>) {
        self.steps.push(step.into());
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn rolls(&self) -> impl Iterator<Item = &RollStep> {
        self.steps.iter().filter_map(|step| match step {
            Step::Roll(roll) => Some(roll),
            _ => None,
        })
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&step.render())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll(term: &str, faces: NonEmpty<Face>) -> RollStep {
        let total = faces.iter().filter(|f| !f.dropped).map(|f| f.value).sum();
        RollStep {
            term: term.parse().unwrap(),
            faces,
            total,
        }
    }

    #[test]
    fn test_render_roll() {
        let step = roll("3d6", vec1![Face::new(2), Face::new(5), Face::new(4)]);
        assert_eq!(step.render(), "3d6=[2,5,4]=11");

        let dropped = Face {
            dropped: true,
            ..Face::new(1)
        };
        let step = roll(
            "4d6k3",
            vec1![Face::new(5), dropped, Face::new(3), Face::new(6)],
        );
        assert_eq!(step.render(), "4d6kh3=[5,(1),3,6]=14");

        let failed = Face {
            big_fail: true,
            ..Face::new(100)
        };
        assert_eq!(roll("1d100", vec1![failed]).render(), "1d100=[100!]=100");
    }

    #[test]
    fn test_render_trace() {
        let mut trace = Trace::new();
        assert_eq!(trace.to_string(), "");

        trace.push(LoadStep {
            name: "str".to_string(),
            value: Value::Number(60),
        });
        trace.push(UnaryStep {
            op: UnaryOperator::Neg,
            operand: Value::Number(11),
            result: Value::Number(-11),
        });
        trace.push(BinaryStep {
            lhs: Value::Number(11),
            op: BinaryOperator::Add,
            rhs: Value::Number(2),
            result: Value::Number(13),
        });
        trace.push(StoreStep {
            name: "name".to_string(),
            value: Value::from("bob"),
        });
        assert_eq!(
            trace.to_string(),
            r#"str=60, -11=-11, 11+2=13, name:="bob""#
        );
        assert_eq!(trace.rolls().count(), 0);
    }
}
