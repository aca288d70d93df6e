use super::{error::EvalError, roller::Roller, rule::BigFailRule, trace::*, value::Value};
use crate::common::*;
use crate::compile::{Instruction, Program};
use crate::context::{Context, Staged};
use crate::parse::ast::DiceTerm;

type EResult<T> = Result<T, EvalError>;

/// What a successful run leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Outcome {
    pub value: Value,
    pub trace: Trace,
    pub big_fail: bool,
    pub writes: Vec<(String, Value)>,
}

/// A single-use stack machine. Each run gets a fresh one.
pub(crate) struct Machine<'c, R> {
    max_rolls: Option<usize>,
    rolls: usize,
    roller: &'c mut R,
    scope: Staged<'c>,
    rule: Option<&'c dyn BigFailRule>,
    stack: Vec<Value>,
    trace: Trace,
    big_fail: bool,
}

impl<'c, R: Roller> Machine<'c, R> {
    pub fn new(roller: &'c mut R, ctx: &'c dyn Context, max_rolls: Option<usize>) -> Self {
        Self {
            max_rolls,
            rolls: 0,
            roller,
            scope: Staged::new(ctx),
            rule: None,
            stack: Vec::new(),
            trace: Trace::new(),
            big_fail: false,
        }
    }

    /// Marks faces the rule flags as big fails.
    pub fn with_big_fail(mut self, rule: &'c dyn BigFailRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn run(mut self, program: &Program) -> EResult<Outcome> {
        let instructions = program.instructions();
        let mut pc = 0;

        while let Some(instruction) = instructions.get(pc) {
            pc += 1;
            match instruction {
                Instruction::Push(value) => self.stack.push(value.clone()),
                Instruction::Roll(dice) => {
                    let total = self.roll(dice)?;
                    self.stack.push(Value::Number(total));
                }
                Instruction::Load(name) => {
                    let value = self
                        .scope
                        .get(name)
                        .ok_or_else(|| EvalError::UndefinedVariable(name.clone()))?;
                    self.trace.push(LoadStep {
                        name: name.clone(),
                        value: value.clone(),
                    });
                    self.stack.push(value);
                }
                Instruction::Store(name) => {
                    let value = self.peek()?.clone();
                    self.scope.set(name, value.clone());
                    self.trace.push(StoreStep {
                        name: name.clone(),
                        value,
                    });
                }
                Instruction::Unary(op) => {
                    let operand = self.pop()?;
                    let result = Value::unary(*op, &operand)?;
                    self.trace.push(UnaryStep {
                        op: *op,
                        operand,
                        result: result.clone(),
                    });
                    self.stack.push(result);
                }
                Instruction::Binary(op) => {
                    let rhs = self.pop()?;
                    let lhs = self.pop()?;
                    let result = Value::binary(&lhs, *op, &rhs)?;
                    self.trace.push(BinaryStep {
                        lhs,
                        op: *op,
                        rhs,
                        result: result.clone(),
                    });
                    self.stack.push(result);
                }
                Instruction::Concat(n) => {
                    let start = self
                        .stack
                        .len()
                        .checked_sub(*n)
                        .ok_or_else(Self::underflow)?;
                    let text: String = self.stack.drain(start..).map(|v| v.to_string()).collect();
                    self.stack.push(Value::String(text));
                }
                Instruction::Truthy => {
                    let value = self.pop()?;
                    self.stack.push(Value::from_bool(value.truthy()));
                }
                Instruction::Jump(target) => pc = Self::jump(pc, *target)?,
                Instruction::JumpIf(target) => {
                    if self.pop()?.truthy() {
                        pc = Self::jump(pc, *target)?;
                    }
                }
                Instruction::JumpUnless(target) => {
                    if !self.pop()?.truthy() {
                        pc = Self::jump(pc, *target)?;
                    }
                }
                Instruction::Pop => {
                    self.pop()?;
                }
            }
        }

        let value = self.pop()?;
        Ok(Outcome {
            value,
            trace: self.trace,
            big_fail: self.big_fail,
            writes: self.scope.into_writes(),
        })
    }

    fn underflow() -> EvalError {
        EvalError::other("stack underflow")
    }

    fn pop(&mut self) -> EResult<Value> {
        self.stack.pop().ok_or_else(Self::underflow)
    }

    fn peek(&self) -> EResult<&Value> {
        self.stack.last().ok_or_else(Self::underflow)
    }

    // `next` is the index after the jump itself
    fn jump(next: usize, target: usize) -> EResult<usize> {
        if target < next {
            Err(EvalError::other(format!(
                "backward jump from {} to {}",
                next - 1,
                target
            )))
        } else {
            Ok(target)
        }
    }

    fn count_rolls(&mut self, n: usize) -> EResult<()> {
        self.rolls += n;
        match self.max_rolls {
            Some(limit) if self.rolls > limit => Err(EvalError::TooManyRolls { limit }),
            _ => Ok(()),
        }
    }

    fn roll(&mut self, dice: &DiceTerm) -> EResult<Int> {
        self.count_rolls(dice.count())?;

        let sides = dice.sides;
        let mut faces: Vec<Face> = self
            .roller
            .roll_iter(dice.count(), sides.faces())
            .map(|x| Face::new(Int::from(x)))
            .collect();

        if let Some(op) = &dice.op {
            let values: Vec<Int> = faces.iter().map(|face| face.value).collect();
            for (face, dropped) in faces.iter_mut().zip(op.select_dropped(&values)) {
                face.dropped = dropped;
            }
        }

        if let Some(rule) = self.rule {
            for face in faces.iter_mut().filter(|face| !face.dropped) {
                if rule.is_big_fail(sides.get(), face.value) {
                    face.big_fail = true;
                    self.big_fail = true;
                }
            }
        }

        let total = faces
            .iter()
            .filter(|face| !face.dropped)
            .try_fold(0 as Int, |acc, face| acc.checked_add(face.value))
            .ok_or(EvalError::Overflow)?;

        let faces = NonEmpty::try_from_vec(faces)
            .map_err(|_| EvalError::other(format!("{} rolled no dice", dice)))?;
        self.trace.push(RollStep {
            term: *dice,
            faces,
            total,
        });
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use crate::vm::roller::StepRoller;
    use crate::vm::rule::MaxFace;
    use std::collections::HashMap;

    fn mock_roller() -> StepRoller {
        StepRoller::new(NonZeroUInt::new(10).unwrap(), 1)
    }

    fn program(s: &str) -> Program {
        Compiler::default().compile(&crate::parse::parse(s).unwrap())
    }

    fn run_in(s: &str, ctx: &dyn Context) -> EResult<Outcome> {
        let mut roller = mock_roller();
        Machine::new(&mut roller, ctx, Some(1000)).run(&program(s))
    }

    fn run(s: &str) -> EResult<Outcome> {
        run_in(s, &crate::context::EmptyContext)
    }

    fn check(s: &str, expected: impl Into<Value>, trace: &str) {
        let outcome = run(s).unwrap();
        assert_eq!(outcome.value, expected.into());
        assert_eq!(outcome.trace.to_string(), trace);
    }

    #[test]
    fn test_run_arithmetic() {
        check("2+3*4", 14, "3*4=12, 2+12=14");
        check("-7 / 2", -3, "-7=-7, -7/2=-3");
        check("10 - 4 - 3", 3, "10-4=6, 6-3=3");
    }

    #[test]
    fn test_run_dice() {
        // the mock roller starts at 10 and counts up
        check("1d20 + 4", 14, "1d20=[10]=10, 10+4=14");
        check("3d6", 4 + 5 + 6, "3d6=[4,5,6]=15");
        check("4d6k3", 4 + 5 + 6, "4d6kh3=[4,5,6,(1)]=15");
        check("4d6p", 4 + 5 + 6, "4d6pl1=[4,5,6,(1)]=15");
        check("d%", 10, "1d%=[10]=10");
    }

    #[test]
    fn test_run_big_fail() {
        let ctx = crate::context::EmptyContext;
        let mut roller = mock_roller();
        let outcome = Machine::new(&mut roller, &ctx, None)
            .with_big_fail(&MaxFace)
            .run(&program("3d12"))
            .unwrap();
        assert!(outcome.big_fail);
        assert_eq!(outcome.trace.to_string(), "3d12=[10,11,12!]=33");

        let mut roller = mock_roller();
        let outcome = Machine::new(&mut roller, &ctx, None)
            .run(&program("3d12"))
            .unwrap();
        assert!(!outcome.big_fail);
        assert_eq!(outcome.trace.to_string(), "3d12=[10,11,12]=33");
    }

    #[test]
    fn test_run_logic() {
        check("1 < 2 && 3", 1, "1<2=1");
        check("0 && x", 0, "");
        check("1 || x", 1, "");
        check("0 || \"\"", 0, "");
        check("2 > 1 ? \"yes\" : \"no\"", "yes", "2>1=1");
        check("!0", 1, "!0=1");
    }

    #[test]
    fn test_run_variables() {
        let mut ctx = HashMap::new();
        ctx.insert("str".to_string(), Value::Number(60));

        let outcome = run_in("x = str / 5; x + 1", &ctx).unwrap();
        assert_eq!(outcome.value, Value::Number(13));
        assert_eq!(outcome.trace.to_string(), "str=60, 60/5=12, x:=12, x=12, 12+1=13");
        assert_eq!(outcome.writes, vec![("x".to_string(), Value::Number(12))]);
        assert!(ctx.get("x").is_none());
    }

    #[test]
    fn test_run_template() {
        let mut ctx = HashMap::new();
        ctx.insert("name".to_string(), Value::from("Ann"));
        let outcome = run_in("`{name} rolls {d20}`", &ctx).unwrap();
        assert_eq!(outcome.value, Value::from("Ann rolls 10"));
    }

    #[test]
    fn test_run_errors() {
        assert_eq!(
            run("x + 1").unwrap_err(),
            EvalError::UndefinedVariable("x".to_string())
        );
        assert_eq!(run("5 % (2 - 2)").unwrap_err(), EvalError::DivideByZero);
        assert_eq!(
            run("\"a\" * 2").unwrap_err(),
            EvalError::type_mismatch(BinaryOperator::Mul, crate::vm::ValueType::String)
        );
        assert_eq!(
            run("600d6 + 401d6").unwrap_err(),
            EvalError::TooManyRolls { limit: 1000 }
        );
        assert!(run("1000d6").is_ok());
    }

    #[test]
    fn test_refuses_backward_jump() {
        let mut program = Program::with_capacity(2);
        program.push_raw(Instruction::Push(Value::TRUE));
        program.push_raw(Instruction::Jump(0));
        let mut roller = mock_roller();
        let err = Machine::new(&mut roller, &crate::context::EmptyContext, None)
            .run(&program)
            .unwrap_err();
        assert!(matches!(err, EvalError::Other(_)));
    }
}
