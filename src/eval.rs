//! The entry points the rest of a bot calls: source text in, value and trace out.

use crate::compile::{Compiler, Program};
use crate::config::EvalConfig;
use crate::context::Context;
use crate::error::Error;
use crate::parse::{self, ast};
use crate::vm::{BigFailRule, Machine, MaxFace, Roller, Trace, Value, ValueType};
use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};

pub type DefaultRoller = rand::rngs::ThreadRng;

type EResult<T> = Result<T, Error>;

/// The result of one successful evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    pub trace: Trace,
    /// Whether any rolled face was marked as a big fail.
    pub big_fail: bool,
}

impl Evaluation {
    /// The rendered trace, e.g. `3d6=[2,5,4]=11, 11+2=13`.
    pub fn detail(&self) -> String {
        self.trace.to_string()
    }
}

pub struct Evaluator<R = DefaultRoller> {
    config: EvalConfig,
    roller: R,
    rule: Box<dyn BigFailRule>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_roller(rand::thread_rng())
    }

    pub fn from_config(config: EvalConfig) -> Self {
        Self::new().with_config(config)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator<StdRng> {
    /// An evaluator whose rolls repeat for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_roller(StdRng::seed_from_u64(seed))
    }
}

impl<R: Roller> Evaluator<R> {
    pub fn with_roller(roller: R) -> Self {
        Self {
            config: EvalConfig::default(),
            roller,
            rule: Box::new(MaxFace),
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the rule that decides which faces are big fails.
    pub fn big_fail_rule(mut self, rule: impl BigFailRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn compile(&self, source: &str) -> EResult<Program> {
        let expr = parse::parse(source)?;
        Ok(self.lower(source, &expr))
    }

    /// Compiles `text` as the body of a template.
    pub fn compile_template(&self, text: &str) -> EResult<Program> {
        let expr = parse::parse_template(text)?;
        Ok(self.lower(text, &expr))
    }

    fn lower(&self, source: &str, expr: &ast::Expression) -> Program {
        let program = Compiler::new(self.config.program_capacity).compile(expr);
        trace!("compiled {:?}:\n{}", source, program);
        program
    }

    /// Runs a compiled program. Assignments are written to `ctx` only if the
    /// run succeeds.
    pub fn execute(
        &mut self,
        program: &Program,
        ctx: &mut dyn Context,
        big_fail: bool,
    ) -> EResult<Evaluation> {
        self.run(program, ctx, big_fail, None)
    }

    pub fn eval_value(
        &mut self,
        source: &str,
        ctx: &mut dyn Context,
        big_fail: bool,
    ) -> EResult<Evaluation> {
        debug!("evaluating {:?} (big fail: {})", source, big_fail);
        let result = self
            .compile(source)
            .and_then(|program| self.run(&program, ctx, big_fail, None));
        log_failure(source, result)
    }

    /// Evaluates `source` and requires the result to be a string, as a
    /// backtick template yields.
    pub fn eval_as_text(&mut self, source: &str, ctx: &mut dyn Context) -> EResult<(String, Trace)> {
        debug!("evaluating {:?} as text", source);
        let result = self
            .compile(source)
            .and_then(|program| self.run(&program, ctx, false, Some(ValueType::String)));
        log_failure(source, result).map(into_text)
    }

    /// Evaluates all of `text` as a template body: literal text with `{expr}`
    /// interpolations.
    pub fn eval_template(&mut self, text: &str, ctx: &mut dyn Context) -> EResult<(String, Trace)> {
        debug!("evaluating template {:?}", text);
        let result = self
            .compile_template(text)
            .and_then(|program| self.run(&program, ctx, false, Some(ValueType::String)));
        log_failure(text, result).map(into_text)
    }

    fn run(
        &mut self,
        program: &Program,
        ctx: &mut dyn Context,
        big_fail: bool,
        expected: Option<ValueType>,
    ) -> EResult<Evaluation> {
        let mut machine = Machine::new(&mut self.roller, &*ctx, self.config.max_rolls);
        if big_fail {
            machine = machine.with_big_fail(&*self.rule);
        }
        let outcome = machine.run(program)?;

        if let Some(expected) = expected {
            let found = outcome.value.value_type();
            if found != expected {
                return Err(Error::WrongResultType { expected, found });
            }
        }

        if !outcome.writes.is_empty() {
            debug!("committing {} assignment(s)", outcome.writes.len());
        }
        for (name, value) in outcome.writes {
            ctx.set(&name, value);
        }

        Ok(Evaluation {
            value: outcome.value,
            trace: outcome.trace,
            big_fail: outcome.big_fail,
        })
    }
}

fn log_failure<T>(source: &str, result: EResult<T>) -> EResult<T> {
    if let Err(why) = &result {
        debug!("evaluation of {:?} failed: {}", source, why);
    }
    result
}

// only called once the result type has been checked
fn into_text(eval: Evaluation) -> (String, Trace) {
    let text = eval
        .value
        .into_string()
        .unwrap_or_else(|other| other.to_string());
    (text, eval.trace)
}

/// Parses, compiles and runs `source` with a fresh thread-local generator.
///
/// With `big_fail` set, faces that roll a die's maximum are marked in the
/// trace and reported through [`Evaluation::big_fail`].
pub fn eval_value(source: &str, ctx: &mut dyn Context, big_fail: bool) -> EResult<Evaluation> {
    Evaluator::new().eval_value(source, ctx, big_fail)
}

pub fn eval(source: &str, ctx: &mut dyn Context) -> EResult<Evaluation> {
    eval_value(source, ctx, false)
}

pub fn eval_as_text(source: &str, ctx: &mut dyn Context) -> EResult<(String, Trace)> {
    Evaluator::new().eval_as_text(source, ctx)
}

pub fn eval_template(text: &str, ctx: &mut dyn Context) -> EResult<(String, Trace)> {
    Evaluator::new().eval_template(text, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::*;
    use crate::context::EmptyContext;
    use crate::parse::ParseErrorKind;
    use crate::vm::{EvalError, StepRoller};
    use std::collections::HashMap;

    fn mock_evaluator() -> Evaluator<StepRoller> {
        Evaluator::with_roller(StepRoller::new(NonZeroUInt::new(10).unwrap(), 1))
    }

    fn sheet() -> HashMap<String, Value> {
        let mut ctx = HashMap::new();
        ctx.insert("hp".to_string(), Value::Number(10));
        ctx.insert("max".to_string(), Value::Number(12));
        ctx.insert("name".to_string(), Value::from("Ann"));
        ctx
    }

    #[test]
    fn test_eval_arithmetic() {
        let eval = eval("2+3*4", &mut EmptyContext).unwrap();
        assert_eq!(eval.value, Value::Number(14));
        assert_eq!(eval.detail(), "3*4=12, 2+12=14");
        assert!(!eval.big_fail);
    }

    #[test]
    fn test_eval_3d6() {
        for _ in 0..200 {
            let eval = eval("3d6", &mut EmptyContext).unwrap();
            let total = eval.value.as_number().unwrap();
            assert!((3..=18).contains(&total));

            let rolls: Vec<_> = eval.trace.rolls().collect();
            assert_eq!(rolls.len(), 1);
            assert_eq!(rolls[0].faces.len(), 3);
            assert_eq!(rolls[0].faces.iter().map(|f| f.value).sum::<Int>(), total);
        }
    }

    #[test]
    fn test_eval_as_text() {
        let (text, _) = eval_as_text("`hello`", &mut EmptyContext).unwrap();
        assert_eq!(text, "hello");

        assert_eq!(
            eval_as_text("5", &mut EmptyContext).unwrap_err(),
            Error::WrongResultType {
                expected: ValueType::String,
                found: ValueType::Number,
            }
        );
    }

    #[test]
    fn test_eval_template() {
        let (text, trace) = eval_template("{name}: HP {hp}/{max}", &mut sheet()).unwrap();
        assert_eq!(text, "Ann: HP 10/12");
        assert_eq!(trace.to_string(), r#"name="Ann", hp=10, max=12"#);

        let (text, _) = eval_template("no interpolation", &mut EmptyContext).unwrap();
        assert_eq!(text, "no interpolation");
    }

    #[test]
    fn test_most_negative_literal() {
        let eval = eval("-9223372036854775808", &mut EmptyContext).unwrap();
        assert_eq!(eval.value, Value::Number(Int::MIN));
        assert_eq!(
            eval_value("-(-9223372036854775808)", &mut EmptyContext, false).unwrap_err(),
            Error::Eval(EvalError::Overflow)
        );
    }

    #[test]
    fn test_undefined_variable() {
        let err = eval("x+1", &mut EmptyContext).unwrap_err();
        assert!(err.is_eval() && !err.is_parse());
        assert_eq!(
            err,
            Error::Eval(EvalError::UndefinedVariable("x".to_string()))
        );
    }

    #[test]
    fn test_parse_error() {
        let err = eval("3d", &mut EmptyContext).unwrap_err();
        assert!(err.is_parse() && !err.is_eval());
        match err {
            Error::Parse(err) => {
                assert_eq!(err.position(), 1);
                assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
            }
            other => panic!("expected a parse error, found {:?}", other),
        }
    }

    #[test]
    fn test_assignment_commits_on_success() {
        let mut ctx = sheet();
        let eval = eval("hp = hp - 3; hp", &mut ctx).unwrap();
        assert_eq!(eval.value, Value::Number(7));
        assert_eq!(ctx["hp"], Value::Number(7));
    }

    #[test]
    fn test_assignment_discarded_on_failure() {
        let mut ctx = sheet();
        assert!(eval("hp = 1; missing", &mut ctx).is_err());
        assert_eq!(ctx["hp"], Value::Number(10));

        assert!(eval_as_text("hp = 2", &mut ctx).is_err());
        assert_eq!(ctx["hp"], Value::Number(10));
    }

    #[test]
    fn test_mock_rolls() {
        let mut evaluator = mock_evaluator();
        let eval = evaluator
            .eval_value("4d6kh3 + 2", &mut EmptyContext, false)
            .unwrap();
        assert_eq!(eval.value, Value::Number(17));
        assert_eq!(eval.detail(), "4d6kh3=[4,5,6,(1)]=15, 15+2=17");
    }

    #[test]
    fn test_big_fail_flag() {
        let mut evaluator = mock_evaluator();
        let eval = evaluator.eval_value("d10", &mut EmptyContext, true).unwrap();
        assert!(eval.big_fail);
        assert_eq!(eval.detail(), "1d10=[10!]=10");

        let mut evaluator = mock_evaluator();
        let eval = evaluator.eval_value("d10", &mut EmptyContext, false).unwrap();
        assert!(!eval.big_fail);
        assert_eq!(eval.detail(), "1d10=[10]=10");
    }

    #[test]
    fn test_big_fail_ignores_dropped_faces() {
        let mut evaluator = mock_evaluator();
        let eval = evaluator
            .eval_value("2d10kl1", &mut EmptyContext, true)
            .unwrap();
        assert_eq!(eval.value, Value::Number(1));
        assert!(!eval.big_fail);
        assert_eq!(eval.detail(), "2d10kl1=[(10),1]=1");

        let roll = eval.trace.rolls().next().unwrap();
        let kept: Vec<_> = roll.kept().map(|face| face.value).collect();
        assert_eq!(kept, vec![1]);
        assert_eq!(eval.trace.steps().len(), 1);
    }

    #[test]
    fn test_custom_big_fail_rule() {
        let mut evaluator = mock_evaluator().big_fail_rule(|sides: Int, face: Int| {
            sides == 100 && face <= 10
        });
        let eval = evaluator.eval_value("d100", &mut EmptyContext, true).unwrap();
        assert!(eval.big_fail);

        let eval = evaluator.eval_value("d20", &mut EmptyContext, true).unwrap();
        assert!(!eval.big_fail);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = Evaluator::seeded(42)
            .eval_value("10d20", &mut EmptyContext, false)
            .unwrap();
        let b = Evaluator::seeded(42)
            .eval_value("10d20", &mut EmptyContext, false)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_roll_limit() {
        let mut evaluator = Evaluator::from_config(EvalConfig::default().with_max_rolls(5));
        assert_eq!(
            evaluator
                .eval_value("3d6 + 3d6", &mut EmptyContext, false)
                .unwrap_err(),
            Error::Eval(EvalError::TooManyRolls { limit: 5 })
        );
    }

    #[test]
    fn test_compile_then_execute() {
        let mut evaluator = mock_evaluator();
        let program = evaluator.compile("hp + 1").unwrap();
        let eval = evaluator.execute(&program, &mut sheet(), false).unwrap();
        assert_eq!(eval.value, Value::Number(11));

        let program = evaluator.compile_template("{1+1}").unwrap();
        let eval = evaluator.execute(&program, &mut EmptyContext, false).unwrap();
        assert_eq!(eval.value, Value::from("2"));
    }

    #[test]
    fn test_small_program_capacity_still_grows() {
        let mut evaluator =
            Evaluator::from_config(EvalConfig::default().with_program_capacity(1));
        let eval = evaluator
            .eval_value("1+2+3+4+5", &mut EmptyContext, false)
            .unwrap();
        assert_eq!(eval.value, Value::Number(15));
    }
}
