//! Lowering of a parse tree into a flat [`Program`].

use crate::common::*;
use crate::parse::{
    ast,
    visit::{Accept, AstVisitor},
};
use crate::vm::Value;
use std::fmt;

pub const DEFAULT_CAPACITY: usize = 255;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Push(Value),
    Roll(ast::DiceTerm),
    Load(String),
    /// Assigns the top of the stack without popping it.
    Store(String),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
    /// Pops `n` values and pushes their concatenation as a string.
    Concat(usize),
    Truthy,
    Jump(usize),
    JumpIf(usize),
    JumpUnless(usize),
    Pop,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(value) => write!(f, "push {}", value.render()),
            Self::Roll(dice) => write!(f, "roll {}", dice),
            Self::Load(name) => write!(f, "load {}", name),
            Self::Store(name) => write!(f, "store {}", name),
            Self::Unary(op) => write!(f, "unary {}", op),
            Self::Binary(op) => write!(f, "binary {}", op),
            Self::Concat(n) => write!(f, "concat {}", n),
            Self::Truthy => f.write_str("truthy"),
            Self::Jump(target) => write!(f, "jump {}", target),
            Self::JumpIf(target) => write!(f, "jump_if {}", target),
            Self::JumpUnless(target) => write!(f, "jump_unless {}", target),
            Self::Pop => f.write_str("pop"),
        }
    }
}

/// The instructions compiled from one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instructions: Vec::with_capacity(capacity),
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    #[cfg(test)]
    pub(crate) fn push_raw(&mut self, instruction: Instruction) {
        self.emit(instruction);
    }

    /// Points the jump at `at` to the next instruction to be emitted.
    fn patch(&mut self, at: usize) {
        let here = self.len();
        debug_assert!(here > at, "jumps only go forward");
        match &mut self.instructions[at] {
            Instruction::Jump(target)
            | Instruction::JumpIf(target)
            | Instruction::JumpUnless(target) => *target = here,
            other => debug_assert!(false, "patched a non-jump: {}", other),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:04} {}", i, instruction)?;
        }
        Ok(())
    }
}

pub struct Compiler {
    program: Program,
}

impl Compiler {
    pub fn new(capacity: usize) -> Self {
        Self {
            program: Program::with_capacity(capacity),
        }
    }

    pub fn compile(mut self, expr: &ast::Expression) -> Program {
        self.visit(expr);
        self.program
    }

    fn emit(&mut self, instruction: Instruction) -> usize {
        self.program.emit(instruction)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<'a> AstVisitor<'a> for Compiler {
    type Output = ();

    fn visit_expression(&mut self, expr: &ast::Expression<'a>) {
        for (i, node) in expr.body.iter().enumerate() {
            if i > 0 {
                self.emit(Instruction::Pop);
            }
            node.accept(self);
        }
    }

    fn visit_int(&mut self, x: Int) {
        self.emit(Instruction::Push(Value::Number(x)));
    }

    fn visit_str(&mut self, s: &str) {
        self.emit(Instruction::Push(s.into()));
    }

    fn visit_dice(&mut self, dice: &ast::DiceTerm) {
        self.emit(Instruction::Roll(*dice));
    }

    fn visit_variable(&mut self, name: &'a str) {
        self.emit(Instruction::Load(name.to_string()));
    }

    fn visit_template(&mut self, segments: &[ast::Segment<'a>]) {
        for segment in segments {
            match segment {
                ast::Segment::Text(text) => self.visit_str(text),
                ast::Segment::Expr(expr) => self.visit_expression(expr),
            }
        }
        self.emit(Instruction::Concat(segments.len()));
    }

    fn visit_parenthetical(&mut self, p: &ast::Node<'a>) {
        p.accept(self);
    }

    fn visit_unary(&mut self, op: UnaryOperator, r: &ast::Node<'a>) {
        r.accept(self);
        self.emit(Instruction::Unary(op));
    }

    fn visit_binary(&mut self, l: &ast::Node<'a>, op: BinaryOperator, r: &ast::Node<'a>) {
        l.accept(self);
        r.accept(self);
        self.emit(Instruction::Binary(op));
    }

    fn visit_logical(&mut self, l: &ast::Node<'a>, op: LogicalOperator, r: &ast::Node<'a>) {
        l.accept(self);
        let (short, short_value) = match op {
            LogicalOperator::And => (self.emit(Instruction::JumpUnless(0)), Value::FALSE),
            LogicalOperator::Or => (self.emit(Instruction::JumpIf(0)), Value::TRUE),
        };
        r.accept(self);
        self.emit(Instruction::Truthy);
        let end = self.emit(Instruction::Jump(0));
        self.program.patch(short);
        self.emit(Instruction::Push(short_value));
        self.program.patch(end);
    }

    fn visit_conditional(
        &mut self,
        cond: &ast::Node<'a>,
        then: &ast::Node<'a>,
        otherwise: &ast::Node<'a>,
    ) {
        cond.accept(self);
        let skip_then = self.emit(Instruction::JumpUnless(0));
        then.accept(self);
        let end = self.emit(Instruction::Jump(0));
        self.program.patch(skip_then);
        otherwise.accept(self);
        self.program.patch(end);
    }

    fn visit_assign(&mut self, name: &'a str, value: &ast::Node<'a>) {
        value.accept(self);
        self.emit(Instruction::Store(name.to_string()));
    }
}
