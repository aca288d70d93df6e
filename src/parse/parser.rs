use super::{ast::*, lexer::*, template};
use crate::common::*;
use logos_iter::LogosIter;
use std::fmt;
use std::ops::Range;

type PResult<T> = Result<T, ParseError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("error at position {} ({slice:?}): {kind}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub slice: String,
}

impl ParseError {
    /// Byte offset into the source text where the error starts.
    pub fn position(&self) -> usize {
        self.span.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken {
        found: Option<TokenKind>,
        expected: Vec<TokenKind>,
    },
    UnexpectedString {
        expected: Vec<TokenKind>,
    },
    UnterminatedString,
    UnterminatedTemplate,
    InvalidDice(ParseDiceError),
    IntegerOutOfRange,
    InvalidAssignmentTarget,
    UnclosedInterpolation,
    EmptyInterpolation,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                found: Some(found),
                expected,
            } => {
                write!(f, "unexpected token: found {}, expected ", found)?;
                fmt_expected(expected, f)
            }
            Self::UnexpectedToken {
                found: None,
                expected,
            } => {
                write!(f, "unexpected end of input, expected ")?;
                fmt_expected(expected, f)
            }
            Self::UnexpectedString { expected } => {
                write!(f, "expected ")?;
                fmt_expected(expected, f)
            }
            Self::UnterminatedString => write!(f, "string is missing its closing '\"'"),
            Self::UnterminatedTemplate => write!(f, "template is missing its closing '`'"),
            Self::InvalidDice(why) => write!(f, "invalid dice literal: {}", why),
            Self::IntegerOutOfRange => write!(f, "integer literal is out of range"),
            Self::InvalidAssignmentTarget => write!(f, "only a variable can be assigned to"),
            Self::UnclosedInterpolation => write!(f, "'{{' in template is never closed"),
            Self::EmptyInterpolation => write!(f, "'{{}}' in template has no expression"),
        }
    }
}

fn fmt_expected(expected: &[TokenKind], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expected {
        [] => Ok(()),
        [a] => f.write_str(a.as_str()),
        [a, b] => write!(f, "{} or {}", a, b),
        [rest @ .., last] => {
            for exp in rest {
                write!(f, "{}, ", exp)?;
            }
            write!(f, "or {}", last)
        }
    }
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    src: &'a str,
    // offset of `src` inside the text the user typed
    base: usize,
}

impl<'a> Parser<'a> {
    const COMPARISON_OPS: &'static [TokenKind] = &[
        TokenKind::LessThan,
        TokenKind::GreaterThan,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::EqualEqual,
        TokenKind::BangEqual,
    ];

    const ADDITION_OPS: &'static [TokenKind] = &[TokenKind::Plus, TokenKind::Minus];

    const MULTIPLICATION_OPS: &'static [TokenKind] =
        &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent];

    const ATOMS: &'static [TokenKind] = &[
        TokenKind::LeftParen,
        TokenKind::Integer,
        TokenKind::Dice,
        TokenKind::Ident,
        TokenKind::String,
        TokenKind::Template,
    ];

    pub fn new(s: &'a str) -> Self {
        Self::with_offset(s, 0)
    }

    pub fn with_offset(s: &'a str, base: usize) -> Self {
        Self {
            lexer: lexer(s),
            src: s,
            base,
        }
    }

    pub fn parse(mut self) -> PResult<Expression<'a>> {
        let expr = self.parse_program()?;
        if self.lexer.peek().is_some() {
            return self.unexpected_token(vec![TokenKind::Semicolon]);
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Option<TokenKind> {
        self.lexer.next()
    }

    fn slice(&self) -> &'a str {
        &self.src[self.lexer.span()]
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        self.lexer.peek().map_or(false, |&peeked| peeked == kind)
    }

    fn consume(&mut self, expected: TokenKind) -> PResult<()> {
        if self.matches(expected) {
            self.advance();
            Ok(())
        } else {
            self.unexpected_token(vec![expected])
        }
    }

    fn error<T>(&self, kind: ParseErrorKind) -> PResult<T> {
        let span = self.lexer.span();
        Err(ParseError {
            kind,
            span: span.start + self.base..span.end + self.base,
            slice: self.slice().to_string(),
        })
    }

    fn error_at_end<T>(&self, kind: ParseErrorKind) -> PResult<T> {
        let end = self.base + self.src.len();
        Err(ParseError {
            kind,
            span: end..end,
            slice: String::new(),
        })
    }

    fn unexpected_token<T>(&mut self, expected: Vec<TokenKind>) -> PResult<T> {
        match self.advance() {
            None => self.error_at_end(ParseErrorKind::UnexpectedToken {
                found: None,
                expected,
            }),
            Some(TokenKind::Error) => self.error(ParseErrorKind::UnexpectedString { expected }),
            Some(TokenKind::ErrUnterminatedString) => {
                self.error(ParseErrorKind::UnterminatedString)
            }
            Some(TokenKind::ErrUnterminatedTemplate) => {
                self.error(ParseErrorKind::UnterminatedTemplate)
            }
            found => self.error(ParseErrorKind::UnexpectedToken { found, expected }),
        }
    }

    fn parse_program(&mut self) -> PResult<Expression<'a>> {
        let mut body = vec1![self.parse_node()?];
        while self.matches(TokenKind::Semicolon) {
            self.advance();
            if self.lexer.peek().is_none() {
                break;
            }
            body.push(self.parse_node()?);
        }
        Ok(Expression::new(body))
    }

    fn parse_node(&mut self) -> PResult<Node<'a>> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> PResult<Node<'a>> {
        let target = self.parse_conditional()?;

        if self.matches(TokenKind::Equal) {
            self.advance();
            return match target {
                Node::Variable(name) => {
                    let value = self.parse_assignment()?;
                    Ok(Node::new_assign(name, value))
                }
                _ => self.error(ParseErrorKind::InvalidAssignmentTarget),
            };
        }

        Ok(target)
    }

    fn parse_conditional(&mut self) -> PResult<Node<'a>> {
        let cond = self.parse_or()?;

        if self.matches(TokenKind::Question) {
            self.advance();
            let then = self.parse_node()?;
            self.consume(TokenKind::Colon)?;
            let otherwise = self.parse_node()?;
            return Ok(Node::new_conditional(cond, then, otherwise));
        }

        Ok(cond)
    }

    fn parse_or(&mut self) -> PResult<Node<'a>> {
        let mut lhs = self.parse_and()?;

        while self.matches(TokenKind::PipePipe) {
            self.advance();
            let rhs = self.parse_and()?;

            lhs = Node::new_logical(LogicalOperator::Or, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Node<'a>> {
        let mut lhs = self.parse_comparison()?;

        while self.matches(TokenKind::AmpAmp) {
            self.advance();
            let rhs = self.parse_comparison()?;

            lhs = Node::new_logical(LogicalOperator::And, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> PResult<Node<'a>> {
        let mut lhs = self.parse_addition()?;

        while let Some(op) = self.binary_op(Self::COMPARISON_OPS) {
            let rhs = self.parse_addition()?;

            lhs = Node::new_binary(op, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_addition(&mut self) -> PResult<Node<'a>> {
        let mut lhs = self.parse_multiplication()?;

        while let Some(op) = self.binary_op(Self::ADDITION_OPS) {
            let rhs = self.parse_multiplication()?;

            lhs = Node::new_binary(op, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_multiplication(&mut self) -> PResult<Node<'a>> {
        let mut lhs = self.parse_unary_prefix()?;

        while let Some(op) = self.binary_op(Self::MULTIPLICATION_OPS) {
            let rhs = self.parse_unary_prefix()?;

            lhs = Node::new_binary(op, lhs, rhs);
        }

        Ok(lhs)
    }

    fn binary_op(&mut self, options: &[TokenKind]) -> Option<BinaryOperator> {
        let op = self
            .lexer
            .peek()
            .filter(|peeked| options.contains(*peeked))
            .and_then(|peeked| peeked.as_binary_op())?;
        self.advance();
        Some(op)
    }

    fn parse_unary_prefix(&mut self) -> PResult<Node<'a>> {
        if let Some(op) = self.lexer.peek().and_then(|peeked| peeked.as_unary_op()) {
            self.advance();
            if op == UnaryOperator::Neg && self.lexer.peek() == Some(&TokenKind::Integer) {
                return self.parse_negated_integer();
            }
            let rhs = self.parse_unary_prefix()?;

            Ok(Node::new_unary(op, rhs))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> PResult<Node<'a>> {
        match self.lexer.peek().copied() {
            Some(TokenKind::LeftParen) => self.parse_parens(),
            Some(TokenKind::Integer) => self.parse_integer(),
            Some(TokenKind::Dice) => self.parse_dice(),
            Some(TokenKind::Ident) => {
                self.advance();
                Ok(Node::Variable(self.slice()))
            }
            Some(TokenKind::String) => self.parse_string(),
            Some(TokenKind::Template) => self.parse_template(),
            _ => self.unexpected_token(Self::ATOMS.to_vec()),
        }
    }

    fn parse_parens(&mut self) -> PResult<Node<'a>> {
        self.consume(TokenKind::LeftParen)?;
        let inner = self.parse_node()?;
        self.consume(TokenKind::RightParen)?;
        Ok(Node::new_parenthetical(inner))
    }

    fn parse_integer(&mut self) -> PResult<Node<'a>> {
        self.consume(TokenKind::Integer)?;
        match self.slice().parse::<Int>() {
            Ok(x) => Ok(Node::LiteralInt(x)),
            Err(_) => self.error(ParseErrorKind::IntegerOutOfRange),
        }
    }

    // `-9223372036854775808` only fits once the sign is applied
    fn parse_negated_integer(&mut self) -> PResult<Node<'a>> {
        self.consume(TokenKind::Integer)?;
        let slice = self.slice();
        match slice.parse::<Int>() {
            Ok(x) => Ok(Node::new_unary(UnaryOperator::Neg, Node::LiteralInt(x))),
            Err(_) if slice.parse::<u64>() == Ok(Int::MIN.unsigned_abs()) => {
                Ok(Node::LiteralInt(Int::MIN))
            }
            Err(_) => self.error(ParseErrorKind::IntegerOutOfRange),
        }
    }

    fn parse_dice(&mut self) -> PResult<Node<'a>> {
        self.consume(TokenKind::Dice)?;
        match self.slice().parse::<DiceTerm>() {
            Ok(dice) => Ok(Node::Dice(dice)),
            Err(why) => self.error(ParseErrorKind::InvalidDice(why)),
        }
    }

    fn parse_string(&mut self) -> PResult<Node<'a>> {
        self.consume(TokenKind::String)?;
        let slice = self.slice();
        Ok(Node::LiteralStr(unescape(&slice[1..slice.len() - 1])))
    }

    fn parse_template(&mut self) -> PResult<Node<'a>> {
        self.consume(TokenKind::Template)?;
        let slice = self.slice();
        let body_start = self.base + self.lexer.span().start + 1;
        let segments = template::split(&slice[1..slice.len() - 1], body_start)?;
        Ok(Node::Template(segments))
    }
}

fn unescape(s: &str) -> String {
    let mut ret = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            ret.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => ret.push('\n'),
            Some('t') => ret.push('\t'),
            Some(other) => ret.push(other),
            None => ret.push('\\'),
        }
    }
    ret
}
