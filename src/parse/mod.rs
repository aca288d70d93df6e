pub mod ast;
mod lexer;
mod parser;
mod template;
pub mod visit;

pub use ast::ParseDiceError;
pub use lexer::TokenKind;
pub use parser::{ParseError, ParseErrorKind};

use crate::common::vec1;

pub(crate) fn parse(s: &str) -> Result<ast::Expression, ParseError> {
    parser::Parser::new(s).parse()
}

/// Parses `s` as the body of a template, as if it were wrapped in backticks.
pub(crate) fn parse_template(s: &str) -> Result<ast::Expression, ParseError> {
    let segments = template::split(s, 0)?;
    Ok(ast::Expression::new(vec1![ast::Node::Template(segments)]))
}
