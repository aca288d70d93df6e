//! Splitting of template bodies into literal text and `{expr}` interpolations.

use super::ast::Segment;
use super::parser::{ParseError, ParseErrorKind, Parser};

/// Splits `body` into segments. `base` is the offset of `body` inside the
/// full source so that errors in an interpolation point at the right place.
pub(crate) fn split(body: &str, base: usize) -> Result<Vec<Segment<'_>>, ParseError> {
    let mut segments = Vec::new();
    let mut start = 0;

    while let Some(found) = body[start..].find('{') {
        let open = start + found;
        if open > start {
            segments.push(Segment::Text(&body[start..open]));
        }

        let close = closing_brace(body, open + 1).ok_or_else(|| ParseError {
            kind: ParseErrorKind::UnclosedInterpolation,
            span: base + open..base + body.len(),
            slice: body[open..].to_string(),
        })?;

        let inner = &body[open + 1..close];
        if inner.trim().is_empty() {
            return Err(ParseError {
                kind: ParseErrorKind::EmptyInterpolation,
                span: base + open..base + close + 1,
                slice: body[open..=close].to_string(),
            });
        }

        let expr = Parser::with_offset(inner, base + open + 1).parse()?;
        segments.push(Segment::Expr(expr));
        start = close + 1;
    }

    if start < body.len() {
        segments.push(Segment::Text(&body[start..]));
    }
    Ok(segments)
}

// A `}` inside a string literal does not close the interpolation.
fn closing_brace(body: &str, from: usize) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in body[from..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else {
            match c {
                '"' => in_string = true,
                '}' => return Some(from + i),
                _ => {}
            }
        }
    }
    None
}
