use crate::common::*;
use crate::parse::ast;

pub trait AstVisitor<'a> {
    type Output;

    fn visit<T: ?Sized>(&mut self, node: &T) -> Self::Output
    where
        T: Accept<'a, Self>,
    {
        node.accept(self)
    }

    fn visit_expression(&mut self, expr: &ast::Expression<'a>) -> Self::Output;

    fn visit_int(&mut self, x: Int) -> Self::Output;

    fn visit_str(&mut self, s: &str) -> Self::Output;

    fn visit_dice(&mut self, dice: &ast::DiceTerm) -> Self::Output;

    fn visit_variable(&mut self, name: &'a str) -> Self::Output;

    fn visit_template(&mut self, segments: &[ast::Segment<'a>]) -> Self::Output;

    fn visit_parenthetical(&mut self, p: &ast::Node<'a>) -> Self::Output;

    fn visit_unary(&mut self, op: UnaryOperator, r: &ast::Node<'a>) -> Self::Output;

    fn visit_binary(
        &mut self,
        l: &ast::Node<'a>,
        op: BinaryOperator,
        r: &ast::Node<'a>,
    ) -> Self::Output;

    fn visit_logical(
        &mut self,
        l: &ast::Node<'a>,
        op: LogicalOperator,
        r: &ast::Node<'a>,
    ) -> Self::Output;

    fn visit_conditional(
        &mut self,
        cond: &ast::Node<'a>,
        then: &ast::Node<'a>,
        otherwise: &ast::Node<'a>,
    ) -> Self::Output;

    fn visit_assign(&mut self, name: &'a str, value: &ast::Node<'a>) -> Self::Output;
}

pub trait Accept<'a, V: AstVisitor<'a> + ?Sized> {
    fn accept(&self, v: &mut V) -> V::Output;
}

impl<'a, V: AstVisitor<'a> + ?Sized> Accept<'a, V> for ast::Expression<'a> {
    fn accept(&self, v: &mut V) -> V::Output {
        v.visit_expression(self)
    }
}

impl<'a, V: AstVisitor<'a> + ?Sized> Accept<'a, V> for ast::Node<'a> {
    fn accept(&self, v: &mut V) -> V::Output {
        match self {
            Self::LiteralInt(x) => v.visit_int(*x),
            Self::LiteralStr(s) => v.visit_str(s),
            Self::Dice(x) => v.visit_dice(x),
            Self::Variable(name) => v.visit_variable(name),
            Self::Template(segments) => v.visit_template(segments),
            Self::Parenthetical(x) => v.visit_parenthetical(x),
            Self::Unary(op, x) => v.visit_unary(*op, x),
            Self::Binary(l, op, r) => v.visit_binary(l, *op, r),
            Self::Logical(l, op, r) => v.visit_logical(l, *op, r),
            Self::Conditional(cond, then, otherwise) => {
                v.visit_conditional(cond, then, otherwise)
            }
            Self::Assign(name, value) => v.visit_assign(name, value),
        }
    }
}
