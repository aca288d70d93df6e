//! Name resolution for variables.

use crate::vm::Value;
use std::collections::HashMap;

/// Where variables are looked up and assigned.
///
/// The engine reads through this trait and only writes back, through
/// [`Context::set`], after an evaluation has fully succeeded.
pub trait Context {
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&mut self, name: &str, value: Value);
}

impl Context for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}

/// A context with no variables that discards writes.
#[derive(Debug, Copy, Clone, Default)]
pub struct EmptyContext;

impl Context for EmptyContext {
    fn get(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set(&mut self, _name: &str, _value: Value) {}
}

/// Assignments made during one evaluation, layered over the caller's context.
pub(crate) struct Staged<'c> {
    base: &'c dyn Context,
    writes: Vec<(String, Value)>,
}

impl<'c> Staged<'c> {
    pub fn new(base: &'c dyn Context) -> Self {
        Self {
            base,
            writes: Vec::new(),
        }
    }

    /// Writes in the order each name was first assigned, with its last value.
    pub fn into_writes(self) -> Vec<(String, Value)> {
        self.writes
    }
}

impl Context for Staged<'_> {
    fn get(&self, name: &str) -> Option<Value> {
        self.writes
            .iter()
            .find(|(staged, _)| staged == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.base.get(name))
    }

    fn set(&mut self, name: &str, value: Value) {
        match self.writes.iter_mut().find(|(staged, _)| staged == name) {
            Some((_, old)) => *old = value,
            None => self.writes.push((name.to_string(), value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_shadows_base() {
        let mut base = HashMap::new();
        base.insert("hp".to_string(), Value::Number(10));

        let mut staged = Staged::new(&base);
        assert_eq!(staged.get("hp"), Some(Value::Number(10)));

        staged.set("hp", Value::Number(7));
        staged.set("mp", Value::Number(1));
        staged.set("hp", Value::Number(5));
        assert_eq!(staged.get("hp"), Some(Value::Number(5)));
        assert_eq!(staged.get("missing"), None);

        assert_eq!(
            staged.into_writes(),
            vec![
                ("hp".to_string(), Value::Number(5)),
                ("mp".to_string(), Value::Number(1)),
            ]
        );
        assert_eq!(base.get("hp"), Some(&Value::Number(10)));
    }

    #[test]
    fn test_empty_context() {
        let mut ctx = EmptyContext;
        ctx.set("x", Value::Number(1));
        assert_eq!(Context::get(&ctx, "x"), None);
    }
}
