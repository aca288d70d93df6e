use crate::common::Int;

/// Decides which rolled faces count as a critical ("big") failure.
///
/// Only consulted when big-fail marking is switched on for an evaluation.
pub trait BigFailRule: Send + Sync {
    fn is_big_fail(&self, sides: Int, face: Int) -> bool;
}

/// The highest face of any die with more than one face.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MaxFace;

impl BigFailRule for MaxFace {
    fn is_big_fail(&self, sides: Int, face: Int) -> bool {
        sides > 1 && face == sides
    }
}

impl<F> BigFailRule for F
where
    F: Fn(Int, Int) -> bool + Send + Sync,
{
    fn is_big_fail(&self, sides: Int, face: Int) -> bool {
        self(sides, face)
    }
}
