use crate::common::{NonZeroUInt, UInt};
use rand::{
    distributions::{DistIter, Distribution, Uniform},
    Rng,
};

pub trait Roller {
    type RollIter<'a>: Iterator<Item = UInt> + 'a
    where
        Self: 'a;

    fn roll(&mut self, sides: NonZeroUInt) -> UInt;

    fn roll_iter(&mut self, num: usize, sides: NonZeroUInt) -> Self::RollIter<'_>;
}

impl<R: Rng> Roller for R {
    type RollIter<'a> = std::iter::Take<DistIter<Uniform<UInt>, &'a mut Self, UInt>>
    where
        Self: 'a;

    fn roll(&mut self, sides: NonZeroUInt) -> UInt {
        self.gen_range(1..=sides.get())
    }

    fn roll_iter(&mut self, num: usize, sides: NonZeroUInt) -> Self::RollIter<'_> {
        Uniform::new_inclusive(1, sides.get())
            .sample_iter(self)
            .take(num)
    }
}

/// Rolls one die on the calling thread's generator.
///
/// Returns 0, meaning no roll happened, when `sides <= 0`.
pub fn roll_die(sides: i32) -> i32 {
    if sides <= 0 {
        return 0;
    }
    rand::thread_rng().gen_range(1..=sides)
}

/// The 64-bit form of [`roll_die`].
///
/// Only `sides == 0` yields 0. A negative `sides` still rolls: the result is
/// `r % sides + 1` for a non-negative random `r`, so it falls in `1..=|sides|`
/// (and wraps for `i64::MIN`).
pub fn roll_die64(sides: i64) -> i64 {
    let mut rng = rand::thread_rng();
    match sides {
        0 => 0,
        _ if sides > 0 => rng.gen_range(1..=sides),
        _ => rng
            .gen_range(0..=i64::MAX)
            .wrapping_rem(sides)
            .wrapping_add(1),
    }
}

#[cfg(test)]
pub(crate) use step::StepRoller;
