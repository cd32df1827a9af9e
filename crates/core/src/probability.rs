//! Customer disobedience probability.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::result::Result;

/// Percentage chance (0..=100) that a customer takes an uncontrollable
/// action instead of deferring to the company, when both are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Disobedience(u8);

impl Disobedience {
    /// Always defers to the company.
    pub const NEVER: Self = Self(0);
    /// Always acts on its own when it can.
    pub const ALWAYS: Self = Self(100);

    /// # Errors
    ///
    /// Returns [`Error::InvalidProbability`] for values above 100.
    pub fn new(value: u32) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(Error::InvalidProbability { value })
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Whether a uniform draw in `[0, 100)` selects the uncontrolled branch.
    #[must_use]
    pub const fn disobeys(self, draw: usize) -> bool {
        draw < self.0 as usize
    }
}

impl TryFrom<u32> for Disobedience {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Disobedience> for u32 {
    fn from(value: Disobedience) -> Self {
        Self::from(value.0)
    }
}

impl fmt::Display for Disobedience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn should_accept_bounds() {
        assert_eq!(Disobedience::new(0).unwrap(), Disobedience::NEVER);
        assert_eq!(Disobedience::new(100).unwrap(), Disobedience::ALWAYS);
    }

    #[test]
    fn should_reject_above_hundred() {
        assert!(matches!(
            Disobedience::new(101),
            Err(Error::InvalidProbability { value: 101 })
        ));
        assert!(Disobedience::new(1000).is_err());
    }

    #[test]
    fn hundred_disobeys_every_draw() {
        assert!((0..100).all(|draw| Disobedience::ALWAYS.disobeys(draw)));
    }

    #[test]
    fn zero_never_disobeys() {
        assert!((0..100).all(|draw| !Disobedience::NEVER.disobeys(draw)));
    }

    #[test]
    fn threshold_is_strict() {
        let p = Disobedience::new(30).unwrap();
        assert!(p.disobeys(29));
        assert!(!p.disobeys(30));
    }
}
