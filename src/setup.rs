//! Immutable per-size transform state.

use crate::kernel::{FftElement, FftError};

/// Planned state for transforms of one element type at one size.
///
/// Setups are immutable once built and safe to share: any number of engines
/// and threads may run transforms off the same setup concurrently. They are
/// also the unit the [`crate::SetupCache`] deduplicates, so holding one keeps
/// the underlying plan alive independently of the cache.
pub struct Setup<E: FftElement> {
    n: usize,
    plan: E::Plan,
}

impl<E: FftElement> Setup<E> {
    pub(crate) fn new(n: usize) -> Result<Self, FftError> {
        #[cfg(test)]
        instrument::record::<E>(n);

        let plan = E::plan(n)?;
        Ok(Self { n, plan })
    }

    /// Transform size this setup was planned for.
    pub fn n(&self) -> usize {
        self.n
    }

    pub(crate) fn plan(&self) -> &E::Plan {
        &self.plan
    }
}


#[cfg(test)]
mod tests {
    use num::Complex;

    use super::*;

    #[test]
    fn construction_follows_the_size_rules() {
        let setup = Setup::<f32>::new(96).unwrap();
        assert_eq!(setup.n(), 96);

        assert_eq!(Setup::<f32>::new(48).err(), Some(FftError::InvalidSize(48)));
        assert!(Setup::<Complex<f32>>::new(48).is_ok());
    }
}
