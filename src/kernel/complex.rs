//! Complex-input transforms. Both spectral layouts are the natural
//! interleaved order here, so reordering reduces to a copy.

use std::sync::Arc;

use num::Complex;
use rustfft::{Fft, FftPlanner};

use super::{
    as_complex, as_complex_mut, as_scalars_mut, run_with_scratch, Direction, FftElement, FftError,
    FftScalar, TransformKind,
};
use crate::good_size;

/// Size-specific plan for complex-valued transforms.
pub struct ComplexPlan<S: FftScalar> {
    fwd: Arc<dyn Fft<S>>,
    inv: Arc<dyn Fft<S>>,
}

impl<S: FftScalar> ComplexPlan<S> {
    pub(crate) fn new(n: usize) -> Result<Self, FftError> {
        if !good_size::is_valid_size(n, TransformKind::Complex) {
            return Err(FftError::InvalidSize(n));
        }
        let mut planner = FftPlanner::new();
        Ok(Self {
            fwd: planner.plan_fft(n, Direction::Forward.into()),
            inv: planner.plan_fft(n, Direction::Backward.into()),
        })
    }

    fn n(&self) -> usize {
        self.fwd.len()
    }

    fn transform(
        &self,
        input: &mut [Complex<S>],
        output: &mut [Complex<S>],
        work: Option<&mut [S]>,
        direction: Direction,
    ) {
        let n = self.n();
        debug_assert_eq!(input.len(), n);
        debug_assert_eq!(output.len(), n);

        let plan = match direction {
            Direction::Forward => &self.fwd,
            Direction::Backward => &self.inv,
        };
        run_with_scratch(work, plan.get_outofplace_scratch_len(), |scratch| {
            plan.process_outofplace_with_scratch(input, output, scratch);
        });
    }

    fn reorder(&self, input: &[S], output: &mut [S], _direction: Direction) {
        debug_assert_eq!(input.len(), 2 * self.n());
        debug_assert_eq!(output.len(), 2 * self.n());

        // the interleaved order is already canonical in both directions
        output.copy_from_slice(input);
    }

    fn convolve(&self, a: &[S], b: &[S], ab: &mut [S], scaling: S) {
        debug_assert_eq!(a.len(), 2 * self.n());
        debug_assert_eq!(b.len(), 2 * self.n());
        debug_assert_eq!(ab.len(), 2 * self.n());

        let pa = as_complex(a);
        let pb = as_complex(b);
        let pab = as_complex_mut(ab);
        for ((x, y), out) in pa.iter().zip(pb).zip(pab) {
            *out = *x * *y * scaling;
        }
    }

    fn convolve_accumulate(&self, a: &[S], b: &[S], ab: &mut [S], scaling: S) {
        debug_assert_eq!(a.len(), 2 * self.n());
        debug_assert_eq!(b.len(), 2 * self.n());
        debug_assert_eq!(ab.len(), 2 * self.n());

        let pa = as_complex(a);
        let pb = as_complex(b);
        let pab = as_complex_mut(ab);
        for ((x, y), out) in pa.iter().zip(pb).zip(pab) {
            *out = *out + *x * *y * scaling;
        }
    }
}

impl<S: FftScalar> FftElement for Complex<S> {
    type Scalar = S;
    type Plan = ComplexPlan<S>;
    const KIND: TransformKind = TransformKind::Complex;

    fn plan(n: usize) -> Result<Self::Plan, FftError> {
        ComplexPlan::new(n)
    }

    fn forward_ordered(
        plan: &Self::Plan,
        signal: &mut [Self],
        spectrum: &mut [Complex<S>],
        work: Option<&mut [S]>,
    ) {
        plan.transform(signal, spectrum, work, Direction::Forward)
    }

    fn inverse_ordered(
        plan: &Self::Plan,
        spectrum: &mut [Complex<S>],
        signal: &mut [Self],
        work: Option<&mut [S]>,
    ) {
        plan.transform(spectrum, signal, work, Direction::Backward)
    }

    fn forward_internal(
        plan: &Self::Plan,
        signal: &mut [Self],
        spectrum: &mut [S],
        work: Option<&mut [S]>,
    ) {
        plan.transform(signal, as_complex_mut(spectrum), work, Direction::Forward)
    }

    fn inverse_internal(
        plan: &Self::Plan,
        spectrum: &mut [S],
        signal: &mut [Self],
        work: Option<&mut [S]>,
    ) {
        plan.transform(as_complex_mut(spectrum), signal, work, Direction::Backward)
    }

    fn reorder_ordered(plan: &Self::Plan, spectrum: &[S], ordered: &mut [Complex<S>]) {
        plan.reorder(spectrum, as_scalars_mut(ordered), Direction::Forward)
    }

    fn convolve(plan: &Self::Plan, a: &[S], b: &[S], ab: &mut [S], scaling: S) {
        plan.convolve(a, b, ab, scaling)
    }

    fn convolve_accumulate(plan: &Self::Plan, a: &[S], b: &[S], ab: &mut [S], scaling: S) {
        plan.convolve_accumulate(a, b, ab, scaling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_rejects_unfactorable_sizes() {
        assert_eq!(
            ComplexPlan::<f32>::new(17).err(),
            Some(FftError::InvalidSize(17))
        );
        assert!(ComplexPlan::<f64>::new(48).is_ok());
    }

    #[test]
    fn reorder_is_a_copy_in_both_directions() {
        let plan = ComplexPlan::<f64>::new(16).unwrap();
        let spectrum: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let mut ordered = vec![0.0f64; 32];

        plan.reorder(&spectrum, &mut ordered, Direction::Forward);
        assert_eq!(ordered, spectrum);

        let mut back = vec![0.0f64; 32];
        plan.reorder(&ordered, &mut back, Direction::Backward);
        assert_eq!(back, spectrum);
    }

    #[test]
    fn convolve_multiplies_bins_pointwise() {
        let plan = ComplexPlan::<f32>::new(16).unwrap();
        let a: Vec<f32> = (0..32).map(|i| i as f32 * 0.125).collect();
        let mut b = vec![0.0f32; 32];
        // b is the all-ones spectrum scaled by 2
        for k in 0..16 {
            b[2 * k] = 2.0;
        }
        let mut ab = vec![0.0f32; 32];

        plan.convolve(&a, &b, &mut ab, 0.5);
        for (got, want) in ab.iter().zip(a.iter()) {
            assert!((got - want).abs() < 1e-6, "expected {want}, got {got}");
        }

        plan.convolve_accumulate(&a, &b, &mut ab, 0.5);
        for (got, want) in ab.iter().zip(a.iter()) {
            assert!((got - 2.0 * want).abs() < 1e-6);
        }
    }
}
