//! Real-input transforms and their packed half-spectrum layouts.

use std::sync::Arc;

use num::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use super::{
    as_complex, as_complex_mut, as_scalars_mut, run_with_scratch, Direction, FftElement, FftError,
    FftScalar, TransformKind,
};
use crate::good_size;

/// Size-specific plan for real-valued transforms.
///
/// A real signal of length `n` has `n / 2 + 1` spectral bins, with the first
/// and last purely real. The plan exposes the two packed layouts built on
/// that: the ordered layout folds the Nyquist coefficient into the imaginary
/// slot of bin 0 so the spectrum fits `n / 2` complex elements, and the
/// internal layout flattens the same data into `n` scalars with the Nyquist
/// coefficient trailing.
pub struct RealPlan<S: FftScalar> {
    fwd: Arc<dyn RealToComplex<S>>,
    inv: Arc<dyn ComplexToReal<S>>,
}

impl<S: FftScalar> RealPlan<S> {
    pub(crate) fn new(n: usize) -> Result<Self, FftError> {
        if !good_size::is_valid_size(n, TransformKind::Real) {
            return Err(FftError::InvalidSize(n));
        }
        let mut planner = RealFftPlanner::new();
        Ok(Self {
            fwd: planner.plan_fft_forward(n),
            inv: planner.plan_fft_inverse(n),
        })
    }

    fn n(&self) -> usize {
        self.fwd.len()
    }

    fn forward_ordered(
        &self,
        signal: &mut [S],
        spectrum: &mut [Complex<S>],
        work: Option<&mut [S]>,
    ) {
        let n = self.n();
        debug_assert_eq!(signal.len(), n);
        debug_assert_eq!(spectrum.len(), n / 2);

        let mut natural = vec![Complex::new(S::zero(), S::zero()); n / 2 + 1];
        run_with_scratch(work, self.fwd.get_scratch_len(), |scratch| {
            // only fails on mismatched lengths, which are exact here
            self.fwd
                .process_with_scratch(signal, &mut natural, scratch)
                .unwrap();
        });
        pack_spectrum(&natural, spectrum);
    }

    fn inverse_ordered(
        &self,
        spectrum: &mut [Complex<S>],
        signal: &mut [S],
        work: Option<&mut [S]>,
    ) {
        let n = self.n();
        debug_assert_eq!(spectrum.len(), n / 2);
        debug_assert_eq!(signal.len(), n);

        let mut natural = vec![Complex::new(S::zero(), S::zero()); n / 2 + 1];
        unpack_spectrum(spectrum, &mut natural);
        run_with_scratch(work, self.inv.get_scratch_len(), |scratch| {
            self.inv
                .process_with_scratch(&mut natural, signal, scratch)
                .unwrap();
        });
    }

    fn forward_internal(&self, signal: &mut [S], spectrum: &mut [S], work: Option<&mut [S]>) {
        let n = self.n();
        debug_assert_eq!(signal.len(), n);
        debug_assert_eq!(spectrum.len(), n);

        let mut natural = vec![Complex::new(S::zero(), S::zero()); n / 2 + 1];
        run_with_scratch(work, self.fwd.get_scratch_len(), |scratch| {
            self.fwd
                .process_with_scratch(signal, &mut natural, scratch)
                .unwrap();
        });
        spectrum[0] = natural[0].re;
        spectrum[n - 1] = natural[n / 2].re;
        for (k, bin) in natural[1..n / 2].iter().enumerate() {
            spectrum[2 * k + 1] = bin.re;
            spectrum[2 * k + 2] = bin.im;
        }
    }

    fn inverse_internal(&self, spectrum: &mut [S], signal: &mut [S], work: Option<&mut [S]>) {
        let n = self.n();
        debug_assert_eq!(spectrum.len(), n);
        debug_assert_eq!(signal.len(), n);

        let mut natural = vec![Complex::new(S::zero(), S::zero()); n / 2 + 1];
        natural[0] = Complex::new(spectrum[0], S::zero());
        natural[n / 2] = Complex::new(spectrum[n - 1], S::zero());
        for k in 1..n / 2 {
            natural[k] = Complex::new(spectrum[2 * k - 1], spectrum[2 * k]);
        }
        run_with_scratch(work, self.inv.get_scratch_len(), |scratch| {
            self.inv
                .process_with_scratch(&mut natural, signal, scratch)
                .unwrap();
        });
    }

    /// Converts between the internal scalar layout and the ordered layout
    /// flattened to scalars. Both views shift the Nyquist coefficient: the
    /// ordered layout keeps it right after DC, the internal layout keeps it
    /// last.
    fn reorder(&self, input: &[S], output: &mut [S], direction: Direction) {
        let n = self.n();
        debug_assert_eq!(input.len(), n);
        debug_assert_eq!(output.len(), n);

        match direction {
            Direction::Forward => {
                output[0] = input[0];
                output[1] = input[n - 1];
                output[2..n].copy_from_slice(&input[1..n - 1]);
            }
            Direction::Backward => {
                output[0] = input[0];
                output[n - 1] = input[1];
                output[1..n - 1].copy_from_slice(&input[2..n]);
            }
        }
    }

    fn convolve(&self, a: &[S], b: &[S], ab: &mut [S], scaling: S) {
        let n = self.n();
        debug_assert_eq!(a.len(), n);
        debug_assert_eq!(b.len(), n);
        debug_assert_eq!(ab.len(), n);

        // DC and Nyquist are real, so their products stay in their slots
        ab[0] = a[0] * b[0] * scaling;
        ab[n - 1] = a[n - 1] * b[n - 1] * scaling;
        let pa = as_complex(&a[1..n - 1]);
        let pb = as_complex(&b[1..n - 1]);
        let pab = as_complex_mut(&mut ab[1..n - 1]);
        for ((x, y), out) in pa.iter().zip(pb).zip(pab) {
            *out = *x * *y * scaling;
        }
    }

    fn convolve_accumulate(&self, a: &[S], b: &[S], ab: &mut [S], scaling: S) {
        let n = self.n();
        debug_assert_eq!(a.len(), n);
        debug_assert_eq!(b.len(), n);
        debug_assert_eq!(ab.len(), n);

        ab[0] = ab[0] + a[0] * b[0] * scaling;
        ab[n - 1] = ab[n - 1] + a[n - 1] * b[n - 1] * scaling;
        let pa = as_complex(&a[1..n - 1]);
        let pb = as_complex(&b[1..n - 1]);
        let pab = as_complex_mut(&mut ab[1..n - 1]);
        for ((x, y), out) in pa.iter().zip(pb).zip(pab) {
            *out = *out + *x * *y * scaling;
        }
    }
}

/// Folds the natural `n / 2 + 1` bins into `n / 2` packed ones: bin 0
/// becomes `(DC, Nyquist)` and the interior bins follow unchanged.
fn pack_spectrum<S: FftScalar>(natural: &[Complex<S>], packed: &mut [Complex<S>]) {
    let half = packed.len();
    debug_assert_eq!(natural.len(), half + 1);

    packed[0] = Complex::new(natural[0].re, natural[half].re);
    packed[1..].copy_from_slice(&natural[1..half]);
}

/// Expands packed bins back to the natural layout. The boundary bins are
/// real by construction, so any stray imaginary part is dropped.
fn unpack_spectrum<S: FftScalar>(packed: &[Complex<S>], natural: &mut [Complex<S>]) {
    let half = packed.len();
    debug_assert_eq!(natural.len(), half + 1);

    natural[0] = Complex::new(packed[0].re, S::zero());
    natural[half] = Complex::new(packed[0].im, S::zero());
    natural[1..half].copy_from_slice(&packed[1..]);
}

macro_rules! impl_real_element {
    ($($scalar:ty),*) => {$(
        impl FftElement for $scalar {
            type Scalar = $scalar;
            type Plan = RealPlan<$scalar>;
            const KIND: TransformKind = TransformKind::Real;

            fn plan(n: usize) -> Result<Self::Plan, FftError> {
                RealPlan::new(n)
            }

            fn forward_ordered(
                plan: &Self::Plan,
                signal: &mut [Self],
                spectrum: &mut [Complex<$scalar>],
                work: Option<&mut [$scalar]>,
            ) {
                plan.forward_ordered(signal, spectrum, work)
            }

            fn inverse_ordered(
                plan: &Self::Plan,
                spectrum: &mut [Complex<$scalar>],
                signal: &mut [Self],
                work: Option<&mut [$scalar]>,
            ) {
                plan.inverse_ordered(spectrum, signal, work)
            }

            fn forward_internal(
                plan: &Self::Plan,
                signal: &mut [Self],
                spectrum: &mut [$scalar],
                work: Option<&mut [$scalar]>,
            ) {
                plan.forward_internal(signal, spectrum, work)
            }

            fn inverse_internal(
                plan: &Self::Plan,
                spectrum: &mut [$scalar],
                signal: &mut [Self],
                work: Option<&mut [$scalar]>,
            ) {
                plan.inverse_internal(spectrum, signal, work)
            }

            fn reorder_ordered(
                plan: &Self::Plan,
                spectrum: &[$scalar],
                ordered: &mut [Complex<$scalar>],
            ) {
                plan.reorder(spectrum, as_scalars_mut(ordered), Direction::Forward)
            }

            fn convolve(
                plan: &Self::Plan,
                a: &[$scalar],
                b: &[$scalar],
                ab: &mut [$scalar],
                scaling: $scalar,
            ) {
                plan.convolve(a, b, ab, scaling)
            }

            fn convolve_accumulate(
                plan: &Self::Plan,
                a: &[$scalar],
                b: &[$scalar],
                ab: &mut [$scalar],
                scaling: $scalar,
            ) {
                plan.convolve_accumulate(a, b, ab, scaling)
            }
        }
    )*};
}

impl_real_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_rejects_unfactorable_sizes() {
        assert_eq!(
            RealPlan::<f32>::new(33).err(),
            Some(FftError::InvalidSize(33))
        );
        assert!(RealPlan::<f64>::new(96).is_ok());
    }

    #[test]
    fn pack_then_unpack_restores_natural_bins() {
        let natural = [
            Complex::new(10.0f64, 0.0),
            Complex::new(1.0, -2.0),
            Complex::new(3.5, 0.25),
            Complex::new(-4.0, 0.0),
        ];
        let mut packed = [Complex::new(0.0, 0.0); 3];
        pack_spectrum(&natural, &mut packed);

        assert_eq!(packed[0], Complex::new(10.0, -4.0));
        assert_eq!(packed[1], Complex::new(1.0, -2.0));
        assert_eq!(packed[2], Complex::new(3.5, 0.25));

        let mut restored = [Complex::new(0.0, 0.0); 4];
        unpack_spectrum(&packed, &mut restored);
        assert_eq!(restored, natural);
    }

    #[test]
    fn unpack_zeroes_stray_boundary_imaginaries() {
        let packed = [Complex::new(2.0f32, 3.0), Complex::new(0.5, 0.5)];
        let mut natural = [Complex::new(9.0, 9.0); 3];
        unpack_spectrum(&packed, &mut natural);

        assert_eq!(natural[0], Complex::new(2.0, 0.0));
        assert_eq!(natural[1], Complex::new(0.5, 0.5));
        assert_eq!(natural[2], Complex::new(3.0, 0.0));
    }

    #[test]
    fn reorder_directions_are_inverses() {
        let plan = RealPlan::<f32>::new(32).unwrap();
        let internal: Vec<f32> = (0..32).map(|i| i as f32).collect();
        let mut ordered = vec![0.0f32; 32];
        let mut back = vec![0.0f32; 32];

        plan.reorder(&internal, &mut ordered, Direction::Forward);
        assert_eq!(ordered[0], 0.0, "DC leads in both layouts");
        assert_eq!(ordered[1], 31.0, "Nyquist moves up next to DC");
        assert_eq!(ordered[2], 1.0);

        plan.reorder(&ordered, &mut back, Direction::Backward);
        assert_eq!(back, internal);
    }

    #[test]
    fn internal_layout_agrees_with_ordered_spectrum() {
        let plan = RealPlan::<f32>::new(32).unwrap();
        let make_signal =
            || -> Vec<f32> { (0..32).map(|i| ((i * 7 + 3) % 11) as f32 * 0.5).collect() };

        let mut signal = make_signal();
        let mut ordered = vec![Complex::new(0.0f32, 0.0); 16];
        plan.forward_ordered(&mut signal, &mut ordered, None);

        let mut signal = make_signal();
        let mut internal = vec![0.0f32; 32];
        plan.forward_internal(&mut signal, &mut internal, None);

        assert!((internal[0] - ordered[0].re).abs() < 1e-4, "DC slot");
        assert!((internal[31] - ordered[0].im).abs() < 1e-4, "Nyquist slot");
        for k in 1..16 {
            assert!((internal[2 * k - 1] - ordered[k].re).abs() < 1e-4);
            assert!((internal[2 * k] - ordered[k].im).abs() < 1e-4);
        }
    }
}
