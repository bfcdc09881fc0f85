//! Transform kernel adapter.
//!
//! The engine never talks to the planner crates directly; it goes through
//! [`FftElement`], which binds an element type to a plan and to the spectral
//! layouts the engine exposes. The real and complex paths live in their own
//! submodules, this one holds the shared vocabulary.

mod complex;
mod real;

pub use complex::ComplexPlan;
pub use real::RealPlan;

use num::{Complex, Float, Zero};
use rustfft::{FftDirection, FftNum};

/// Which transform family a plan computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Real,
    Complex,
}

/// Direction of a spectral reordering or transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Internal layout to ordered layout (or time to frequency).
    Forward,
    /// Ordered layout to internal layout (or frequency to time).
    Backward,
}

impl From<Direction> for FftDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => FftDirection::Forward,
            Direction::Backward => FftDirection::Inverse,
        }
    }
}

/// Errors produced while planning a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FftError {
    /// The size cannot be decomposed as `min_fft_size * 2^a * 3^b * 5^c`.
    #[error("{0} is not a supported FFT size (min size times powers of 2, 3 and 5)")]
    InvalidSize(usize),
}

/// Scalar precision the kernel supports.
pub trait FftScalar: FftNum + Float {}

macro_rules! impl_fft_scalar {
    ($($scalar:ty),*) => {
        $(impl FftScalar for $scalar {})*
    };
}

impl_fft_scalar!(f32, f64);

/// Element type an engine transforms: a real scalar or a [`Complex`] pair.
///
/// Implementations tie the element to its plan and to the packed spectral
/// layouts documented on [`crate::Fft`]. Every slice handed to these methods
/// has exactly the length the plan dictates; the engine checks capacities
/// before dispatching.
pub trait FftElement: Copy + Zero + Send + Sync + 'static {
    /// Scalar precision backing the element.
    type Scalar: FftScalar;
    /// Transform plan built once per `(element, size)` pair.
    type Plan: Send + Sync + 'static;
    /// Transform family this element selects.
    const KIND: TransformKind;

    fn plan(n: usize) -> Result<Self::Plan, FftError>;

    fn forward_ordered(
        plan: &Self::Plan,
        signal: &mut [Self],
        spectrum: &mut [Complex<Self::Scalar>],
        work: Option<&mut [Self::Scalar]>,
    );

    fn inverse_ordered(
        plan: &Self::Plan,
        spectrum: &mut [Complex<Self::Scalar>],
        signal: &mut [Self],
        work: Option<&mut [Self::Scalar]>,
    );

    fn forward_internal(
        plan: &Self::Plan,
        signal: &mut [Self],
        spectrum: &mut [Self::Scalar],
        work: Option<&mut [Self::Scalar]>,
    );

    fn inverse_internal(
        plan: &Self::Plan,
        spectrum: &mut [Self::Scalar],
        signal: &mut [Self],
        work: Option<&mut [Self::Scalar]>,
    );

    fn reorder_ordered(
        plan: &Self::Plan,
        spectrum: &[Self::Scalar],
        ordered: &mut [Complex<Self::Scalar>],
    );

    fn convolve(
        plan: &Self::Plan,
        a: &[Self::Scalar],
        b: &[Self::Scalar],
        ab: &mut [Self::Scalar],
        scaling: Self::Scalar,
    );

    fn convolve_accumulate(
        plan: &Self::Plan,
        a: &[Self::Scalar],
        b: &[Self::Scalar],
        ab: &mut [Self::Scalar],
        scaling: Self::Scalar,
    );
}

/// Vector extension the planners will pick up on this machine.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) fn simd_arch() -> &'static str {
    if is_x86_feature_detected!("avx") {
        "avx"
    } else if is_x86_feature_detected!("sse4.1") {
        "sse4.1"
    } else {
        "scalar"
    }
}

/// Vector extension the planners will pick up on this machine.
#[cfg(target_arch = "aarch64")]
pub(crate) fn simd_arch() -> &'static str {
    "neon"
}

/// Vector extension the planners will pick up on this machine.
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) fn simd_arch() -> &'static str {
    "scalar"
}

pub(crate) fn as_complex<S: FftScalar>(scalars: &[S]) -> &[Complex<S>] {
    debug_assert_eq!(scalars.len() % 2, 0);
    // SAFETY: Complex<S> is repr(C) { re: S, im: S }, so halving the length
    // preserves bounds, alignment and initialization.
    unsafe { std::slice::from_raw_parts(scalars.as_ptr() as *const Complex<S>, scalars.len() / 2) }
}

pub(crate) fn as_complex_mut<S: FftScalar>(scalars: &mut [S]) -> &mut [Complex<S>] {
    debug_assert_eq!(scalars.len() % 2, 0);
    // SAFETY: as above; `&mut` access is inherited from the input borrow.
    unsafe {
        std::slice::from_raw_parts_mut(scalars.as_mut_ptr() as *mut Complex<S>, scalars.len() / 2)
    }
}

pub(crate) fn as_scalars_mut<S: FftScalar>(values: &mut [Complex<S>]) -> &mut [S] {
    // SAFETY: inverse of the cast above; doubling the length stays within
    // the same allocation.
    unsafe { std::slice::from_raw_parts_mut(values.as_mut_ptr() as *mut S, values.len() * 2) }
}

/// Runs `op` with at least `need` complex scratch elements, borrowing them
/// from the engine's work buffer when it is large enough and falling back to
/// a temporary allocation otherwise.
pub(crate) fn run_with_scratch<S: FftScalar>(
    work: Option<&mut [S]>,
    need: usize,
    op: impl FnOnce(&mut [Complex<S>]),
) {
    match work {
        Some(work) if work.len() >= 2 * need => op(as_complex_mut(&mut work[..2 * need])),
        _ => op(&mut vec![Complex::new(S::zero(), S::zero()); need]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_complex_casts_share_memory() {
        let mut scalars = [1.0f32, 2.0, 3.0, 4.0];
        {
            let pairs = as_complex_mut(&mut scalars);
            pairs[1] = Complex::new(-3.0, -4.0);
        }
        assert_eq!(scalars, [1.0, 2.0, -3.0, -4.0]);

        let pairs = as_complex(&scalars);
        assert_eq!(pairs[0], Complex::new(1.0, 2.0));
        assert_eq!(pairs[1], Complex::new(-3.0, -4.0));
    }

    #[test]
    fn complex_to_scalar_view_doubles_length() {
        let mut values = [Complex::new(1.0f64, 2.0), Complex::new(3.0, 4.0)];
        let flat = as_scalars_mut(&mut values);
        assert_eq!(flat.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);

        flat[3] = 9.0;
        assert_eq!(values[1].im, 9.0);
    }

    #[test]
    fn scratch_borrows_from_work_when_large_enough() {
        let mut work = [0.0f32; 8];
        let mut seen = 0;
        run_with_scratch(Some(&mut work), 3, |scratch| {
            seen = scratch.len();
            scratch[0] = Complex::new(5.0, 6.0);
        });

        assert_eq!(seen, 3);
        assert_eq!(&work[..2], &[5.0, 6.0]);
    }

    #[test]
    fn scratch_falls_back_to_a_temporary_when_work_is_short() {
        let mut work = [0.0f32; 4];
        let mut seen = 0;
        run_with_scratch(Some(&mut work), 3, |scratch| {
            seen = scratch.len();
            scratch[0] = Complex::new(5.0, 6.0);
        });

        assert_eq!(seen, 3);
        assert_eq!(work, [0.0; 4]);
    }
}
