//! Fixed-size transform engines.

use std::sync::Arc;

use num::Complex;

use crate::buffer::AlignedBuffer;
use crate::cache::SetupCache;
use crate::good_size;
use crate::kernel::{self, FftElement, FftError, TransformKind};
use crate::setup::Setup;

/// Above this size an engine keeps a dedicated work buffer, so transform
/// scratch stays off the allocator on the hot path.
const WORK_BUFFER_THRESHOLD: usize = 4096;

/// Transform engine for one element type at one fixed size.
///
/// An engine wraps a shared [`Setup`] and adds the per-instance state a
/// transform needs, so an engine is cheap to build once the setup is cached.
/// Transforms are unnormalized: running [`Fft::forward`] and then
/// [`Fft::inverse`] returns the signal scaled by `n`.
///
/// Spectra come in two layouts. The *ordered* layout is complex bins in
/// natural frequency order; for real elements the `n / 2 + 1` distinct bins
/// fit `n / 2` slots because the purely real DC and Nyquist coefficients
/// share element 0 (`re` holds DC, `im` holds Nyquist). The *internal*
/// layout is the scalar form the convolution helpers consume: real spectra
/// keep DC first and Nyquist last with the interior bins interleaved in
/// between, complex spectra are the ordered bins flattened to scalars.
///
/// Buffers should come from the engine's `make_*_buffer` factories, which
/// size and align them for the kernel. Every operation checks capacities up
/// front and panics on a short buffer rather than compute a wrong answer.
pub struct Fft<E: FftElement> {
    setup: Arc<Setup<E>>,
    n: usize,
    work: AlignedBuffer<E::Scalar>,
}

impl<E: FftElement> Fft<E> {
    /// Builds an engine for size `n`, sharing setups through the
    /// process-wide [`SetupCache`].
    pub fn new(n: usize) -> Result<Self, FftError> {
        Ok(Self::with_setup(SetupCache::shared().get::<E>(n)?))
    }

    /// As [`Fft::new`], but resolves the setup through `cache`.
    pub fn with_cache(cache: &SetupCache, n: usize) -> Result<Self, FftError> {
        Ok(Self::with_setup(cache.get::<E>(n)?))
    }

    /// Wraps an already planned setup.
    pub fn with_setup(setup: Arc<Setup<E>>) -> Self {
        let n = setup.n();
        let work_capacity = if n > WORK_BUFFER_THRESHOLD {
            match E::KIND {
                TransformKind::Real => n,
                TransformKind::Complex => 2 * n,
            }
        } else {
            0
        };
        Self {
            setup,
            n,
            work: AlignedBuffer::new(work_capacity),
        }
    }

    /// Transform size of this engine.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Setup shared by this engine.
    pub fn setup(&self) -> &Arc<Setup<E>> {
        &self.setup
    }

    /// Allocates a signal buffer holding `n + extra` elements.
    pub fn make_signal_buffer(&self, extra: usize) -> AlignedBuffer<E> {
        AlignedBuffer::new(self.n + extra)
    }

    /// Allocates an ordered-spectrum buffer with `extra` elements of
    /// headroom past the packed bins.
    ///
    /// The headroom is what makes [`AlignedBuffer::fill_with_swap_last`]
    /// convenient for real spectra: generate all `n / 2 + 1` natural bins
    /// with `extra >= 1` and the fill folds the trailing Nyquist bin back
    /// into element 0.
    pub fn make_spectrum_buffer(&self, extra: usize) -> AlignedBuffer<Complex<E::Scalar>> {
        AlignedBuffer::new(self.ordered_len() + extra)
    }

    /// Allocates an internal-layout buffer sized for `n + extra` elements.
    pub fn make_internal_layout_buffer(&self, extra: usize) -> AlignedBuffer<E::Scalar> {
        let capacity = match E::KIND {
            TransformKind::Real => self.n + extra,
            TransformKind::Complex => 2 * (self.n + extra),
        };
        AlignedBuffer::new(capacity)
    }

    /// Computes the ordered-layout spectrum of `signal`.
    ///
    /// The signal buffer doubles as kernel scratch, so its contents are
    /// clobbered.
    pub fn forward(
        &mut self,
        signal: &mut AlignedBuffer<E>,
        spectrum: &mut AlignedBuffer<Complex<E::Scalar>>,
    ) {
        self.check_transform_buffers(signal.capacity(), spectrum.capacity());
        let n = self.n;
        let m = self.ordered_len();
        let work = work_slice(&mut self.work);
        E::forward_ordered(self.setup.plan(), &mut signal[..n], &mut spectrum[..m], work);
    }

    /// Reconstructs `signal` from an ordered-layout `spectrum`, scaled by
    /// `n`.
    ///
    /// The spectrum buffer doubles as kernel scratch, so its contents are
    /// clobbered.
    pub fn inverse(
        &mut self,
        spectrum: &mut AlignedBuffer<Complex<E::Scalar>>,
        signal: &mut AlignedBuffer<E>,
    ) {
        self.check_transform_buffers(signal.capacity(), spectrum.capacity());
        let n = self.n;
        let m = self.ordered_len();
        let work = work_slice(&mut self.work);
        E::inverse_ordered(self.setup.plan(), &mut spectrum[..m], &mut signal[..n], work);
    }

    /// As [`Fft::forward`], but emits the internal scalar layout, skipping
    /// the final reordering pass. Pair the result with [`Fft::convolve`], or
    /// bring it into natural order later with [`Fft::reorder`].
    pub fn forward_to_internal_layout(
        &mut self,
        signal: &mut AlignedBuffer<E>,
        spectrum: &mut AlignedBuffer<E::Scalar>,
    ) {
        self.check_internal_buffers(signal.capacity(), spectrum.capacity());
        let n = self.n;
        let m = self.internal_len();
        let work = work_slice(&mut self.work);
        E::forward_internal(self.setup.plan(), &mut signal[..n], &mut spectrum[..m], work);
    }

    /// Inverse of [`Fft::forward_to_internal_layout`]; like [`Fft::inverse`]
    /// the result is scaled by `n` and the spectrum buffer is clobbered.
    pub fn inverse_from_internal_layout(
        &mut self,
        spectrum: &mut AlignedBuffer<E::Scalar>,
        signal: &mut AlignedBuffer<E>,
    ) {
        self.check_internal_buffers(signal.capacity(), spectrum.capacity());
        let n = self.n;
        let m = self.internal_len();
        let work = work_slice(&mut self.work);
        E::inverse_internal(self.setup.plan(), &mut spectrum[..m], &mut signal[..n], work);
    }

    /// Rewrites an internal-layout spectrum into ordered complex bins.
    pub fn reorder(
        &self,
        spectrum: &AlignedBuffer<E::Scalar>,
        output: &mut AlignedBuffer<Complex<E::Scalar>>,
    ) {
        assert!(
            spectrum.capacity() >= self.internal_len(),
            "spectrum buffer too small"
        );
        assert!(
            output.capacity() >= self.ordered_len(),
            "output buffer too small"
        );
        E::reorder_ordered(
            self.setup.plan(),
            &spectrum[..self.internal_len()],
            &mut output[..self.ordered_len()],
        );
    }

    /// Pointwise product of two internal-layout spectra:
    /// `ab = a * b * scaling`.
    ///
    /// With `scaling = 1 / n`, a pair of forward transforms followed by
    /// [`Fft::inverse_from_internal_layout`] yields the circular convolution
    /// of the two signals.
    pub fn convolve(
        &self,
        a: &AlignedBuffer<E::Scalar>,
        b: &AlignedBuffer<E::Scalar>,
        ab: &mut AlignedBuffer<E::Scalar>,
        scaling: E::Scalar,
    ) {
        self.check_convolve_buffers(a.capacity(), b.capacity(), ab.capacity());
        let m = self.internal_len();
        E::convolve(self.setup.plan(), &a[..m], &b[..m], &mut ab[..m], scaling);
    }

    /// As [`Fft::convolve`], accumulating into `ab`:
    /// `ab += a * b * scaling`.
    pub fn convolve_accumulate(
        &self,
        a: &AlignedBuffer<E::Scalar>,
        b: &AlignedBuffer<E::Scalar>,
        ab: &mut AlignedBuffer<E::Scalar>,
        scaling: E::Scalar,
    ) {
        self.check_convolve_buffers(a.capacity(), b.capacity(), ab.capacity());
        let m = self.internal_len();
        E::convolve_accumulate(self.setup.plan(), &a[..m], &b[..m], &mut ab[..m], scaling);
    }

    /// Whether `n` can be planned for this element type.
    pub fn is_valid_size(n: usize) -> bool {
        good_size::is_valid_size(n, E::KIND)
    }

    /// Closest valid size to `n`: upward when `higher` is set, downward
    /// otherwise.
    pub fn nearest_valid_size(n: usize, higher: bool) -> usize {
        good_size::nearest_valid_size(n, E::KIND, higher)
    }

    /// Smallest valid size for this element type.
    pub fn min_fft_size() -> usize {
        good_size::min_fft_size(E::KIND)
    }

    /// Vector extension the transforms will use on this machine.
    pub fn simd_arch() -> &'static str {
        kernel::simd_arch()
    }

    fn ordered_len(&self) -> usize {
        match E::KIND {
            TransformKind::Real => self.n / 2,
            TransformKind::Complex => self.n,
        }
    }

    fn internal_len(&self) -> usize {
        match E::KIND {
            TransformKind::Real => self.n,
            TransformKind::Complex => 2 * self.n,
        }
    }

    fn check_transform_buffers(&self, signal: usize, spectrum: usize) {
        assert!(signal >= self.n, "signal buffer too small");
        assert!(spectrum >= self.ordered_len(), "spectrum buffer too small");
    }

    fn check_internal_buffers(&self, signal: usize, spectrum: usize) {
        assert!(signal >= self.n, "signal buffer too small");
        assert!(spectrum >= self.internal_len(), "spectrum buffer too small");
    }

    fn check_convolve_buffers(&self, a: usize, b: usize, ab: usize) {
        let m = self.internal_len();
        assert!(a >= m, "a buffer too small");
        assert!(b >= m, "b buffer too small");
        assert!(ab >= m, "ab buffer too small");
    }
}

fn work_slice<S>(work: &mut AlignedBuffer<S>) -> Option<&mut [S]> {
    if work.capacity() > 0 {
        Some(&mut work[..])
    } else {
        None
    }
}
