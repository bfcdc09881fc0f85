//! Over-aligned heap buffers for transform inputs and outputs.
//!
//! Vectorized FFT kernels read and write whole SIMD lanes at a time, so every
//! buffer handed to an engine starts at an address aligned to the widest
//! vector the target may use. [`AlignedBuffer`] owns such an allocation,
//! zero-initializes it, and dereferences to a plain slice for everything else.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use num::{Complex, Zero};

/// Byte alignment guaranteed for the start of every [`AlignedBuffer`].
///
/// 32 bytes covers AVX loads on x86 targets; everything else gets the common
/// 16-byte vector alignment.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub const BUFFER_ALIGNMENT: usize = 32;
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub const BUFFER_ALIGNMENT: usize = 16;

/// Fixed-capacity heap buffer whose base address is aligned to
/// [`BUFFER_ALIGNMENT`] bytes.
///
/// Elements are zeroed on construction. The buffer never grows; request any
/// trailing headroom up front through the engine's `make_*_buffer` factories.
pub struct AlignedBuffer<T> {
    ptr: NonNull<T>,
    capacity: usize,
}

impl<T: Copy + Zero> AlignedBuffer<T> {
    /// Allocates a zero-filled buffer holding `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            return Self {
                ptr: NonNull::dangling(),
                capacity: 0,
            };
        }
        let layout = Self::layout(capacity);
        // SAFETY: the layout has non-zero size, and every element is written
        // before the pointer escapes this function.
        let ptr = unsafe {
            let raw = alloc(layout) as *mut T;
            if raw.is_null() {
                handle_alloc_error(layout);
            }
            for i in 0..capacity {
                ptr::write(raw.add(i), T::zero());
            }
            NonNull::new_unchecked(raw)
        };
        Self { ptr, capacity }
    }
}

impl<T> AlignedBuffer<T> {
    /// Number of elements the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: all `capacity` elements were initialized at construction.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, plus `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.capacity) }
    }

    /// Overwrites every element with `f(index)`.
    pub fn fill_with(&mut self, mut f: impl FnMut(usize) -> T) {
        for (i, slot) in self.as_mut_slice().iter_mut().enumerate() {
            *slot = f(i);
        }
    }

    fn layout(capacity: usize) -> Layout {
        Layout::array::<T>(capacity)
            .and_then(|layout| layout.align_to(BUFFER_ALIGNMENT))
            .expect("buffer capacity overflow")
    }
}

impl<S: Copy> AlignedBuffer<Complex<S>> {
    /// Overwrites every element with `f(index)`, then copies the real part of
    /// the last element into the imaginary slot of the first.
    ///
    /// Ordered real spectra keep the Nyquist coefficient in `self[0].im`, so a
    /// spectrum generated bin-by-bin into `capacity` slots (with the Nyquist
    /// bin landing one past the packed region) folds back into packed form
    /// with this single call.
    pub fn fill_with_swap_last(&mut self, f: impl FnMut(usize) -> Complex<S>) {
        self.fill_with(f);
        if self.capacity == 0 {
            return;
        }
        let last = self.as_slice()[self.capacity - 1].re;
        self.as_mut_slice()[0].im = last;
    }
}

impl<T> Deref for AlignedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for AlignedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        if self.capacity > 0 {
            // Elements are only ever Copy types; just release the allocation.
            // SAFETY: the pointer came from `alloc` with this exact layout.
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, Self::layout(self.capacity)) }
        }
    }
}

// SAFETY: the buffer uniquely owns its allocation and the element types used
// with it (scalars and Complex pairs) carry no thread affinity.
unsafe impl<T: Send> Send for AlignedBuffer<T> {}
unsafe impl<T: Sync> Sync for AlignedBuffer<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_address_is_aligned() {
        let f32_buf = AlignedBuffer::<f32>::new(17);
        let f64_buf = AlignedBuffer::<f64>::new(9);
        let c32_buf = AlignedBuffer::<Complex<f32>>::new(11);
        let c64_buf = AlignedBuffer::<Complex<f64>>::new(5);

        assert_eq!(f32_buf.as_slice().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
        assert_eq!(f64_buf.as_slice().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
        assert_eq!(c32_buf.as_slice().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
        assert_eq!(c64_buf.as_slice().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
    }

    #[test]
    fn starts_zeroed() {
        let buf = AlignedBuffer::<f64>::new(33);

        assert_eq!(buf.capacity(), 33);
        assert!(buf.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn fill_with_writes_every_index() {
        let mut buf = AlignedBuffer::<f32>::new(8);
        buf.fill_with(|i| i as f32 * 0.5);

        let expected: Vec<f32> = (0..8).map(|i| i as f32 * 0.5).collect();
        assert_eq!(buf.as_slice(), expected.as_slice());
    }

    #[test]
    fn swap_last_moves_trailing_real_into_first_imag() {
        let mut buf = AlignedBuffer::<Complex<f32>>::new(5);
        buf.fill_with_swap_last(|i| Complex::new(i as f32, -1.0));

        assert_eq!(buf[0], Complex::new(0.0, 4.0));
        assert_eq!(buf[1], Complex::new(1.0, -1.0));
        assert_eq!(buf[4], Complex::new(4.0, -1.0));
    }

    #[test]
    fn zero_capacity_is_inert() {
        let mut buf = AlignedBuffer::<Complex<f64>>::new(0);
        buf.fill_with_swap_last(|_| Complex::new(1.0, 1.0));

        assert_eq!(buf.capacity(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn indexing_past_capacity_panics() {
        let buf = AlignedBuffer::<f32>::new(4);
        let _ = buf[4];
    }
}
