//! Fixed-size FFT engines with cached planning, packed real spectra and
//! SIMD-friendly aligned buffers.
//!
//! [`Fft`] is the entry point: pick an element type (`f32` or `f64` for real
//! transforms, [`Complex`] of either for complex ones) and a valid size, then
//! move data between domains with unnormalized forward and inverse passes.
//! Setups are planned once per `(element, size)` pair and shared through
//! [`SetupCache`].

mod buffer;
mod cache;
mod fft;
mod good_size;
mod kernel;
mod setup;

pub use buffer::{AlignedBuffer, BUFFER_ALIGNMENT};
pub use cache::SetupCache;
pub use fft::Fft;
pub use kernel::{ComplexPlan, FftElement, FftError, FftScalar, RealPlan, TransformKind};
pub use setup::Setup;

pub use num::Complex;
