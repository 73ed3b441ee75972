//! Atomic backend selection.
//!
//! Targets without native CAS (or without 64-bit atomics) enable one of the
//! `portable-atomic*` features; everything else uses `core::sync::atomic`.

#[cfg(not(feature = "portable-atomic"))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, AtomicUsize};

#[cfg(all(not(feature = "portable-atomic"), target_has_atomic = "64"))]
pub(crate) use core::sync::atomic::AtomicU64;

#[cfg(feature = "portable-atomic")]
pub(crate) use portable_atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, AtomicUsize};

// Plain `portable-atomic` has no 64-bit emulation without `fallback`; only the
// interrupt-masking backends provide it on 32-bit cores.
#[cfg(all(
    feature = "portable-atomic",
    any(
        target_has_atomic = "64",
        feature = "portable-atomic-unsafe-assume-single-core",
        feature = "portable-atomic-critical-section",
    )
))]
pub(crate) use portable_atomic::AtomicU64;

pub(crate) use core::sync::atomic::Ordering;
