// SPDX-License-Identifier: Apache-2.0
//! Deterministic fixed-point scalars for the Dominium simulation kernel.
//!
//! Two ratio types are provided:
//!
//! - [`Q16_16`] — signed 32-bit, 16 fractional bits. Used for ratios and
//!   angles-in-turns (one full turn is `0x0001_0000`).
//! - [`Q48_16`] — signed 64-bit, 16 fractional bits. Used for capacities and
//!   running accumulators.
//!
//! Every operation here is a pure function of its inputs: there is no global
//! state, no floating point, and no panics. Multiplication widens to a wider
//! intermediate and saturates on overflow; division saturates to the type
//! extremes on overflow and on division by zero (sign follows the
//! numerator), matching the handful of C libraries this substrate is meant
//! to interoperate with bit-for-bit.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

mod q16_16;
mod q48_16;
mod sqrt;
mod trig;

pub use q16_16::Q16_16;
pub use q48_16::Q48_16;
pub use sqrt::isqrt_u64;
pub use trig::{cos_turn, sin_cos_turn, sin_turn};

/// Number of fractional bits shared by both fixed-point encodings.
pub const FRAC_BITS: u32 = 16;

/// Raw Q16.16 value of one full turn (`1.0`).
pub const TURN_ONE: i32 = 0x0001_0000;

/// Raw Q16.16 value of a quarter turn (`0.25`).
pub const TURN_QUARTER: i32 = 0x0000_4000;

/// Raw Q16.16 value of a half turn (`0.5`).
pub const TURN_HALF: i32 = 0x0000_8000;

/// Raw Q16.16 value of three-quarters of a turn (`0.75`).
pub const TURN_THREE_QUARTER: i32 = 0x0000_C000;
