// SPDX-License-Identifier: Apache-2.0
//! Property tests for the fixed-point substrate.

use dominium_fixed::{isqrt_u64, sin_turn, Q16_16, Q48_16};
use proptest::prelude::*;

proptest! {
    #[test]
    fn q16_16_add_sub_round_trips(a in any::<i32>(), b in any::<i32>()) {
        let a = Q16_16::from_raw(a);
        let b = Q16_16::from_raw(b);
        let sum = a.saturating_add(b);
        let back = sum.saturating_sub(b);
        // Saturation can clip the round trip; only assert exactness when the
        // forward addition did not saturate.
        let wide = i64::from(a.raw()) + i64::from(b.raw());
        if wide >= i64::from(i32::MIN) && wide <= i64::from(i32::MAX) {
            prop_assert_eq!(back, a);
        }
    }

    #[test]
    fn q16_16_div_never_panics(a in any::<i32>(), b in any::<i32>()) {
        let a = Q16_16::from_raw(a);
        let b = Q16_16::from_raw(b);
        let _ = a.saturating_div(b);
    }

    #[test]
    fn q48_16_mul_never_panics(a in any::<i64>(), b in any::<i64>()) {
        let a = Q48_16::from_raw(a);
        let b = Q48_16::from_raw(b);
        let _ = a.saturating_mul(b);
    }

    #[test]
    fn isqrt_is_monotonic(a in 0_u64..1_000_000_000, b in 0_u64..1_000_000_000) {
        if a <= b {
            prop_assert!(isqrt_u64(a) <= isqrt_u64(b));
        }
    }

    #[test]
    fn isqrt_never_overshoots(n in any::<u64>()) {
        let r = u64::from(isqrt_u64(n));
        prop_assert!(r.saturating_mul(r) <= n);
    }

    #[test]
    fn sin_turn_is_bounded(raw in any::<i32>()) {
        let s = sin_turn(raw);
        prop_assert!((-0x0001_0000..=0x0001_0000).contains(&s));
    }

    #[test]
    fn sin_turn_odd_symmetry(raw in any::<i32>()) {
        // sin(-x) == -sin(x), except where saturation/interpolation at the
        // boundary would make exact negation impossible to express.
        if raw != i32::MIN {
            prop_assert_eq!(sin_turn(-raw), -sin_turn(raw));
        }
    }
}
