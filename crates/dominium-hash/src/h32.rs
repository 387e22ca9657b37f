// SPDX-License-Identifier: Apache-2.0
//! `h32`: word-stable 32-bit FNV-style hash of symbolic names.

/// FNV-1a 32-bit offset basis.
const OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
const PRIME: u32 = 0x0100_0193;

/// Hashes `label` into a stable 32-bit identifier.
///
/// Folds each byte of `label` with an xor-then-multiply step (FNV-1a),
/// which is identical across platforms and endianness because it operates
/// byte-at-a-time on the UTF-8 representation, never on machine words. Two
/// fixtures whose symbolic names are identical after whitespace/comment
/// stripping (performed by the fixture parser, not here) therefore hash to
/// the same id on every platform.
#[must_use]
pub fn h32(label: &str) -> u32 {
    let mut acc = OFFSET_BASIS;
    for byte in label.as_bytes() {
        acc ^= u32::from(*byte);
        acc = acc.wrapping_mul(PRIME);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(h32("alpha_side"), h32("alpha_side"));
    }

    #[test]
    fn distinct_labels_usually_differ() {
        assert_ne!(h32("alpha_side"), h32("beta_side"));
    }

    #[test]
    fn empty_string_hashes_to_offset_basis() {
        assert_eq!(h32(""), OFFSET_BASIS);
    }

    #[test]
    fn is_sensitive_to_byte_order() {
        assert_ne!(h32("ab"), h32("ba"));
    }
}
