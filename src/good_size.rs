use crate::kernel::TransformKind;

/// Smallest transform size the kernel decomposes for this kind.
pub(crate) fn min_fft_size(kind: TransformKind) -> usize {
    match kind {
        TransformKind::Real => 32,
        TransformKind::Complex => 16,
    }
}

/// A size is usable iff it is `min_fft_size * 2^a * 3^b * 5^c`.
pub(crate) fn is_valid_size(n: usize, kind: TransformKind) -> bool {
    let min = min_fft_size(kind);
    let mut r = n;
    while r >= 5 * min && r % 5 == 0 {
        r /= 5;
    }
    while r >= 3 * min && r % 3 == 0 {
        r /= 3;
    }
    while r >= 2 * min && r % 2 == 0 {
        r /= 2;
    }
    r == min
}

/// Closest valid size to `n`, searching upward when `higher` is set and
/// downward otherwise. Valid sizes are multiples of the minimum, so the
/// search walks that grid; anything at or below the minimum clamps to it.
pub(crate) fn nearest_valid_size(n: usize, kind: TransformKind, higher: bool) -> usize {
    let min = min_fft_size(kind);
    if n <= min {
        return min;
    }
    if is_valid_size(n, kind) {
        return n;
    }
    if higher {
        let mut candidate = (n + min - 1) / min * min;
        loop {
            if is_valid_size(candidate, kind) {
                return candidate;
            }
            candidate += min;
        }
    } else {
        let mut candidate = n / min * min;
        loop {
            if is_valid_size(candidate, kind) {
                return candidate;
            }
            // min itself is always valid, so this never underflows
            candidate -= min;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorizable_sizes_are_valid() {
        for n in [32, 64, 96, 160, 480, 4096, 5120, 32 * 3 * 3 * 5] {
            assert!(is_valid_size(n, TransformKind::Real), "real {n}");
        }
        for n in [16, 32, 48, 80, 240, 4800, 16 * 2 * 3 * 5] {
            assert!(is_valid_size(n, TransformKind::Complex), "complex {n}");
        }
    }

    #[test]
    fn unfactorizable_sizes_are_rejected_per_kind() {
        for n in [0, 1, 31, 33, 48, 112, 4097, 32 * 7] {
            assert!(!is_valid_size(n, TransformKind::Real), "real {n}");
        }
        // 48 is 16 * 3: fine for complex, not reachable from a real minimum
        assert!(is_valid_size(48, TransformKind::Complex));
        for n in [0, 8, 17, 40, 56, 16 * 7] {
            assert!(!is_valid_size(n, TransformKind::Complex), "complex {n}");
        }
    }

    #[test]
    fn nearest_climbs_to_the_next_multiple() {
        assert_eq!(nearest_valid_size(33, TransformKind::Real, true), 64);
        assert_eq!(nearest_valid_size(4097, TransformKind::Real, true), 4320);
        assert_eq!(nearest_valid_size(17, TransformKind::Complex, true), 32);
        // 112 is 16 * 7, so the climb skips it
        assert_eq!(nearest_valid_size(100, TransformKind::Complex, true), 128);
    }

    #[test]
    fn nearest_descends_to_the_previous_multiple() {
        assert_eq!(nearest_valid_size(63, TransformKind::Real, false), 32);
        assert_eq!(nearest_valid_size(4100, TransformKind::Real, false), 4096);
        assert_eq!(nearest_valid_size(47, TransformKind::Complex, false), 32);
    }

    #[test]
    fn nearest_returns_valid_input_unchanged() {
        assert_eq!(nearest_valid_size(96, TransformKind::Real, false), 96);
        assert_eq!(nearest_valid_size(96, TransformKind::Real, true), 96);
    }

    #[test]
    fn nearest_clamps_below_the_minimum() {
        assert_eq!(nearest_valid_size(0, TransformKind::Real, false), 32);
        assert_eq!(nearest_valid_size(31, TransformKind::Real, false), 32);
        assert_eq!(nearest_valid_size(5, TransformKind::Complex, true), 16);
    }
}
