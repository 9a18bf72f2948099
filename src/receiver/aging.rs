//! Age comparison of source block numbers in the wrap-around 24-bit space.
//!
//! Due to the wrap-around nature of source block numbers, "older" and
//! "newer" cannot be told apart with a plain numeric comparison: if the
//! reference is 0, is 16777214 very new or very old? The ambiguity is
//! resolved by declaring the 2^22 values following the reference to be the
//! "newer" window; everything else is current, old or too old. With a
//! maximum age of 2 and a reference of 0, block numbers 0 and 16777215 are
//! recent enough, 16777214 is too old, and 1 is newer.

const NEWER_RANGE: u32 = 1 << 22;
const TOTAL_RANGE: u32 = 1 << 24;

/// true when `candidate` lies in the newer window following `reference`,
/// i.e. in the circular range `[reference+1, reference+2^22-1]`
pub fn is_newer(candidate: u32, reference: u32) -> bool {
    let start = (reference + 1) & (TOTAL_RANGE - 1);
    let end = (reference + (NEWER_RANGE - 1)) & (TOTAL_RANGE - 1);
    in_range(candidate, start, end)
}

/// true when `candidate` is at most `max_age - 1` steps behind `reference`
/// or inside the newer window, i.e. in the circular range
/// `[reference-(max_age-1), reference+2^22-1]`.
///
/// The newer window is part of the recent range, otherwise newer block
/// numbers would be misclassified as too old.
pub fn is_recent_enough(candidate: u32, reference: u32, max_age: u32) -> bool {
    // Ages beyond the block number space wrap like the block numbers do
    let age = (max_age - 1) & (TOTAL_RANGE - 1);
    let start = (reference + TOTAL_RANGE - age) & (TOTAL_RANGE - 1);
    let end = (reference + (NEWER_RANGE - 1)) & (TOTAL_RANGE - 1);
    in_range(candidate, start, end)
}

/// Wrap-around aware ordering of two block numbers.
///
/// Only coherent when all compared numbers span less than the newer window,
/// which holds for any set of source blocks alive at the same time.
pub fn cmp_block_nr(a: u32, b: u32) -> std::cmp::Ordering {
    if a == b {
        std::cmp::Ordering::Equal
    } else if is_newer(b, a) {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Greater
    }
}

fn in_range(block_nr: u32, start: u32, end: u32) -> bool {
    if start < end {
        block_nr >= start && block_nr <= end
    } else if start > end {
        block_nr <= end || block_nr >= start
    } else {
        block_nr == start
    }
}

#[cfg(test)]
mod tests {
    use super::{cmp_block_nr, is_newer, is_recent_enough, TOTAL_RANGE};

    #[test]
    pub fn test_is_newer() {
        crate::tests::init();
        for reference in [0, 1, 4242, TOTAL_RANGE - 1] {
            let next = (reference + 1) & (TOTAL_RANGE - 1);
            let prev = (reference + TOTAL_RANGE - 1) & (TOTAL_RANGE - 1);
            assert!(is_newer(next, reference), "reference {}", reference);
            assert!(!is_newer(reference, reference), "reference {}", reference);
            assert!(!is_newer(prev, reference), "reference {}", reference);
        }
    }

    #[test]
    pub fn test_newer_window_is_asymmetric() {
        crate::tests::init();
        // 2^22 - 1 steps ahead is still newer, one more is not
        assert!(is_newer((1 << 22) - 1, 0));
        assert!(!is_newer(1 << 22, 0));
        // Far behind the reference is not newer
        assert!(!is_newer(TOTAL_RANGE - 100, 0));
    }

    #[test]
    pub fn test_is_recent_enough_max_age_1() {
        crate::tests::init();
        for reference in [0, 77, TOTAL_RANGE - 1] {
            let next = (reference + 1) & (TOTAL_RANGE - 1);
            let prev = (reference + TOTAL_RANGE - 1) & (TOTAL_RANGE - 1);
            // Only the reference itself and newer candidates qualify
            assert!(is_recent_enough(reference, reference, 1));
            assert!(is_recent_enough(next, reference, 1));
            assert!(!is_recent_enough(prev, reference, 1));
        }
    }

    #[test]
    pub fn test_is_recent_enough_wraps_around() {
        crate::tests::init();
        // max_age 2 at reference 0: 0 and 16777215 are recent, 16777214 is not
        assert!(is_recent_enough(0, 0, 2));
        assert!(is_recent_enough(TOTAL_RANGE - 1, 0, 2));
        assert!(!is_recent_enough(TOTAL_RANGE - 2, 0, 2));
    }

    #[test]
    pub fn test_cmp_block_nr_respects_wrap_around() {
        crate::tests::init();
        let mut block_nrs = vec![1, TOTAL_RANGE - 1, 0, 2];
        block_nrs.sort_by(|a, b| cmp_block_nr(*a, *b));
        assert_eq!(block_nrs, vec![TOTAL_RANGE - 1, 0, 1, 2]);
    }
}
