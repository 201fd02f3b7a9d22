//! Ratcliff-Obershelp string similarity.
//!
//! The ratio is `2 * M / (|a| + |b|)` where `M` counts the characters in the
//! matching blocks found by taking the longest common substring, then
//! recursing into the unmatched text on its left and right. When several
//! longest blocks exist, the one starting earliest in `a` (then in `b`) is
//! taken, so the result is fully deterministic.

/// Similarity in `[0, 1]`; two empty strings are identical (1.0).
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`.
pub fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common block inside `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(start_in_a, start_in_b, size)`; size 0 means no common char.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    let width = bhi - blo;
    // run[k] = length of the common suffix ending at a[i], b[blo + k]
    let mut prev = vec![0usize; width + 1];
    let mut current = vec![0usize; width + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo + 1;
            if a[i] == b[j] {
                current[k] = prev[k - 1] + 1;
                if current[k] > best_size {
                    best_size = current[k];
                    best_i = i + 1 - best_size;
                    best_j = j + 1 - best_size;
                }
            } else {
                current[k] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut current);
    }
    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        assert!(close(ratio("email", "email"), 1.0));
        assert!(close(ratio("", ""), 1.0));
    }

    #[test]
    fn disjoint_or_empty_scores_zero() {
        assert!(close(ratio("abc", "xyz"), 0.0));
        assert!(close(ratio("", "email"), 0.0));
    }

    #[test]
    fn matches_reference_ratios() {
        // Values produced by the classic difflib SequenceMatcher.
        assert!(close(ratio("abcd", "bcda"), 0.75));
        assert!(close(ratio("purchasedate", "orderdate"), 12.0 / 21.0));
        assert!(close(ratio("referrerurl", "referrer"), 16.0 / 19.0));
        assert!(close(ratio("utmsrc", "utmsource"), 0.8));
        assert!(close(ratio("total", "tax"), 0.5));
    }

    #[test]
    fn recursion_counts_blocks_on_both_sides() {
        // "ab" + "cd" around a differing middle.
        assert_eq!(
            matching_characters(
                &"abXcd".chars().collect::<Vec<_>>(),
                &"abYcd".chars().collect::<Vec<_>>()
            ),
            4
        );
    }
}
