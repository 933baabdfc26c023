//! Normalized edit-distance similarity.
//!
//! `similarity(a, b) = 1 - levenshtein(a, b) / max(len(a), len(b))`, computed
//! over lowercased characters. Inputs longer than [`FULL_MATRIX_MAX_LEN`]
//! characters use a two-row dynamic program so memory stays proportional to
//! the shorter string. Both paths produce the same distance.

/// Longest input (in characters) scored with the full matrix.
pub const FULL_MATRIX_MAX_LEN: usize = 100;

/// Case-insensitive similarity score in `[0, 1]`.
///
/// Two empty strings score `1.0`; exactly one empty string scores `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = if a.len() > FULL_MATRIX_MAX_LEN || b.len() > FULL_MATRIX_MAX_LEN {
        distance_two_row(&a, &b)
    } else {
        distance_full_matrix(&a, &b)
    };

    score(distance, a.len().max(b.len()))
}

fn score(distance: usize, max_len: usize) -> f64 {
    1.0 - distance as f64 / max_len as f64
}

/// Levenshtein distance using the full `(len(a)+1) x (len(b)+1)` matrix.
pub fn distance_full_matrix(a: &[char], b: &[char]) -> usize {
    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a.len()][b.len()]
}

/// Levenshtein distance keeping only two rows sized to the shorter input.
pub fn distance_two_row(a: &[char], b: &[char]) -> usize {
    // Distance is symmetric, so iterate the longer string in the outer loop.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev: Vec<usize> = (0..=inner.len()).collect();
    let mut curr = vec![0usize; inner.len() + 1];

    for i in 1..=outer.len() {
        curr[0] = i;
        for j in 1..=inner.len() {
            let cost = usize::from(outer[i - 1] != inner[j - 1]);
            curr[j] = (curr[j - 1] + 1)
                .min(prev[j] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(similarity("longsword", "longsword"), 1.0);
        assert_eq!(similarity("Longsword", "LONGSWORD"), 1.0);
    }

    #[test]
    fn test_empty_edge_cases() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "x"), 0.0);
        assert_eq!(similarity("arrows", ""), 0.0);
    }

    #[test]
    fn test_single_substitution() {
        // one edit over five characters
        let score = similarity("sword", "sward");
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_completely_different() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(distance_full_matrix(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(distance_two_row(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(distance_full_matrix(&chars("flaw"), &chars("lawn")), 2);
        assert_eq!(distance_two_row(&chars("lawn"), &chars("flaw")), 2);
    }

    #[test]
    fn test_long_inputs_take_two_row_path() {
        let a = "a".repeat(150);
        let mut b = "a".repeat(149);
        b.push('b');
        let expected = 1.0 - 1.0 / 150.0;
        assert!((similarity(&a, &b) - expected).abs() < 1e-12);
        assert_eq!(
            distance_full_matrix(&chars(&a), &chars(&b)),
            distance_two_row(&chars(&a), &chars(&b))
        );
    }

    #[test]
    fn test_mixed_lengths_around_threshold() {
        let short = "potion of healing";
        let long = format!("{} {}", short, "x".repeat(120));
        let full = distance_full_matrix(&chars(short), &chars(&long));
        let two_row = distance_two_row(&chars(short), &chars(&long));
        assert_eq!(full, two_row);
        assert_eq!(full, 121);
    }
}
