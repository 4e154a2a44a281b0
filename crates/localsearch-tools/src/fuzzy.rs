//! Partial-ratio fuzzy scoring for file names.

/// Case-insensitive partial ratio in `[0, 100]`.
///
/// The shorter string is aligned against every equally long window of the
/// longer one; each window is scored by its longest common subsequence with
/// the shorter string and the best window wins. Empty input scores 0.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let mut best = 0;
    for window in long.windows(short.len()) {
        let common = lcs_len(&short, window);
        if common > best {
            best = common;
            if best == short.len() {
                break;
            }
        }
    }

    (best as f64 * 100.0 / short.len() as f64).round()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0_usize; b.len() + 1];
    let mut curr = vec![0_usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_substring_scores_full() {
        assert_eq!(partial_ratio("readme", "README.md"), 100.0);
        assert_eq!(partial_ratio("main", "src_main_rs"), 100.0);
    }

    #[test]
    fn test_case_insensitive_and_symmetric() {
        assert_eq!(
            partial_ratio("ReadMe", "readme.MD"),
            partial_ratio("readme", "README.md")
        );
        assert_eq!(
            partial_ratio("config", "app_config.toml"),
            partial_ratio("app_config.toml", "config")
        );
    }

    #[test]
    fn test_inserting_far_characters_does_not_lower_score() {
        let base = partial_ratio("readme", "read_me.txt");
        let padded = partial_ratio("readme", "read_me.txt.backup.zzz");
        assert!(padded >= base);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        assert!(partial_ratio("readme", "other.txt") <= 50.0);
        assert!(partial_ratio("readme", "read_me_old.txt") > 50.0);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(partial_ratio("", "anything"), 0.0);
        assert_eq!(partial_ratio("x", ""), 0.0);
    }
}
