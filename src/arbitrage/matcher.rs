use std::collections::HashMap;
use tracing::debug;

use crate::types::{Event, MatchedPair};

/// Similarity between two titles in [0.0, 1.0], computed as 2*M/T over the
/// lower-cased character sequences, where M is the total size of the matching
/// blocks found by recursively taking the longest common block and T is the
/// combined length. Character-alignment based, not token or edit distance.
pub fn title_similarity(title_a: &str, title_b: &str) -> f64 {
    let a: Vec<char> = title_a.to_lowercase().chars().collect();
    let b: Vec<char> = title_b.to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b_positions.entry(c).or_default().push(j);
    }

    let mut matched = 0usize;
    let mut regions = vec![(0usize, a.len(), 0usize, b.len())];

    while let Some((alo, ahi, blo, bhi)) = regions.pop() {
        let (i, j, size) = longest_block(a, &b_positions, alo, ahi, blo, bhi);
        if size > 0 {
            matched += size;
            regions.push((alo, i, blo, j));
            regions.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest contiguous matching block within `a[alo..ahi]` and `b[blo..bhi]`.
/// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
fn longest_block(
    a: &[char],
    b_positions: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best_i = alo;
    let mut best_j = blo;
    let mut best_size = 0usize;

    // run_lengths[j] = length of the matching run ending at (i, j)
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut new_runs: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_positions.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let len = if j > blo {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_runs.insert(j, len);
                if len > best_size {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_size = len;
                }
            }
        }
        run_lengths = new_runs;
    }

    (best_i, best_j, best_size)
}

/// Pair events across two sources by resolution-date proximity and title
/// similarity. Greedy: each source event takes the highest-scoring target at
/// or above the threshold, ties going to the first target seen. A target may
/// be claimed by more than one source event; no global optimum is attempted.
pub fn match_events(
    source_events: &[Event],
    target_events: &[Event],
    similarity_threshold: f64,
    date_tolerance_days: i64,
) -> Vec<MatchedPair> {
    let max_diff_seconds = date_tolerance_days * 24 * 60 * 60;
    let mut pairs = Vec::new();

    for source in source_events {
        let mut best_match: Option<&Event> = None;
        let mut best_similarity = 0.0_f64;

        for target in target_events {
            let date_diff_seconds = (source.end_date - target.end_date).num_seconds().abs();
            if date_diff_seconds > max_diff_seconds {
                continue;
            }

            let similarity = title_similarity(&source.title, &target.title);
            if similarity >= similarity_threshold && similarity > best_similarity {
                best_match = Some(target);
                best_similarity = similarity;
            }
        }

        if let Some(target) = best_match {
            debug!(
                "Matched '{}' <-> '{}' (similarity {:.3})",
                source.title, target.title, best_similarity
            );
            pairs.push(MatchedPair {
                source: source.clone(),
                target: target.clone(),
            });
        }
    }

    pairs
}
