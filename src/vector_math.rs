/// Cosine similarity in `[-1, 1]`.
///
/// Empty, length-mismatched or zero-norm inputs score `0.0`.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    if query.is_empty() || query.len() != candidate.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut query_norm = 0.0f64;
    let mut candidate_norm = 0.0f64;
    for (q, c) in query.iter().zip(candidate.iter()) {
        let (q, c) = (*q as f64, *c as f64);
        dot += q * c;
        query_norm += q * q;
        candidate_norm += c * c;
    }

    let denom = query_norm.sqrt() * candidate_norm.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }

    let score = dot / denom;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(-1.0, 1.0) as f32
}

/// Stable descending sort on an `f32` key. NaN keys sort last.
pub fn sort_descending<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> f32,
{
    let normalized = |item: &T| -> f32 {
        let value = key(item);
        if value.is_nan() {
            f32::NEG_INFINITY
        } else if value == 0.0 {
            0.0
        } else {
            value
        }
    };
    items.sort_by(|left, right| normalized(right).total_cmp(&normalized(left)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let vec = vec![1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&vec, &vec), 1.0));

        let tiny = vec![1e-20, 3e-20];
        assert!(approx_eq(cosine_similarity(&tiny, &tiny), 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
    }

    #[test]
    fn cosine_is_minus_one_for_opposite_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, -2.0], &[-1.0, 2.0]), -1.0));
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn empty_or_mismatched_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let vectors = [
            vec![0.3, -0.7, 2.5],
            vec![1e30, 1e30, -1e30],
            vec![-4.0, 0.0, 0.01],
            vec![0.1, 0.1, 0.1],
        ];
        for a in &vectors {
            for b in &vectors {
                let score = cosine_similarity(a, b);
                assert!((-1.0..=1.0).contains(&score), "{} out of range", score);
            }
        }
    }

    fn rank(query: &[f32], candidates: &[Vec<f32>]) -> Vec<(usize, f32)> {
        let mut scores: Vec<(usize, f32)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| (idx, cosine_similarity(query, candidate)))
            .collect();
        sort_descending(&mut scores, |(_, score)| *score);
        scores
    }

    #[test]
    fn ranking_returns_highest_similarity_first() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![0.8, 0.2], vec![0.1, 0.9], vec![0.9, 0.0]];
        let ranked = rank(&query, &candidates);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 2);
        assert_eq!(ranked[2].0, 1);
    }

    #[test]
    fn ranking_keeps_input_order_on_ties() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]];
        let ranked = rank(&query, &candidates);

        assert_eq!(ranked.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn nan_keys_do_not_panic() {
        let mut items = vec![1.0f32, f32::NAN, 3.0];
        sort_descending(&mut items, |v| *v);
        assert_eq!(items[0], 3.0);
        assert_eq!(items[1], 1.0);
        assert!(items[2].is_nan());
    }
}
