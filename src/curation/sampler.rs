//! Selection sampler: uniform downsampling of an oversized match set.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Track;

/// Reduce `candidates` to exactly `target` elements, each candidate having
/// equal inclusion probability: Fisher–Yates shuffle of the whole list,
/// then take the first `target`. Lists at or under the target come back
/// untouched.
///
/// The RNG is injected so tests can seed it; production callers pass a
/// per-engine `StdRng`.
pub fn sample<R: Rng + ?Sized>(mut candidates: Vec<Track>, target: usize, rng: &mut R) -> Vec<Track> {
    if candidates.len() <= target {
        return candidates;
    }
    candidates.shuffle(rng);
    candidates.truncate(target);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(format!("t{}", i), format!("Track {}", i), "A"))
            .collect()
    }

    #[test]
    fn test_undersized_list_is_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = sample(tracks(3), 5, &mut rng);
        let ids: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn test_exact_target_size_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(2);
        let result = sample(tracks(10), 4, &mut rng);
        assert_eq!(result.len(), 4);

        let mut ids: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let a = sample(tracks(10), 3, &mut StdRng::seed_from_u64(7));
        let b = sample(tracks(10), 3, &mut StdRng::seed_from_u64(7));
        let ids = |v: &[Track]| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_inclusion_probability_is_roughly_uniform() {
        // 10 candidates, keep 3 → expected inclusion K/N = 0.3 per track.
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 6000;
        let mut counts: HashMap<String, u32> = HashMap::new();

        for _ in 0..trials {
            for t in sample(tracks(10), 3, &mut rng) {
                *counts.entry(t.id).or_insert(0) += 1;
            }
        }

        let expected = trials as f64 * 0.3;
        for i in 0..10 {
            let count = *counts.get(&format!("t{}", i)).unwrap_or(&0) as f64;
            // Generous tolerance; ~7+ standard deviations at these counts.
            assert!(
                (count - expected).abs() < expected * 0.15,
                "track t{} included {} times, expected ~{}",
                i,
                count,
                expected
            );
        }
    }
}
