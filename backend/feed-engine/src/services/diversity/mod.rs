use crate::models::ScoredCandidate;
use std::collections::HashSet;

/// Minimum number of shared top tags that makes two items near-duplicates
const NEAR_DUPLICATE_SHARED_TAGS: usize = 2;

/// Number of steps `diversity_factor` is resolved to
const FACTOR_STEPS: u32 = 10;

/// Diversity Layer - greedy re-rank over the profile's top tags
///
/// Each pick maximizes `score - penalty`, where the penalty grows with the
/// number of already-picked items sharing at least two top tags with the
/// candidate. The penalty unit is the input's score span plus one, so at
/// `diversity_factor = 1.0` any non-duplicate beats any duplicate.
///
/// The factor is applied in tenths. Each step re-ranks the previous step's
/// output and may only pick a candidate that keeps every prefix covering at
/// least the top tags the same prefix covered one step earlier, so a higher
/// factor never shows fewer distinct top tags in the first K results.
pub struct DiversityLayer {
    diversity_factor: f64, // 0.0 = relevance only, 1.0 = maximal spread
}

struct Entry {
    candidate: ScoredCandidate,
    /// Position in the relevance order
    rank: usize,
    /// Candidate tags that are also profile top tags
    top_tags: HashSet<String>,
}

impl DiversityLayer {
    pub fn new(diversity_factor: f64) -> Self {
        Self {
            diversity_factor: if diversity_factor.is_finite() {
                diversity_factor.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Re-rank candidates already sorted by score descending.
    pub fn rerank(&self, scored: Vec<ScoredCandidate>, top_tags: &[String]) -> Vec<ScoredCandidate> {
        if self.diversity_factor == 0.0 || top_tags.len() < NEAR_DUPLICATE_SHARED_TAGS {
            return scored;
        }

        let (min, max) = scored.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
            (lo.min(s.score), hi.max(s.score))
        });
        let unit = if scored.is_empty() { 1.0 } else { max - min + 1.0 };

        let top: HashSet<&str> = top_tags.iter().map(String::as_str).collect();
        let mut order: Vec<Entry> = scored
            .into_iter()
            .enumerate()
            .map(|(rank, candidate)| {
                let top_tags = candidate
                    .item
                    .tags
                    .iter()
                    .filter(|t| top.contains(t.as_str()))
                    .cloned()
                    .collect();
                Entry {
                    candidate,
                    rank,
                    top_tags,
                }
            })
            .collect();

        let steps = (self.diversity_factor * FACTOR_STEPS as f64).ceil() as u32;
        for step in 1..=steps.min(FACTOR_STEPS) {
            let weight = unit * step as f64 / FACTOR_STEPS as f64;
            order = Self::greedy_pass(order, weight);
        }

        order.into_iter().map(|entry| entry.candidate).collect()
    }

    fn greedy_pass(previous: Vec<Entry>, weight: f64) -> Vec<Entry> {
        // top tags covered by each prefix of the previous order
        let mut floors: Vec<HashSet<String>> = Vec::with_capacity(previous.len());
        let mut covered: HashSet<String> = HashSet::new();
        for entry in &previous {
            covered.extend(entry.top_tags.iter().cloned());
            floors.push(covered.clone());
        }

        let mut remaining = previous;
        remaining.sort_by_key(|entry| entry.rank);

        let mut covered: HashSet<String> = HashSet::new();
        let mut selected: Vec<Entry> = Vec::with_capacity(remaining.len());

        for floor in &floors {
            let mut best: Option<(usize, f64, f64)> = None;

            for (i, entry) in remaining.iter().enumerate() {
                let keeps_floor = floor
                    .iter()
                    .all(|t| covered.contains(t) || entry.top_tags.contains(t));
                if !keeps_floor {
                    continue;
                }

                let duplicates = selected
                    .iter()
                    .filter(|p| {
                        p.top_tags.intersection(&entry.top_tags).count() >= NEAR_DUPLICATE_SHARED_TAGS
                    })
                    .count();
                let penalty = weight * duplicates as f64;
                let adjusted = entry.candidate.score - penalty;

                // strict comparison keeps the more relevant candidate on ties
                if best.map_or(true, |(_, best_adjusted, _)| adjusted > best_adjusted) {
                    best = Some((i, adjusted, penalty));
                }
            }

            // the previous order's item at this position always keeps the floor
            let Some((idx, _, penalty)) = best else {
                break;
            };
            let mut entry = remaining.remove(idx);
            entry.candidate.diversity_penalty = penalty;
            covered.extend(entry.top_tags.iter().cloned());
            selected.push(entry);
        }

        selected.extend(remaining);
        selected
    }
}
