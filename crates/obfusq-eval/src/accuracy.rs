//! Semantic accuracy between two outcome histograms.

use obfusq_hal::Counts;

/// Percentage of the original histogram reproduced by the obfuscated one.
///
/// Each outcome contributes the smaller of its two counts, so the score is
/// `100 × Σ min(o, b) / Σ o`. An empty original histogram scores 0.
pub fn semantic_accuracy(original: &Counts, obfuscated: &Counts) -> f64 {
    let total = original.total_shots();
    if total == 0 {
        return 0.0;
    }

    let shared: u64 = original
        .iter()
        .map(|(bitstring, &count)| count.min(obfuscated.get(bitstring)))
        .sum();

    100.0 * shared as f64 / total as f64
}
