use crate::models::rating::Rating;

/// A mean together with the sample count it was computed over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingAggregate {
    pub avg: f64,
    pub count: usize,
}

/// Mean of a complete ratings list, 0 when the list is empty. Used on bulk
/// ingestion and bulk replacement, where folding samples in one at a time
/// would accumulate floating-point drift.
pub fn full_average(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.stars)).sum();
    f64::from(sum) / ratings.len() as f64
}

/// Folds exactly one new sample into a previously computed mean without
/// rescanning the list.
pub fn incremental_average(prev_avg: f64, prev_count: usize, new_stars: u8) -> RatingAggregate {
    let count = prev_count + 1;
    let avg = (prev_avg * prev_count as f64 + f64::from(new_stars)) / count as f64;
    RatingAggregate { avg, count }
}
