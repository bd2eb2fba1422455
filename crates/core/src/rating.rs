//! Title rating aggregation.
//!
//! A title's rating is the arithmetic mean of its review scores rounded half
//! up to the nearest integer, or `None` when the title has no reviews. It is
//! never stored; the repository layer returns `SUM(score)` and `COUNT(*)`
//! with every title read and the API calls [`rating_from_totals`].

/// Rating from aggregated totals.
///
/// Uses exact integer arithmetic: `round_half_up(sum / count)` equals
/// `floor((2 * sum + count) / (2 * count))` for non-negative sums.
pub fn rating_from_totals(score_sum: i64, review_count: i64) -> Option<i32> {
    if review_count <= 0 {
        return None;
    }
    let rounded = (2 * score_sum + review_count).div_euclid(2 * review_count);
    i32::try_from(rounded).ok()
}

/// Rating from the individual scores of a title's reviews.
pub fn average_score(scores: &[i16]) -> Option<i32> {
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    rating_from_totals(sum, scores.len() as i64)
}
