use super::report::{DiagnosisReport, round_one_decimal};

/// Smallest rating gap (either direction) worth calling out.
pub const RATING_GAP_THRESHOLD: f64 = 0.2;
/// Review counts below this trigger the review-acquisition line.
pub const LOW_REVIEW_THRESHOLD: u32 = 20;

pub const FALLBACK_HOOK: &str =
    "Your first-look report is ready; here is how you compare with competitors nearby.";

/// One-sentence summary of the most salient competitive gap. First matching
/// rule wins: rating gap to the top competitor, then a low review count,
/// then a generic line.
pub fn derive_hook(report: &DiagnosisReport) -> String {
    let primary = &report.primary;

    if let Some(own) = primary.rating
        && let Some(top) = report.competitors.first()
        && let Some(theirs) = top.rating
    {
        let diff = round_one_decimal(theirs - own);
        if diff.abs() >= RATING_GAP_THRESHOLD {
            let direction = if diff > 0.0 { "higher" } else { "lower" };
            return format!(
                "Nearby competitor \"{}\" is rated {:.1} points {} than you; now is the time to put an improvement plan in place.",
                top.name,
                diff.abs(),
                direction
            );
        }
    }

    if let Some(count) = primary.review_count
        && count < LOW_REVIEW_THRESHOLD
    {
        return format!(
            "You only have {count} reviews so far; the way to pull ahead is collecting good reviews faster and replying to every one of them."
        );
    }

    FALLBACK_HOOK.to_string()
}
