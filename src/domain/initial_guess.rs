use super::grouping::MarginGrouping;
use super::types::Platform;

/// Relative position of the lowest and highest margin tier inside their ranges.
pub const LOW_TIER_POSITION: f64 = 0.6;
pub const HIGH_TIER_POSITION: f64 = 0.9;
/// Downward offset per member rank inside a shared tier.
pub const MEMBER_OFFSET: f64 = 0.05;

/// Normalized position of a tier, highest margin first.
pub fn tier_position(tier_rank: usize, num_tiers: usize) -> f64 {
    if num_tiers <= 1 {
        return HIGH_TIER_POSITION;
    }
    let span = HIGH_TIER_POSITION - LOW_TIER_POSITION;
    HIGH_TIER_POSITION - span * tier_rank as f64 / (num_tiers - 1) as f64
}

/// Seed prices that already lean toward the tier ordering.
///
/// Members sharing a tier are staggered by [`MEMBER_OFFSET`] so the solver does
/// not start on a symmetric tie.
pub fn synthesize_initial_guess(platforms: &[Platform], grouping: &MarginGrouping) -> Vec<f64> {
    let mut guess = vec![0.0; platforms.len()];
    let num_tiers = grouping.num_tiers();

    for (tier_rank, (_, members)) in grouping.tiers().enumerate() {
        let base = tier_position(tier_rank, num_tiers);
        for (member_rank, &index) in members.iter().enumerate() {
            let position = if members.len() > 1 {
                (base - MEMBER_OFFSET * member_rank as f64).clamp(0.0, 1.0)
            } else {
                base
            };
            let (min, max) = platforms[index].bounds;
            guess[index] = min + position * (max - min);
        }
    }

    guess
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouping_of(platforms: &[Platform]) -> MarginGrouping {
        let margins: Vec<f64> = platforms.iter().map(|p| p.margin).collect();
        MarginGrouping::from_margins(&margins)
    }

    #[test]
    fn positions_span_high_to_low() {
        assert_eq!(tier_position(0, 1), HIGH_TIER_POSITION);
        assert!((tier_position(0, 3) - 0.9).abs() < 1e-12);
        assert!((tier_position(1, 3) - 0.75).abs() < 1e-12);
        assert!((tier_position(2, 3) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn higher_margin_starts_higher_in_its_range() {
        let platforms = vec![
            Platform::new("low", 0.4, 10.0, 30.0),
            Platform::new("high", 0.8, 10.0, 30.0),
        ];
        let guess = synthesize_initial_guess(&platforms, &grouping_of(&platforms));
        assert!((guess[1] - 28.0).abs() < 1e-12);
        assert!((guess[0] - 22.0).abs() < 1e-12);
    }

    #[test]
    fn shared_tier_members_are_staggered() {
        let platforms = vec![
            Platform::new("a", 0.7, 10.0, 28.0),
            Platform::new("b", 0.7, 10.0, 28.0),
            Platform::new("c", 0.7, 10.0, 28.0),
        ];
        let guess = synthesize_initial_guess(&platforms, &grouping_of(&platforms));
        assert!((guess[0] - (10.0 + 0.90 * 18.0)).abs() < 1e-9);
        assert!((guess[1] - (10.0 + 0.85 * 18.0)).abs() < 1e-9);
        assert!((guess[2] - (10.0 + 0.80 * 18.0)).abs() < 1e-9);
    }

    #[test]
    fn seeds_stay_inside_bounds_for_large_tiers() {
        let platforms: Vec<Platform> = (0..30)
            .map(|i| Platform::new(format!("p{i}"), 0.5, 5.0, 15.0))
            .collect();
        let guess = synthesize_initial_guess(&platforms, &grouping_of(&platforms));
        assert!(guess.iter().all(|&p| (5.0..=15.0).contains(&p)));
        assert_eq!(guess[29], 5.0);
    }
}
