use crate::domain::{
    MarginGrouping, NumericWarning, OptimizerConfig, Platform, RankedEntry,
    Solution, SolveStats, round_cents,
};
use tracing::warn;

/// Registry indices ordered by descending royalty; ties keep registry order.
pub fn royalty_order(royalties: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..royalties.len()).collect();
    order.sort_by(|&a, &b| royalties[b].total_cmp(&royalties[a]));
    order
}

/// 1-based rank of each platform, in registry order.
pub fn ranks(royalties: &[f64]) -> Vec<usize> {
    let mut ranking = vec![0; royalties.len()];
    for (position, index) in royalty_order(royalties).into_iter().enumerate() {
        ranking[index] = position + 1;
    }
    ranking
}

/// Package a feasible price vector.
///
/// Prices and royalties stay unrounded in `prices`/`royalties`; only the
/// presentation rows in `entries` are rounded to cents.
pub fn build_solution(
    platforms: &[Platform],
    grouping: &MarginGrouping,
    config: &OptimizerConfig,
    prices: Vec<f64>,
    stats: SolveStats,
) -> Solution {
    let royalties: Vec<f64> = platforms
        .iter()
        .zip(&prices)
        .map(|(p, &price)| p.royalty(price))
        .collect();
    let order = royalty_order(&royalties);
    let ranking = ranks(&royalties);

    let entries = order
        .iter()
        .map(|&index| {
            let platform = &platforms[index];
            RankedEntry {
                index,
                name: platform.name.clone(),
                margin: platform.margin,
                min_price: platform.min_price(),
                max_price: platform.max_price(),
                price: round_cents(prices[index]),
                royalty: round_cents(royalties[index]),
                rank: ranking[index],
            }
        })
        .collect();

    let warnings = collect_warnings(platforms, grouping, config, &prices);
    for warning in &warnings {
        warn!(?warning, "numeric warning");
    }

    Solution {
        total_royalty: royalties.iter().sum(),
        prices,
        royalties,
        ranking,
        entries,
        feasible: true,
        diagnostic: None,
        warnings,
        stats,
    }
}

/// Tier gaps that hold but sit under the comfortable threshold.
///
/// Only called on prices that already meet every rule, so a broken rule is
/// never a warning.
pub fn collect_warnings(
    platforms: &[Platform],
    grouping: &MarginGrouping,
    config: &OptimizerConfig,
    prices: &[f64],
) -> Vec<NumericWarning> {
    grouping
        .adjacent_tiers()
        .filter_map(|(higher_margin, lower_margin)| {
            let hi = grouping.representative(higher_margin)?;
            let lo = grouping.representative(lower_margin)?;
            let gap = platforms[hi].royalty(prices[hi]) - platforms[lo].royalty(prices[lo]);
            (gap > 0.0 && gap < config.comfortable_royalty_diff).then_some(
                NumericWarning::NarrowSeparation {
                    higher_margin,
                    lower_margin,
                    gap,
                    threshold: config.comfortable_royalty_diff,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectiveStrategy;

    #[test]
    fn ties_keep_registry_order() {
        let royalties = [5.0, 7.5, 5.0, 9.0];
        assert_eq!(royalty_order(&royalties), vec![3, 1, 0, 2]);
        assert_eq!(ranks(&royalties), vec![3, 2, 4, 1]);
    }

    #[test]
    fn entries_are_sorted_and_rounded() {
        let platforms = vec![
            Platform::new("Low", 0.35, 10.0, 40.0),
            Platform::new("High", 0.87, 10.0, 25.0),
        ];
        let grouping = MarginGrouping::from_margins(&[0.35, 0.87]);
        let config = OptimizerConfig::default();
        let solution = build_solution(
            &platforms,
            &grouping,
            &config,
            vec![40.0, 24.996],
            SolveStats::default(),
        );

        assert!(solution.feasible);
        assert_eq!(solution.ranking, vec![2, 1]);
        assert_eq!(solution.entries[0].name, "High");
        assert_eq!(solution.entries[0].price, 25.0);
        assert_eq!(solution.entries[0].royalty, 21.75);
        // internal values are not rounded
        assert_eq!(solution.prices[1], 24.996);
        assert!((solution.total_royalty - (14.0 + 0.87 * 24.996)).abs() < 1e-12);
    }

    #[test]
    fn narrow_gap_is_flagged() {
        let platforms = vec![
            Platform::new("A", 0.8, 10.0, 30.0),
            Platform::new("B", 0.4, 10.0, 60.0),
        ];
        let grouping = MarginGrouping::from_margins(&[0.8, 0.4]);
        let config = OptimizerConfig::default();
        // gap = 24 - 23.4 = 0.6
        let warnings = collect_warnings(&platforms, &grouping, &config, &[30.0, 58.5]);
        assert!(matches!(
            warnings.as_slice(),
            [NumericWarning::NarrowSeparation { .. }]
        ));
    }

    #[test]
    fn comfortable_gaps_are_quiet_in_both_modes() {
        let platforms = vec![
            Platform::new("A", 0.8, 10.0, 30.0),
            Platform::new("B", 0.4, 10.0, 60.0),
        ];
        let grouping = MarginGrouping::from_margins(&[0.8, 0.4]);
        // gap = 24 - 20 = 4
        for mode in [ObjectiveStrategy::HardConstraint, ObjectiveStrategy::PenaltyAugmented] {
            let config = OptimizerConfig::default().with_mode(mode);
            assert!(collect_warnings(&platforms, &grouping, &config, &[30.0, 50.0]).is_empty());
        }
    }
}
