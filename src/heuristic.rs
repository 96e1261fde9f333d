use crate::domain::{Platform, round_cents};

/// Greedy tier walk: visit platforms by descending margin, price the first at
/// its maximum and every later one so its royalty sits `min_royalty_diff`
/// below the previous platform's, clamped to its bounds. The royalty carried
/// forward is the cent-rounded one a seller would read off a price sheet.
///
/// The walk is deterministic and needs no solver, but it treats platforms
/// sharing a margin as a staircase and ignores the spread rule, so the result
/// can still violate the full constraint set.
pub fn greedy_separation(platforms: &[Platform], min_royalty_diff: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..platforms.len()).collect();
    order.sort_by(|&a, &b| platforms[b].margin.total_cmp(&platforms[a].margin));

    let mut prices = vec![0.0; platforms.len()];
    let mut previous_royalty: Option<f64> = None;

    for index in order {
        let platform = &platforms[index];
        let (min, max) = platform.bounds;
        let price = match previous_royalty {
            None => max,
            Some(royalty) => ((royalty - min_royalty_diff) / platform.margin).min(max),
        }
        .max(min);

        prices[index] = price;
        previous_royalty = Some(round_cents(platform.royalty(price)));
    }

    prices
}
