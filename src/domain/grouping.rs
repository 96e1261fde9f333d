use indexmap::IndexMap;

/// Platforms partitioned into margin tiers.
///
/// Margins are keyed by their bit pattern, so two margins share a tier only when
/// they are exactly equal. Callers round margins before building a catalog.
#[derive(Clone, Debug)]
pub struct MarginGrouping {
    unique_margins: Vec<f64>,
    groups: IndexMap<u64, Vec<usize>>,
}

impl MarginGrouping {
    pub fn from_margins(margins: &[f64]) -> Self {
        let mut groups: IndexMap<u64, Vec<usize>> = IndexMap::new();
        for (index, &margin) in margins.iter().enumerate() {
            groups.entry(margin.to_bits()).or_default().push(index);
        }

        let mut unique_margins: Vec<f64> = groups.keys().map(|&bits| f64::from_bits(bits)).collect();
        unique_margins.sort_by(|a, b| b.total_cmp(a));

        Self {
            unique_margins,
            groups,
        }
    }

    /// Distinct margins, strictly descending.
    pub fn unique_margins(&self) -> &[f64] {
        &self.unique_margins
    }

    pub fn num_tiers(&self) -> usize {
        self.unique_margins.len()
    }

    /// Members of the tier with exactly this margin, in registry order.
    pub fn members(&self, margin: f64) -> &[usize] {
        self.groups
            .get(&margin.to_bits())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First registry member of the tier.
    pub fn representative(&self, margin: f64) -> Option<usize> {
        self.members(margin).first().copied()
    }

    /// Tiers from highest to lowest margin.
    pub fn tiers(&self) -> impl Iterator<Item = (f64, &[usize])> + '_ {
        self.unique_margins.iter().map(|&m| (m, self.members(m)))
    }

    /// Pairs of margin-adjacent tiers as (higher, lower).
    pub fn adjacent_tiers(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.unique_margins.windows(2).map(|w| (w[0], w[1]))
    }
}
