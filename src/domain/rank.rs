//! Cross-sectional ranking, composite scoring, and top/bottom-N selection.

/// Direction of a factor rank: Ascending gives rank 1 to the smallest value
/// (cheap P/B is good), Descending gives rank 1 to the largest (high ROIC is
/// good).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Ascending,
    Descending,
}

/// Which end of the composite score a strategy buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectBest {
    Lowest,
    Highest,
}

/// Ordinal ranks (1..=k) over the masked universe. Securities outside the
/// mask, or with NaN scores, receive NaN. Ties break by original universe
/// order (stable sort).
pub fn rank(scores: &[f64], mask: &[bool], order: RankOrder) -> Vec<f64> {
    debug_assert_eq!(scores.len(), mask.len());

    let mut eligible: Vec<usize> = (0..scores.len())
        .filter(|&i| mask[i] && !scores[i].is_nan())
        .collect();

    eligible.sort_by(|&a, &b| {
        let ord = scores[a].partial_cmp(&scores[b]).unwrap_or(std::cmp::Ordering::Equal);
        match order {
            RankOrder::Ascending => ord,
            RankOrder::Descending => ord.reverse(),
        }
    });

    let mut ranks = vec![f64::NAN; scores.len()];
    for (position, &i) in eligible.iter().enumerate() {
        ranks[i] = (position + 1) as f64;
    }
    ranks
}

/// One weighted column of a composite score.
#[derive(Debug, Clone)]
pub struct Component<'a> {
    pub weight: f64,
    pub values: &'a [f64],
}

/// Fixed linear combination of score columns. NaN in any component makes the
/// composite NaN for that security.
pub fn composite(components: &[Component<'_>]) -> Vec<f64> {
    let n = components.first().map(|c| c.values.len()).unwrap_or(0);
    (0..n)
        .map(|i| {
            components
                .iter()
                .map(|c| c.weight * c.values[i])
                .sum::<f64>()
        })
        .collect()
}

/// Indices of the `n` best securities by composite score within the mask.
/// NaN scores are never selected; fewer than `n` eligible securities give a
/// shorter selection, never padding. Ties break by universe order.
pub fn select(scores: &[f64], mask: &[bool], n: usize, best: SelectBest) -> Vec<usize> {
    debug_assert_eq!(scores.len(), mask.len());

    let mut eligible: Vec<usize> = (0..scores.len())
        .filter(|&i| mask[i] && !scores[i].is_nan())
        .collect();

    eligible.sort_by(|&a, &b| {
        let ord = scores[a].partial_cmp(&scores[b]).unwrap_or(std::cmp::Ordering::Equal);
        match best {
            SelectBest::Lowest => ord,
            SelectBest::Highest => ord.reverse(),
        }
    });

    eligible.truncate(n);
    eligible
}
