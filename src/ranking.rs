// =============================================================================
// Ranking — hot / sell selection
// =============================================================================

use crate::types::Mover;

/// Sort movers by percentage change, highest first.
///
/// The sort is stable: equal changes keep their snapshot order.
pub fn sort_descending(movers: &mut [Mover]) {
    movers.sort_by(|a, b| b.change_pct.total_cmp(&a.change_pct));
}

/// Split a descending-sorted sequence into the first `n` (hot) and the last
/// `n` (sell), both in sorted order.  With fewer than `2n` movers the two
/// lists overlap.
pub fn top_and_bottom(sorted: &[Mover], n: usize) -> (Vec<Mover>, Vec<Mover>) {
    let hot = sorted.iter().take(n).cloned().collect();
    let sell = sorted[sorted.len().saturating_sub(n)..].to_vec();
    (hot, sell)
}
