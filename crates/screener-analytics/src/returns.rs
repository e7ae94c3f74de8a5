use screener_core::{PriceBar, ReturnPoint};

/// Groups bars by symbol in first-seen order, each group sorted by date
/// ascending. The provider may interleave symbols; downstream math assumes
/// contiguous, ordered groups.
pub fn group_by_symbol(bars: Vec<PriceBar>) -> Vec<Vec<PriceBar>> {
    let mut groups: Vec<Vec<PriceBar>> = Vec::new();
    for bar in bars {
        match groups.iter_mut().find(|g| g[0].symbol == bar.symbol) {
            Some(group) => group.push(bar),
            None => groups.push(vec![bar]),
        }
    }
    for group in &mut groups {
        group.sort_by_key(|b| b.date);
    }
    groups
}

/// Derives the per-symbol return series from grouped bars.
///
/// The period return is the fractional change of the adjusted close (close
/// when no adjusted field exists) from the prior bar of the same symbol; the
/// first bar per symbol gets exactly 0. The cumulative index is the base-100
/// running product of (1 + return).
pub fn derive_return_series(groups: &[Vec<PriceBar>]) -> Vec<ReturnPoint> {
    let mut points = Vec::with_capacity(groups.iter().map(Vec::len).sum());
    for group in groups {
        let mut index = 100.0;
        let mut prev_price: Option<f64> = None;
        for bar in group {
            let price = bar.return_price();
            let period_return = match prev_price {
                Some(prev) if prev != 0.0 => (price - prev) / prev,
                _ => 0.0,
            };
            index *= 1.0 + period_return;
            points.push(ReturnPoint {
                symbol: bar.symbol.clone(),
                date: bar.date,
                period_return,
                cumulative_index: index,
            });
            prev_price = Some(price);
        }
    }
    points
}
