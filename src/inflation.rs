use crate::types::{Observation, SeriesRow, SeriesTable};
use std::collections::HashMap;

/// Rows back to the comparison point. This is a row offset inside each
/// region's own sequence, not twelve calendar months: a gap in the data
/// shifts the comparison point.
pub const YOY_LAG: usize = 12;

/// Attach `inflation_yoy` to every observation.
///
/// Each region is grouped into its own chronological sequence first, then
/// scanned with a fixed row offset. The first `YOY_LAG` rows of a region get
/// `None`, as does any row whose base index is zero or whose result is not
/// finite.
pub fn annotate(observations: Vec<Observation>) -> SeriesTable {
    let yoy = {
        let mut by_region: HashMap<&str, Vec<usize>> = HashMap::new();
        for (pos, o) in observations.iter().enumerate() {
            by_region.entry(o.region.as_str()).or_default().push(pos);
        }

        let mut yoy: Vec<Option<f64>> = vec![None; observations.len()];
        for positions in by_region.values() {
            for (k, &pos) in positions.iter().enumerate().skip(YOY_LAG) {
                let base = observations[positions[k - YOY_LAG]].index;
                yoy[pos] = pct_change(base, observations[pos].index);
            }
        }
        yoy
    };

    let rows = observations
        .into_iter()
        .zip(yoy)
        .map(|(o, inflation_yoy)| SeriesRow {
            region: o.region,
            date: o.date,
            category: o.category,
            index: o.index,
            inflation_yoy,
        })
        .collect();
    SeriesTable { rows }
}

fn pct_change(base: f64, current: f64) -> Option<f64> {
    if base == 0.0 {
        return None;
    }
    let v = (current / base - 1.0) * 100.0;
    v.is_finite().then_some(v)
}
