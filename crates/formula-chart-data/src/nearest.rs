use ordered_float::OrderedFloat;

/// What to return when values on both sides of the target are equally near.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NearestTies {
    /// Every index at the minimal distance, grouped by value.
    #[default]
    All,
    /// Only the value at or below the target. Indices sharing that exact value are still all
    /// returned.
    PreferBelow,
}

/// Indices (into `values`) of the values nearest to `target`.
///
/// `NaN` values never match. A candidate farther than `max_distance` is dropped rather than
/// replaced by a farther one, so the result may be empty.
pub(crate) fn indices_of_nearest<I>(
    values: I,
    target: f64,
    max_distance: Option<f64>,
    ties: NearestTies,
) -> Vec<usize>
where
    I: IntoIterator<Item = f64>,
{
    let max_distance = max_distance.unwrap_or(f64::INFINITY);
    let mut min_dist = f64::INFINITY;
    let mut min_diff: Option<f64> = None;
    // (value, indices) in order of each value's first occurrence.
    let mut groups: Vec<(OrderedFloat<f64>, Vec<usize>)> = Vec::new();

    for (idx, value) in values.into_iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        let diff = target - value;
        let dist = diff.abs();
        if !(dist <= max_distance) {
            continue;
        }

        match ties {
            NearestTies::All => {
                if dist < min_dist {
                    min_dist = dist;
                    groups.clear();
                }
                if dist == min_dist {
                    let key = OrderedFloat(value);
                    match groups.iter_mut().find(|(v, _)| *v == key) {
                        Some((_, indices)) => indices.push(idx),
                        None => groups.push((key, vec![idx])),
                    }
                }
            }
            NearestTies::PreferBelow => {
                let below_beats_above =
                    dist == min_dist && diff >= 0.0 && min_diff.is_some_and(|d| d < 0.0);
                if dist < min_dist || below_beats_above {
                    min_dist = dist;
                    min_diff = Some(diff);
                    groups.clear();
                }
                if min_diff == Some(diff) {
                    match groups.first_mut() {
                        Some((_, indices)) => indices.push(idx),
                        None => groups.push((OrderedFloat(value), vec![idx])),
                    }
                }
            }
        }
    }

    groups.into_iter().flat_map(|(_, indices)| indices).collect()
}
