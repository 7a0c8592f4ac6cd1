//! Voice movement metric

/// Signed distance in semitones from `from` to `to`
pub fn semitones_between(from: f64, to: f64) -> f64 {
    12.0 * (to / from).log2()
}

/// Total semitone movement from one voicing to the next.
///
/// Voices are matched greedily: each voice of `previous`, in order, takes
/// the closest voice of `next` not already taken. The matching is
/// order-dependent and not globally optimal; voicing selection relies on
/// exactly this policy. Voices left unmatched on either side cost nothing.
pub fn voice_movement(previous: &[f64], next: &[f64]) -> f64 {
    let mut used = vec![false; next.len()];
    let mut total = 0.0;

    for &from in previous {
        let mut closest: Option<(usize, f64)> = None;

        for (index, &to) in next.iter().enumerate() {
            if used[index] {
                continue;
            }
            let distance = semitones_between(from, to).abs();
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((index, distance));
            }
        }

        if let Some((index, distance)) = closest {
            used[index] = true;
            total += distance;
        }
    }

    total
}
