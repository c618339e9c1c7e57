use argminmax::ArgMinMax;

/// Largest value in `vec`. Returns `None` for an empty slice.
pub fn get_max(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    let max_index: usize = vec.argmax();
    Some(vec[max_index])
}

// Normalizes a vector of (positive) f64 to 0.0 to 1.0. Guarantees largest value is 1.0
// Smallest output value will be 0.0 iff smallest input value = 0.0
// Name: `Max normalization`, `Max-Abs normalization`, or `L∞ normalization`
pub fn normalize_max(vec: &[f64]) -> Vec<f64> {
    match get_max(vec) {
        Some(max_value) if max_value > 0.0 => vec.iter().map(|&x| x / max_value).collect(),
        // Empty, all-zero or non-positive input: nothing sensible to scale by
        _ => vec.to_vec(),
    }
}
