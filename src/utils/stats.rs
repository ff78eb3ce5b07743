/// Arithmetic mean; `None` for an empty sample.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation (divides by `n - 1`); `0` for a single sample.
pub fn sample_std_dev(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    if samples.len() == 1 {
        return Some(0.);
    }
    let sum_sq = samples.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
    Some((sum_sq / (samples.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(mean(&[2., 4., 6.]), Some(4.));
        assert_eq!(sample_std_dev(&[2., 4., 6.]), Some(2.));
        assert_eq!(sample_std_dev(&[1.5]), Some(0.));
        assert_eq!(sample_std_dev(&[3., 3., 3., 3.]), Some(0.));
    }
}
