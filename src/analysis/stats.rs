//! Small descriptive-statistics helpers shared by the reports.
//!
//! Every function returns 0 for inputs too short to define the statistic.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Population standard deviation (divides by n).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (sum_sq_dev(values) / values.len() as f64).sqrt()
}

/// Sample standard deviation (divides by n - 1).
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    (sum_sq_dev(values) / (values.len() - 1) as f64).sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile with linear interpolation between closest ranks; `p` in [0, 100].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

fn central_moment(values: &[f64], k: i32) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

/// Biased sample skewness, `m3 / m2^1.5`.
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m2 = central_moment(values, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    central_moment(values, 3) / m2.powf(1.5)
}

/// Excess kurtosis, `m4 / m2^2 - 3`.
pub fn kurtosis(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m2 = central_moment(values, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    central_moment(values, 4) / m2.powi(2) - 3.0
}

/// Gini coefficient of non-negative values: 0 is perfectly even.
pub fn gini(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return 0.0;
    }
    let n = values.len() as f64;
    let weighted: f64 = sorted(values)
        .iter()
        .enumerate()
        .map(|(i, v)| (n - i as f64) * v)
        .sum();
    (n + 1.0 - 2.0 * weighted / total) / n
}

/// Pearson correlation; 0 when either side has no variance.
pub fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let (mx, my) = (mean(xs), mean(ys));
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return 0.0;
    }
    cov / (vx * vy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(close(percentile(&values, 75.0), 3.25));
        assert!(close(percentile(&values, 25.0), 1.75));
        assert!(close(median(&values), 2.5));
        assert!(close(percentile(&[7.0], 75.0), 7.0));
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn std_variants() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(population_std(&values), 2.0));
        assert!(close(sample_std(&values), (32.0f64 / 7.0).sqrt()));
        assert_eq!(sample_std(&[3.0]), 0.0);
    }

    #[test]
    fn gini_bounds() {
        assert!(close(gini(&[5.0, 5.0, 5.0, 5.0]), 0.0));
        assert!(close(gini(&[0.0, 0.0, 0.0, 10.0]), 0.75));
        assert_eq!(gini(&[]), 0.0);
    }

    #[test]
    fn shape_statistics_of_symmetric_data() {
        let values = [1.0, 2.0, 3.0];
        assert!(close(skewness(&values), 0.0));
        assert!(close(kurtosis(&values), -1.5));
        assert!(close(correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0));
        assert_eq!(correlation(&[1.0, 1.0], &[2.0, 3.0]), 0.0);
    }
}
