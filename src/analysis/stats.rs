//! Descriptive statistics over `f64` slices. NaN values are skipped.

use ndarray::Array1;
use ndarray_stats::interpolate::Linear;
use ndarray_stats::Quantile1dExt;
use noisy_float::types::{n64, N64};
use statrs::statistics::Statistics;

use crate::data::table::{Cell, DataTable, LabeledMatrix};

pub fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    finite(values).iter().mean()
}

/// Sample standard deviation (n - 1)
pub fn std_dev(values: &[f64]) -> f64 {
    finite(values).iter().std_dev()
}

/// Linear-interpolated quantiles, each `q` in [0, 1]. All NaN when no
/// finite value is left.
pub fn quantiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    let mut data: Array1<N64> = finite(values).into_iter().map(n64).collect();
    let qs: Array1<N64> = qs
        .iter()
        .map(|&q| n64(if q.is_nan() { 0.5 } else { q.clamp(0.0, 1.0) }))
        .collect();
    data.quantiles_mut(&qs, &Linear)
        .map(|found| found.mapv(N64::raw).into_raw_vec())
        .unwrap_or_else(|_| vec![f64::NAN; qs.len()])
}

pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantiles(values, &[q]).first().copied().unwrap_or(f64::NAN)
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// count / mean / std / min / quartiles / max
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn describe(values: &[f64]) -> Describe {
    let v = finite(values);
    let q = quantiles(&v, &[0.25, 0.5, 0.75]);
    Describe {
        count: v.len(),
        mean: v.iter().mean(),
        std: v.iter().std_dev(),
        min: Statistics::min(v.iter()),
        q25: q[0],
        q50: q[1],
        q75: q[2],
        max: Statistics::max(v.iter()),
    }
}

impl Describe {
    pub fn rows(&self) -> [(&'static str, f64); 8] {
        [
            ("count", self.count as f64),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.q50),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }

    pub fn to_table(&self, column: &str) -> DataTable {
        DataTable::new(
            vec![String::new(), column.to_string()],
            self.rows()
                .iter()
                .map(|(k, v)| vec![Cell::text(*k), Cell::number(*v)])
                .collect(),
        )
    }
}

/// Tukey fences: (Q1 - 1.5 IQR, Q3 + 1.5 IQR)
pub fn tukey_fences(values: &[f64]) -> (f64, f64) {
    let q = quantiles(values, &[0.25, 0.75]);
    let (q1, q3) = (q[0], q[1]);
    let iqr = q3 - q1;
    (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

/// Replace values outside each column's Tukey fences with NaN
pub fn filter_outliers(matrix: &LabeledMatrix) -> LabeledMatrix {
    let mut out = matrix.clone();
    for j in 0..matrix.n_cols() {
        let (lo, hi) = tukey_fences(&matrix.column(j));
        for row in &mut out.values {
            if row[j] < lo || row[j] > hi {
                row[j] = f64::NAN;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantiles_interpolate() {
        let v = [4.0, 1.0, 3.0, 2.0, f64::NAN];
        assert_eq!(median(&v), 2.5);
        assert_eq!(quantile(&v, 0.25), 1.75);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert!(median(&[]).is_nan());
        assert_eq!(quantiles(&v, &[0.75, 0.0]), vec![3.25, 1.0]);
    }

    #[test]
    fn test_mean_and_std_skip_missing() {
        assert_eq!(mean(&[2.0, f64::NAN, 4.0]), 3.0);
        assert!(mean(&[f64::NAN]).is_nan());
        assert!(std_dev(&[1.0]).is_nan());
        assert!((std_dev(&[1.0, 3.0, f64::NAN]) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_describe() {
        let d = describe(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(d.count, 5);
        assert_eq!(d.mean, 3.0);
        assert!((d.std - 1.5811388300841898).abs() < 1e-12);
        assert_eq!((d.min, d.q25, d.q50, d.q75, d.max), (1.0, 2.0, 3.0, 4.0, 5.0));
        assert_eq!(d.to_table("NumPeptides").n_rows(), 8);
    }

    #[test]
    fn test_outlier_filter_masks_extremes() {
        let m = LabeledMatrix::new(
            (0..6).map(|i| i.to_string()).collect(),
            vec!["A".into()],
            vec![vec![10.0], vec![11.0], vec![12.0], vec![11.5], vec![10.5], vec![1000.0]],
        );
        let f = filter_outliers(&m);
        assert!(f.values[5][0].is_nan());
        assert_eq!(f.values[0][0], 10.0);
    }
}
