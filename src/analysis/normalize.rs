//! Matrix transforms shared by the intensity figures

use serde::{Deserialize, Serialize};

use crate::analysis::stats;
use crate::data::table::LabeledMatrix;

/// Per-sample intensity normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleNormalization {
    #[default]
    None,
    Median,
    Quantile,
}

impl SampleNormalization {
    pub const ALL: [SampleNormalization; 3] = [
        SampleNormalization::None,
        SampleNormalization::Median,
        SampleNormalization::Quantile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SampleNormalization::None => "None",
            SampleNormalization::Median => "Median",
            SampleNormalization::Quantile => "Quantile",
        }
    }

    pub fn apply(&self, m: &LabeledMatrix) -> LabeledMatrix {
        match self {
            SampleNormalization::None => m.clone(),
            SampleNormalization::Median => median_normalize(m),
            SampleNormalization::Quantile => quantile_normalize(m),
        }
    }
}

/// Heatmap scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisNormalization {
    #[default]
    Row,
    Column,
    None,
}

impl AxisNormalization {
    pub const ALL: [AxisNormalization; 3] = [
        AxisNormalization::Row,
        AxisNormalization::Column,
        AxisNormalization::None,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AxisNormalization::Row => "Row",
            AxisNormalization::Column => "Column",
            AxisNormalization::None => "None",
        }
    }

    pub fn apply(&self, m: &LabeledMatrix) -> LabeledMatrix {
        match self {
            AxisNormalization::Row => row_normalize(m),
            AxisNormalization::Column => row_normalize(&m.transpose()).transpose(),
            AxisNormalization::None => m.clone(),
        }
    }
}

/// Logarithm of positive values; zero and negatives become NaN
pub fn log_transform(m: &LabeledMatrix, base: f64) -> LabeledMatrix {
    let log = |v: f64| match base {
        b if b == 2.0 => v.log2(),
        b if b == 10.0 => v.log10(),
        b => v.log(b),
    };
    m.map(|v| if v > 0.0 { log(v) } else { f64::NAN })
}

/// Scale each column so its median lands on the mean of all column medians
pub fn median_normalize(m: &LabeledMatrix) -> LabeledMatrix {
    let medians: Vec<f64> = (0..m.n_cols()).map(|j| stats::median(&m.column(j))).collect();
    let target = stats::mean(&medians);
    let mut out = m.clone();
    for row in &mut out.values {
        for (v, med) in row.iter_mut().zip(&medians) {
            *v = if *med != 0.0 { *v / med * target } else { f64::NAN };
        }
    }
    out
}

/// Subtract each column's median
pub fn median_center(m: &LabeledMatrix) -> LabeledMatrix {
    let mut out = m.clone();
    for j in 0..m.n_cols() {
        let med = stats::median(&m.column(j));
        for row in &mut out.values {
            row[j] -= med;
        }
    }
    out
}

/// Give every column the same distribution: the mean of the columns' sorted
/// values. Missing values stay missing; columns of different lengths are
/// matched on rank fraction.
pub fn quantile_normalize(m: &LabeledMatrix) -> LabeledMatrix {
    let columns: Vec<Vec<f64>> = (0..m.n_cols()).map(|j| m.finite_column(j)).collect();
    let n_ref = columns.iter().map(Vec::len).max().unwrap_or(0);
    if n_ref == 0 {
        return m.clone();
    }
    let rank_fraction = |rank: f64, len: usize| {
        if len <= 1 {
            0.0
        } else {
            rank / (len - 1) as f64
        }
    };
    let ref_qs: Vec<f64> = (0..n_ref).map(|r| rank_fraction(r as f64, n_ref)).collect();
    let per_column: Vec<Vec<f64>> = columns
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| stats::quantiles(c, &ref_qs))
        .collect();
    let reference: Vec<f64> = (0..n_ref)
        .map(|r| stats::mean(&per_column.iter().map(|q| q[r]).collect::<Vec<_>>()))
        .collect();

    let mut out = m.clone();
    for (j, col) in columns.iter().enumerate() {
        let mut sorted = col.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let finite_rows: Vec<usize> = (0..m.n_rows()).filter(|i| m.values[*i][j].is_finite()).collect();
        // average rank among ties
        let qs: Vec<f64> = finite_rows
            .iter()
            .map(|i| {
                let v = m.values[*i][j];
                let first = sorted.partition_point(|x| *x < v);
                let last = sorted.partition_point(|x| *x <= v);
                rank_fraction((first + last - 1) as f64 / 2.0, sorted.len())
            })
            .collect();
        for (i, value) in finite_rows.iter().zip(stats::quantiles(&reference, &qs)) {
            out.values[*i][j] = value;
        }
    }
    out
}

/// Divide each row by its sum
pub fn row_normalize(m: &LabeledMatrix) -> LabeledMatrix {
    let mut out = m.clone();
    for row in &mut out.values {
        let sum: f64 = row.iter().filter(|v| v.is_finite()).sum();
        for v in row.iter_mut() {
            *v = if sum != 0.0 { *v / sum } else { f64::NAN };
        }
    }
    out
}

/// Rescale each column to [0, 1]
pub fn min_max_columns(m: &LabeledMatrix) -> LabeledMatrix {
    let mut out = m.clone();
    for j in 0..m.n_cols() {
        let col = m.finite_column(j);
        let lo = col.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = hi - lo;
        for row in &mut out.values {
            row[j] = if span > 0.0 { (row[j] - lo) / span } else { 0.0 * row[j] };
        }
    }
    out
}

/// Clamp every value to at most `cap`
pub fn clamp_max(m: &LabeledMatrix, cap: f64) -> LabeledMatrix {
    m.map(|v| if v > cap { cap } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(values: Vec<Vec<f64>>) -> LabeledMatrix {
        let rows = (0..values.len()).map(|i| format!("r{}", i)).collect();
        let cols = (0..values[0].len()).map(|j| format!("c{}", j)).collect();
        LabeledMatrix::new(rows, cols, values)
    }

    #[test]
    fn test_log_transform_masks_nonpositive() {
        let m = log_transform(&matrix(vec![vec![100.0, 0.0, -1.0]]), 10.0);
        assert_eq!(m.values[0][0], 2.0);
        assert!(m.values[0][1].is_nan() && m.values[0][2].is_nan());
    }

    #[test]
    fn test_median_normalize_aligns_medians() {
        let m = matrix(vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]);
        let n = median_normalize(&m);
        assert_eq!(stats::median(&n.column(0)), stats::median(&n.column(1)));
        assert_eq!(stats::median(&n.column(0)), 11.0);
    }

    #[test]
    fn test_quantile_normalize_equalizes_columns() {
        let m = matrix(vec![
            vec![5.0, 4.0, 3.0],
            vec![2.0, 1.0, 4.0],
            vec![3.0, 4.0, 6.0],
            vec![4.0, 2.0, 8.0],
        ]);
        let q = quantile_normalize(&m);
        let mut a = q.column(0);
        let mut c = q.column(2);
        a.sort_by(|x, y| x.total_cmp(y));
        c.sort_by(|x, y| x.total_cmp(y));
        assert_eq!(a, c);
        // largest value of each column maps to the mean of column maxima
        assert!((q.values[0][0] - (5.0 + 4.0 + 8.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_row_and_column_normalization() {
        let m = matrix(vec![vec![1.0, 3.0], vec![2.0, 2.0]]);
        assert_eq!(AxisNormalization::Row.apply(&m).values[0], vec![0.25, 0.75]);
        assert_eq!(AxisNormalization::Column.apply(&m).values[0], vec![1.0 / 3.0, 0.6]);
    }

    #[test]
    fn test_min_max_and_clamp() {
        let m = matrix(vec![vec![2.0], vec![4.0], vec![6.0]]);
        assert_eq!(min_max_columns(&m).column(0), vec![0.0, 0.5, 1.0]);
        let c = clamp_max(&matrix(vec![vec![12.0, 45.0]]), 30.0);
        assert_eq!(c.values[0], vec![12.0, 30.0]);
        assert_eq!(clamp_max(&c, 30.0), c);
    }
}
