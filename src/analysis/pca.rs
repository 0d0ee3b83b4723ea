//! Principal component analysis
//!
//! Observations are matrix rows. Missing values are imputed with 0 and every
//! feature is mean-centered. Components come from the eigen decomposition of
//! the observation Gram matrix, which stays small (runs × runs) however many
//! peptides there are.

use nalgebra::DMatrix;

use crate::data::table::LabeledMatrix;

#[derive(Debug, Clone)]
pub struct Pca {
    pub observations: Vec<String>,
    pub features: Vec<String>,
    /// `scores[observation][component]`
    pub scores: Vec<Vec<f64>>,
    /// `loadings[component][feature]`, unit length
    pub loadings: Vec<Vec<f64>>,
    /// Share of total variance per component
    pub explained_ratio: Vec<f64>,
}

impl Pca {
    /// Fit up to `k` components; `None` when there are fewer than two
    /// observations or no features
    pub fn fit(data: &LabeledMatrix, k: usize) -> Option<Self> {
        let (n, p) = (data.n_rows(), data.n_cols());
        if n < 2 || p == 0 || k == 0 {
            return None;
        }

        let mut x = DMatrix::from_fn(n, p, |i, j| {
            let v = data.values[i][j];
            if v.is_finite() {
                v
            } else {
                0.0
            }
        });
        for j in 0..p {
            let mean = x.column(j).mean();
            x.column_mut(j).add_scalar_mut(-mean);
        }

        let gram = &x * x.transpose();
        let eigen = gram.symmetric_eigen();
        let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|a, b| eigen.eigenvalues[*b].total_cmp(&eigen.eigenvalues[*a]));
        let k = k.min(n);

        let mut scores = vec![vec![0.0; k]; n];
        let mut loadings = Vec::with_capacity(k);
        let mut explained_ratio = Vec::with_capacity(k);
        for (c, &idx) in order.iter().take(k).enumerate() {
            let lambda = eigen.eigenvalues[idx].max(0.0);
            let mut u = eigen.eigenvectors.column(idx).into_owned();

            // deterministic sign: largest |u| entry positive
            let pivot = u
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            if pivot < 0.0 {
                u.neg_mut();
            }

            let sigma = lambda.sqrt();
            for i in 0..n {
                scores[i][c] = u[i] * sigma;
            }
            let loading: Vec<f64> = if sigma > 1e-12 {
                (x.transpose() * &u).iter().map(|v| v / sigma).collect()
            } else {
                vec![0.0; p]
            };
            loadings.push(loading);
            explained_ratio.push(if total > 0.0 { lambda / total } else { 0.0 });
        }

        Some(Self {
            observations: data.rows.clone(),
            features: data.columns.clone(),
            scores,
            loadings,
            explained_ratio,
        })
    }

    pub fn n_components(&self) -> usize {
        self.explained_ratio.len()
    }

    /// `"PC1 (42.17%)"`
    pub fn axis_label(&self, component: usize) -> String {
        let ratio = self.explained_ratio.get(component).copied().unwrap_or(0.0);
        format!("PC{} ({:.2}%)", component + 1, ratio * 100.0)
    }

    pub fn component_scores(&self, component: usize) -> Vec<f64> {
        self.scores.iter().map(|r| r[component]).collect()
    }

    /// Feature indices ordered by |loading| on one component, largest first
    pub fn most_influential(&self, component: usize, n: usize) -> Vec<usize> {
        let Some(loading) = self.loadings.get(component) else {
            return Vec::new();
        };
        let mut idx: Vec<usize> = (0..loading.len()).collect();
        idx.sort_by(|a, b| loading[*b].abs().total_cmp(&loading[*a].abs()));
        idx.truncate(n);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations(values: Vec<Vec<f64>>) -> LabeledMatrix {
        let rows = (0..values.len()).map(|i| format!("S{}", i + 1)).collect();
        let cols = (0..values[0].len()).map(|j| format!("PEP{}", j + 1)).collect();
        LabeledMatrix::new(rows, cols, values)
    }

    #[test]
    fn test_explained_variance_sums_to_at_most_one() {
        let m = observations(vec![
            vec![1.0, 2.0, 3.0, 0.5],
            vec![2.0, 1.0, 0.0, 1.5],
            vec![4.0, 3.0, 1.0, f64::NAN],
            vec![0.0, 5.0, 2.0, 2.5],
        ]);
        let pca = Pca::fit(&m, 3).unwrap();
        let sum: f64 = pca.explained_ratio.iter().sum();
        assert!(sum <= 1.0 + 1e-9);
        assert!(pca.explained_ratio.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(pca.n_components(), 3);
    }

    #[test]
    fn test_collinear_data_has_one_component() {
        let m = observations(vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]]);
        let pca = Pca::fit(&m, 2).unwrap();
        assert!((pca.explained_ratio[0] - 1.0).abs() < 1e-9);
        assert_eq!(pca.axis_label(0), "PC1 (100.00%)");
        assert_eq!(pca.axis_label(1), "PC2 (0.00%)");
        let pc1 = pca.component_scores(0);
        assert!((pc1[0] + pc1[2]).abs() < 1e-9);
        assert!(pc1[1].abs() < 1e-9);
        let l = &pca.loadings[0];
        assert!((l[0].abs() - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_label_formats_two_decimals() {
        let pca = Pca {
            observations: vec![],
            features: vec![],
            scores: vec![],
            loadings: vec![],
            explained_ratio: vec![0.421_66, 0.1],
        };
        assert_eq!(pca.axis_label(0), "PC1 (42.17%)");
        assert_eq!(pca.axis_label(1), "PC2 (10.00%)");
    }

    #[test]
    fn test_most_influential_features() {
        let m = observations(vec![
            vec![0.0, 10.0, 1.0],
            vec![0.1, -10.0, 1.0],
            vec![0.0, 5.0, 1.0],
        ]);
        let pca = Pca::fit(&m, 1).unwrap();
        assert_eq!(pca.most_influential(0, 1), vec![1]);
        assert!(Pca::fit(&observations(vec![vec![1.0]]), 2).is_none());
    }
}
