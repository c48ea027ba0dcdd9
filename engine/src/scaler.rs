use crate::error::AppError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

// constant columns keep scale 1.0 and are only centred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub n_samples_seen: usize,
}

impl StandardScaler {
    pub fn fit(x: &DMatrix<f64>) -> Result<Self, AppError> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(AppError::Training(
                "cannot fit scaler on zero samples".to_string(),
            ));
        }

        let n = n_samples as f64;
        let mut mean = Vec::with_capacity(n_features);
        let mut scale = Vec::with_capacity(n_features);
        for column in x.column_iter() {
            let mu = column.sum() / n;
            let var = column.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            mean.push(mu);
            scale.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        debug!("Fitted scaler on {} samples x {} features", n_samples, n_features);

        Ok(Self {
            mean,
            scale,
            n_samples_seen: n_samples,
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform_one(&self, x: &DVector<f64>) -> Result<DVector<f64>, AppError> {
        if x.len() != self.len() {
            return Err(AppError::dimension_mismatch("scaler", self.len(), x.len()));
        }
        Ok(DVector::from_iterator(
            x.len(),
            x.iter()
                .zip(self.mean.iter().zip(&self.scale))
                .map(|(v, (mu, sigma))| (v - mu) / sigma),
        ))
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        if x.ncols() != self.len() {
            return Err(AppError::dimension_mismatch("scaler", self.len(), x.ncols()));
        }
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.mean[j]) / self.scale[j]
        }))
    }
}
