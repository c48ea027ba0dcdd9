use crate::error::AppError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    // inverse L2 strength
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    // stop once max |gradient| falls below this
    pub tolerance: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 5000,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_iter: usize,
    pub converged: bool,
}

impl LogisticRegression {
    // mean log-loss + ||w||^2 / (2Cn), full-batch gradient descent
    pub fn fit(x: &DMatrix<f64>, y: &[u8], params: FitParams) -> Result<Self, AppError> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(AppError::Training("cannot fit with zero samples".to_string()));
        }
        if n_samples != y.len() {
            return Err(AppError::Training(format!(
                "{} samples but {} labels",
                n_samples,
                y.len()
            )));
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            return Err(AppError::Training(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }
        let positives = y.iter().filter(|&&label| label == 1).count();
        if positives == 0 || positives == n_samples {
            return Err(AppError::Training(
                "training labels contain a single class".to_string(),
            ));
        }

        let n = n_samples as f64;
        let targets = DVector::from_iterator(n_samples, y.iter().map(|&label| f64::from(label)));
        let xt = x.transpose();
        let l2 = 1.0 / (params.c * n);

        let mut weights = DVector::<f64>::zeros(n_features);
        let mut bias = 0.0;
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 0..params.max_iter {
            n_iter = iter + 1;

            let mut residuals = x * &weights;
            residuals.apply(|z| *z = sigmoid(*z + bias));
            residuals -= &targets;

            let grad_w = (&xt * &residuals) / n + &weights * l2;
            let grad_b = residuals.sum() / n;

            weights -= &grad_w * params.learning_rate;
            bias -= params.learning_rate * grad_b;

            let max_grad = grad_w.amax().max(grad_b.abs());
            if iter % 500 == 0 {
                debug!("iteration {}: max gradient {:.3e}", iter, max_grad);
            }
            if max_grad < params.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            info!("Logistic regression converged after {} iterations", n_iter);
        } else {
            warn!(
                "Logistic regression did not converge within {} iterations",
                params.max_iter
            );
        }

        Ok(Self {
            coefficients: weights.iter().copied().collect(),
            intercept: bias,
            n_iter,
            converged,
        })
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn decision_function(&self, x: &DVector<f64>) -> Result<f64, AppError> {
        if x.len() != self.len() {
            return Err(AppError::dimension_mismatch("classifier", self.len(), x.len()));
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(x.iter())
                .map(|(w, v)| w * v)
                .sum::<f64>())
    }

    pub fn predict_proba_one(&self, x: &DVector<f64>) -> Result<f64, AppError> {
        Ok(sigmoid(self.decision_function(x)?))
    }

    pub fn predict_one(&self, x: &DVector<f64>) -> Result<u8, AppError> {
        Ok(u8::from(self.decision_function(x)? > 0.0))
    }

    pub fn predict_proba(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        x.row_iter()
            .map(|row| self.predict_proba_one(&row.transpose()))
            .collect()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<u8>, AppError> {
        x.row_iter()
            .map(|row| self.predict_one(&row.transpose()))
            .collect()
    }

    // sorted by |weight|, largest first
    pub fn feature_importance<'a>(&self, names: &'a [String]) -> Vec<(&'a str, f64)> {
        let mut importance: Vec<(&str, f64)> = names
            .iter()
            .zip(&self.coefficients)
            .map(|(name, weight)| (name.as_str(), *weight))
            .collect();
        importance.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        importance
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
