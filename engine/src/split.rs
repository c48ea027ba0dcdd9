use crate::error::AppError;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: DMatrix<f64>,
    pub labels: Vec<u8>,
}

impl Partition {
    pub fn new(features: DMatrix<f64>, labels: Vec<u8>) -> Result<Self, AppError> {
        if features.nrows() != labels.len() {
            return Err(AppError::Data(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select_rows(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

// test side holds ceil(test_size * n) rows, both sides non-empty
pub fn train_test_indices(
    n: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), AppError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::Data(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::Data(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut indices = shuffled_indices(n, seed);
    let test = indices.split_off(n - n_test);
    Ok((indices, test))
}

pub fn train_test_split(
    data: &Partition,
    test_size: f64,
    seed: u64,
) -> Result<(Partition, Partition), AppError> {
    let (train, test) = train_test_indices(data.len(), test_size, seed)?;
    Ok((data.select(&train), data.select(&test)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(n: usize) -> Partition {
        let features = DMatrix::from_fn(n, 2, |i, j| (i * 10 + j) as f64);
        let labels = (0..n).map(|i| (i % 2) as u8).collect();
        Partition::new(features, labels).unwrap()
    }

    #[test]
    fn test_shuffle_is_reproducible() {
        assert_eq!(shuffled_indices(50, 42), shuffled_indices(50, 42));
        assert_ne!(shuffled_indices(50, 42), shuffled_indices(50, 7));
    }

    #[test]
    fn test_split_sizes_round_test_side_up() {
        let (train, test) = train_test_indices(10, 0.25, 42).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 7);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_keeps_rows_and_labels_aligned() {
        let data = partition(20);
        let (train, test) = train_test_split(&data, 0.2, 42).unwrap();
        assert_eq!(train.len(), 16);
        assert_eq!(test.len(), 4);
        for part in [&train, &test] {
            for (i, label) in part.labels.iter().enumerate() {
                let original_row = (part.features[(i, 0)] / 10.0) as usize;
                assert_eq!(*label, (original_row % 2) as u8);
            }
        }
    }

    #[test]
    fn test_split_rejects_degenerate_sizes() {
        assert!(train_test_indices(1, 0.2, 42).is_err());
        assert!(train_test_indices(10, 0.0, 42).is_err());
        assert!(train_test_indices(10, 1.0, 42).is_err());
    }
}
