use crate::{
    error::AppError,
    storage::{ArtifactSet, ArtifactStore, RunInfo},
    types::{Prediction, Record},
};
use nalgebra::DVector;
use std::path::Path;
use tracing::{debug, info};

// Immutable after construction; the HTTP shell shares it behind an Arc.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifacts: ArtifactSet,
}

impl Predictor {
    pub fn new(artifacts: ArtifactSet) -> Result<Self, AppError> {
        artifacts.validate()?;
        info!(
            "Predictor ready: run {} with {} features",
            artifacts.run.run_id,
            artifacts.vectorizer.len()
        );
        Ok(Self { artifacts })
    }

    pub fn load(dir: &Path) -> Result<Self, AppError> {
        Self::new(ArtifactStore::new(dir).load()?)
    }

    pub fn run(&self) -> &RunInfo {
        &self.artifacts.run
    }

    pub fn n_features(&self) -> usize {
        self.artifacts.vectorizer.len()
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn transform(&self, record: &Record) -> Result<DVector<f64>, AppError> {
        let raw = self.artifacts.vectorizer.transform_one(record)?;
        self.artifacts.scaler.transform_one(&raw)
    }

    pub fn predict(&self, record: &Record) -> Result<Prediction, AppError> {
        let scaled = self.transform(record)?;
        let classifier = &self.artifacts.classifier;
        let label = classifier.predict_one(&scaled)?;
        let probability = classifier.predict_proba_one(&scaled)?;

        debug!("Predicted label {} (p={:.4})", label, probability);
        Ok(Prediction { label, probability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_artifacts, fixture_dataset, reference_record};
    use crate::types::FeatureValue;

    #[test]
    fn test_predict_reference_record() {
        let predictor = Predictor::new(fixture_artifacts()).unwrap();
        let prediction = predictor.predict(&reference_record()).unwrap();
        assert!(prediction.label <= 1);
        assert!((0.0..=1.0).contains(&prediction.probability));
        assert_eq!(prediction.label == 1, prediction.probability > 0.5);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let predictor = Predictor::new(fixture_artifacts()).unwrap();
        let record = reference_record();
        let first = predictor.predict(&record).unwrap();
        let second = predictor.predict(&record).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            predictor.transform(&record).unwrap(),
            predictor.transform(&record).unwrap()
        );
    }

    #[test]
    fn test_row_by_row_matches_training_batch() {
        let artifacts = fixture_artifacts();
        let dataset = fixture_dataset();
        let batch = artifacts
            .scaler
            .transform(&artifacts.vectorizer.transform(&dataset.records).unwrap())
            .unwrap();

        let predictor = Predictor::new(artifacts).unwrap();
        for (i, record) in dataset.records.iter().enumerate() {
            let row = predictor.transform(record).unwrap();
            assert_eq!(row, batch.row(i).transpose());
        }
    }

    #[test]
    fn test_unknown_platform_does_not_fail() {
        let predictor = Predictor::new(fixture_artifacts()).unwrap();
        let mut record = reference_record();
        record.insert(
            "most_used_platform".into(),
            FeatureValue::Text("UnknownPlatformXYZ".into()),
        );
        let raw = predictor
            .artifacts()
            .vectorizer
            .transform_one(&record)
            .unwrap();
        for (idx, name) in predictor
            .artifacts()
            .vectorizer
            .feature_names()
            .iter()
            .enumerate()
        {
            if name.starts_with("most_used_platform=") {
                assert_eq!(raw[idx], 0.0);
            }
        }
        assert_eq!(raw.len(), predictor.n_features());
        assert!(predictor.predict(&record).is_ok());
    }

    #[test]
    fn test_missing_numeric_field_is_zero_before_scaling() {
        let predictor = Predictor::new(fixture_artifacts()).unwrap();
        let mut record = reference_record();
        record.remove("age");
        let raw = predictor
            .artifacts()
            .vectorizer
            .transform_one(&record)
            .unwrap();
        let idx = predictor.artifacts().vectorizer.index_of("age").unwrap();
        assert_eq!(raw[idx], 0.0);
        assert!(predictor.predict(&record).is_ok());
    }

    #[test]
    fn test_inconsistent_triple_is_rejected() {
        let mut artifacts = fixture_artifacts();
        artifacts.scaler.mean.push(0.0);
        artifacts.scaler.scale.push(1.0);
        assert!(matches!(
            Predictor::new(artifacts),
            Err(AppError::DimensionMismatch { .. })
        ));
    }
}
