use crate::config::TrainingConfig;
use crate::dataset::{self, Dataset, DatasetOptions};
use crate::error::AppError;
use crate::evaluation::{roc_auc, ClassificationReport};
use crate::features::DictVectorizer;
use crate::model::{FitParams, LogisticRegression};
use crate::scaler::StandardScaler;
use crate::split::{train_test_split, Partition};
use crate::storage::{ArtifactSet, ArtifactStore, RunInfo};
use serde::Serialize;
use std::fmt;
use tracing::info;

const TOP_FEATURES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub roc_auc: Option<f64>,
}

impl Evaluation {
    fn of(model: &LogisticRegression, partition: &Partition) -> Result<Self, AppError> {
        let predicted = model.predict(&partition.features)?;
        let scores = model.predict_proba(&partition.features)?;
        Ok(Self {
            report: ClassificationReport::new(&partition.labels, &predicted),
            roc_auc: roc_auc(&partition.labels, &scores),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub run: RunInfo,
    pub n_features: usize,
    pub train_size: usize,
    pub validation_size: usize,
    pub test_size: usize,
    pub n_iter: usize,
    pub converged: bool,
    pub validation: Evaluation,
    pub test: Evaluation,
    pub top_features: Vec<(String, f64)>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifacts: ArtifactSet,
    pub report: TrainingReport,
}

pub fn fit_pipeline(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainingOutcome, AppError> {
    let vectorizer = DictVectorizer::fit(&dataset.records)?;
    let features = vectorizer.transform(&dataset.records)?;

    let scaler = StandardScaler::fit(&features)?;
    let scaled = scaler.transform(&features)?;

    let all = Partition::new(scaled, dataset.labels.clone())?;
    let (full_train, test) = train_test_split(&all, config.test_size, config.seed)?;
    let (train, validation) = train_test_split(&full_train, config.validation_size, config.seed)?;

    info!(
        "Split {} rows into train={} validation={} test={}",
        all.len(),
        train.len(),
        validation.len(),
        test.len()
    );

    let params = FitParams {
        c: config.c,
        learning_rate: config.learning_rate,
        max_iter: config.max_iter,
        tolerance: config.tolerance,
    };
    let classifier = LogisticRegression::fit(&train.features, &train.labels, params)?;

    let validation_eval = Evaluation::of(&classifier, &validation)?;
    let test_eval = Evaluation::of(&classifier, &test)?;

    let top_features = classifier
        .feature_importance(vectorizer.feature_names())
        .into_iter()
        .take(TOP_FEATURES)
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

    let run = RunInfo::new();
    let report = TrainingReport {
        run,
        n_features: vectorizer.len(),
        train_size: train.len(),
        validation_size: validation.len(),
        test_size: test.len(),
        n_iter: classifier.n_iter,
        converged: classifier.converged,
        validation: validation_eval,
        test: test_eval,
        top_features,
    };

    Ok(TrainingOutcome {
        artifacts: ArtifactSet {
            run,
            vectorizer,
            scaler,
            classifier,
        },
        report,
    })
}

pub fn run(config: &TrainingConfig, store: &ArtifactStore) -> Result<TrainingOutcome, AppError> {
    let dataset = dataset::load_csv(&config.data_path, &DatasetOptions::from(config))?;
    info!(
        "Positive (addicted) rate: {:.1}%",
        dataset.positive_rate() * 100.0
    );

    let outcome = fit_pipeline(&dataset, config)?;
    store.save(&outcome.artifacts)?;
    Ok(outcome)
}

fn write_evaluation(f: &mut fmt::Formatter<'_>, name: &str, eval: &Evaluation) -> fmt::Result {
    writeln!(f, "\n--- {} Set Results ---", name)?;
    writeln!(f, "Classification Report on {} Set:", name)?;
    write!(f, "{}", eval.report)?;
    match eval.roc_auc {
        Some(auc) => writeln!(f, "AUC Score on {} Set: {:.4}", name, auc),
        None => writeln!(f, "AUC Score on {} Set: undefined (single class)", name),
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training set size: {}", self.train_size)?;
        writeln!(f, "Validation set size: {}", self.validation_size)?;
        writeln!(f, "Test set size: {}", self.test_size)?;
        writeln!(f, "Feature dimensions: {}", self.n_features)?;
        writeln!(
            f,
            "Optimizer: {} iterations ({})",
            self.n_iter,
            if self.converged { "converged" } else { "not converged" }
        )?;

        write_evaluation(f, "Validation", &self.validation)?;
        write_evaluation(f, "Test", &self.test)?;

        writeln!(f, "\n--- Top Features ---")?;
        for (name, weight) in &self.top_features {
            writeln!(f, "{:>40} {:>+9.4}", name, weight)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_dataset, fixture_training_config};

    #[test]
    fn test_fit_pipeline_partitions_and_dimensions() {
        let dataset = fixture_dataset();
        let outcome = fit_pipeline(&dataset, &fixture_training_config()).unwrap();
        let report = &outcome.report;

        // 80 rows: 16 test, then 16 validation out of the remaining 64
        assert_eq!(report.test_size, 16);
        assert_eq!(report.validation_size, 16);
        assert_eq!(report.train_size, 48);

        let artifacts = &outcome.artifacts;
        assert!(artifacts.validate().is_ok());
        assert_eq!(artifacts.vectorizer.len(), report.n_features);
        assert_eq!(report.top_features.len(), TOP_FEATURES);
    }

    #[test]
    fn test_fit_pipeline_learns_usage_signal() {
        let outcome = fit_pipeline(&fixture_dataset(), &fixture_training_config()).unwrap();
        let idx = outcome
            .artifacts
            .vectorizer
            .index_of("avg_daily_usage_hours")
            .unwrap();
        assert!(outcome.artifacts.classifier.coefficients[idx] > 0.0);
        assert!(outcome.report.test.report.accuracy >= 0.75);
    }

    #[test]
    fn test_split_is_reproducible() {
        let dataset = fixture_dataset();
        let config = fixture_training_config();
        let a = fit_pipeline(&dataset, &config).unwrap();
        let b = fit_pipeline(&dataset, &config).unwrap();
        assert_eq!(a.artifacts.classifier, b.artifacts.classifier);
        assert_eq!(a.artifacts.scaler, b.artifacts.scaler);
        assert_ne!(a.report.run.run_id, b.report.run.run_id);
    }

    #[test]
    fn test_run_persists_loadable_triple() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("survey.csv");
        std::fs::write(&csv_path, crate::test_support::fixture_csv()).unwrap();

        let mut config = fixture_training_config();
        config.data_path = csv_path;
        let store = ArtifactStore::new(dir.path().join("artifacts"));

        let outcome = run(&config, &store).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, outcome.artifacts);
        assert!(outcome.report.to_string().contains("Validation Set Results"));
    }

    #[test]
    fn test_tiny_dataset_is_rejected() {
        let mut dataset = fixture_dataset();
        dataset.records.truncate(2);
        dataset.labels.truncate(2);
        assert!(fit_pipeline(&dataset, &fixture_training_config()).is_err());
    }
}
