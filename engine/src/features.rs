// Numeric fields map to one dimension named after the field, categories to
// `field=value`. Dimensions are sorted by name.

use crate::error::{validation_error, AppError};
use crate::types::{FeatureValue, Record};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const CATEGORY_SEPARATOR: char = '=';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictVectorizer {
    feature_names: Vec<String>,
    vocabulary: BTreeMap<String, usize>,
}

impl DictVectorizer {
    pub fn fit(records: &[Record]) -> Result<Self, AppError> {
        if records.is_empty() {
            return Err(AppError::Training(
                "cannot fit vectorizer on zero records".to_string(),
            ));
        }

        let mut names = BTreeSet::new();
        for record in records {
            for (field, value) in record {
                match value {
                    FeatureValue::Number(_) => {
                        names.insert(field.clone());
                    }
                    FeatureValue::Text(text) => {
                        names.insert(category_name(field, text));
                    }
                    FeatureValue::TextList(items) => {
                        names.extend(items.iter().map(|item| category_name(field, item)));
                    }
                }
            }
        }

        let feature_names: Vec<String> = names.into_iter().collect();
        let vocabulary = feature_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        debug!(
            "Fitted vectorizer on {} records: {} dimensions",
            records.len(),
            feature_names.len()
        );

        Ok(Self {
            feature_names,
            vocabulary,
        })
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.vocabulary.get(name).copied()
    }

    // fields and values outside the vocabulary contribute 0
    pub fn transform_one(&self, record: &Record) -> Result<DVector<f64>, AppError> {
        let mut row = DVector::zeros(self.len());
        for (field, value) in record {
            match value {
                FeatureValue::Number(v) => {
                    if !v.is_finite() {
                        return Err(validation_error(&format!(
                            "field '{}' must be a finite number",
                            field
                        )));
                    }
                    if let Some(idx) = self.index_of(field) {
                        row[idx] = *v;
                    }
                }
                FeatureValue::Text(text) => {
                    if let Some(idx) = self.index_of(&category_name(field, text)) {
                        row[idx] = 1.0;
                    }
                }
                FeatureValue::TextList(items) => {
                    for item in items {
                        if let Some(idx) = self.index_of(&category_name(field, item)) {
                            row[idx] += 1.0;
                        }
                    }
                }
            }
        }
        Ok(row)
    }

    pub fn transform(&self, records: &[Record]) -> Result<DMatrix<f64>, AppError> {
        let mut matrix = DMatrix::zeros(records.len(), self.len());
        for (i, record) in records.iter().enumerate() {
            let row = self.transform_one(record)?;
            matrix.set_row(i, &row.transpose());
        }
        Ok(matrix)
    }
}

fn category_name(field: &str, value: &str) -> String {
    format!("{}{}{}", field, CATEGORY_SEPARATOR, value)
}
