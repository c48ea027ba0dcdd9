use crate::config::TrainingConfig;
use crate::error::AppError;
use crate::types::{FeatureValue, Record};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub id_column: String,
    pub label_column: String,
    pub label_threshold: f64,
}

impl From<&TrainingConfig> for DatasetOptions {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            id_column: config.id_column.clone(),
            label_column: config.label_column.clone(),
            label_threshold: config.label_threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_columns: Vec<String>,
    pub records: Vec<Record>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}

// inclusive: a score equal to the threshold is addicted
pub fn derive_label(score: f64, threshold: f64) -> u8 {
    u8::from(score >= threshold)
}

pub fn load_csv(path: &Path, options: &DatasetOptions) -> Result<Dataset, AppError> {
    let file = std::fs::File::open(path)?;
    let dataset = from_reader(file, options)?;
    info!(
        "Loaded {} records with {} feature columns from {}",
        dataset.len(),
        dataset.feature_columns.len(),
        path.display()
    );
    Ok(dataset)
}

pub fn from_reader<R: Read>(reader: R, options: &DatasetOptions) -> Result<Dataset, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_lowercase).collect();
    let id_column = options.id_column.to_lowercase();
    let label_column = options.label_column.to_lowercase();

    let label_idx = headers
        .iter()
        .position(|h| *h == label_column)
        .ok_or_else(|| AppError::Data(format!("missing label column '{}'", label_column)))?;

    let feature_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| i != label_idx && headers[i] != id_column)
        .collect();

    let rows: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>()?;
    if rows.is_empty() {
        return Err(AppError::Data("dataset has no rows".to_string()));
    }

    let mut labels = Vec::with_capacity(rows.len());
    for (line, row) in rows.iter().enumerate() {
        let raw = row.get(label_idx).unwrap_or("");
        let score: f64 = raw.parse().map_err(|_| {
            AppError::Data(format!(
                "row {}: '{}' value '{}' is not numeric",
                line + 1,
                label_column,
                raw
            ))
        })?;
        labels.push(derive_label(score, options.label_threshold));
    }

    // a column is numeric only if every non-empty cell parses
    let numeric: Vec<bool> = feature_idx
        .iter()
        .map(|&col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .filter(|cell| !cell.is_empty())
                .all(|cell| cell.parse::<f64>().is_ok())
        })
        .collect();

    let records = rows
        .iter()
        .map(|row| {
            let mut record = Record::new();
            for (&col, &is_numeric) in feature_idx.iter().zip(&numeric) {
                let cell = match row.get(col) {
                    Some(cell) if !cell.is_empty() => cell,
                    _ => continue,
                };
                let value = if is_numeric {
                    FeatureValue::Number(cell.parse().unwrap_or_default())
                } else {
                    FeatureValue::Text(cell.to_string())
                };
                record.insert(headers[col].clone(), value);
            }
            record
        })
        .collect();

    let feature_columns: Vec<String> = feature_idx.iter().map(|&i| headers[i].clone()).collect();
    debug!(
        "Feature columns: {:?} (numeric: {:?})",
        feature_columns, numeric
    );

    Ok(Dataset {
        feature_columns,
        records,
        labels,
    })
}
