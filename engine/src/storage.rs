// Artifact files are written first and manifest.json (with SHA-256 digests)
// last. Loading needs the manifest, matching digests and a single run id.

use crate::error::AppError;
use crate::features::DictVectorizer;
use crate::model::LogisticRegression;
use crate::scaler::StandardScaler;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Vectorizer,
    Scaler,
    Classifier,
}

impl ArtifactKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Vectorizer => "dict_vectorizer.json",
            ArtifactKind::Scaler => "scaler.json",
            ArtifactKind::Classifier => "logistic_regression_model.json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RunInfo {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }
}

impl Default for RunInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub run: RunInfo,
    pub vectorizer: DictVectorizer,
    pub scaler: StandardScaler,
    pub classifier: LogisticRegression,
}

impl ArtifactSet {
    pub fn validate(&self) -> Result<(), AppError> {
        let dims = self.vectorizer.len();
        if self.scaler.len() != dims {
            return Err(AppError::dimension_mismatch("scaler", dims, self.scaler.len()));
        }
        if self.classifier.len() != dims {
            return Err(AppError::dimension_mismatch(
                "classifier",
                dims,
                self.classifier.len(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactFile<T> {
    format_version: u32,
    kind: ArtifactKind,
    run: RunInfo,
    payload: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: ArtifactKind,
    pub file: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub run: RunInfo,
    pub n_features: usize,
    pub artifacts: Vec<ManifestEntry>,
}

impl Manifest {
    fn entry(&self, kind: ArtifactKind) -> Result<&ManifestEntry, AppError> {
        self.artifacts
            .iter()
            .find(|e| e.kind == kind)
            .ok_or_else(|| AppError::Artifact(format!("manifest has no {:?} entry", kind)))
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // The old manifest is removed before the swap, so an interrupted swap
    // leaves nothing loadable.
    pub fn save(&self, set: &ArtifactSet) -> Result<Manifest, AppError> {
        set.validate()?;
        fs::create_dir_all(&self.dir)?;

        let staged = [
            self.encode(ArtifactKind::Vectorizer, set.run, &set.vectorizer),
            self.encode(ArtifactKind::Scaler, set.run, &set.scaler),
            self.encode(ArtifactKind::Classifier, set.run, &set.classifier),
        ];

        let mut written: Vec<(PathBuf, ManifestEntry)> = Vec::with_capacity(staged.len());
        for encoded in staged {
            let result = encoded.and_then(|(kind, bytes)| {
                let tmp = self.temp_path(kind.file_name(), set.run.run_id);
                fs::write(&tmp, &bytes)?;
                Ok((
                    tmp,
                    ManifestEntry {
                        kind,
                        file: kind.file_name().to_string(),
                        sha256: digest(&bytes),
                    },
                ))
            });
            match result {
                Ok(entry) => written.push(entry),
                Err(e) => {
                    self.discard(written.iter().map(|(tmp, _)| tmp.as_path()));
                    return Err(e);
                }
            }
        }

        let manifest_path = self.dir.join(MANIFEST_FILE);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }

        let mut entries = Vec::with_capacity(written.len());
        for (i, (tmp, entry)) in written.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, self.dir.join(&entry.file)) {
                // staged files from `i` on were never moved into place
                self.discard(written[i..].iter().map(|(tmp, _)| tmp.as_path()));
                return Err(e.into());
            }
            entries.push(entry.clone());
        }

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            run: set.run,
            n_features: set.vectorizer.len(),
            artifacts: entries,
        };
        let tmp = self.temp_path(MANIFEST_FILE, set.run.run_id);
        fs::write(&tmp, serde_json::to_vec_pretty(&manifest)?)?;
        fs::rename(&tmp, &manifest_path)?;

        info!(
            "Saved artifacts for run {} ({} features) to {}",
            set.run.run_id,
            manifest.n_features,
            self.dir.display()
        );
        Ok(manifest)
    }

    pub fn load_manifest(&self) -> Result<Manifest, AppError> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|e| {
            AppError::Artifact(format!("cannot read {}: {}", path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_slice(&bytes)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(AppError::Artifact(format!(
                "unsupported artifact format version {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }

    pub fn load(&self) -> Result<ArtifactSet, AppError> {
        let manifest = self.load_manifest()?;

        let set = ArtifactSet {
            run: manifest.run,
            vectorizer: self.decode(&manifest, ArtifactKind::Vectorizer)?,
            scaler: self.decode(&manifest, ArtifactKind::Scaler)?,
            classifier: self.decode(&manifest, ArtifactKind::Classifier)?,
        };
        set.validate()?;
        if set.vectorizer.len() != manifest.n_features {
            return Err(AppError::dimension_mismatch(
                "manifest",
                manifest.n_features,
                set.vectorizer.len(),
            ));
        }

        info!(
            "Loaded artifacts for run {} created {} from {}",
            set.run.run_id,
            set.run.created_at.to_rfc3339(),
            self.dir.display()
        );
        Ok(set)
    }

    fn encode<T: Serialize>(
        &self,
        kind: ArtifactKind,
        run: RunInfo,
        payload: &T,
    ) -> Result<(ArtifactKind, Vec<u8>), AppError> {
        let file = ArtifactFile {
            format_version: FORMAT_VERSION,
            kind,
            run,
            payload,
        };
        Ok((kind, serde_json::to_vec_pretty(&file)?))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        manifest: &Manifest,
        kind: ArtifactKind,
    ) -> Result<T, AppError> {
        let entry = manifest.entry(kind)?;
        let path = self.dir.join(&entry.file);
        let bytes = fs::read(&path).map_err(|e| {
            AppError::Artifact(format!("cannot read {}: {}", path.display(), e))
        })?;

        let actual = digest(&bytes);
        if actual != entry.sha256 {
            return Err(AppError::Artifact(format!(
                "{} digest mismatch: manifest {} but file {}",
                entry.file, entry.sha256, actual
            )));
        }

        let file: ArtifactFile<T> = serde_json::from_slice(&bytes)?;
        if file.kind != kind {
            return Err(AppError::Artifact(format!(
                "{} holds a {:?} artifact, expected {:?}",
                entry.file, file.kind, kind
            )));
        }
        if file.run.run_id != manifest.run.run_id {
            return Err(AppError::Artifact(format!(
                "{} belongs to run {}, manifest is run {}",
                entry.file, file.run.run_id, manifest.run.run_id
            )));
        }

        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(file.payload)
    }

    fn temp_path(&self, file_name: &str, run_id: Uuid) -> PathBuf {
        self.dir.join(format!(".{}.{}.tmp", file_name, run_id.simple()))
    }

    fn discard<'a>(&self, paths: impl Iterator<Item = &'a Path>) {
        for path in paths {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to remove staged artifact {}: {}", path.display(), e);
            }
        }
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
