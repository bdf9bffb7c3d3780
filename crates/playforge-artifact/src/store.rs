//! Artifact store
//!
//! The output directory holding every generated playbook. Artifacts are
//! write-once: a new request always produces a new file.

use crate::error::StoreError;
use crate::matcher::{self, score_document, CandidateArtifact};
use crate::name::ArtifactName;
use chrono::{DateTime, Local};
use playforge_intent::{IntentKind, ParameterSet};
use serde_yaml::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Name attempts before giving up on a free slot
const MAX_NAME_ATTEMPTS: usize = 120;

/// Directory of persisted artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create store rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if missing
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created
    pub async fn ensure(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io_error(&self.root, e))
    }

    /// Persist `body` under `name`, or the next free second after it
    ///
    /// Never overwrites an existing file.
    ///
    /// # Errors
    /// - `StoreError::Io` on write failure
    /// - `StoreError::NameExhausted` if no free name was found
    pub async fn write_new(&self, name: ArtifactName, body: &str) -> Result<PathBuf, StoreError> {
        self.ensure().await?;

        let mut name = name;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.root.join(name.file_name());
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match opened {
                Ok(mut file) => {
                    file.write_all(body.as_bytes())
                        .await
                        .map_err(|e| StoreError::io_error(&path, e))?;
                    file.flush()
                        .await
                        .map_err(|e| StoreError::io_error(&path, e))?;
                    tracing::info!(path = %path.display(), bytes = body.len(), "artifact written");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(name = %name, "artifact name taken, trying next second");
                    name = name.next_second();
                }
                Err(e) => return Err(StoreError::io_error(&path, e)),
            }
        }

        Err(StoreError::NameExhausted(name.file_name()))
    }

    /// Stored artifacts of `intent`, scored against `params` and ranked
    ///
    /// Files that cannot be read or do not parse as YAML are left out.
    /// A missing directory yields no candidates.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory exists but cannot be listed
    pub async fn find_candidates(
        &self,
        intent: IntentKind,
        params: &ParameterSet,
    ) -> Result<Vec<CandidateArtifact>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io_error(&self.root, e)),
        };

        let prefix = ArtifactName::prefix_for(intent);
        let mut candidates = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io_error(&self.root, e))?
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with(&prefix) || !is_yaml(&file_name) {
                continue;
            }
            if let Some(candidate) = load_candidate(entry.path(), file_name, params).await {
                candidates.push(candidate);
            }
        }

        matcher::rank(&mut candidates);
        tracing::debug!(
            intent = %intent,
            candidates = candidates.len(),
            top = candidates.first().map(|c| c.score),
            "artifact scan finished"
        );
        Ok(candidates)
    }
}

fn is_yaml(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

async fn load_candidate(
    path: PathBuf,
    file_name: String,
    params: &ParameterSet,
) -> Option<CandidateArtifact> {
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
            return None;
        }
    };
    let body = match tokio::fs::read_to_string(&path).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
            return None;
        }
    };

    let document: Value = match serde_yaml::from_str(&body) {
        Ok(Value::Null) => return None,
        Ok(document) => document,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping malformed artifact");
            return None;
        }
    };

    let score = score_document(&document, params);
    tracing::debug!(file = %file_name, score, "scored artifact");

    Some(CandidateArtifact {
        file_name,
        created: metadata.created().ok().map(DateTime::<Local>::from),
        modified: metadata.modified().ok().map(DateTime::<Local>::from),
        size: metadata.len(),
        path,
        body,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn jan_first() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap()
    }

    #[tokio::test]
    async fn write_new_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("output"));
        let name = ArtifactName::at(IntentKind::InstallPackage, "ubuntu", jan_first());

        let first = store.write_new(name.clone(), "first").await.unwrap();
        let second = store.write_new(name, "second").await.unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("install_package_ubuntu_20240101_000001.yml"));
        assert_eq!(tokio::fs::read_to_string(&first).await.unwrap(), "first");
        assert_eq!(tokio::fs::read_to_string(&second).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn missing_directory_has_no_candidates() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("nope"));
        let candidates = store
            .find_candidates(IntentKind::InstallPackage, &ParameterSet::default())
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn scan_filters_by_prefix_and_skips_malformed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("install_package_all_20240101_000000.yml"), "- hosts: all\n  vars: {pkg: git}\n").unwrap();
        std::fs::write(root.join("install_package_all_20240101_000001.yml"), "- hosts: [\n").unwrap();
        std::fs::write(root.join("install_package_all_20240101_000002.yml"), "").unwrap();
        std::fs::write(root.join("create_user_all_20240101_000000.yml"), "git").unwrap();
        std::fs::write(root.join("install_package_notes.txt"), "git").unwrap();

        let store = ArtifactStore::new(root);
        let params = ParameterSet::default().with("package_name", "git");
        let candidates = store
            .find_candidates(IntentKind::InstallPackage, &params)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        let only = &candidates[0];
        assert_eq!(only.file_name, "install_package_all_20240101_000000.yml");
        assert!((only.score - 1.0).abs() < f64::EPSILON);
        assert_eq!(only.size, only.body.len() as u64);
        assert!(only.modified.is_some());
    }
}
