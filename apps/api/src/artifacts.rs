//! Per-job artifact directories under the data dir.
//!
//! Layout: `<data_dir>/<job_id>/{resumes,offers,contracts,emails}/<file>`.

use std::path::{Path, PathBuf};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Resumes,
    Offers,
    Contracts,
    Emails,
}

impl ArtifactKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Resumes => "resumes",
            ArtifactKind::Offers => "offers",
            ArtifactKind::Contracts => "contracts",
            ArtifactKind::Emails => "emails",
        }
    }
}

/// Rejects ids that would escape the data directory when used as a path segment.
pub fn check_segment(label: &str, value: &str) -> Result<(), AppError> {
    let bad = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(AppError::Validation(format!("Invalid {label}: {value:?}")));
    }
    Ok(())
}

pub fn artifact_dir(data_dir: &Path, job_id: &str, kind: ArtifactKind) -> Result<PathBuf, AppError> {
    check_segment("job id", job_id)?;
    Ok(data_dir.join(job_id).join(kind.dir_name()))
}

pub fn artifact_path(
    data_dir: &Path,
    job_id: &str,
    kind: ArtifactKind,
    file_name: &str,
) -> Result<PathBuf, AppError> {
    check_segment("file name", file_name)?;
    Ok(artifact_dir(data_dir, job_id, kind)?.join(file_name))
}

/// Writes `contents` to the artifact path, creating parent directories.
pub async fn write_artifact(
    data_dir: &Path,
    job_id: &str,
    kind: ArtifactKind,
    file_name: &str,
    contents: &[u8],
) -> Result<PathBuf, AppError> {
    let path = artifact_path(data_dir, job_id, kind, file_name)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_failure(parent, e))?;
    }
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| io_failure(&path, e))?;
    tracing::debug!("Wrote artifact {}", path.display());
    Ok(path)
}

/// Replaces anything outside `[A-Za-z0-9_-]` so a display name can be used as a file stem.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem
    }
}

pub(crate) fn io_failure(path: &Path, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::NotFound(format!("{} does not exist", path.display()))
    } else {
        AppError::Internal(anyhow::Error::new(err).context(format!("I/O on {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_segments_rejected() {
        for bad in ["", "..", "a/b", "a\\b", "  "] {
            assert!(check_segment("job id", bad).is_err(), "{bad:?} accepted");
        }
        assert!(check_segment("job id", "3f1c-22").is_ok());
    }

    #[test]
    fn test_artifact_layout() {
        let path = artifact_path(Path::new("/tmp/data"), "job1", ArtifactKind::Offers, "x.txt").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/data/job1/offers/x.txt"));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Ada Lovelace"), "Ada_Lovelace");
        assert_eq!(file_stem("../etc"), "___etc");
        assert_eq!(file_stem(""), "unnamed");
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "job1", ArtifactKind::Emails, "a.txt", b"hi")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), "hi");
    }
}
