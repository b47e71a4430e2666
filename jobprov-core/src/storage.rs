//! Cloud storage and file staging collaborators.
//!
//! Provides trait-based abstractions with two kinds of implementation:
//! - `LocalDirStorage` / `LocalFileStaging`: job files kept under a local
//!   directory, one `job-<id>/` folder per job.
//! - `InMemoryCloudStorage`: in-memory store for testing.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::StorageError;
use crate::job::{CloudFileInformation, Job};

/// A cloud object store holding the files of many jobs.
#[async_trait]
pub trait CloudStorage: Send + Sync {
    /// Identifier matched against `Job::storage_service_id`.
    fn id(&self) -> &str;

    /// List the files currently stored for `job`.
    async fn list_job_files(&self, job: &Job) -> Result<Vec<CloudFileInformation>, StorageError>;

    /// Fetch the contents of one job file.
    async fn get_job_file(&self, job: &Job, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Upload local files into the job's storage, keyed by file name.
    async fn upload_job_files(&self, job: &Job, files: &[PathBuf]) -> Result<(), StorageError>;
}

/// Hands out job-scoped local paths for files about to be uploaded.
#[async_trait]
pub trait FileStaging: Send + Sync {
    async fn create_local_file(&self, name: &str, job: &Job) -> Result<PathBuf, StorageError>;
}

const UPLOAD_TMP_SUFFIX: &str = ".upload.tmp";

fn job_dir(root: &Path, job: &Job) -> PathBuf {
    root.join(format!("job-{}", job.id))
}

/// Reject keys that would escape the job directory.
fn checked_key(key: &str) -> Result<&Path, StorageError> {
    let path = Path::new(key);
    let plain = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(StorageError::Backend {
            message: format!("illegal file key '{key}'"),
        })
    }
}

fn file_name_of(path: &Path) -> Result<String, StorageError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| StorageError::UploadFailed {
            path: path.to_path_buf(),
            message: "path has no file name".into(),
        })
}

/// Every regular file below `dir`, keyed by its `/`-joined relative path.
/// A missing directory lists nothing. Interrupted uploads are skipped.
fn list_dir_files(dir: &Path) -> Result<Vec<CloudFileInformation>, StorageError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|e| StorageError::Backend {
            message: format!("failed to walk {}: {e}", dir.display()),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        let Some(parts) = parts else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 job file");
            continue;
        };
        let key = parts.join("/");
        if key.ends_with(UPLOAD_TMP_SUFFIX) {
            continue;
        }
        let size = entry
            .metadata()
            .map_err(|e| StorageError::Backend {
                message: format!("failed to stat {}: {e}", entry.path().display()),
            })?
            .len();
        files.push(CloudFileInformation::new(key, size));
    }
    files.sort_by(|a, b| a.cloud_key.cmp(&b.cloud_key));
    Ok(files)
}

/// Job files stored under `<root>/job-<id>/`.
pub struct LocalDirStorage {
    id: String,
    root: PathBuf,
}

impl LocalDirStorage {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl CloudStorage for LocalDirStorage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_job_files(&self, job: &Job) -> Result<Vec<CloudFileInformation>, StorageError> {
        let dir = job_dir(&self.root, job);
        tokio::task::spawn_blocking(move || list_dir_files(&dir))
            .await
            .map_err(|e| StorageError::Backend {
                message: format!("listing task failed: {e}"),
            })?
    }

    async fn get_job_file(&self, job: &Job, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = job_dir(&self.root, job).join(checked_key(key)?);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::FileNotFound {
                job_id: job.id,
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn upload_job_files(&self, job: &Job, files: &[PathBuf]) -> Result<(), StorageError> {
        let dir = job_dir(&self.root, job);
        tokio::fs::create_dir_all(&dir).await?;
        for file in files {
            let name = file_name_of(file)?;
            let target = dir.join(&name);
            // Write via a temp sibling then rename so readers never see a torn file.
            let tmp = dir.join(format!("{name}{UPLOAD_TMP_SUFFIX}"));
            tokio::fs::copy(file, &tmp)
                .await
                .map_err(|e| StorageError::UploadFailed {
                    path: file.clone(),
                    message: e.to_string(),
                })?;
            tokio::fs::rename(&tmp, &target).await?;
            tracing::debug!(job_id = job.id, key = %name, "Uploaded job file");
        }
        Ok(())
    }
}

/// Stages files under `<root>/job-<id>/`.
pub struct LocalFileStaging {
    root: PathBuf,
}

impl LocalFileStaging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStaging for LocalFileStaging {
    async fn create_local_file(&self, name: &str, job: &Job) -> Result<PathBuf, StorageError> {
        let dir = job_dir(&self.root, job);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(checked_key(name)?);
        tokio::fs::File::create(&path).await?;
        Ok(path)
    }
}

/// In-memory cloud storage for testing.
///
/// Thread-safe via `Mutex<HashMap>`. Does not persist across process restarts.
pub struct InMemoryCloudStorage {
    id: String,
    files: Mutex<HashMap<u64, BTreeMap<String, Vec<u8>>>>,
    unavailable: AtomicBool,
}

impl InMemoryCloudStorage {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            files: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Seed a file for a job.
    pub fn put(&self, job_id: u64, key: &str, contents: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .entry(job_id)
            .or_default()
            .insert(key.to_string(), contents.into());
    }

    /// Read back a stored file.
    pub fn contents(&self, job_id: u64, key: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&job_id)
            .and_then(|files| files.get(key).cloned())
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Backend {
                message: format!("storage '{}' unavailable", self.id),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CloudStorage for InMemoryCloudStorage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_job_files(&self, job: &Job) -> Result<Vec<CloudFileInformation>, StorageError> {
        self.check_available()?;
        let files = self.files.lock().unwrap();
        Ok(files
            .get(&job.id)
            .map(|files| {
                files
                    .iter()
                    .map(|(key, bytes)| CloudFileInformation::new(key, bytes.len() as u64))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_job_file(&self, job: &Job, key: &str) -> Result<Vec<u8>, StorageError> {
        self.check_available()?;
        self.contents(job.id, key)
            .ok_or_else(|| StorageError::FileNotFound {
                job_id: job.id,
                key: key.to_string(),
            })
    }

    async fn upload_job_files(&self, job: &Job, files: &[PathBuf]) -> Result<(), StorageError> {
        self.check_available()?;
        for file in files {
            let name = file_name_of(file)?;
            let bytes = tokio::fs::read(file)
                .await
                .map_err(|e| StorageError::UploadFailed {
                    path: file.clone(),
                    message: e.to_string(),
                })?;
            self.put(job.id, &name, bytes);
        }
        Ok(())
    }
}
