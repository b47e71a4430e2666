//! Job, solution and user metadata consumed by the graph builder.
//!
//! These mirror the records owned by the portal's job store; the core only
//! reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A compute job as recorded by the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Identifier of the responsible user (typically an email address).
    pub user: String,
    #[serde(default)]
    pub process_date: Option<DateTime<Utc>>,
    /// Which registered cloud storage service holds this job's files.
    pub storage_service_id: String,
    #[serde(default)]
    pub downloads: Vec<Download>,
    /// Files the job reports having produced.
    #[serde(default)]
    pub files: Vec<FileInformation>,
}

/// A dataset the job fetched before running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub parent_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A file the job says it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInformation {
    pub cloud_key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub details: Option<String>,
}

impl FileInformation {
    pub fn new(cloud_key: impl Into<String>) -> Self {
        Self {
            cloud_key: cloud_key.into(),
            size: 0,
            details: None,
        }
    }
}

/// A file as listed by a cloud storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudFileInformation {
    pub cloud_key: String,
    pub size: u64,
    #[serde(default)]
    pub public_url: Option<String>,
}

impl CloudFileInformation {
    pub fn new(cloud_key: impl Into<String>, size: u64) -> Self {
        Self {
            cloud_key: cloud_key.into(),
            size,
            public_url: None,
        }
    }
}

/// The solution (model/workflow) a job ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A resolved portal user. `link` is the profile URI used as the PROV agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, link: Option<&str>) -> Self {
        Self {
            id: id.into(),
            link: link.map(str::to_string),
        }
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserializes_with_defaults() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "Cool Job",
                "user": "foo@test.com",
                "storage_service_id": "fluffy Cloud"
            }"#,
        )
        .unwrap();
        assert_eq!(job.id, 1);
        assert!(job.downloads.is_empty());
        assert!(job.files.is_empty());
        assert!(job.process_date.is_none());
    }

    #[test]
    fn test_job_deserializes_downloads_and_files() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": 2,
                "name": "j",
                "user": "u",
                "storage_service_id": "s",
                "process_date": "2013-02-12T00:00:00Z",
                "downloads": [{"name": "file1", "url": "http://portal-uploads.vhirl.org/file1"}],
                "files": [{"cloud_key": "cloudKey", "size": 10}]
            }"#,
        )
        .unwrap();
        assert_eq!(job.downloads[0].name, "file1");
        assert_eq!(job.files[0].cloud_key, "cloudKey");
        assert!(job.process_date.is_some());
    }

    #[test]
    fn test_user_identity_link() {
        let user = UserIdentity::new("foo@test.com", Some("https://plus.google.com/1"));
        assert_eq!(user.link(), Some("https://plus.google.com/1"));
        assert_eq!(UserIdentity::new("x", None).link(), None);
    }
}
