//! Provenance service: builds job activity graphs, persists them next to
//! the job's files, and reports finished activities to the registry.
//!
//! A job goes through two phases:
//! 1. **start**: [`ProvenanceService::start_job`] records the inputs and
//!    stores the activity graph as the job's activity file.
//! 2. **completion**: [`ProvenanceService::complete_job`] rehydrates that
//!    file, adds outputs and the end time, stores it again and submits an
//!    external report.
//!
//! The stored activity file is the checkpoint between the phases, so a
//! failed submission can be repeated with [`ProvenanceService::resubmit`].

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::config::ProvenanceConfig;
use crate::error::{BuildError, CodecError, ConfigError, Result, StorageError};
use crate::graph::{Graph, Timestamp};
use crate::identity::IdentityResolver;
use crate::job::{Job, Solution, UserIdentity};
use crate::model::{Activity, Entity, EntitySet};
use crate::report::{Report, ReportSink};
use crate::storage::{CloudStorage, FileStaging};
use crate::turtle;
use crate::uri::{build_activity_uri, build_output_uri};

/// Result of a completed job's provenance run.
#[derive(Debug, Clone)]
pub struct CompletedJob {
    /// The extended activity graph, as stored.
    pub turtle: String,
    /// Status the registry accepted the report with.
    pub status: u16,
}

/// Builds, stores and reports provenance for jobs.
///
/// Holds no per-job state; one instance can serve many jobs concurrently.
pub struct ProvenanceService {
    server_url: String,
    registry: Url,
    activity_file_name: String,
    service_title: String,
    storages: Vec<Arc<dyn CloudStorage>>,
    staging: Arc<dyn FileStaging>,
    identity: Arc<dyn IdentityResolver>,
    reporter: Arc<dyn ReportSink>,
}

impl ProvenanceService {
    pub fn new(
        config: &ProvenanceConfig,
        staging: Arc<dyn FileStaging>,
        identity: Arc<dyn IdentityResolver>,
        reporter: Arc<dyn ReportSink>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            server_url: config.server_url.clone(),
            registry: config.registry()?,
            activity_file_name: config.activity_file_name.clone(),
            service_title: config.service_title.clone(),
            storages: Vec::new(),
            staging,
            identity,
            reporter,
        })
    }

    /// Register a storage backend. Jobs pick one by `storage_service_id`.
    pub fn with_storage(mut self, storage: Arc<dyn CloudStorage>) -> Self {
        self.storages.push(storage);
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn activity_uri(&self, job: &Job) -> String {
        build_activity_uri(job.id, &self.server_url)
    }

    fn storage_for(&self, job: &Job) -> std::result::Result<&dyn CloudStorage, StorageError> {
        self.storages
            .iter()
            .find(|s| s.id() == job.storage_service_id)
            .map(|s| s.as_ref())
            .ok_or_else(|| StorageError::ServiceNotFound {
                id: job.storage_service_id.clone(),
            })
    }

    /// The entity identifying this portal as the producing service.
    pub fn service_entity(&self) -> Entity {
        Entity::service(&self.server_url).with_title(&self.service_title)
    }

    /// Entities for everything the job consumes: each download, each file
    /// already staged in the job's storage, and the solution.
    ///
    /// A user without a profile link only means attribution edges are left
    /// out.
    pub async fn create_input_entities(
        &self,
        job: &Job,
        solution: &Solution,
        user: &UserIdentity,
    ) -> Result<EntitySet> {
        let link = user.link();
        if link.is_none() {
            tracing::debug!(job_id = job.id, user = %user.id, "No profile link, omitting attribution");
        }

        let mut inputs = EntitySet::new();
        for download in &job.downloads {
            check_uri(&download.url)?;
            let mut entity = Entity::downloadable(&download.url)
                .with_title(&download.name)
                .with_attributed_to(link);
            if let Some(description) = &download.description {
                entity = entity.with_description(description);
            }
            inputs.insert(entity);
        }

        let staged = self.storage_for(job)?.list_job_files(job).await?;
        for file in staged {
            let uri = build_output_uri(job.id, &file.cloud_key, &self.server_url);
            inputs.insert(
                Entity::downloadable(uri)
                    .with_title(&file.cloud_key)
                    .with_attributed_to(link),
            );
        }

        check_uri(&solution.uri)?;
        let mut model = Entity::new(&solution.uri)
            .with_title(&solution.name)
            .with_attributed_to(link);
        if let Some(description) = &solution.description {
            model = model.with_description(description);
        }
        if let Some(created) = solution.created_at {
            model = model.with_created_at(Timestamp::from_utc(created));
        }
        inputs.insert(model);

        tracing::debug!(job_id = job.id, inputs = inputs.len(), "Built input entities");
        Ok(inputs)
    }

    /// The start-of-job activity: inputs, the service entity, and no end time.
    pub async fn build_activity(
        &self,
        job: &Job,
        solution: &Solution,
        user: &UserIdentity,
    ) -> Result<Activity> {
        let inputs = self.create_input_entities(job, solution, user).await?;
        let started = job
            .process_date
            .map(Timestamp::from_utc)
            .unwrap_or_else(Timestamp::now);

        let mut activity = Activity::new(self.activity_uri(job))
            .with_title(&job.name)
            .with_started_at(started)
            .with_associated_with(user.link())
            .with_used(inputs)
            .with_used([self.service_entity()]);
        if let Some(description) = &job.description {
            activity = activity.with_description(description);
        }
        Ok(activity)
    }

    /// Serialized start-of-job activity graph. Not persisted; see
    /// [`start_job`](Self::start_job).
    pub async fn create_activity(
        &self,
        job: &Job,
        solution: &Solution,
        user: &UserIdentity,
    ) -> Result<String> {
        let activity = self.build_activity(job, solution, user).await?;
        Ok(turtle::serialize(&activity.to_graph()))
    }

    /// Build the start-of-job activity and store it as the job's activity file.
    pub async fn start_job(
        &self,
        job: &Job,
        solution: &Solution,
        user: &UserIdentity,
    ) -> Result<String> {
        let graph = self.build_activity(job, solution, user).await?.to_graph();
        self.upload_model(&graph, job).await?;
        tracing::info!(job_id = job.id, statements = graph.len(), "Recorded job start provenance");
        Ok(turtle::serialize(&graph))
    }

    /// Output entities for the files the job reports, attributed to
    /// `user_link`. Files that storage does not list are skipped.
    pub async fn output_entities(&self, job: &Job, user_link: Option<&str>) -> Result<EntitySet> {
        let listed: HashSet<String> = self
            .storage_for(job)?
            .list_job_files(job)
            .await?
            .into_iter()
            .map(|f| f.cloud_key)
            .collect();

        let mut outputs = EntitySet::new();
        for file in &job.files {
            if !listed.contains(&file.cloud_key) {
                tracing::warn!(
                    job_id = job.id,
                    key = %file.cloud_key,
                    "Job file missing from storage, leaving it out of provenance"
                );
                continue;
            }
            let uri = build_output_uri(job.id, &file.cloud_key, &self.server_url);
            outputs.insert(
                Entity::downloadable(uri)
                    .with_title(&file.cloud_key)
                    .with_attributed_to(user_link),
            );
        }
        Ok(outputs)
    }

    /// Fetch and rehydrate the job's stored activity.
    pub async fn fetch_activity(&self, job: &Job) -> Result<Activity> {
        let storage = self.storage_for(job)?;
        let bytes = match storage.get_job_file(job, &self.activity_file_name).await {
            Ok(bytes) => bytes,
            Err(StorageError::FileNotFound { .. }) => {
                return Err(BuildError::MissingActivityRecord {
                    job_id: job.id,
                    file: self.activity_file_name.clone(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        let text = String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        let graph = turtle::parse(&text, Some(self.server_url.as_str()))?;
        Ok(Activity::from_graph(&self.activity_uri(job), &graph)?)
    }

    /// The stored activity extended with outputs and an end time.
    pub async fn extend_activity(&self, job: &Job) -> Result<Activity> {
        let link = self.responsible_link(job).await;
        let outputs = self.output_entities(job, link.as_deref()).await?;
        let activity = self.fetch_activity(job).await?;
        tracing::debug!(
            job_id = job.id,
            outputs = outputs.len(),
            carried = activity.passthrough().len(),
            "Extending stored activity"
        );
        Ok(activity
            .with_ended_at(Timestamp::now())
            .with_generated(outputs))
    }

    /// Serialized completion-time activity graph. Not persisted; see
    /// [`complete_job`](Self::complete_job).
    pub async fn create_output_entities(&self, job: &Job) -> Result<String> {
        let activity = self.extend_activity(job).await?;
        Ok(turtle::serialize(&activity.to_graph()))
    }

    /// Serialize `graph` into a staged file and upload it as the job's
    /// activity file.
    pub async fn upload_model(&self, graph: &Graph, job: &Job) -> Result<()> {
        let storage = self.storage_for(job)?;
        let text = turtle::serialize(graph);
        let path = self
            .staging
            .create_local_file(&self.activity_file_name, job)
            .await?;
        tokio::fs::write(&path, text.as_bytes()).await?;
        storage.upload_job_files(job, &[path]).await?;
        tracing::debug!(job_id = job.id, bytes = text.len(), "Stored activity graph");
        Ok(())
    }

    /// Wrap `activity` in an external report and post it to the registry.
    pub async fn submit_activity(&self, job: &Job, activity: &Activity) -> Result<u16> {
        let report = Report::external(activity.clone())
            .with_title(&job.name)
            .with_native_id(job.id.to_string())
            .with_reporting_system(&self.server_url);

        match self.reporter.post_report(&self.registry, &report).await {
            Ok(status) => {
                tracing::info!(job_id = job.id, status, "Registry accepted provenance report");
                Ok(status)
            }
            Err(e) => {
                tracing::warn!(
                    job_id = job.id,
                    error = %e,
                    "Provenance report not accepted; stored activity can be resubmitted"
                );
                Err(e.into())
            }
        }
    }

    /// Extend, store, and report a finished job.
    ///
    /// The extended graph is stored before submission, so a submission error
    /// leaves a complete activity file behind.
    pub async fn complete_job(&self, job: &Job) -> Result<CompletedJob> {
        let activity = self.extend_activity(job).await?;
        let graph = activity.to_graph();
        self.upload_model(&graph, job).await?;
        let status = self.submit_activity(job, &activity).await?;
        Ok(CompletedJob {
            turtle: turtle::serialize(&graph),
            status,
        })
    }

    /// Extend and store a finished job without reporting it.
    pub async fn record_completion(&self, job: &Job) -> Result<String> {
        let graph = self.extend_activity(job).await?.to_graph();
        self.upload_model(&graph, job).await?;
        Ok(turtle::serialize(&graph))
    }

    /// Report the job's stored activity again.
    pub async fn resubmit(&self, job: &Job) -> Result<u16> {
        let activity = self.fetch_activity(job).await?;
        self.submit_activity(job, &activity).await
    }

    async fn responsible_link(&self, job: &Job) -> Option<String> {
        match self.identity.resolve(&job.user).await {
            Ok(Some(user)) => {
                if user.link.is_none() {
                    tracing::debug!(job_id = job.id, user = %job.user, "No profile link, omitting attribution");
                }
                user.link
            }
            Ok(None) => {
                tracing::debug!(job_id = job.id, user = %job.user, "Unknown user, omitting attribution");
                None
            }
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Identity lookup failed, omitting attribution");
                None
            }
        }
    }
}

fn check_uri(uri: &str) -> std::result::Result<(), BuildError> {
    Url::parse(uri)
        .map(|_| ())
        .map_err(|e| BuildError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
}
