//! Report envelopes and submission to a PROMS-style provenance registry.
//!
//! A [`Report`] wraps one finished [`Activity`] with reporting metadata. It
//! is built for a single submission and never stored. [`ReportSink`] is the
//! seam for sending it: [`HttpReporter`] posts Turtle over HTTP, and
//! [`RecordingReporter`] captures submissions in memory for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::ReportError;
use crate::graph::{Graph, GraphBuilder, Literal, Term};
use crate::model::Activity;
use crate::turtle;
use crate::vocab::{proms, rdfs};

/// PROMS report classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Basic,
    Internal,
    External,
}

impl ReportKind {
    pub fn class_iri(self) -> &'static str {
        match self {
            ReportKind::Basic => proms::BASIC_REPORT,
            ReportKind::Internal => proms::INTERNAL_REPORT,
            ReportKind::External => proms::EXTERNAL_REPORT,
        }
    }
}

/// One submission of an activity to a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    kind: ReportKind,
    title: String,
    native_id: String,
    reporting_system: String,
    activity: Activity,
}

impl Report {
    pub fn new(kind: ReportKind, activity: Activity) -> Self {
        Self {
            kind,
            title: String::new(),
            native_id: String::new(),
            reporting_system: String::new(),
            activity,
        }
    }

    /// A report about a system outside the registry's own organisation.
    pub fn external(activity: Activity) -> Self {
        Self::new(ReportKind::External, activity)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The reporting system's own identifier for the job.
    pub fn with_native_id(mut self, native_id: impl Into<String>) -> Self {
        self.native_id = native_id.into();
        self
    }

    pub fn with_reporting_system(mut self, uri: impl Into<String>) -> Self {
        self.reporting_system = uri.into();
        self
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn native_id(&self) -> &str {
        &self.native_id
    }

    pub fn reporting_system(&self) -> &str {
        &self.reporting_system
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// `<activity>#report`; one report URI per job.
    pub fn uri(&self) -> String {
        format!("{}#report", self.activity.uri())
    }

    pub fn to_graph(&self) -> Graph {
        let subject = Term::iri(self.uri());
        let activity = self.activity.subject();
        let mut builder = GraphBuilder::new();
        builder
            .add_type(&subject, proms::REPORT)
            .add_type(&subject, self.kind.class_iri())
            .add(&subject, proms::STARTING_ACTIVITY, activity.clone())
            .add(&subject, proms::ENDING_ACTIVITY, activity);
        if !self.title.is_empty() {
            builder.add(&subject, rdfs::LABEL, Literal::string(&self.title));
        }
        if !self.native_id.is_empty() {
            builder.add(&subject, proms::NATIVE_ID, Literal::string(&self.native_id));
        }
        if !self.reporting_system.is_empty() {
            builder.add(
                &subject,
                proms::REPORTING_SYSTEM,
                Term::iri(&self.reporting_system),
            );
        }
        self.activity.write_to(&mut builder);
        builder.build()
    }

    pub fn to_turtle(&self) -> String {
        turtle::serialize(&self.to_graph())
    }
}

/// Map a registry status to the submission outcome: only 200 and 201 count
/// as accepted.
pub fn status_outcome(status: u16) -> Result<u16, ReportError> {
    match status {
        200 | 201 => Ok(status),
        _ => Err(ReportError::Rejected { status }),
    }
}

/// Destination for finished reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Submit `report` to `registry`. Returns the accepting status (200 or
    /// 201); any other status or a transport failure is an error. Never
    /// retries.
    async fn post_report(&self, registry: &Url, report: &Report) -> Result<u16, ReportError>;
}

/// Posts reports as `text/turtle` over HTTP.
pub struct HttpReporter {
    client: reqwest::Client,
}

impl HttpReporter {
    pub fn new(timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReportSink for HttpReporter {
    async fn post_report(&self, registry: &Url, report: &Report) -> Result<u16, ReportError> {
        let body = report.to_turtle();
        tracing::debug!(
            registry = %registry,
            report = %report.uri(),
            bytes = body.len(),
            "Posting provenance report"
        );

        let response = self
            .client
            .post(registry.clone())
            .header(CONTENT_TYPE, "text/turtle")
            .body(body)
            .send()
            .await
            .map_err(|e| ReportError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        tracing::info!(registry = %registry, status, "Registry responded");
        status_outcome(status)
    }
}

/// A report captured by [`RecordingReporter`].
#[derive(Debug, Clone)]
pub struct RecordedReport {
    pub registry: Url,
    pub report_uri: String,
    pub body: String,
}

/// In-memory sink for testing. Records every submission and answers with a
/// fixed status.
pub struct RecordingReporter {
    status: u16,
    reports: Mutex<Vec<RecordedReport>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::with_status(201)
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn reports(&self) -> Vec<RecordedReport> {
        self.reports.lock().unwrap().clone()
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for RecordingReporter {
    async fn post_report(&self, registry: &Url, report: &Report) -> Result<u16, ReportError> {
        self.reports.lock().unwrap().push(RecordedReport {
            registry: registry.clone(),
            report_uri: report.uri(),
            body: report.to_turtle(),
        });
        status_outcome(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Timestamp;
    use crate::model::Entity;
    use crate::vocab::prov;

    const JOB: &str = "http://portal-fake.vhirl.org/secure/getJobObject.do?jobId=1";

    fn report() -> Report {
        let activity = Activity::new(JOB)
            .with_started_at(Timestamp::parse("2016-03-01T10:00:00.000Z").unwrap())
            .with_ended_at(Timestamp::parse("2016-03-01T11:00:00.000Z").unwrap())
            .with_generated([Entity::downloadable("http://e/out")]);
        Report::external(activity)
            .with_title("Cool Job")
            .with_native_id("1")
            .with_reporting_system("http://portal-fake.vhirl.org")
    }

    #[test]
    fn test_status_outcome() {
        assert_eq!(status_outcome(200).unwrap(), 200);
        assert_eq!(status_outcome(201).unwrap(), 201);
        for status in [202, 204, 301, 400, 404, 500, 503] {
            assert!(matches!(
                status_outcome(status),
                Err(ReportError::Rejected { status: s }) if s == status
            ));
        }
    }

    #[test]
    fn test_report_graph_envelope() {
        let report = report();
        let graph = report.to_graph();
        let subject = Term::iri(report.uri());
        assert_eq!(report.uri(), format!("{JOB}#report"));
        assert!(graph.has_type(&subject, proms::REPORT));
        assert!(graph.has_type(&subject, proms::EXTERNAL_REPORT));
        assert_eq!(
            graph.objects(&subject, proms::NATIVE_ID).next(),
            Some(&Term::Literal(Literal::string("1")))
        );
        assert_eq!(
            graph.objects(&subject, proms::REPORTING_SYSTEM).next(),
            Some(&Term::iri("http://portal-fake.vhirl.org"))
        );
        let activity = Term::iri(JOB);
        assert!(graph.has_type(&activity, prov::ACTIVITY));
        assert_eq!(graph.objects(&activity, prov::GENERATED).count(), 1);
    }

    #[test]
    fn test_report_turtle_has_no_blank_nodes() {
        let text = report().to_turtle();
        assert!(!text.contains("_:"));
        assert!(text.contains("<http://promsns.org/def/proms#ExternalReport>"));
        assert!(text.contains("<http://www.w3.org/ns/prov#endedAtTime>"));
    }

    #[test]
    fn test_report_kind_classes() {
        assert_eq!(ReportKind::Basic.class_iri(), proms::BASIC_REPORT);
        assert_eq!(ReportKind::Internal.class_iri(), proms::INTERNAL_REPORT);
        assert_eq!(ReportKind::External.class_iri(), proms::EXTERNAL_REPORT);
    }

    #[tokio::test]
    async fn test_recording_reporter() {
        let registry = Url::parse("http://proms-dev.vhirl.net/id/report/").unwrap();
        let accepting = RecordingReporter::new();
        assert_eq!(accepting.post_report(&registry, &report()).await.unwrap(), 201);
        assert_eq!(accepting.reports().len(), 1);
        assert_eq!(accepting.reports()[0].report_uri, format!("{JOB}#report"));

        let rejecting = RecordingReporter::with_status(500);
        let err = rejecting.post_report(&registry, &report()).await.unwrap_err();
        assert!(matches!(err, ReportError::Rejected { status: 500 }));
        assert_eq!(rejecting.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_http_reporter_unreachable_registry() {
        let reporter = HttpReporter::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections.
        let registry = Url::parse("http://127.0.0.1:9/report").unwrap();
        let err = reporter.post_report(&registry, &report()).await.unwrap_err();
        assert!(matches!(err, ReportError::Transport { .. }));
    }
}
