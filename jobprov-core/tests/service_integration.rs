//! Integration tests for the provenance service against in-memory
//! collaborators.
//!
//! Walks a job through start, completion and rehydration, and checks the
//! serialized graphs for the exact blocks a registry consumer reads.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use jobprov_core::vocab::prov;
use jobprov_core::{
    Activity, Download, Entity, FileInformation, Graph, InMemoryCloudStorage, Job,
    LocalFileStaging, ProvenanceConfig, ProvenanceService, RecordingReporter, Solution,
    StaticIdentityResolver, Term, Timestamp, UserIdentity, build_activity_uri, build_output_uri,
    turtle,
};

const SERVER: &str = "http://portal-fake.vhirl.org";
const REGISTRY: &str = "http://proms-dev.vhirl.net/id/report/";
const USER_LINK: &str = "https://plus.google.com/1";
const CLOUD: &str = "fluffy Cloud";
const ACTIVITY_FILE: &str = "activity.ttl";
const STORED_ACTIVITY: &str = include_str!("fixtures/activity.ttl");

const INITIAL_TURTLE: &str = "<http://portal-fake.vhirl.org/secure/getJobObject.do?jobId=1>\n      a       <http://www.w3.org/ns/prov#Activity> ;\n";

const INTERMEDIATE_TURTLE: &str = concat!(
    "      a       <http://www.w3.org/ns/prov#Entity> ;\n",
    "      <http://www.w3.org/2000/01/rdf-schema#label>\n",
    "              \"activity.ttl\"^^<http://www.w3.org/2001/XMLSchema#string> ;\n",
    "      <http://www.w3.org/ns/dcat#downloadURL>\n",
    "              \"http://portal-fake.vhirl.org/secure/jobFile.do?jobId=1&key=activity.ttl\"^^<http://www.w3.org/2001/XMLSchema#anyURI> ;\n",
    "      <http://www.w3.org/ns/prov#wasAttributedTo>\n",
    "              <https://plus.google.com/1> ."
);

const CLOUD_KEY_TURTLE: &str = concat!(
    "      a       <http://www.w3.org/ns/prov#Entity> ;\n",
    "      <http://www.w3.org/2000/01/rdf-schema#label>\n",
    "              \"cloudKey\"^^<http://www.w3.org/2001/XMLSchema#string> ;\n",
    "      <http://www.w3.org/ns/dcat#downloadURL>\n",
    "              \"http://portal-fake.vhirl.org/secure/jobFile.do?jobId=1&key=cloudKey\"^^<http://www.w3.org/2001/XMLSchema#anyURI> ;\n",
    "      <http://www.w3.org/ns/prov#wasAttributedTo>\n",
    "              <https://plus.google.com/1> ."
);

const ENDED_TURTLE: &str = "<http://www.w3.org/ns/prov#endedAtTime>";
const SERVICE_TURTLE: &str = "<http://promsns.org/def/proms#ServiceEntity>";

struct Harness {
    service: ProvenanceService,
    storage: Arc<InMemoryCloudStorage>,
    reporter: Arc<RecordingReporter>,
    _staging: tempfile::TempDir,
}

fn harness() -> Harness {
    let staging = tempfile::tempdir().unwrap();
    let config = ProvenanceConfig {
        server_url: SERVER.into(),
        registry_url: REGISTRY.into(),
        service_title: "Virtual Hazards, Impact and Risk Laboratory".into(),
        ..ProvenanceConfig::default()
    };
    let storage = Arc::new(InMemoryCloudStorage::new(CLOUD));
    let reporter = Arc::new(RecordingReporter::new());
    let identity = StaticIdentityResolver::new().with_user("foo@test.com", USER_LINK);
    let service = ProvenanceService::new(
        &config,
        Arc::new(LocalFileStaging::new(staging.path())),
        Arc::new(identity),
        reporter.clone(),
    )
    .unwrap()
    .with_storage(storage.clone());
    Harness {
        service,
        storage,
        reporter,
        _staging: staging,
    }
}

fn prepared_job() -> Job {
    Job {
        id: 1,
        name: "Cool Job".into(),
        description: Some("Some job I made.".into()),
        user: "foo@test.com".into(),
        process_date: Some(chrono::Utc::now()),
        storage_service_id: CLOUD.into(),
        downloads: vec![Download {
            id: Some(1),
            name: "file1".into(),
            url: "http://portal-uploads.vhirl.org/file1?download=true".into(),
            parent_url: Some("http://portal-uploads.vhirl.org/".into()),
            description: None,
        }],
        files: vec![FileInformation::new("cloudKey")],
    }
}

fn solution() -> Solution {
    Solution {
        uri: "http://sssc.vhirl.org/solution1".into(),
        name: "FakeSol".into(),
        description: Some("A Fake Solution".into()),
        created_at: Some(chrono::Utc::now()),
    }
}

fn user() -> UserIdentity {
    UserIdentity::new("foo@test.com", Some(USER_LINK))
}

/// Storage as the portal leaves it mid-run: one result file and the stored
/// start-of-job activity.
fn seed_storage(storage: &InMemoryCloudStorage) {
    storage.put(1, "cloudKey", Vec::new());
    storage.put(1, ACTIVITY_FILE, STORED_ACTIVITY);
}

#[test]
fn test_job_url() {
    assert_eq!(
        build_activity_uri(1, SERVER),
        "http://portal-fake.vhirl.org/secure/getJobObject.do?jobId=1"
    );
}

#[test]
fn test_output_url() {
    assert_eq!(
        build_output_uri(1, "cloudKey", SERVER),
        "http://portal-fake.vhirl.org/secure/jobFile.do?jobId=1&key=cloudKey"
    );
}

#[tokio::test]
async fn test_create_entities_for_inputs() {
    let h = harness();
    seed_storage(&h.storage);
    let entities = h
        .service
        .create_input_entities(&prepared_job(), &solution(), &user())
        .await
        .unwrap();
    // download, both staged files, and the solution
    assert_eq!(entities.len(), 4);
    assert!(entities.contains("http://portal-uploads.vhirl.org/file1?download=true"));
    assert!(entities.contains("http://portal-fake.vhirl.org/secure/jobFile.do?jobId=1&key=cloudKey"));
    assert!(entities.contains("http://portal-fake.vhirl.org/secure/jobFile.do?jobId=1&key=activity.ttl"));
    assert!(entities.contains("http://sssc.vhirl.org/solution1"));
    assert!(entities.iter().all(|e| e.attributed_to() == Some(USER_LINK)));
}

#[tokio::test]
async fn test_create_activity() {
    let h = harness();
    seed_storage(&h.storage);
    let graph = h
        .service
        .create_activity(&prepared_job(), &solution(), &user())
        .await
        .unwrap();
    assert!(graph.contains(INITIAL_TURTLE), "{graph}");
    assert!(graph.contains(SERVICE_TURTLE));
    assert!(graph.contains(INTERMEDIATE_TURTLE), "{graph}");
    assert!(!graph.contains(ENDED_TURTLE));
}

#[tokio::test]
async fn test_create_entities_for_outputs() {
    let h = harness();
    seed_storage(&h.storage);
    let graph = h
        .service
        .create_output_entities(&prepared_job())
        .await
        .unwrap();
    assert!(graph.contains(INITIAL_TURTLE), "{graph}");
    assert!(graph.contains(ENDED_TURTLE));
    assert!(graph.contains(CLOUD_KEY_TURTLE), "{graph}");
    // create_output_entities leaves the stored file alone
    assert_eq!(
        h.storage.contents(1, ACTIVITY_FILE).unwrap(),
        STORED_ACTIVITY.as_bytes()
    );
}

#[tokio::test]
async fn test_upload_model() {
    let h = harness();
    h.service
        .upload_model(&Graph::empty(), &prepared_job())
        .await
        .unwrap();
    assert_eq!(h.storage.contents(1, ACTIVITY_FILE).unwrap(), b"");
}

#[tokio::test]
async fn test_completion_keeps_stored_inputs_and_unknown_statements() {
    let h = harness();
    seed_storage(&h.storage);
    let job = prepared_job();
    let done = h.service.complete_job(&job).await.unwrap();
    assert_eq!(done.status, 201);

    let stored = String::from_utf8(h.storage.contents(1, ACTIVITY_FILE).unwrap()).unwrap();
    assert_eq!(stored, done.turtle);

    let activity = Activity::from_graph(
        &build_activity_uri(1, SERVER),
        &turtle::parse(&stored, None).unwrap(),
    )
    .unwrap();
    assert_eq!(activity.used().len(), 3);
    assert_eq!(activity.generated().len(), 1);
    assert_eq!(
        activity.started_at().map(Timestamp::lexical),
        Some("2016-03-01T10:15:30.000Z")
    );
    assert!(activity.ended_at().is_some());
    assert!(stored.contains("<http://www.w3.org/ns/prov#wasInformedBy>"));
    assert!(stored.contains("\"foo@test.com\" ."));

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].registry.as_str(), REGISTRY);
    assert_eq!(
        reports[0].report_uri,
        "http://portal-fake.vhirl.org/secure/getJobObject.do?jobId=1#report"
    );
    assert!(reports[0].body.contains("<http://promsns.org/def/proms#ExternalReport>"));
}

#[tokio::test]
async fn test_start_then_complete_round_trip() {
    let h = harness();
    let job = prepared_job();
    let started = h.service.start_job(&job, &solution(), &user()).await.unwrap();
    assert!(!started.contains(ENDED_TURTLE));

    h.storage.put(1, "cloudKey", b"result".to_vec());
    let done = h.service.complete_job(&job).await.unwrap();
    assert!(done.turtle.contains(INITIAL_TURTLE));
    assert!(done.turtle.contains(ENDED_TURTLE));

    // Everything recorded at start survives completion.
    let start_graph = turtle::parse(&started, None).unwrap();
    let end_graph = turtle::parse(&done.turtle, None).unwrap();
    let activity = Term::iri(build_activity_uri(1, SERVER));
    for statement in &start_graph {
        assert!(end_graph.contains(statement), "lost {statement:?}");
    }
    assert_eq!(end_graph.objects(&activity, prov::ENDED_AT_TIME).count(), 1);
}

#[test]
fn test_set_from_model() {
    let graph = turtle::parse(STORED_ACTIVITY, Some(SERVER)).unwrap();
    let activity = Activity::from_graph(&build_activity_uri(1, SERVER), &graph).unwrap();
    assert_eq!(activity.title(), Some("Cool Job"));
    assert_eq!(activity.associated_with(), Some(USER_LINK));

    let output = format!(
        "{SERVER}/secure/jobFile.do?jobId=21&key=job-macgo-bt-everbloom_gmail_com-0000000021/1000_yrRP_hazard_map.png"
    );
    let extended = activity
        .with_ended_at(Timestamp::now())
        .with_generated([Entity::downloadable(&output).with_attributed_to(Some(USER_LINK))]);
    let text = turtle::serialize(&extended.to_graph());

    let output_block = format!(
        concat!(
            "      a       <http://www.w3.org/ns/prov#Entity> ;\n",
            "      <http://www.w3.org/ns/dcat#downloadURL>\n",
            "              \"{}\"^^<http://www.w3.org/2001/XMLSchema#anyURI> ;\n",
            "      <http://www.w3.org/ns/prov#wasAttributedTo>\n",
            "              <https://plus.google.com/1> ."
        ),
        output
    );
    assert!(text.contains(INITIAL_TURTLE));
    assert!(text.contains(ENDED_TURTLE));
    assert!(text.contains(&output_block), "{text}");
    assert!(text.contains(&output));
}

#[test]
fn test_stored_activity_round_trips_exactly() {
    let graph = turtle::parse(STORED_ACTIVITY, Some(SERVER)).unwrap();
    let activity = Activity::from_graph(&build_activity_uri(1, SERVER), &graph).unwrap();
    assert_eq!(activity.to_graph(), graph);

    let canonical = turtle::serialize(&graph);
    assert_eq!(turtle::parse(&canonical, None).unwrap(), graph);
    assert_eq!(turtle::serialize(&turtle::parse(&canonical, None).unwrap()), canonical);
}
