//! Synchronization against a mocked Grouper web service.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use requiam_core::{ExternalKey, MemberEntry, MemberId, MemberSet};
use requiam_grouper::{GrouperClient, GrouperConfig};
use requiam_sync::{
    delta_for_user, CancellationToken, Delta, OverrideAction, SyncConfig, SyncError, SyncOutcome,
    TracingObserver, TransportErrorPolicy,
};

const GROUP: &str = "arizona.edu:dept:LBRY:figtest:portal:sci_math";

fn members_path() -> String {
    format!("/ws/groups/{GROUP}/members")
}

fn client(server: &MockServer) -> GrouperClient {
    let config = GrouperConfig::new("grouper.test", "ws", "svc", "secret")
        .with_endpoint(format!("{}/ws", server.uri()));
    GrouperClient::with_http_client(config, reqwest::Client::new())
}

async fn mount_members(server: &MockServer, ids: &[&str]) {
    let subjects: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
    Mock::given(method("GET"))
        .and(path(members_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WsGetMembersLiteResult": {"wsSubjects": subjects}
        })))
        .mount(server)
        .await;
}

fn source(ids: &[&'static str]) -> MemberSet {
    ids.iter().copied().map(MemberId::from_static).collect()
}

#[tokio::test]
async fn test_synchronize_against_grouper() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let server = MockServer::start().await;
    mount_members(&server, &["B", "C", "D"]).await;

    Mock::given(method("POST"))
        .and(path(members_path()))
        .and(header("content-type", "text/x-json"))
        .and(body_json(json!({
            "WsRestDeleteMemberRequest": {
                "replaceAllExisting": "F",
                "subjectLookups": [{"subjectId": "D"}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WsDeleteMemberResults": {"resultMetadata": {"resultCode": "SUCCESS"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(members_path()))
        .and(body_json(json!({
            "WsRestAddMemberRequest": {
                "replaceAllExisting": "F",
                "subjectLookups": [{"subjectId": "A"}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WsAddMemberResults": {"resultMetadata": {"resultCode": "SUCCESS"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let snapshot = client.query(GROUP).await.unwrap();
    let delta = Delta::new(
        &source(&["A", "B", "C"]),
        snapshot,
        SyncConfig::new(2, 5, 0, 10).unwrap(),
    );

    let report = delta
        .synchronize(&client, &TracingObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.group, GROUP);
}

#[tokio::test]
async fn test_http_error_aborts_by_default() {
    let server = MockServer::start().await;
    mount_members(&server, &["D"]).await;

    Mock::given(method("POST"))
        .and(path(members_path()))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let snapshot = client.query(GROUP).await.unwrap();
    let delta = Delta::new(&source(&["A"]), snapshot, SyncConfig::new(5, 5, 0, 10).unwrap());

    let err = delta
        .synchronize(&client, &TracingObserver, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Transport { batch: 1, .. }));
    assert_eq!(
        err.partial_report().map(|r| r.adds.attempted),
        Some(0)
    );
}

#[tokio::test]
async fn test_http_error_skipped_when_configured() {
    let server = MockServer::start().await;
    mount_members(&server, &["D"]).await;

    Mock::given(method("POST"))
        .and(path(members_path()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(members_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WsAddMemberResults": {"resultMetadata": {"resultCode": "SUCCESS"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let snapshot = client.query(GROUP).await.unwrap();
    let config = SyncConfig::new(5, 5, 0, 10)
        .unwrap()
        .with_transport_policy(TransportErrorPolicy::SkipBatch);
    let delta = Delta::new(&source(&["A"]), snapshot, config);

    let report = delta
        .synchronize(&client, &TracingObserver, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, SyncOutcome::Completed);
    assert_eq!(report.drops.skipped, 1);
    assert_eq!(report.adds.succeeded, 1);
}

#[tokio::test]
async fn test_user_update_adds_single_member() {
    let server = MockServer::start().await;
    mount_members(&server, &["B", "C"]).await;

    Mock::given(method("PUT"))
        .and(path(members_path()))
        .and(body_json(json!({
            "WsRestAddMemberRequest": {
                "replaceAllExisting": "F",
                "subjectLookups": [{"subjectId": "U1"}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "WsAddMemberResults": {"resultMetadata": {"resultCode": "SUCCESS"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let snapshot = client.query(GROUP).await.unwrap();
    let entries = [MemberEntry::new(
        ExternalKey::from_static("jdoe"),
        MemberId::from_static("U1"),
    )];
    let delta = delta_for_user(
        snapshot,
        &entries,
        OverrideAction::Add,
        SyncConfig::new(100, 5, 0, 10).unwrap(),
    );

    assert!(delta.drops().is_empty());
    let report = delta
        .synchronize(&client, &TracingObserver, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.is_clean());
}
