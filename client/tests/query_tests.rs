mod common;

use std::time::Duration;

use serde_json::json;

use client::ClientError;
use common::*;
use shared::types::{DisplayField, FieldVisibility, LoginStatus};

#[tokio::test]
async fn concurrent_identical_queries_share_one_request() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        _ => Reply::ok(voters()).delayed(Duration::from_millis(100)),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    let (a, b) = tokio::join!(
        client.presearch_voters(ACTIVATION_CODE),
        client.presearch_voters(ACTIVATION_CODE),
    );
    let (a, b) = (a?, b?);

    assert_eq!(a.len(), 2);
    assert_eq!(a, b);
    assert_eq!(server.hits("/api/voters/presearch"), 1);

    // Served from cache.
    client.presearch_voters(ACTIVATION_CODE).await?;
    assert_eq!(server.hits("/api/voters/presearch"), 1);

    let req = server.last("/api/voters/presearch").expect("presearch request");
    assert_eq!(req.param("pageSize").as_deref(), Some("50"));
    assert_eq!(req.param("activationCode").as_deref(), Some(ACTIVATION_CODE));
    assert_eq!(req.header("authorization"), Some("Bearer srv-token-1"));
    Ok(())
}

#[tokio::test]
async fn different_parameters_are_separate_entries() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        _ => Reply::ok(voters()),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    client.search_voters(ACTIVATION_CODE, "priya").await?;
    client.search_voters(ACTIVATION_CODE, "rahul").await?;
    client.search_voters(ACTIVATION_CODE, "priya").await?;

    assert_eq!(server.hits("/api/voters/search"), 2);
    Ok(())
}

#[tokio::test]
async fn save_config_invalidates_config_reads_only() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match (req.method.as_str(), req.path.as_str()) {
        (_, "/auth/login") => login_reply(req),
        ("GET", "/api/config") => Reply::ok(json!({ "name": true, "mobileNumber": false })),
        ("POST", "/api/config") => Reply::raw(200, ""),
        _ => Reply::ok(voters()),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    let config = client.get_config().await?;
    assert!(!config.visibility.get(DisplayField::MobileNumber));
    client.get_config().await?;
    client.presearch_voters(ACTIVATION_CODE).await?;
    let config_gets = || {
        server
            .requests()
            .iter()
            .filter(|r| r.path == "/api/config" && r.method == http::Method::GET)
            .count()
    };
    assert_eq!(config_gets(), 1);

    let visibility: FieldVisibility = [(DisplayField::Age, false)].into_iter().collect();
    client.save_config(&visibility).await?;

    let posted = server.last("/api/config").expect("config post");
    assert_eq!(posted.method, http::Method::POST);
    assert_eq!(posted.json()["age"], false);
    assert_eq!(posted.header("content-type"), Some("application/json"));

    client.get_config().await?;
    assert_eq!(config_gets(), 2);

    client.presearch_voters(ACTIVATION_CODE).await?;
    assert_eq!(server.hits("/api/voters/presearch"), 1);
    Ok(())
}

#[tokio::test]
async fn failed_mutation_invalidates_nothing() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match (req.method.as_str(), req.path.as_str()) {
        (_, "/auth/login") => login_reply(req),
        ("GET", "/api/config") => Reply::ok(json!({})),
        _ => Reply::json(500, json!({ "message": "Database unavailable" })),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    client.get_config().await?;
    let err = client
        .save_config(&FieldVisibility::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Application {
            status: Some(500),
            message: "Database unavailable".into()
        }
    );

    client.get_config().await?;
    assert_eq!(server.hits("/api/config"), 2); // one GET, one POST
    assert!(client.current_session().is_some());
    Ok(())
}

#[tokio::test]
async fn save_preferences_failure_keeps_local_state() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        _ => Reply::raw(502, "<html>Bad Gateway</html>"),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    client.preferences().set(DisplayField::City, false);
    let err = client.save_preferences().await.unwrap_err();

    assert!(matches!(err, ClientError::Transport { .. }));
    assert_eq!(err.user_message(), "API request failed");
    assert!(!client.preferences().is_visible(DisplayField::City));
    Ok(())
}

#[tokio::test]
async fn wrapped_voter_pages_decode() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        _ => Reply::ok(json!({ "content": voters() })),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    let found = client.search_voters(ACTIVATION_CODE, "priya").await?;

    assert_eq!(found.len(), 2);
    assert_eq!(found[1].booth_no, Some(12));
    assert!(!found[1].has_mobile());
    let req = server.last("/api/voters/search").expect("search request");
    assert_eq!(req.param("searchText").as_deref(), Some("priya"));
    Ok(())
}

#[tokio::test]
async fn unexpected_shape_is_an_application_error() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        _ => Reply::ok(json!({ "unexpected": true })),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    let err = client.get_booth_locations(ACTIVATION_CODE).await.unwrap_err();

    assert!(matches!(err, ClientError::Application { status: None, .. }));
    assert!(err.to_string().contains("/api/booth-locations"));
    assert!(client.current_session().is_some());
    Ok(())
}

#[tokio::test]
async fn slow_backend_times_out_as_transport_error() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        _ => Reply::ok(json!([])).delayed(Duration::from_secs(5)),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    let err = client.get_user_print_report(ACTIVATION_CODE).await.unwrap_err();

    assert_eq!(err, ClientError::transport());
    assert!(client.current_session().is_some());
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() -> anyhow::Result<()> {
    let server = TestServer::start(login_reply).await?;
    let (client, _storage) = client_for(&server);
    drop(server);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = client.login("asha", "secret", ACTIVATION_CODE).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport { .. }));
    Ok(())
}

#[tokio::test]
async fn reports_and_directory_decode() -> anyhow::Result<()> {
    let server = TestServer::start(|req| match req.path.as_str() {
        "/auth/login" => login_reply(req),
        "/api/searchUsers" => Reply::ok(json!({
            "activationCode": ACTIVATION_CODE,
            "candidateAdminId": "7",
            "candidateAdminUsername": "asha",
            "candidateAdminName": "Asha Patil",
            "candidateAdminMobileNumber": "9000000000",
            "users": [
                { "userId": "11", "username": "field01", "name": "Meera", "mobileNumber": "9000000001" }
            ]
        })),
        "/api/voter-report" => Reply::ok(json!([
            { "userId": "11", "username": "field01", "name": "Meera", "totalPrints": 4, "totalVoters": 90 }
        ])),
        "/report/total-prints" => Reply::ok(json!({ "print": [
            { "id": "1", "username": "field01", "ipAddress": "10.0.0.1", "device": "Android",
              "location": "Pune", "timestamp": "2024-04-01T10:00:00Z", "userAgent": "app" }
        ]})),
        _ => Reply::raw(404, ""),
    })
    .await?;
    let (client, _storage) = signed_in(&server).await?;

    let directory = client.search_users(ACTIVATION_CODE).await?;
    assert_eq!(directory.users[0].username, "field01");

    let report = client.get_voter_report(ACTIVATION_CODE, Some(" meera ")).await?;
    assert_eq!(report[0].total_prints, 4);
    let req = server.last("/api/voter-report").expect("report request");
    assert_eq!(req.param("searchTerm").as_deref(), Some("meera"));

    client.get_voter_report(ACTIVATION_CODE, None).await?;
    let req = server.last("/api/voter-report").expect("report request");
    assert!(req.param("searchTerm").is_none());

    let detail = client.get_print_detail(ACTIVATION_CODE, "field01").await?;
    assert_eq!(detail.print.len(), 1);
    assert_eq!(detail.print[0].status, LoginStatus::Success);
    let req = server.last("/report/total-prints").expect("detail request");
    assert_eq!(req.param("user").as_deref(), Some("field01"));
    Ok(())
}

#[tokio::test]
async fn blank_activation_code_is_rejected_locally() -> anyhow::Result<()> {
    let server = TestServer::start(login_reply).await?;
    let (client, _storage) = signed_in(&server).await?;
    let before = server.requests().len();

    let err = client.search_users(" ").await.unwrap_err();

    assert_eq!(err.field(), Some("activationCode"));
    assert_eq!(server.requests().len(), before);
    Ok(())
}
