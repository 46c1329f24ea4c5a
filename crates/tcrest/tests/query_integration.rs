//! End-to-end query tests through the public API.
//!
//! A scripted transport stands in for the server; each test asserts both the
//! results and the exact sequence of requests made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tcrest::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use tcrest::resources::{BuildFilter, BuildTypeFilter, ProjectFilter};
use tcrest::{Error, GetOptions, TeamCity};

const SERVER: &str = "http://tc.example.com";

/// Serves canned responses by URL and records every request.
#[derive(Clone, Default)]
struct ScriptedServer {
    routes: Arc<Mutex<HashMap<String, HttpResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    fn route(&self, url: impl Into<String>, status: u16, body: Value) -> &Self {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.into(), HttpResponse::json(status, &body));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn session(&self) -> TeamCity {
        TeamCity::builder(SERVER)
            .transport(Arc::new(self.clone()))
            .build()
            .expect("session")
    }
}

#[async_trait]
impl HttpTransport for ScriptedServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.calls.lock().expect("calls lock").push(request.url.clone());
        self.routes
            .lock()
            .expect("routes lock")
            .get(&request.url)
            .cloned()
            .ok_or(HttpError::NoMockResponse { url: request.url })
    }
}

#[tokio::test]
async fn test_single_page_builds() {
    let server = ScriptedServer::default();
    server.route(
        format!("{SERVER}/app/rest/builds/"),
        200,
        json!({"count": 2, "build": [{"id": 1}, {"id": 2}]}),
    );
    let mut builds = server.session().builds().all();

    assert_eq!(builds.len().await.expect("len"), 2);
    let ids: Vec<i64> = builds.iter().await.expect("iter").map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(server.calls().len(), 1);
}

#[tokio::test]
async fn test_two_pages_are_merged_in_order() {
    let server = ScriptedServer::default();
    server
        .route(
            format!("{SERVER}/app/rest/builds/?locator=buildType:bt1"),
            200,
            json!({
                "count": 1,
                "build": [{"id": 10}],
                "nextHref": "/app/rest/builds/?locator=buildType:bt1,start:1"
            }),
        )
        .route(
            format!("{SERVER}/app/rest/builds/?locator=buildType:bt1,start:1"),
            200,
            json!({"count": 1, "build": [{"id": 11}]}),
        );
    let mut builds = server
        .session()
        .builds()
        .all()
        .filter(BuildFilter::default().build_type("bt1"));

    assert_eq!(builds.count().await.expect("count"), 2);
    let ids: Vec<i64> = builds.iter().await.expect("iter").map(|b| b.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(
        server.calls(),
        vec![
            format!("{SERVER}/app/rest/builds/?locator=buildType:bt1"),
            format!("{SERVER}/app/rest/builds/?locator=buildType:bt1,start:1"),
        ]
    );
    assert!(builds.records().await.expect("records").len() == 2);
}

#[tokio::test]
async fn test_build_types_by_project_and_strict_get() {
    let server = ScriptedServer::default();
    server
        .route(
            format!("{SERVER}/app/rest/buildTypes/?locator=project:(id:Foo)"),
            200,
            json!({"count": 1, "buildType": [{"id": "Foo_Package", "projectId": "Foo"}]}),
        )
        .route(
            format!("{SERVER}/app/rest/buildTypes/project:(id:Foo)"),
            200,
            json!({"id": "Foo_Package", "name": "package", "projectId": "Foo"}),
        );

    let mut build_types = server.session().build_types().all();
    let bt = build_types
        .get_with(
            BuildTypeFilter::default().project_id("Foo"),
            GetOptions::strict(),
        )
        .await
        .expect("single build type");
    assert_eq!(bt.name.as_deref(), Some("package"));
    assert_eq!(
        bt.origin().url(),
        Some(format!("{SERVER}/app/rest/buildTypes/project:(id:Foo)").as_str())
    );
    assert_eq!(server.calls().len(), 2);
}

#[tokio::test]
async fn test_unauthorized_is_distinguished_from_other_failures() {
    let server = ScriptedServer::default();
    server
        .route(
            format!("{SERVER}/app/rest/projects/"),
            401,
            json!({"message": "Authentication required"}),
        )
        .route(
            format!("{SERVER}/app/rest/projects/id:Missing"),
            404,
            json!({"message": "No project found"}),
        )
        .route(
            format!("{SERVER}/app/rest/builds/"),
            500,
            json!({"message": "boom"}),
        );
    let tc = server.session();

    let err = tc.projects().all().count().await.expect_err("401");
    assert!(err.is_unauthorized());
    assert_eq!(err.status(), Some(401));

    let err = tc
        .projects()
        .all()
        .get(ProjectFilter::default().id("Missing"))
        .await
        .expect_err("404");
    assert!(!err.is_unauthorized());
    assert_eq!(err.status(), Some(404));

    let err = tc.builds().all().count().await.expect_err("500");
    assert!(matches!(err, Error::Http { status: 500, .. }));
}

#[tokio::test]
async fn test_failed_fetch_caches_nothing() {
    let server = ScriptedServer::default();
    server.route(
        format!("{SERVER}/app/rest/builds/"),
        200,
        json!({"count": 1, "build": [{"id": 1}], "nextHref": "/app/rest/builds/?start=1"}),
    );
    let mut builds = server.session().builds().all();

    let err = builds.count().await.expect_err("second page missing");
    assert!(matches!(err, Error::Transport(_)));
    assert!(!builds.is_cached());
}
