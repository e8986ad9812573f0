use chrono::{Duration, TimeZone, Utc};
use repo_activity::querier::ActivityQuerier;
use repo_activity::report::{self, ReportRequest, DEFAULT_TEMPLATE};
use repo_activity::types::ListState;
use repo_activity::{Credentials, GitHubClient, RepoId, RepositoryApi};
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo_id() -> RepoId {
    RepoId::new("acme", "widget")
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(Credentials::Anonymous, Some(&server.uri())).expect("client")
}

#[tokio::test]
async fn test_repository_lookup() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/repos/acme/widget",
        json!({ "id": 1, "name": "widget", "full_name": "acme/widget", "has_issues": true }),
    )
    .await;

    let info = client(&server).repository(&repo_id()).await.unwrap();

    assert_eq!(info.full_name, "acme/widget");
    assert!(info.has_issues);
}

#[tokio::test]
async fn test_missing_repository_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;

    let result = client(&server).repository(&repo_id()).await;

    let err = result.err().expect("lookup should fail");
    assert!(format!("{err:#}").contains("Failed to look up repository acme/widget"));
}

#[tokio::test]
async fn test_list_commits_sends_paging_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/commits"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "sha": "abc",
                "author": null,
                "commit": {
                    "message": "Fix things",
                    "author": { "name": "Dev", "email": "dev@example.com", "date": "2024-01-14T10:00:00Z" }
                }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let commits = client(&server).list_commits(&repo_id(), 2).await.unwrap();

    assert_eq!(commits.items.len(), 1);
    assert!(commits.items[0].author.is_none());
    assert!(!commits.has_next);
}

#[tokio::test]
async fn test_list_issues_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/issues"))
        .and(query_param("state", "closed"))
        .and(query_param("sort", "updated"))
        .and(query_param("since", "2024-01-08T12:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap();
    let issues = client(&server)
        .list_issues(&repo_id(), ListState::Closed, since, 1)
        .await
        .unwrap();

    assert!(issues.items.is_empty());
}

fn closing_events(page: u32) -> serde_json::Value {
    let newest = Utc::now() - Duration::hours(1);
    let events: Vec<_> = (0..100)
        .map(|i| {
            let offset = (page as i64 - 1) * 100 + i;
            json!({
                "type": "PullRequestEvent",
                "actor": { "login": "maintainer" },
                "payload": { "action": "closed", "number": offset + 1 },
                "created_at": (newest - Duration::minutes(offset)).to_rfc3339()
            })
        })
        .collect();
    json!(events)
}

#[tokio::test]
async fn test_event_walk_follows_link_header() {
    let server = MockServer::start().await;
    let events_url = format!("{}/repos/acme/widget/events?per_page=100", server.uri());
    for page in 1..=3u32 {
        let mut links = Vec::new();
        if page < 3 {
            links.push(format!("<{events_url}&page={}>; rel=\"next\"", page + 1));
        }
        links.push(format!("<{events_url}&page=3>; rel=\"last\""));
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/events"))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", links.join(", ").as_str())
                    .set_body_json(closing_events(page)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    // GitHub refuses to page past the end of the events feed.
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/events"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "In order to keep the API fast for everyone, pagination is limited for this resource.",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    let repo = repo_id();
    let querier = ActivityQuerier::new(&client, &repo, 10);

    let closing = querier
        .pull_request_closing_events(Utc::now() - Duration::days(7))
        .await
        .unwrap();

    assert_eq!(closing.len(), 300);
}

#[tokio::test]
async fn test_basic_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/events"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::resolve(Some("octocat".into()), Some("hunter2".into()), None);
    let client = GitHubClient::new(credentials, Some(&server.uri())).unwrap();

    let events = client.list_events(&repo_id(), 1).await.unwrap();
    assert!(events.items.is_empty());
}

#[tokio::test]
async fn test_report_over_http() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/repos/acme/widget",
        json!({ "name": "widget", "full_name": "acme/widget", "has_issues": false }),
    )
    .await;
    mount_json(
        &server,
        "/repos/acme/widget/commits",
        json!([
            {
                "sha": "c2",
                "author": { "login": "alice" },
                "commit": { "message": "Add feature\n\nDetails", "author": { "name": "Alice", "date": "2024-01-14T10:00:00Z" } }
            },
            {
                "sha": "c1",
                "author": { "login": "bob" },
                "commit": { "message": "Old work", "author": { "name": "Bob", "date": "2024-01-01T10:00:00Z" } }
            }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls"))
        .and(query_param("state", "open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "number": 8,
                "title": "Draft feature",
                "html_url": "https://github.com/acme/widget/pull/8",
                "user": { "login": "carol" },
                "closed_at": null
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls"))
        .and(query_param("state", "closed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "number": 5,
                "title": "Fix bug",
                "html_url": "https://github.com/acme/widget/pull/5",
                "user": { "login": "dave" },
                "closed_at": "2024-01-13T09:00:00Z"
            }
        ])))
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/repos/acme/widget/events",
        json!([
            {
                "type": "PullRequestEvent",
                "actor": { "login": "maintainer" },
                "payload": { "action": "closed", "number": 5 },
                "created_at": "2024-01-13T09:00:00Z"
            }
        ]),
    )
    .await;

    let request = ReportRequest {
        repo: repo_id(),
        days: Some(7),
        report_no_activity: false,
    };
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

    let text = report::generate_report(&client(&server), &request, DEFAULT_TEMPLATE, 10, now)
        .await
        .unwrap();

    assert!(text.contains("* 2024-01-14 alice: Add feature"));
    assert!(!text.contains("Old work"));
    assert!(text.contains("#8 Draft feature (carol)"));
    assert!(text.contains("#5 Fix bug (dave), closed 2024-01-13 by maintainer"));
}
