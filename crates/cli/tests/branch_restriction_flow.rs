mod common;

use bitbucket_admin::{Outcome, RepositoryManager, Session};
use common::{console, gateway, member, membership, page, pick, text, ScriptedPrompter};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESTRICTIONS: &str = "/2.0/repositories/ws/api/branch-restrictions";
const RESTRICTION_7: &str = "/2.0/repositories/ws/api/branch-restrictions/7";

const ALLOW_USER: &str = "Allow specific user to bypass pull request";
const DENY_EVERYONE: &str = "Deny everyone from bypassing pull request";

fn restriction(id: i64, pattern: &str, users: Value) -> Value {
    json!({
        "id": id,
        "kind": "push",
        "pattern": pattern,
        "branch_match_kind": "glob",
        "users": users,
        "groups": []
    })
}

fn manager(server: &MockServer) -> RepositoryManager {
    let mut manager = RepositoryManager::new("ws", &gateway(server));
    manager.repo_slug = "api".to_string();
    manager
}

async fn mount_listing(server: &MockServer, restrictions: Value) {
    Mock::given(method("GET"))
        .and(path(RESTRICTIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(restrictions)))
        .mount(server)
        .await;
}

async fn mount_members(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/ws/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            membership("Ann", "u-1"),
            membership("Bob", "u-2"),
            membership("Cy", "u-3")
        ]))))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_deny_everyone_creates_restriction_without_users() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path(RESTRICTIONS))
        .and(body_json(json!({"kind": "push", "pattern": "main", "users": []})))
        .respond_with(ResponseTemplate::new(201).set_body_json(restriction(9, "main", json!([]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([text("main"), pick(DENY_EVERYONE)]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    let outcome = manager(&mock_server)
        .create_branch_restriction(&mut session)
        .await
        .unwrap();

    assert!(outcome.is_created());
    assert!(output
        .text()
        .contains("Branch restriction created successfully."));
}

#[tokio::test]
async fn test_rejected_create_carries_remote_body() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path(RESTRICTIONS))
        .respond_with(ResponseTemplate::new(400).set_body_string("Pattern is invalid"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([text("main"), pick(DENY_EVERYONE)]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    let err = manager(&mock_server)
        .create_branch_restriction(&mut session)
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed to create branch restriction on main"));
    assert!(message.contains("Pattern is invalid"));
    assert!(!output.text().contains("created successfully"));
}

#[tokio::test]
async fn test_allow_user_creates_restriction_with_selected_uuid() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, json!([])).await;
    mount_members(&mock_server).await;

    Mock::given(method("POST"))
        .and(path(RESTRICTIONS))
        .and(body_json(json!({
            "kind": "push",
            "pattern": "release/*",
            "users": [{"uuid": "u-2"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(restriction(
            10,
            "release/*",
            json!([member("Bob", "u-2")]),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter =
        ScriptedPrompter::new([text("release/*"), pick(ALLOW_USER), pick("Bob")]);
    let (mut console, _output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    let outcome = manager(&mock_server)
        .create_branch_restriction(&mut session)
        .await
        .unwrap();

    assert!(outcome.is_created());
}

#[tokio::test]
async fn test_existing_restriction_is_not_created_again() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, json!([restriction(7, "main", json!([]))])).await;

    Mock::given(method("POST"))
        .and(path(RESTRICTIONS))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([text("main"), pick(DENY_EVERYONE)]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    let outcome = manager(&mock_server)
        .create_branch_restriction(&mut session)
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Reused(ref r) if r.id == 7));
    assert!(output.text().contains("Branch restriction already exists."));
}

#[tokio::test]
async fn test_list_prints_one_line_per_restriction() {
    let mock_server = MockServer::start().await;
    mount_listing(
        &mock_server,
        json!([
            restriction(7, "main", json!([member("Ann", "u-1"), member("Bob", "u-2")])),
            restriction(8, "develop", json!([]))
        ]),
    )
    .await;

    let mut prompter = ScriptedPrompter::new([pick("List branch restrictions")]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    manager(&mock_server)
        .manage_branch_restrictions(&mut session)
        .await
        .unwrap();

    assert_eq!(
        output.text(),
        "main: push -> Users: [Ann, Bob]\ndevelop: push -> Users: []\n"
    );
}

#[tokio::test]
async fn test_remove_user_submits_list_without_selected_entry() {
    let mock_server = MockServer::start().await;
    let current = restriction(7, "main", json!([member("Ann", "u-1"), member("Bob", "u-2")]));
    mount_listing(&mock_server, json!([current.clone()])).await;

    Mock::given(method("GET"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(RESTRICTION_7))
        .and(body_json(json!({
            "kind": "push",
            "pattern": "main",
            "users": [{"uuid": "u-1"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([
        pick("main: push -> Users: [Ann, Bob]"),
        pick("Remove specific user from bypassing pull request"),
        pick("Bob"),
    ]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    manager(&mock_server)
        .update_branch_restriction_handler(&mut session)
        .await
        .unwrap();

    assert!(output
        .text()
        .contains("Branch restriction updated successfully."));
}

#[tokio::test]
async fn test_allow_user_appends_exactly_one_entry() {
    let mock_server = MockServer::start().await;
    let current = restriction(7, "main", json!([member("Ann", "u-1"), member("Bob", "u-2")]));
    mount_listing(&mock_server, json!([current.clone()])).await;
    mount_members(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(RESTRICTION_7))
        .and(body_json(json!({
            "kind": "push",
            "pattern": "main",
            "users": [{"uuid": "u-1"}, {"uuid": "u-2"}, {"uuid": "u-3"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([
        pick("main: push -> Users: [Ann, Bob]"),
        pick(ALLOW_USER),
        pick("Cy"),
    ]);
    let (mut console, _output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    manager(&mock_server)
        .update_branch_restriction_handler(&mut session)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_deny_everyone_update_clears_users() {
    let mock_server = MockServer::start().await;
    let current = restriction(7, "main", json!([member("Ann", "u-1")]));
    mount_listing(&mock_server, json!([current.clone()])).await;

    Mock::given(method("GET"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(RESTRICTION_7))
        .and(body_json(json!({"kind": "push", "pattern": "main", "users": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([
        pick("main: push -> Users: [Ann]"),
        pick(DENY_EVERYONE),
    ]);
    let (mut console, _output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    manager(&mock_server)
        .update_branch_restriction_handler(&mut session)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_update_carries_remote_body() {
    let mock_server = MockServer::start().await;
    let current = restriction(7, "main", json!([member("Ann", "u-1")]));
    mount_listing(&mock_server, json!([current.clone()])).await;

    Mock::given(method("GET"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(400).set_body_string("Users must be unique"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([
        pick("main: push -> Users: [Ann]"),
        pick(DENY_EVERYONE),
    ]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    let err = manager(&mock_server)
        .update_branch_restriction_handler(&mut session)
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed to update branch restriction 7"));
    assert!(message.contains("Users must be unique"));
    assert!(!output.text().contains("updated successfully"));
}

#[tokio::test]
async fn test_allow_everyone_deletes_restriction() {
    let mock_server = MockServer::start().await;
    let current = restriction(7, "main", json!([]));
    mount_listing(&mock_server, json!([current.clone()])).await;

    Mock::given(method("GET"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200).set_body_json(current))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([
        pick("main: push -> Users: []"),
        pick("Allow everyone to bypass pull request"),
    ]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    manager(&mock_server)
        .update_branch_restriction_handler(&mut session)
        .await
        .unwrap();

    assert!(output
        .text()
        .contains("Branch restriction deleted successfully."));
}

#[tokio::test]
async fn test_vanished_restriction_is_not_updated() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, json!([restriction(7, "main", json!([]))])).await;

    Mock::given(method("GET"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(RESTRICTION_7))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut prompter = ScriptedPrompter::new([pick("main: push -> Users: []")]);
    let (mut console, output) = console();
    let mut session = Session::new(&mut prompter, &mut console);

    manager(&mock_server)
        .update_branch_restriction_handler(&mut session)
        .await
        .unwrap();

    assert!(output
        .text()
        .contains("Branch restriction 7 no longer exists."));
    assert!(prompter.exhausted());
}
