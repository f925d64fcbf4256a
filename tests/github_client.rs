//! Client classification tests against a mock GraphQL endpoint: parsing,
//! non-retryable rejections and transient-failure retries.

use profile_refresh::env::Credentials;
use profile_refresh::github::queries::AccountData;
use profile_refresh::github::{GenerationError, GitHubClient, QueryKind};

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials {
        access_token: "token".to_owned(),
        user_name: "octocat".to_owned(),
    }
}

const QUERY: &str = "query($login: String!) { user(login: $login) { id createdAt } }";

#[tokio::test]
async fn a_successful_response_parses_into_typed_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": { "id": "MDQ6VXNlcjE=", "createdAt": "2019-11-03T21:15:07Z" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_endpoint(server.uri());
    let data: AccountData = client
        .post_with_retry(
            QueryKind::Account,
            &credentials(),
            QUERY,
            json!({ "login": "octocat" }),
        )
        .await
        .expect("query should succeed");

    let account = data.user.expect("user should be present");
    assert_eq!(account.id, "MDQ6VXNlcjE=");
    assert_eq!(account.created_at, "2019-11-03T21:15:07Z");
}

#[tokio::test]
async fn an_unauthorized_response_stops_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_endpoint(server.uri());
    let error = client
        .post_with_retry::<AccountData>(
            QueryKind::Account,
            &credentials(),
            QUERY,
            json!({ "login": "octocat" }),
        )
        .await
        .expect_err("query should fail");

    assert!(matches!(error, GenerationError::Rejected), "got {error:?}");
    server.verify().await;
}

#[tokio::test]
async fn a_transient_server_error_is_retried() {
    let server = MockServer::start().await;
    // The first response is a 502, then the endpoint recovers.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": { "id": "MDQ6VXNlcjE=", "createdAt": "2019-11-03T21:15:07Z" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_endpoint(server.uri());
    let data: AccountData = client
        .post_with_retry(
            QueryKind::Account,
            &credentials(),
            QUERY,
            json!({ "login": "octocat" }),
        )
        .await
        .expect("the retry should succeed");

    assert!(data.user.is_some());
}

#[tokio::test]
async fn graphql_level_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Could not resolve to a User with the login of 'nobody'." }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_endpoint(server.uri());
    let error = client
        .post_with_retry::<AccountData>(
            QueryKind::Account,
            &credentials(),
            QUERY,
            json!({ "login": "nobody" }),
        )
        .await
        .expect_err("query should fail");

    assert!(matches!(error, GenerationError::Rejected), "got {error:?}");
    server.verify().await;
}
