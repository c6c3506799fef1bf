use course_compare::domain::ports::{ReviewSource, TeacherSource};
use course_compare::{CompareConfig, CompareError, GraphQlClient};
use httpmock::prelude::*;
use serde_json::json;

fn config_for(server: &MockServer, extra_source: &str) -> CompareConfig {
    CompareConfig::from_toml_str(&format!(
        r#"
[school]
id = "U2Nob29sLTExMTE="
departments = ["RGVwYXJ0bWVudC00Ng=="]

[source]
endpoint = "{}"
retry_delay_seconds = 0
{}

[load]
output_path = "./output"
output_formats = ["json"]
"#,
        server.url("/graphql"),
        extra_source
    ))
    .unwrap()
}

fn rating(course: &str, date: &str) -> serde_json::Value {
    json!({
        "cursor": "ignored",
        "node": {
            "class": course,
            "date": date,
            "grade": "A",
            "comment": "Solid",
            "flagStatus": "UNFLAGGED",
            "helpfulRating": 5,
            "clarityRating": 4,
            "difficultyRatingRounded": 2,
            "iWouldTakeAgain": 1
        }
    })
}

#[tokio::test]
async fn test_list_reviews_follows_cursor() {
    let server = MockServer::start();

    let first_page = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("Authorization", "Basic dGVzdDp0ZXN0")
            .body_contains("RatingsListQuery")
            .json_body_partial(json!({"variables": {"id": "VGVhY2hlci0x", "cursor": ""}}).to_string());
        then.status(200).json_body(json!({
            "data": {"node": {"__typename": "Teacher", "id": "VGVhY2hlci0x", "ratings": {
                "edges": [rating("CS101", "2023-06-01 12:00:00 +0000 UTC")],
                "pageInfo": {"hasNextPage": true, "endCursor": "Y3Vyc29yOjE="}
            }}}
        }));
    });

    let second_page = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .json_body_partial(json!({"variables": {"cursor": "Y3Vyc29yOjE="}}).to_string());
        then.status(200).json_body(json!({
            "data": {"node": {"__typename": "Teacher", "id": "VGVhY2hlci0x", "ratings": {
                "edges": [rating("MATH123", "2023-07-01 12:00:00 +0000 UTC")],
                "pageInfo": {"hasNextPage": false, "endCursor": "Y3Vyc29yOjI="}
            }}}
        }));
    });

    let client = GraphQlClient::from_config(&config_for(&server, ""));
    let reviews = client.list_reviews("VGVhY2hlci0x", 1).await.unwrap();

    first_page.assert();
    second_page.assert();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].course, "CS101");
    assert_eq!(reviews[1].course, "MATH123");
    assert_eq!(reviews[0].would_take_again, Some(true));
}

#[tokio::test]
async fn test_list_instructors_sends_department_and_school() {
    let server = MockServer::start();

    let search = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("X-Client", "course-compare")
            .body_contains("TeacherSearchResultsPageQuery")
            .json_body_partial(
                json!({"variables": {"query": {
                    "schoolID": "U2Nob29sLTExMTE=",
                    "departmentID": "RGVwYXJ0bWVudC00Ng=="
                }}})
                .to_string(),
            );
        then.status(200).json_body(json!({
            "data": {"search": {"teachers": {
                "edges": [
                    {"node": {"id": "VGVhY2hlci0x", "firstName": "Jane", "lastName": "Doe",
                               "avgRatingRounded": 4.6, "avgDifficulty": 2.4, "numRatings": 31,
                               "wouldTakeAgainPercentRounded": 92.0}},
                    {"node": {"id": "VGVhY2hlci0y", "firstName": "John", "lastName": "Roe",
                               "avgRatingRounded": null, "avgDifficulty": 0, "numRatings": 0,
                               "wouldTakeAgainPercentRounded": -1}}
                ],
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "resultCount": 2
            }}}
        }));
    });

    let client = GraphQlClient::from_config(&config_for(
        &server,
        "headers = { \"X-Client\" = \"course-compare\" }",
    ));
    let instructors = client
        .list_instructors("RGVwYXJ0bWVudC00Ng==")
        .await
        .unwrap();

    search.assert();
    assert_eq!(instructors.len(), 2);
    assert_eq!(instructors[0].display_name(), "Jane Doe");
    assert_eq!(instructors[0].avg_rating, 4.6);
    assert_eq!(instructors[1].avg_rating, 0.0);
}

#[tokio::test]
async fn test_server_errors_are_retried_then_surfaced() {
    let server = MockServer::start();

    let failing = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(503).body("upstream unavailable");
    });

    let client = GraphQlClient::from_config(&config_for(&server, "retry_attempts = 2"));
    let err = client.list_reviews("VGVhY2hlci0x", 20).await.unwrap_err();

    failing.assert_hits(3);
    assert!(matches!(err, CompareError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start();

    let unauthorized = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(401);
    });

    let client = GraphQlClient::from_config(&config_for(&server, "retry_attempts = 3"));
    let err = client.list_reviews("VGVhY2hlci0x", 20).await.unwrap_err();

    unauthorized.assert_hits(1);
    assert!(matches!(err, CompareError::UnexpectedStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_graphql_errors_become_typed_errors() {
    let server = MockServer::start();

    let rejected = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({
            "data": null,
            "errors": [{"message": "Cannot query field \"ratings\""}]
        }));
    });

    let client = GraphQlClient::from_config(&config_for(&server, ""));
    let err = client.list_reviews("VGVhY2hlci0x", 20).await.unwrap_err();

    rejected.assert();
    match err {
        CompareError::GraphQlError { message } => assert!(message.contains("ratings")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_instructor_yields_no_reviews() {
    let server = MockServer::start();

    let empty = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({"data": {"node": null}}));
    });

    let client = GraphQlClient::from_config(&config_for(&server, ""));
    let reviews = client.list_reviews("VGVhY2hlci05OTk=", 20).await.unwrap();

    empty.assert();
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_null_dates_and_nodes_do_not_fail_the_page() {
    let server = MockServer::start();

    let page = server.mock(|when, then| {
        when.method(POST).path("/graphql").body_contains("RatingsListQuery");
        then.status(200).json_body(json!({
            "data": {"node": {"__typename": "Teacher", "id": "VGVhY2hlci0x", "ratings": {
                "edges": [
                    rating("CS101", "2023-06-01 12:00:00 +0000 UTC"),
                    {"cursor": "c2", "node": {"class": "CS101", "date": null, "comment": "When?"}},
                    {"cursor": "c3", "node": null}
                ],
                "pageInfo": {"hasNextPage": false, "endCursor": "c3"}
            }}}
        }));
    });

    let client = GraphQlClient::from_config(&config_for(&server, ""));
    let reviews = client.list_reviews("VGVhY2hlci0x", 20).await.unwrap();

    page.assert();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].date, "2023-06-01 12:00:00 +0000 UTC");
    assert_eq!(reviews[1].date, "");
    assert_eq!(reviews[1].comment, "When?");
}
