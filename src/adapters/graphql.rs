//! GraphQL client for the review API. Implements both [`TeacherSource`] and
//! [`ReviewSource`], following `pageInfo` cursors until exhausted.

use crate::config::CompareConfig;
use crate::domain::model::{RawInstructor, RawReview};
use crate::domain::ports::{ReviewSource, TeacherSource};
use crate::utils::error::{CompareError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const RATINGS_QUERY: &str = r#"
query RatingsListQuery($count: Int!, $id: ID!, $cursor: String) {
  node(id: $id) {
    __typename
    ... on Teacher {
      id
      ratings(first: $count, after: $cursor) {
        edges {
          cursor
          node {
            class
            date
            grade
            comment
            flagStatus
            helpfulRating
            clarityRating
            difficultyRatingRounded
            iWouldTakeAgain
          }
        }
        pageInfo {
          hasNextPage
          endCursor
        }
      }
    }
    id
  }
}
"#;

const TEACHER_SEARCH_QUERY: &str = r#"
query TeacherSearchResultsPageQuery($query: TeacherSearchQuery!, $count: Int!, $cursor: String) {
  search: newSearch {
    teachers(query: $query, first: $count, after: $cursor) {
      edges {
        node {
          id
          firstName
          lastName
          avgRatingRounded
          avgDifficulty
          numRatings
          wouldTakeAgainPercentRounded
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
      resultCount
    }
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl<T> Connection<T> {
    /// Cursor for the next page, if the server says there is one.
    fn next_cursor(&self) -> Option<String> {
        self.page_info
            .as_ref()
            .filter(|info| info.has_next_page)
            .and_then(|info| info.end_cursor.clone())
            .filter(|cursor| !cursor.is_empty())
    }

    /// Edges whose node came back null are dropped.
    fn into_nodes(self) -> Vec<T> {
        let total = self.edges.len();
        let nodes: Vec<T> = self.edges.into_iter().filter_map(|edge| edge.node).collect();
        if nodes.len() < total {
            tracing::debug!("Skipped {} edges without a node", total - nodes.len());
        }
        nodes
    }
}

#[derive(Debug, Deserialize)]
struct RatingsData {
    node: Option<TeacherRatings>,
}

#[derive(Debug, Deserialize)]
struct TeacherRatings {
    ratings: Option<Connection<RawReview>>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: TeacherSearch,
}

#[derive(Debug, Deserialize)]
struct TeacherSearch {
    teachers: Connection<RawInstructor>,
}

pub struct GraphQlClient {
    client: Client,
    endpoint: String,
    authorization: String,
    headers: HashMap<String, String>,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    school_id: String,
    teacher_page_size: usize,
    max_pages: usize,
}

impl GraphQlClient {
    pub fn from_config(config: &CompareConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint().to_string(),
            authorization: config.authorization().to_string(),
            headers: config.source.headers.clone().unwrap_or_default(),
            timeout: config.timeout(),
            retry_attempts: config.retry_attempts(),
            retry_delay: config.retry_delay(),
            school_id: config.school.id.clone(),
            teacher_page_size: config.teacher_page_size(),
            max_pages: config.max_pages(),
        }
    }

    async fn post<T: DeserializeOwned>(&self, request: &GraphQlRequest<'_>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match self.post_once(request).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ Request to {} failed ({}), retry {}/{}",
                        self.endpoint,
                        e,
                        attempt,
                        self.retry_attempts
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once<T: DeserializeOwned>(&self, request: &GraphQlRequest<'_>) -> Result<T> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .timeout(self.timeout)
            .json(request);

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("GraphQL response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompareError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlResponse<T> = response.json().await?;
        if !envelope.errors.is_empty() {
            let message = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CompareError::GraphQlError { message });
        }

        envelope.data.ok_or_else(|| CompareError::GraphQlError {
            message: "response carried no data".to_string(),
        })
    }
}

#[async_trait]
impl TeacherSource for GraphQlClient {
    async fn list_instructors(&self, department_id: &str) -> Result<Vec<RawInstructor>> {
        let mut instructors = Vec::new();
        let mut cursor = String::new();

        for page in 1..=self.max_pages {
            let request = GraphQlRequest {
                query: TEACHER_SEARCH_QUERY,
                variables: serde_json::json!({
                    "query": {
                        "text": "",
                        "schoolID": self.school_id,
                        "fallback": true,
                        "departmentID": department_id,
                    },
                    "count": self.teacher_page_size,
                    "cursor": cursor,
                }),
            };

            let data: SearchData = self.post(&request).await?;
            let connection = data.search.teachers;
            let next = connection.next_cursor();
            instructors.extend(connection.into_nodes());
            tracing::debug!(
                "Department {} page {}: {} instructors so far",
                department_id,
                page,
                instructors.len()
            );

            match next {
                Some(next) => cursor = next,
                None => return Ok(instructors),
            }
        }

        tracing::warn!(
            "⚠️ Stopped paging department {} after {} pages",
            department_id,
            self.max_pages
        );
        Ok(instructors)
    }
}

#[async_trait]
impl ReviewSource for GraphQlClient {
    async fn list_reviews(&self, instructor_id: &str, page_size: usize) -> Result<Vec<RawReview>> {
        let mut reviews = Vec::new();
        let mut cursor = String::new();

        for _ in 0..self.max_pages {
            let request = GraphQlRequest {
                query: RATINGS_QUERY,
                variables: serde_json::json!({
                    "count": page_size,
                    "id": instructor_id,
                    "cursor": cursor,
                }),
            };

            let data: RatingsData = self.post(&request).await?;
            let Some(connection) = data.node.and_then(|teacher| teacher.ratings) else {
                tracing::debug!("Instructor {} has no ratings node", instructor_id);
                return Ok(reviews);
            };

            let next = connection.next_cursor();
            reviews.extend(connection.into_nodes());

            match next {
                Some(next) => cursor = next,
                None => return Ok(reviews),
            }
        }

        tracing::warn!(
            "⚠️ Stopped paging reviews of {} after {} pages",
            instructor_id,
            self.max_pages
        );
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_cursor_requires_has_next_page() {
        let connection: Connection<RawInstructor> = serde_json::from_value(serde_json::json!({
            "edges": [],
            "pageInfo": {"hasNextPage": false, "endCursor": "YXJyYXljb25uZWN0aW9uOjk="}
        }))
        .unwrap();
        assert_eq!(connection.next_cursor(), None);

        let connection: Connection<RawInstructor> = serde_json::from_value(serde_json::json!({
            "edges": [],
            "pageInfo": {"hasNextPage": true, "endCursor": "YXJyYXljb25uZWN0aW9uOjk="}
        }))
        .unwrap();
        assert_eq!(connection.next_cursor().as_deref(), Some("YXJyYXljb25uZWN0aW9uOjk="));
    }

    #[test]
    fn test_missing_page_info_ends_paging() {
        let connection: Connection<RawInstructor> = serde_json::from_value(serde_json::json!({
            "edges": [{"node": {"id": "VGVhY2hlci0x", "firstName": "Jane", "lastName": "Doe"}}]
        }))
        .unwrap();
        assert_eq!(connection.edges.len(), 1);
        assert_eq!(connection.next_cursor(), None);
    }

    #[test]
    fn test_null_edge_nodes_are_dropped() {
        let connection: Connection<RawReview> = serde_json::from_value(serde_json::json!({
            "edges": [
                {"node": null},
                {"node": {"class": "CS101", "date": null}},
                {}
            ]
        }))
        .unwrap();

        let reviews = connection.into_nodes();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].course, "CS101");
        assert!(reviews[0].date.is_empty());
    }

    #[test]
    fn test_graphql_errors_parse() {
        let envelope: GraphQlResponse<SearchData> = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{"message": "Variable \"$query\" is invalid"}]
        }))
        .unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.len(), 1);
    }
}
