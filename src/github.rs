use serde::Deserialize;
use serde_json::json;

use crate::catalog::{CatalogPage, CatalogSource};
use crate::entry::RemoteCatalogEntry;
use crate::error::CatalogError;
use crate::identity::RemoteIdentity;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const PAGE_SIZE: u32 = 100;

const REPOSITORIES_QUERY: &str = r#"
query($first: Int!, $after: String) {
  viewer {
    repositories(first: $first, after: $after, orderBy: {field: PUSHED_AT, direction: DESC}, ownerAffiliations: [OWNER, COLLABORATOR, ORGANIZATION_MEMBER]) {
      pageInfo { hasNextPage endCursor }
      nodes {
        nameWithOwner
        diskUsage
        isArchived
        parent { nameWithOwner }
      }
    }
  }
}
"#;

/// The authenticated user's repositories, most recently pushed first.
#[derive(Debug, Clone)]
pub struct GithubCatalog {
    token: String,
    endpoint: String,
}

impl GithubCatalog {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: GRAPHQL_URL.to_string(),
        }
    }

    /// Build from an explicit token, falling back to `GITHUB_TOKEN`.
    pub fn from_token_or_env(token: Option<&str>) -> Result<Self, CatalogError> {
        let token = token
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty()))
            .ok_or(CatalogError::MissingToken)?;
        Ok(Self::new(token))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn fetch_blocking(
        endpoint: &str,
        token: &str,
        cursor: Option<&str>,
    ) -> Result<CatalogPage, CatalogError> {
        let body = json!({
            "query": REPOSITORIES_QUERY,
            "variables": { "first": PAGE_SIZE, "after": cursor },
        });

        let response = ureq::post(endpoint)
            .set("Authorization", &format!("bearer {}", token))
            .set("User-Agent", concat!("repopick/", env!("CARGO_PKG_VERSION")))
            .send_json(body)
            .map_err(|e| CatalogError::Request(e.to_string()))?;

        let parsed: GraphqlResponse = response
            .into_json()
            .map_err(|e| CatalogError::Decode(e.to_string()))?;

        parsed.into_page()
    }
}

impl CatalogSource for GithubCatalog {
    async fn next_page(&mut self, cursor: Option<String>) -> Result<CatalogPage, CatalogError> {
        let endpoint = self.endpoint.clone();
        let token = self.token.clone();
        tracing::debug!(cursor = ?cursor, "requesting catalog page");
        tokio::task::spawn_blocking(move || {
            Self::fetch_blocking(&endpoint, &token, cursor.as_deref())
        })
        .await
        .map_err(|e| CatalogError::Request(format!("catalog request task failed: {}", e)))?
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ViewerData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    page_info: PageInfo,
    nodes: Vec<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name_with_owner: String,
    #[serde(default)]
    disk_usage: Option<u64>,
    #[serde(default)]
    is_archived: bool,
    parent: Option<ParentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentNode {
    name_with_owner: String,
}

impl GraphqlResponse {
    fn into_page(self) -> Result<CatalogPage, CatalogError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(CatalogError::Api(messages.join("; ")));
        }
        let connection = self
            .data
            .ok_or_else(|| CatalogError::Decode("response has no data".to_string()))?
            .viewer
            .repositories;

        let entries = connection
            .nodes
            .into_iter()
            .filter_map(|node| {
                let slug = match node.name_with_owner.parse::<RemoteIdentity>() {
                    Ok(slug) => slug,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping catalog node");
                        return None;
                    }
                };
                Some(RemoteCatalogEntry {
                    slug,
                    disk_usage_kb: node.disk_usage.unwrap_or(0),
                    is_archived: node.is_archived,
                    fork_parent: node
                        .parent
                        .and_then(|p| p.name_with_owner.parse().ok()),
                })
            })
            .collect();

        let next_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };

        Ok(CatalogPage {
            entries,
            next_cursor,
        })
    }
}
