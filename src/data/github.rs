//! Source-hosting REST client (GitHub API)
//! Lists an account's non-archived repositories with their latest commit,
//! newest activity first.

use super::{DataError, DataResult, RepoActivitySource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

const VENDOR: &str = "github";
const TIMEOUT_SECONDS: u64 = 30;
const PER_PAGE: u32 = 100;
/// Courtesy delay between per-repo commit lookups to stay clear of
/// unauthenticated rate limits.
const COMMIT_LOOKUP_DELAY_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub stars: i64,
    pub last_commit: DateTime<Utc>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub is_fork: bool,
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RepoRow {
    name: String,
    full_name: String,
    stargazers_count: i64,
    description: Option<String>,
    language: Option<String>,
    fork: bool,
    archived: Option<bool>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitRow {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: CommitSignature,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}

pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent("tokenscout/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: "https://api.github.com".to_string(),
        }
    }

    /// Resolve whether the account is a user or an organization.
    /// Returns None when the account does not exist.
    async fn account_type(&self, account: &str) -> DataResult<Option<String>> {
        let url = format!("{}/users/{}", self.base_url, account);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataError::Api {
                vendor: VENDOR,
                status: status.as_u16(),
                message,
            });
        }

        let row: AccountRow = response
            .json()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))?;
        Ok(Some(row.kind.to_lowercase()))
    }

    async fn list_repo_page(&self, repos_url: &str, page: u32) -> DataResult<Vec<RepoRow>> {
        let page_str = page.to_string();
        let per_page_str = PER_PAGE.to_string();
        let response = self
            .client
            .get(repos_url)
            .query(&[
                ("page", page_str.as_str()),
                ("per_page", per_page_str.as_str()),
                ("sort", "updated"),
                ("direction", "desc"),
                ("type", "all"),
            ])
            .send()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 403 || status.as_u16() == 429 {
                return Err(DataError::RateLimit {
                    vendor: VENDOR,
                    retry_after: 60,
                });
            }
            return Err(DataError::Api {
                vendor: VENDOR,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))
    }

    /// Fetch the latest commit timestamp on the repo's default branch.
    /// Returns None when the lookup fails (empty repo, protected, etc).
    async fn latest_commit(&self, full_name: &str, branch: &str) -> Option<DateTime<Utc>> {
        let url = format!("{}/repos/{}/commits", self.base_url, full_name);
        let response = self
            .client
            .get(&url)
            .query(&[("per_page", "1"), ("sha", branch)])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let commits: Vec<CommitRow> = response.json().await.ok()?;
        let date = &commits.first()?.commit.committer.date;
        parse_commit_date(date)
    }
}

#[async_trait]
impl RepoActivitySource for GithubClient {
    async fn repos_with_activity(&self, account: &str) -> DataResult<Vec<RepoInfo>> {
        let Some(kind) = self.account_type(account).await? else {
            tracing::warn!("GitHub account {} not found", account);
            return Ok(Vec::new());
        };

        let repos_url = if kind == "organization" {
            format!("{}/orgs/{}/repos", self.base_url, account)
        } else {
            format!("{}/users/{}/repos", self.base_url, account)
        };

        let mut repos = Vec::new();
        let mut page = 1;
        loop {
            let rows = self.list_repo_page(&repos_url, page).await?;
            if rows.is_empty() {
                break;
            }

            for row in rows {
                if row.archived.unwrap_or(false) {
                    continue;
                }

                let branch = row.default_branch.clone().unwrap_or_else(|| "master".to_string());
                if let Some(last_commit) = self.latest_commit(&row.full_name, &branch).await {
                    repos.push(RepoInfo {
                        name: row.name,
                        full_name: row.full_name,
                        stars: row.stargazers_count,
                        last_commit,
                        description: row.description,
                        language: row.language,
                        is_fork: row.fork,
                        default_branch: branch,
                    });
                }

                tokio::time::sleep(std::time::Duration::from_millis(COMMIT_LOOKUP_DELAY_MS)).await;
            }

            page += 1;
        }

        repos.sort_by(|a, b| b.last_commit.cmp(&a.last_commit));
        tracing::info!("Fetched {} active repos for {}", repos.len(), account);
        Ok(repos)
    }
}

fn parse_commit_date(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format the repo listing into the text block fed to the development-status
/// summary. Empty input yields a fixed marker the summary step still accepts.
pub fn format_repo_listing(repos: &[RepoInfo]) -> String {
    if repos.is_empty() {
        return "No repositories found.".to_string();
    }

    repos
        .iter()
        .map(|repo| {
            format!(
                "Repository: {}\nLast commit: {}\nDescription: {}\nLanguage: {}\nStars: {}\n{}",
                repo.full_name,
                repo.last_commit.format("%Y-%m-%d %H:%M:%S"),
                repo.description.as_deref().unwrap_or("No description"),
                repo.language.as_deref().unwrap_or("Unknown"),
                repo.stars,
                "=".repeat(50)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(full_name: &str, last_commit: &str) -> RepoInfo {
        RepoInfo {
            name: full_name.split('/').next_back().unwrap_or(full_name).to_string(),
            full_name: full_name.to_string(),
            stars: 10,
            last_commit: parse_commit_date(last_commit).expect("valid date"),
            description: Some("A test repo".to_string()),
            language: Some("Rust".to_string()),
            is_fork: false,
            default_branch: "main".to_string(),
        }
    }

    #[test]
    fn test_parse_commit_date() {
        let parsed = parse_commit_date("2025-06-01T12:30:45Z").expect("should parse");
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2025-06-01");
        assert!(parse_commit_date("not a date").is_none());
    }

    #[test]
    fn test_format_repo_listing_empty() {
        assert_eq!(format_repo_listing(&[]), "No repositories found.");
    }

    #[test]
    fn test_format_repo_listing_fields() {
        let listing = format_repo_listing(&[repo("acme/protocol", "2025-06-01T12:00:00Z")]);
        assert!(listing.contains("Repository: acme/protocol"));
        assert!(listing.contains("Last commit: 2025-06-01 12:00:00"));
        assert!(listing.contains("Language: Rust"));
    }

    #[test]
    fn test_repo_row_decoding_skips_missing_optionals() {
        let body = r#"[{
            "name": "core",
            "full_name": "acme/core",
            "stargazers_count": 3,
            "description": null,
            "language": null,
            "fork": false,
            "archived": true
        }]"#;
        let rows: Vec<RepoRow> = serde_json::from_str(body).expect("repo rows should decode");
        assert!(rows[0].archived.unwrap_or(false));
        assert!(rows[0].default_branch.is_none());
    }
}
