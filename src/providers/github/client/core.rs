use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::error::{CommitLensError, Result};
use crate::models::RepoKey;

pub struct GitHubClient {
    pub client: Client,
    pub api_url: Url,
    pub token: Option<Token>,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .user_agent(concat!("CommitLens/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| CommitLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut api_url = Url::parse(base_url)
            .map_err(|e| CommitLensError::Config(format!("Invalid base URL: {e}")))?;
        // Url::join drops the last path segment unless it ends with a slash
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// `{api}/repos/{owner}/{repo}/`
    pub fn repo_url(&self, repo: &RepoKey) -> Result<Url> {
        self.api_url
            .join(&format!(
                "repos/{}/{}/",
                urlencoding::encode(&repo.owner),
                urlencoding::encode(&repo.name)
            ))
            .map_err(|e| CommitLensError::Config(format!("Invalid repository URL: {e}")))
    }

    pub fn repo_endpoint(&self, repo: &RepoKey, endpoint: &str) -> Result<Url> {
        self.repo_url(repo)?
            .join(endpoint)
            .map_err(|e| CommitLensError::Config(format!("Invalid {endpoint} URL: {e}")))
    }
}
