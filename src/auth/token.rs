/// Bearer credential for the GitHub API.
///
/// Never printed: `Debug` is redacted so the token can sit inside clients
/// that get logged.
pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl Token {
    /// Builds a token from an optional, environment-provided value.
    ///
    /// Blank values yield `None`: an unset and an empty `GITHUB_TOKEN` both
    /// mean unauthenticated requests.
    pub fn from_optional(value: Option<&str>) -> Option<Self> {
        value
            .map(Self::from)
            .filter(|token| !token.as_str().is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
