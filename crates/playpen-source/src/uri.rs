use std::fmt;

use url::Url;

/// Identity of a live playground document.
///
/// Documents are addressed as `gist://<gist-id>/<file-name>`. The authority
/// names the backing snippet; the path names the file within its file set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentUri {
    url: Url,
}

#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("invalid document uri: {0}")]
    Parse(#[from] url::ParseError),
    #[error("expected gist scheme, got '{0}'")]
    Scheme(String),
    #[error("document uri is missing a gist id")]
    MissingGistId,
    #[error("document uri is missing a file name")]
    MissingFileName,
}

impl DocumentUri {
    pub fn new(gist_id: &str, file_name: &str) -> Result<Self, UriError> {
        Self::parse(&format!("gist://{gist_id}/{file_name}"))
    }

    pub fn parse(input: &str) -> Result<Self, UriError> {
        let url = Url::parse(input)?;

        if url.scheme() != "gist" {
            return Err(UriError::Scheme(url.scheme().to_string()));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(UriError::MissingGistId);
        }
        if url.path().trim_start_matches('/').is_empty() {
            return Err(UriError::MissingFileName);
        }

        Ok(Self { url })
    }

    /// The id of the snippet set this document belongs to.
    #[must_use]
    pub fn gist_id(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The document's file name within its snippet, without the leading slash.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for DocumentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

impl std::str::FromStr for DocumentUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let uri = DocumentUri::parse("gist://abc123/index.html").unwrap();
        assert_eq!(uri.gist_id(), "abc123");
        assert_eq!(uri.file_name(), "index.html");
        assert_eq!(uri.to_string(), "gist://abc123/index.html");
    }

    #[test]
    fn test_new_builds_same_identity() {
        let built = DocumentUri::new("abc123", "script.tsx").unwrap();
        let parsed = DocumentUri::parse("gist://abc123/script.tsx").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            DocumentUri::parse("file:///tmp/index.html"),
            Err(UriError::Scheme(_))
        ));
    }

    #[test]
    fn test_rejects_missing_file_name() {
        assert!(matches!(
            DocumentUri::parse("gist://abc123/"),
            Err(UriError::MissingFileName)
        ));
    }
}
