//! The TeamCity session handle.
//!
//! A [`TeamCity`] value is cheap to clone and shared read-only by every query
//! set and entity derived from it. It owns the server base URL, the default
//! request headers and the transport.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde_json::Value;

use crate::Record;
use crate::error::{Error, Result};
use crate::http::{HttpHeaders, HttpRequest, HttpTransport};
use crate::manager::Manager;
use crate::resources::{
    Build, BuildType, Project, QueuedBuild, Resource, TestOccurrence, TestOccurrenceDetail,
};

/// Default request timeout for the reqwest transport.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Shared handle to one TeamCity server.
#[derive(Clone)]
pub struct TeamCity {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    server_url: String,
    path_prefix: String,
    headers: HttpHeaders,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for TeamCity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamCity")
            .field("server_url", &self.inner.server_url)
            .field("path_prefix", &self.inner.path_prefix)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TeamCity`].
pub struct TeamCityBuilder {
    server_url: String,
    path_prefix: String,
    headers: HttpHeaders,
    timeout: StdDuration,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl TeamCityBuilder {
    /// Path inserted between the server URL and every resource path,
    /// e.g. `/guestAuth` or `/httpAuth`.
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        self.path_prefix = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Request timeout for the default transport. Ignored when a custom
    /// transport is supplied.
    #[must_use]
    pub fn timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<TeamCity> {
        url::Url::parse(&self.server_url)?;
        let server_url = self.server_url.trim_end_matches('/').to_string();

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(self.timeout)?,
        };

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        headers.extend(self.headers);

        Ok(TeamCity {
            inner: Arc::new(SessionInner {
                server_url,
                path_prefix: self.path_prefix,
                headers,
                transport,
            }),
        })
    }
}

#[cfg(feature = "reqwest")]
fn default_transport(timeout: StdDuration) -> Result<Arc<dyn HttpTransport>> {
    use crate::http::reqwest_transport::ReqwestTransport;

    Ok(Arc::new(ReqwestTransport::with_timeout(timeout)?))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport(_timeout: StdDuration) -> Result<Arc<dyn HttpTransport>> {
    Err(crate::http::HttpError::Transport(
        "no transport configured and the `reqwest` feature is disabled".to_string(),
    )
    .into())
}

impl TeamCity {
    /// Start building a session for `server_url` (e.g. `https://tc.example.com`).
    pub fn builder(server_url: impl Into<String>) -> TeamCityBuilder {
        TeamCityBuilder {
            server_url: server_url.into(),
            path_prefix: String::new(),
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            transport: None,
        }
    }

    /// Session with the default transport and no path prefix.
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Self::builder(server_url).build()
    }

    /// Server URL without a trailing slash.
    pub fn server_url(&self) -> &str {
        &self.inner.server_url
    }

    /// Server URL plus path prefix; resource paths are appended to this.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.inner.server_url, self.inner.path_prefix)
    }

    /// Absolute URL for a resource path or an href returned by the server.
    ///
    /// Hrefs that already carry the path prefix are resolved against the
    /// server URL, others against [`TeamCity::base_url`]. Absolute URLs are
    /// returned unchanged.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }

        let href = if href.starts_with('/') {
            href.to_string()
        } else {
            format!("/{href}")
        };

        let prefix = &self.inner.path_prefix;
        let carries_prefix = !prefix.is_empty()
            && href.starts_with(prefix.as_str())
            && href[prefix.len()..].starts_with('/');

        if carries_prefix {
            format!("{}{}", self.inner.server_url, href)
        } else {
            format!("{}{}", self.base_url(), href)
        }
    }

    /// GET `url` and parse the body as a JSON object.
    pub async fn get_json(&self, url: &str) -> Result<Record> {
        tracing::debug!(url, "GET");

        let request = HttpRequest {
            url: url.to_string(),
            headers: self.inner.headers.clone(),
        };
        let response = self.inner.transport.send(request).await?;

        if !response.is_success() {
            tracing::debug!(url, status = response.status, "Request failed");
            return Err(Error::from_response(url, &response));
        }

        match serde_json::from_slice::<Value>(&response.body)? {
            Value::Object(record) => Ok(record),
            _ => Err(Error::UnexpectedPayload {
                url: url.to_string(),
            }),
        }
    }

    /// Manager for any resource type.
    pub fn manager<R: Resource>(&self) -> Manager<R> {
        Manager::new(self.clone())
    }

    pub fn projects(&self) -> Manager<Project> {
        self.manager()
    }

    pub fn build_types(&self) -> Manager<BuildType> {
        self.manager()
    }

    pub fn builds(&self) -> Manager<Build> {
        self.manager()
    }

    pub fn queued_builds(&self) -> Manager<QueuedBuild> {
        self.manager()
    }

    pub fn tests(&self) -> Manager<TestOccurrence> {
        self.manager()
    }

    pub fn test_details(&self) -> Manager<TestOccurrenceDetail> {
        self.manager()
    }
}
