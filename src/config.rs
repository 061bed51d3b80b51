use std::time::Duration;

use url::Url;

use crate::Result;

/// Which service host an endpoint path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiUrl {
    Api,
    Upload,
    Stream,
    UserStream,
    SiteStream,
    OAuth,
}

/// Client configuration.
///
/// Defaults target the public service; override base URLs to point at a
/// proxy or a test server.
#[derive(Debug, Clone)]
pub struct Config {
    api: String,
    upload: String,
    stream: String,
    user_stream: String,
    site_stream: String,
    oauth: String,
    /// Whole-exchange timeout for ordinary requests, connect timeout for
    /// streams.
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: "https://api.twitter.com/1.1/".to_string(),
            upload: "https://upload.twitter.com/1.1/".to_string(),
            stream: "https://stream.twitter.com/1.1/".to_string(),
            user_stream: "https://userstream.twitter.com/1.1/".to_string(),
            site_stream: "https://sitestream.twitter.com/1.1/".to_string(),
            oauth: "https://api.twitter.com/".to_string(),
            timeout: Duration::from_secs(60),
            user_agent: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one base URL. A trailing `/` is added when missing so that
    /// relative paths join below it.
    pub fn with_base_url<T: Into<String>>(mut self, which: ApiUrl, base_url: T) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        *self.slot(which) = base_url;
        self
    }

    /// Point every base URL at one host, keeping the usual path layout.
    pub fn with_host(self, host: &str) -> Self {
        let host = host.trim_end_matches('/');
        self.with_base_url(ApiUrl::Api, format!("{}/1.1/", host))
            .with_base_url(ApiUrl::Upload, format!("{}/1.1/", host))
            .with_base_url(ApiUrl::Stream, format!("{}/1.1/", host))
            .with_base_url(ApiUrl::UserStream, format!("{}/1.1/", host))
            .with_base_url(ApiUrl::SiteStream, format!("{}/1.1/", host))
            .with_base_url(ApiUrl::OAuth, format!("{}/", host))
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Config { timeout, ..self }
    }

    pub fn with_user_agent<T: Into<String>>(self, user_agent: T) -> Self {
        Config {
            user_agent: Some(user_agent.into()),
            ..self
        }
    }

    pub fn base_url(&self, which: ApiUrl) -> &str {
        match which {
            ApiUrl::Api => &self.api,
            ApiUrl::Upload => &self.upload,
            ApiUrl::Stream => &self.stream,
            ApiUrl::UserStream => &self.user_stream,
            ApiUrl::SiteStream => &self.site_stream,
            ApiUrl::OAuth => &self.oauth,
        }
    }

    /// Resolve `path` against the selected base URL.
    pub fn endpoint(&self, which: ApiUrl, path: &str) -> Result<Url> {
        let base = Url::parse(self.base_url(which))?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    fn slot(&mut self, which: ApiUrl) -> &mut String {
        match which {
            ApiUrl::Api => &mut self.api,
            ApiUrl::Upload => &mut self.upload,
            ApiUrl::Stream => &mut self.stream,
            ApiUrl::UserStream => &mut self.user_stream,
            ApiUrl::SiteStream => &mut self.site_stream,
            ApiUrl::OAuth => &mut self.oauth,
        }
    }
}
