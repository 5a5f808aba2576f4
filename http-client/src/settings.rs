use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::time::Duration;

#[serde_as]
#[derive(Deserialize, Eq, PartialEq, Debug, Clone)]
pub struct HttpClientSettings {
    #[serde(rename = "tcp_keepalive_sec", default = "HttpClientSettings::default_tcp_keepalive")]
    #[serde_as(as = "DurationSeconds")]
    pub tcp_keepalive: Duration,
    #[serde(
        rename = "pool_idle_timeout_sec",
        default = "HttpClientSettings::default_pool_idle_timeout"
    )]
    #[serde_as(as = "DurationSeconds")]
    pub pool_idle_timeout: Duration,
    #[serde(rename = "request_timeout_sec", default = "HttpClientSettings::default_request_timeout")]
    #[serde_as(as = "DurationSeconds")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the provider's base url, e.g. to point at a mock server.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl HttpClientSettings {
    fn default_tcp_keepalive() -> Duration {
        Duration::from_secs(20)
    }

    fn default_pool_idle_timeout() -> Duration {
        Duration::from_secs(20)
    }

    fn default_request_timeout() -> Duration {
        Duration::from_secs(15)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    pub fn client_builder(&self) -> reqwest::ClientBuilder {
        reqwest::ClientBuilder::new()
            .tcp_keepalive(Some(self.tcp_keepalive))
            .pool_idle_timeout(Some(self.pool_idle_timeout))
            .timeout(self.request_timeout)
    }
}

impl TryFrom<&HttpClientSettings> for reqwest::Client {
    type Error = reqwest::Error;

    fn try_from(settings: &HttpClientSettings) -> Result<Self, Self::Error> {
        settings.client_builder().build()
    }
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            tcp_keepalive: Self::default_tcp_keepalive(),
            pool_idle_timeout: Self::default_pool_idle_timeout(),
            request_timeout: Self::default_request_timeout(),
            api_key: None,
            base_url: None,
        }
    }
}
