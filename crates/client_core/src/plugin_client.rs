//! WordPress.org plugin directory client.
//!
//! Every call to [`PluginWpOrgClient::fetch_plugin_info`] issues exactly one request and
//! dispatches exactly one [`Action::FetchedPluginInfo`], whatever happens on the wire.

use reqwest::Client;
use shared::{
    error::{FetchPluginError, FetchPluginErrorType},
    protocol::{Action, FetchedPluginPayload, WpOrgPluginResponse},
};
use tracing::{info, warn};
use url::Url;

use crate::{dispatcher::Dispatcher, error::RestError};

pub const DEFAULT_WPORG_API_URL: &str = "https://api.wordpress.org";
const PLUGIN_INFO_API_VERSION: &str = "1.0";

#[derive(Debug, Clone)]
pub struct PluginClientSettings {
    pub api_url: String,
    pub user_agent: String,
}

impl Default for PluginClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WPORG_API_URL.to_string(),
            user_agent: format!("people-console/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub struct PluginWpOrgClient {
    http: Client,
    api_url: String,
    dispatcher: Dispatcher,
}

impl PluginWpOrgClient {
    pub fn new(dispatcher: Dispatcher, settings: PluginClientSettings) -> Result<Self, RestError> {
        let http = Client::builder().user_agent(settings.user_agent).build()?;
        Ok(Self {
            http,
            api_url: settings.api_url,
            dispatcher,
        })
    }

    pub async fn fetch_plugin_info(&self, slug: &str) -> FetchedPluginPayload {
        let payload = match self.request_plugin_info(slug).await {
            Ok(Some(response)) => {
                info!(slug = %slug, "fetched plugin info");
                FetchedPluginPayload::Fetched(response.into_plugin(slug))
            }
            Ok(None) => {
                warn!(slug = %slug, "plugin info response was empty");
                FetchedPluginPayload::Failed(FetchPluginError::new(
                    FetchPluginErrorType::EmptyResponse,
                ))
            }
            Err(err) => {
                warn!(slug = %slug, error = %err, "plugin info request failed");
                FetchedPluginPayload::Failed(FetchPluginError::with_message(
                    FetchPluginErrorType::GenericError,
                    err.to_string(),
                ))
            }
        };

        self.dispatcher
            .dispatch(Action::FetchedPluginInfo(payload.clone()));
        payload
    }

    pub fn plugin_info_url(&self, slug: &str) -> Result<Url, RestError> {
        let mut url = Url::parse(&self.api_url)?;
        let document = format!("{slug}.json");
        url.path_segments_mut()
            .map_err(|_| RestError::CannotBeABase(self.api_url.clone()))?
            .pop_if_empty()
            .extend([
                "plugins",
                "info",
                PLUGIN_INFO_API_VERSION,
                document.as_str(),
            ]);
        Ok(url)
    }

    async fn request_plugin_info(&self, slug: &str) -> Result<Option<WpOrgPluginResponse>, RestError> {
        let url = self.plugin_info_url(slug)?;
        let res = self
            .http
            .get(url)
            .query(&[("fields", "icons")])
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(RestError::Status { status, body });
        }
        Ok(decode_plugin_response(&body)?)
    }
}

/// A blank body and a literal `null` both mean the directory has nothing for the slug.
fn decode_plugin_response(body: &str) -> Result<Option<WpOrgPluginResponse>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<WpOrgPluginResponse>>(body)
}

#[cfg(test)]
#[path = "tests/plugin_client_tests.rs"]
mod tests;
