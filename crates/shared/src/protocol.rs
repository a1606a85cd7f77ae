use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    domain::{LocalSiteId, Person, PersonId, SiteId, WpOrgPlugin},
    error::FetchPluginError,
};

/// Result of one plugin info fetch. Carries either the plugin or the error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FetchedPluginPayload {
    Fetched(WpOrgPlugin),
    Failed(FetchPluginError),
}

impl FetchedPluginPayload {
    pub fn plugin(&self) -> Option<&WpOrgPlugin> {
        match self {
            Self::Fetched(plugin) => Some(plugin),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchPluginError> {
        match self {
            Self::Fetched(_) => None,
            Self::Failed(error) => Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<WpOrgPlugin> for FetchedPluginPayload {
    fn from(value: WpOrgPlugin) -> Self {
        Self::Fetched(value)
    }
}

impl From<FetchPluginError> for FetchedPluginPayload {
    fn from(value: FetchPluginError) -> Self {
        Self::Failed(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    FetchedPluginInfo(FetchedPluginPayload),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchedPluginInfo(_) => "fetched_plugin_info",
        }
    }
}

/// Body of `GET /plugins/info/1.0/{slug}.json?fields=icons`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WpOrgPluginResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Either an object of size -> url or an empty list when the plugin has no icons.
    #[serde(default)]
    pub icons: Option<Value>,
}

const ICON_PREFERENCE: [&str; 4] = ["2x", "1x", "svg", "default"];

impl WpOrgPluginResponse {
    pub fn icon_url(&self) -> Option<String> {
        if let Some(icon) = self.icon.as_ref().filter(|icon| !icon.is_empty()) {
            return Some(icon.clone());
        }
        let icons = self.icons.as_ref()?.as_object()?;
        ICON_PREFERENCE
            .iter()
            .find_map(|key| icons.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// `requested_slug` backs up a reply that omits its own slug.
    pub fn into_plugin(self, requested_slug: &str) -> WpOrgPlugin {
        let icon = self.icon_url();
        WpOrgPlugin {
            slug: self.slug.unwrap_or_else(|| requested_slug.to_string()),
            name: self.name,
            rating: self.rating,
            version: self.version,
            icon,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpComUser {
    #[serde(rename = "ID")]
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nice_name: Option<String>,
    #[serde(default, rename = "avatar_URL")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl WpComUser {
    pub fn into_person(self, site_id: SiteId, local_site_id: LocalSiteId) -> Person {
        let display_name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .or(self.nice_name)
            .unwrap_or_else(|| self.login.clone());
        Person {
            person_id: PersonId(self.id),
            local_site_id,
            site_id,
            username: self.login,
            display_name,
            role: self.roles.into_iter().next().unwrap_or_default(),
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpComUsersResponse {
    #[serde(default)]
    pub found: usize,
    #[serde(default)]
    pub users: Vec<WpComUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveUserResponse {
    pub success: bool,
}
