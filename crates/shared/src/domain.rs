use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(PersonId);
id_newtype!(SiteId);
id_newtype!(LocalSiteId);

/// A collaborator on a remote site, as cached in the local people table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: PersonId,
    pub local_site_id: LocalSiteId,
    pub site_id: SiteId,
    pub username: String,
    pub display_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Person {
    /// Case-insensitive over all letters, not only ASCII.
    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .chars()
            .flat_map(char::to_lowercase)
            .eq(role.chars().flat_map(char::to_lowercase))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub local_id: LocalSiteId,
    /// `None` for sites that are not known to the remote service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<SiteId>,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people_synced_at: Option<DateTime<Utc>>,
}

/// Plugin metadata from the WordPress.org plugin directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WpOrgPlugin {
    pub slug: String,
    pub name: Option<String>,
    pub rating: Option<String>,
    pub version: Option<String>,
    pub icon: Option<String>,
}
