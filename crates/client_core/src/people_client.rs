//! WordPress.com REST client for listing, re-roling and removing site users.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{LocalSiteId, Person, PersonId, SiteId},
    protocol::{RemoveUserResponse, UpdateRoleRequest, WpComUser, WpComUsersResponse},
};
use tracing::{debug, info};
use url::Url;

use crate::{error::RestError, PeopleService};

pub const DEFAULT_WPCOM_API_URL: &str = "https://public-api.wordpress.com/rest/v1.1";
const USERS_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct PeopleClientSettings {
    pub api_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub page_size: usize,
}

impl Default for PeopleClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WPCOM_API_URL.to_string(),
            token: None,
            user_agent: format!("people-console/{}", env!("CARGO_PKG_VERSION")),
            page_size: USERS_PAGE_SIZE,
        }
    }
}

pub struct WpComPeopleClient {
    http: Client,
    api_url: String,
    token: Option<String>,
    page_size: usize,
}

impl WpComPeopleClient {
    pub fn new(settings: PeopleClientSettings) -> Result<Self, RestError> {
        let http = Client::builder().user_agent(settings.user_agent).build()?;
        Ok(Self {
            http,
            api_url: settings.api_url,
            token: settings.token,
            page_size: settings.page_size.max(1),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RestError> {
        let mut url = Url::parse(&self.api_url)?;
        url.path_segments_mut()
            .map_err(|_| RestError::CannotBeABase(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RestError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(RestError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PeopleService for WpComPeopleClient {
    async fn fetch_users(
        &self,
        site_id: SiteId,
        local_site_id: LocalSiteId,
    ) -> Result<Vec<Person>, RestError> {
        let site = site_id.0.to_string();
        let url = self.endpoint(&["sites", &site, "users"])?;
        let mut people = Vec::new();

        loop {
            let offset = people.len().to_string();
            let page: WpComUsersResponse = self
                .send_json(
                    self.http
                        .get(url.clone())
                        .query(&[("number", self.page_size.to_string()), ("offset", offset)]),
                )
                .await?;
            let page_len = page.users.len();
            people.extend(
                page.users
                    .into_iter()
                    .map(|user| user.into_person(site_id, local_site_id)),
            );
            debug!(site_id = site_id.0, page_len, found = page.found, "fetched users page");
            // A short page is the last one, whatever `found` claims.
            if page_len < self.page_size || people.len() >= page.found {
                break;
            }
        }

        info!(site_id = site_id.0, count = people.len(), "fetched site users");
        Ok(people)
    }

    async fn update_role(
        &self,
        site_id: SiteId,
        person_id: PersonId,
        new_role: &str,
        local_site_id: LocalSiteId,
    ) -> Result<Person, RestError> {
        let site = site_id.0.to_string();
        let person = person_id.0.to_string();
        let url = self.endpoint(&["sites", &site, "users", &person])?;
        let user: WpComUser = self
            .send_json(self.http.post(url).json(&UpdateRoleRequest {
                roles: vec![new_role.to_string()],
            }))
            .await?;
        info!(site_id = site_id.0, person_id = person_id.0, role = %new_role, "updated user role");
        Ok(user.into_person(site_id, local_site_id))
    }

    async fn remove_person(
        &self,
        site_id: SiteId,
        person_id: PersonId,
        local_site_id: LocalSiteId,
    ) -> Result<(PersonId, LocalSiteId), RestError> {
        let site = site_id.0.to_string();
        let person = person_id.0.to_string();
        let url = self.endpoint(&["sites", &site, "users", &person, "delete"])?;
        let res: RemoveUserResponse = self.send_json(self.http.post(url)).await?;
        if !res.success {
            return Err(RestError::Rejected(format!(
                "user {} was not removed from site {}",
                person_id.0, site_id.0
            )));
        }
        info!(site_id = site_id.0, person_id = person_id.0, "removed user from site");
        Ok((person_id, local_site_id))
    }
}

#[cfg(test)]
#[path = "tests/people_client_tests.rs"]
mod tests;
