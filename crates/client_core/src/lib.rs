use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{LocalSiteId, Person, PersonId, SiteId};
use storage::Storage;

pub mod dispatcher;
pub mod error;
pub mod people;
pub mod people_client;
pub mod plugin_client;
pub mod plugin_store;

pub use dispatcher::Dispatcher;
pub use error::RestError;
pub use people::PeopleManagementController;
pub use people_client::{PeopleClientSettings, WpComPeopleClient};
pub use plugin_client::{PluginClientSettings, PluginWpOrgClient};
pub use plugin_store::{PluginStore, PluginStoreEvent};

/// Remote people endpoints of a site.
#[async_trait]
pub trait PeopleService: Send + Sync {
    async fn fetch_users(
        &self,
        site_id: SiteId,
        local_site_id: LocalSiteId,
    ) -> std::result::Result<Vec<Person>, RestError>;
    async fn update_role(
        &self,
        site_id: SiteId,
        person_id: PersonId,
        new_role: &str,
        local_site_id: LocalSiteId,
    ) -> std::result::Result<Person, RestError>;
    async fn remove_person(
        &self,
        site_id: SiteId,
        person_id: PersonId,
        local_site_id: LocalSiteId,
    ) -> std::result::Result<(PersonId, LocalSiteId), RestError>;
}

/// Local cache of site people.
#[async_trait]
pub trait PeopleTable: Send + Sync {
    async fn save_people(&self, people: &[Person], local_site_id: LocalSiteId) -> Result<()>;
    async fn save_person(&self, person: &Person) -> Result<()>;
    async fn person(&self, person_id: PersonId, local_site_id: LocalSiteId)
        -> Result<Option<Person>>;
    async fn delete_person(&self, person_id: PersonId, local_site_id: LocalSiteId) -> Result<()>;
}

#[async_trait]
impl PeopleTable for Storage {
    async fn save_people(&self, people: &[Person], local_site_id: LocalSiteId) -> Result<()> {
        Storage::save_people(self, people, local_site_id).await
    }

    async fn save_person(&self, person: &Person) -> Result<()> {
        Storage::save_person(self, person).await
    }

    async fn person(
        &self,
        person_id: PersonId,
        local_site_id: LocalSiteId,
    ) -> Result<Option<Person>> {
        Storage::person(self, person_id, local_site_id).await
    }

    async fn delete_person(&self, person_id: PersonId, local_site_id: LocalSiteId) -> Result<()> {
        Storage::delete_person(self, person_id, local_site_id).await
    }
}
