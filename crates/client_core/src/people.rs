//! People management screen controller.
//!
//! Coordinates a people list view and an optional person detail view for one site,
//! the remote people endpoints and the local people table. The detail view reference
//! is held only while that view is on the back stack.

use std::sync::Arc;

use shared::domain::{LocalSiteId, Person, PersonId, Site, SiteId};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{PeopleService, PeopleTable};

pub trait PeopleListView: Send + Sync {
    fn refresh_people_list(&self);
}

pub trait PersonDetailView: Send + Sync {
    fn set_person_details(&self, person_id: PersonId, local_site_id: LocalSiteId);
    fn refresh_person_details(&self);
}

pub trait PeopleViewFactory: Send + Sync {
    fn people_list(&self, local_site_id: LocalSiteId) -> Arc<dyn PeopleListView>;
    fn person_detail(
        &self,
        person_id: PersonId,
        local_site_id: LocalSiteId,
    ) -> Arc<dyn PersonDetailView>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    FetchPeopleFailed,
    UpdateRoleFailed,
    RemovePersonFailed,
    PersonRemoved,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoneSelected,
    PersonSelected(Person),
}

/// Destructive confirmation shown before removing the selected person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPrompt {
    pub person_id: PersonId,
    pub local_site_id: LocalSiteId,
    pub title: String,
    pub message: String,
    pub confirm_label: &'static str,
    pub cancel_label: &'static str,
    pub destructive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { count: usize },
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChangeOutcome {
    /// Unknown person or unchanged role; nothing was sent.
    Skipped,
    Updated(Person),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    NothingSelected,
    Removed { personalized: bool },
    /// Removed remotely, but the local record could not be deleted and is still cached.
    LocalCleanupFailed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackNavigation {
    ReturnedToList,
    /// Nothing left to pop; the host should close the screen.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Home,
    RemovePerson,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    Navigated(BackNavigation),
    ConfirmRemoval(RemovalPrompt),
    Ignored,
}

pub struct PeopleManagementController {
    service: Arc<dyn PeopleService>,
    table: Arc<dyn PeopleTable>,
    views: Arc<dyn PeopleViewFactory>,
    list_view: Option<Arc<dyn PeopleListView>>,
    detail_view: Option<Arc<dyn PersonDetailView>>,
    selection: Selection,
    notices: broadcast::Sender<Notice>,
}

impl PeopleManagementController {
    pub fn new(
        service: Arc<dyn PeopleService>,
        table: Arc<dyn PeopleTable>,
        views: Arc<dyn PeopleViewFactory>,
    ) -> Self {
        let (notices, _) = broadcast::channel(64);
        Self {
            service,
            table,
            views,
            list_view: None,
            detail_view: None,
            selection: Selection::NoneSelected,
            notices,
        }
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_person(&self) -> Option<&Person> {
        match &self.selection {
            Selection::PersonSelected(person) => Some(person),
            Selection::NoneSelected => None,
        }
    }

    pub fn has_detail_view(&self) -> bool {
        self.detail_view.is_some()
    }

    /// Shows the list for `site`, reusing `restored_list` when the host kept one alive,
    /// and refreshes the people list when the site is known remotely.
    pub async fn activate(
        &mut self,
        site: &Site,
        restored_list: Option<Arc<dyn PeopleListView>>,
    ) -> Option<RefreshOutcome> {
        let list_view = restored_list.unwrap_or_else(|| self.views.people_list(site.local_id));
        self.list_view = Some(list_view);

        match site.site_id {
            Some(site_id) => Some(self.refresh_users_list(site_id, site.local_id).await),
            None => {
                debug!(
                    local_site_id = site.local_id.0,
                    "site is not known remotely; skipping people refresh"
                );
                None
            }
        }
    }

    pub async fn refresh_users_list(
        &mut self,
        site_id: SiteId,
        local_site_id: LocalSiteId,
    ) -> RefreshOutcome {
        let people = match self.service.fetch_users(site_id, local_site_id).await {
            Ok(people) => people,
            Err(err) => {
                warn!(site_id = site_id.0, error = %err, "failed to fetch people list");
                self.notify(NoticeKind::FetchPeopleFailed, "Couldn't retrieve the people on this site");
                return RefreshOutcome::Failed;
            }
        };

        if let Err(err) = self.table.save_people(&people, local_site_id).await {
            error!(local_site_id = local_site_id.0, error = %err, "failed to store people list");
            self.notify(NoticeKind::FetchPeopleFailed, "Couldn't retrieve the people on this site");
            return RefreshOutcome::Failed;
        }

        info!(
            site_id = site_id.0,
            local_site_id = local_site_id.0,
            count = people.len(),
            "people list refreshed"
        );
        self.refresh_on_screen_views();
        RefreshOutcome::Refreshed {
            count: people.len(),
        }
    }

    pub fn on_person_selected(&mut self, person: &Person) {
        self.selection = Selection::PersonSelected(person.clone());

        match &self.detail_view {
            Some(detail) => detail.set_person_details(person.person_id, person.local_site_id),
            None => {
                self.detail_view = Some(
                    self.views
                        .person_detail(person.person_id, person.local_site_id),
                );
            }
        }
        debug!(person_id = person.person_id.0, "person selected");
    }

    pub async fn on_role_changed(
        &mut self,
        person_id: PersonId,
        local_site_id: LocalSiteId,
        new_role: &str,
    ) -> RoleChangeOutcome {
        let person = match self.table.person(person_id, local_site_id).await {
            Ok(Some(person)) => person,
            Ok(None) => return RoleChangeOutcome::Skipped,
            Err(err) => {
                warn!(person_id = person_id.0, error = %err, "failed to load person for role change");
                return RoleChangeOutcome::Skipped;
            }
        };
        if person.has_role(new_role) {
            return RoleChangeOutcome::Skipped;
        }

        match self
            .service
            .update_role(person.site_id, person.person_id, new_role, local_site_id)
            .await
        {
            Ok(updated) => {
                if let Err(err) = self.table.save_person(&updated).await {
                    error!(person_id = person_id.0, error = %err, "failed to store updated person");
                }
                self.refresh_on_screen_views();
                RoleChangeOutcome::Updated(updated)
            }
            Err(err) => {
                warn!(person_id = person_id.0, error = %err, "failed to update role");
                self.notify(NoticeKind::UpdateRoleFailed, "Couldn't update the user's role");
                RoleChangeOutcome::Failed
            }
        }
    }

    pub fn confirm_remove_person(&self) -> Option<RemovalPrompt> {
        let person = self.selected_person()?;
        let name = &person.display_name;
        Some(RemovalPrompt {
            person_id: person.person_id,
            local_site_id: person.local_site_id,
            title: format!("Remove {name}?"),
            message: format!(
                "If you remove {name}, that user will no longer be able to access this site, \
                 but any content that was created by {name} will remain on the site."
            ),
            confirm_label: "Remove",
            cancel_label: "Cancel",
            destructive: true,
        })
    }

    /// Removes the selected person after the user confirmed the prompt.
    pub async fn remove_selected_person(&mut self) -> RemovalOutcome {
        let Some(selected) = self.selected_person().cloned() else {
            return RemovalOutcome::NothingSelected;
        };

        let (person_id, local_site_id) = match self
            .service
            .remove_person(selected.site_id, selected.person_id, selected.local_site_id)
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                warn!(person_id = selected.person_id.0, error = %err, "failed to remove person");
                self.notify(NoticeKind::RemovePersonFailed, "Couldn't remove the user");
                return RemovalOutcome::Failed;
            }
        };

        // The lookup runs after the remote call and is not atomic with it; a record that
        // vanished in between only loses the personalized message.
        let stored = match self.table.person(person_id, local_site_id).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(person_id = person_id.0, error = %err, "failed to load removed person");
                None
            }
        };
        let outcome = match &stored {
            Some(person) => match self.table.delete_person(person_id, local_site_id).await {
                Ok(()) => {
                    self.notify(
                        NoticeKind::PersonRemoved,
                        format!("Successfully removed {}", person.username),
                    );
                    RemovalOutcome::Removed { personalized: true }
                }
                Err(err) => {
                    error!(person_id = person_id.0, error = %err, "failed to delete removed person");
                    self.notify(NoticeKind::PersonRemoved, "Successfully removed the user");
                    RemovalOutcome::LocalCleanupFailed
                }
            },
            None => {
                self.notify(NoticeKind::PersonRemoved, "Successfully removed the user");
                RemovalOutcome::Removed {
                    personalized: false,
                }
            }
        };

        self.navigate_back_to_people_list();
        self.refresh_people_list_view();
        outcome
    }

    pub fn on_back_pressed(&mut self) -> BackNavigation {
        if self.navigate_back_to_people_list() {
            BackNavigation::ReturnedToList
        } else {
            BackNavigation::Exit
        }
    }

    pub fn on_menu_item(&mut self, item: MenuItem) -> MenuOutcome {
        match item {
            MenuItem::Home => MenuOutcome::Navigated(self.on_back_pressed()),
            MenuItem::RemovePerson => match self.confirm_remove_person() {
                Some(prompt) => MenuOutcome::ConfirmRemoval(prompt),
                None => MenuOutcome::Ignored,
            },
        }
    }

    fn navigate_back_to_people_list(&mut self) -> bool {
        if self.detail_view.take().is_none() {
            return false;
        }
        self.selection = Selection::NoneSelected;
        true
    }

    fn refresh_on_screen_views(&self) {
        if let Some(detail) = &self.detail_view {
            detail.refresh_person_details();
        }
        self.refresh_people_list_view();
    }

    fn refresh_people_list_view(&self) {
        if let Some(list) = &self.list_view {
            list.refresh_people_list();
        }
    }

    fn notify(&self, kind: NoticeKind, text: impl Into<String>) {
        let _ = self.notices.send(Notice {
            kind,
            text: text.into(),
        });
    }
}

#[cfg(test)]
#[path = "tests/people_tests.rs"]
mod tests;
