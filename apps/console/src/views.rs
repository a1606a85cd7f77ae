use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use client_core::people::{PeopleListView, PeopleViewFactory, PersonDetailView};
use shared::domain::{LocalSiteId, PersonId};

/// Terminal views only remember that they went stale; the command loop redraws from storage.
#[derive(Clone, Default)]
pub struct TerminalViews {
    list_stale: Arc<AtomicBool>,
    detail_stale: Arc<AtomicBool>,
}

impl TerminalViews {
    pub fn take_list_stale(&self) -> bool {
        self.list_stale.swap(false, Ordering::SeqCst)
    }

    pub fn take_detail_stale(&self) -> bool {
        self.detail_stale.swap(false, Ordering::SeqCst)
    }
}

struct ListView {
    stale: Arc<AtomicBool>,
}

impl PeopleListView for ListView {
    fn refresh_people_list(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }
}

struct DetailView {
    stale: Arc<AtomicBool>,
}

impl PersonDetailView for DetailView {
    fn set_person_details(&self, person_id: PersonId, local_site_id: LocalSiteId) {
        tracing::debug!(
            person_id = person_id.0,
            local_site_id = local_site_id.0,
            "detail view retargeted"
        );
        self.stale.store(true, Ordering::SeqCst);
    }

    fn refresh_person_details(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }
}

impl PeopleViewFactory for TerminalViews {
    fn people_list(&self, _local_site_id: LocalSiteId) -> Arc<dyn PeopleListView> {
        Arc::new(ListView {
            stale: self.list_stale.clone(),
        })
    }

    fn person_detail(
        &self,
        _person_id: PersonId,
        _local_site_id: LocalSiteId,
    ) -> Arc<dyn PersonDetailView> {
        self.detail_stale.store(true, Ordering::SeqCst);
        Arc::new(DetailView {
            stale: self.detail_stale.clone(),
        })
    }
}
