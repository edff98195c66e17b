use chrono::{DateTime, Utc};
use shared::{
    domain::{Registration, RegistrationId},
    protocol::Breakdowns,
};

use crate::{
    error::PageError,
    pagination::{PageView, Pagination},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionCommand {
    CheckIn {
        id: RegistrationId,
        applied_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub showing: usize,
    pub total: usize,
}

impl FilterSummary {
    pub fn label(&self) -> String {
        format!(
            "Showing {} of {} registrations",
            self.showing, self.total
        )
    }
}

#[derive(Debug, Default)]
pub struct ProjectionCache {
    all_registrations: Vec<Registration>,
    registrations: Vec<Registration>,
    detail: Option<Registration>,
    last_breakdowns: Option<Breakdowns>,
    committed_generation: u64,
    loading: bool,
    error: Option<PageError>,
    pagination: Pagination,
}

impl ProjectionCache {
    pub fn new(page_size: usize) -> Self {
        Self {
            pagination: Pagination::new(page_size),
            ..Self::default()
        }
    }

    pub fn all_registrations(&self) -> &[Registration] {
        &self.all_registrations
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn detail(&self) -> Option<&Registration> {
        self.detail.as_ref()
    }

    pub fn last_breakdowns(&self) -> Option<&Breakdowns> {
        self.last_breakdowns.as_ref()
    }

    pub fn committed_generation(&self) -> u64 {
        self.committed_generation
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&PageError> {
        self.error.as_ref()
    }

    pub fn set_loading(&mut self, loading: bool) -> bool {
        let changed = self.loading != loading;
        self.loading = loading;
        changed
    }

    pub fn replace_all(&mut self, registrations: Vec<Registration>) {
        self.all_registrations = registrations;
    }

    pub fn commit_results(
        &mut self,
        generation: u64,
        registrations: Vec<Registration>,
        breakdowns: Option<Breakdowns>,
    ) {
        self.registrations = registrations;
        self.last_breakdowns = breakdowns;
        self.committed_generation = generation;
        self.error = None;
        self.pagination.reset();
    }

    pub fn fail(&mut self, error: PageError) {
        self.error = Some(error);
    }

    pub fn apply(&mut self, command: &ProjectionCommand) -> usize {
        match command {
            ProjectionCommand::CheckIn { id, applied_at } => {
                let mut changed = 0;
                for registration in self
                    .registrations
                    .iter_mut()
                    .chain(self.all_registrations.iter_mut())
                    .chain(self.detail.iter_mut())
                    .filter(|registration| &registration.id == id)
                {
                    if registration.mark_checked_in(*applied_at) {
                        changed += 1;
                    }
                }
                changed
            }
        }
    }

    pub fn find(&self, id: &RegistrationId) -> Option<&Registration> {
        self.registrations
            .iter()
            .chain(self.all_registrations.iter())
            .find(|registration| &registration.id == id)
    }

    pub fn can_check_in(&self, id: &RegistrationId) -> bool {
        self.find(id).map_or(true, |registration| !registration.checked_in)
    }

    pub fn open_detail(&mut self, id: &RegistrationId) -> Option<&Registration> {
        self.detail = self.find(id).cloned();
        self.detail.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn summary(&self) -> FilterSummary {
        FilterSummary {
            showing: self.registrations.len(),
            total: self.all_registrations.len(),
        }
    }

    pub fn page(&self) -> PageView<Registration> {
        self.pagination.view(&self.registrations)
    }

    pub fn next_page(&mut self) {
        self.pagination.next(self.registrations.len());
    }

    pub fn prev_page(&mut self) {
        self.pagination.prev();
    }
}
