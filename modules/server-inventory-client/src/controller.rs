//! UI state for the inventory table and the controller that reconciles it
//! with the Record API.
//!
//! `ViewState::update` handles purely local edits (typing into a form,
//! changing a filter). `Controller::dispatch` handles actions that talk to
//! the API. Every state-changing action refetches the full list afterwards.

use crate::api::{ApiError, InventoryApi};
use crate::filter::{ColumnFilters, matches_query};
use server_inventory_types::ServerRecord;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Records as last fetched (possibly narrowed by a search).
    pub servers: Vec<ServerRecord>,
    pub filters: ColumnFilters,
    pub search_query: String,
    /// Add-form draft.
    pub draft: ServerRecord,
    pub show_form: bool,
    /// Edit-form draft, present while a record is being edited.
    pub editing: Option<ServerRecord>,
    pub last_error: Option<String>,
}

/// Local state edits. None of these issue a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    ToggleForm,
    SetDraftField { key: String, value: String },
    /// Start editing the record at this index of `servers`.
    BeginEdit(usize),
    SetEditField { key: String, value: String },
    CancelEdit,
    SetFilter { key: String, value: String },
    ClearFilters,
    SetSearchQuery(String),
}

/// Actions that go through the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Load,
    SubmitNew,
    SubmitEdit,
    Search,
    /// Full text of a user-selected YAML file.
    Import(String),
}

impl ViewState {
    pub fn update(&mut self, edit: Edit) {
        match edit {
            Edit::ToggleForm => self.show_form = !self.show_form,
            Edit::SetDraftField { key, value } => {
                self.draft.set_field(&key, value);
            }
            Edit::BeginEdit(index) => {
                if let Some(record) = self.servers.get(index) {
                    self.editing = Some(record.clone());
                }
            }
            Edit::SetEditField { key, value } => {
                if let Some(editing) = self.editing.as_mut() {
                    editing.set_field(&key, value);
                }
            }
            Edit::CancelEdit => self.editing = None,
            Edit::SetFilter { key, value } => self.filters.set(&key, value),
            Edit::ClearFilters => self.filters.clear(),
            Edit::SetSearchQuery(query) => self.search_query = query,
        }
    }

    /// Records passing every column filter, paired with their index in `servers`.
    pub fn visible(&self) -> Vec<(usize, &ServerRecord)> {
        self.servers
            .iter()
            .enumerate()
            .filter(|(_, r)| self.filters.matches(r))
            .collect()
    }
}

pub struct Controller {
    api: Arc<dyn InventoryApi>,
    state: ViewState,
}

impl Controller {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self {
            api,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn edit(&mut self, edit: Edit) {
        self.state.update(edit);
    }

    /// Runs an API-backed action. On failure the fetched list is left as it
    /// was and the error is kept in `last_error` as well as returned.
    pub async fn dispatch(&mut self, action: Action) -> Result<(), ApiError> {
        let result = self.run(action).await;
        match &result {
            Ok(()) => self.state.last_error = None,
            Err(e) => self.record_error(e.to_string()),
        }
        result
    }

    /// Refetches the displayed list, re-running the search when one is
    /// active. `last_error` from the preceding action is kept unless this
    /// fetch fails too.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let result = self.search().await;
        if let Err(e) = &result {
            self.record_error(e.to_string());
        }
        result
    }

    /// Shows a failure that happened outside an API action, e.g. an unreadable upload.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Inventory action failed: {}", message);
        self.state.last_error = Some(message);
    }

    /// The export payload for a client-side download.
    pub async fn export(&self) -> Result<String, ApiError> {
        self.api.export().await
    }

    async fn run(&mut self, action: Action) -> Result<(), ApiError> {
        match action {
            Action::Load => self.refetch().await,
            Action::SubmitNew => self.submit_new().await,
            Action::SubmitEdit => self.submit_edit().await,
            Action::Search => self.search().await,
            Action::Import(yaml) => {
                self.api.import(&yaml).await?;
                self.refetch().await
            }
        }
    }

    async fn refetch(&mut self) -> Result<(), ApiError> {
        self.state.servers = self.api.list().await?;
        Ok(())
    }

    async fn submit_new(&mut self) -> Result<(), ApiError> {
        if !self.state.draft.has_name() {
            return Ok(());
        }

        let mut record = self.state.draft.clone();
        if record.id.is_none() {
            // The store never assigns identifiers; the caller supplies one.
            let current = self.api.list().await?;
            record.id = Some(next_id(&current));
        }

        self.api.create(&record).await?;
        self.refetch().await?;
        self.state.draft = ServerRecord::default();
        self.state.show_form = false;
        Ok(())
    }

    async fn submit_edit(&mut self) -> Result<(), ApiError> {
        let Some(editing) = self.state.editing.as_ref() else {
            return Ok(());
        };
        if !editing.has_name() {
            return Ok(());
        }
        let Some(id) = editing.id else {
            return Err(ApiError::NotFound(format!(
                "'{}' has no identifier",
                editing.server_name
            )));
        };

        let patch = editing.to_patch();
        self.api.update(id, &patch).await?;
        self.refetch().await?;
        self.state.editing = None;
        Ok(())
    }

    async fn search(&mut self) -> Result<(), ApiError> {
        if self.state.search_query.trim().is_empty() {
            return self.refetch().await;
        }
        let all = self.api.list().await?;
        let query = &self.state.search_query;
        self.state.servers = all.into_iter().filter(|r| matches_query(r, query)).collect();
        Ok(())
    }
}

fn next_id(records: &[ServerRecord]) -> i64 {
    records
        .iter()
        .filter_map(|r| r.id)
        .max()
        .map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use server_inventory_types::ServerPatch;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeApi {
        records: Mutex<Vec<ServerRecord>>,
        creates: AtomicUsize,
        fail_list: AtomicBool,
    }

    impl FakeApi {
        fn with(records: Vec<ServerRecord>) -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(records),
                ..Default::default()
            })
        }

        fn snapshot(&self) -> Vec<ServerRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InventoryApi for FakeApi {
        async fn list(&self) -> Result<Vec<ServerRecord>, ApiError> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(self.snapshot())
        }

        async fn create(&self, record: &ServerRecord) -> Result<ServerRecord, ApiError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.records.lock().unwrap().push(record.clone());
            Ok(record.clone())
        }

        async fn update(&self, id: i64, patch: &ServerPatch) -> Result<ServerRecord, ApiError> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.id == Some(id))
                .ok_or_else(|| ApiError::NotFound("Server not found".into()))?;
            patch.clone().apply(record);
            Ok(record.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), ApiError> {
            self.records.lock().unwrap().retain(|r| r.id != Some(id));
            Ok(())
        }

        async fn import(&self, yaml: &str) -> Result<(), ApiError> {
            let names: Vec<ServerRecord> = yaml
                .lines()
                .map(|name| ServerRecord {
                    server_name: name.to_string(),
                    ..Default::default()
                })
                .collect();
            *self.records.lock().unwrap() = names;
            Ok(())
        }

        async fn export(&self) -> Result<String, ApiError> {
            Ok(self
                .snapshot()
                .iter()
                .map(|r| r.server_name.clone())
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    fn server(id: i64, name: &str, standort: &str) -> ServerRecord {
        ServerRecord {
            id: Some(id),
            server_name: name.into(),
            standort: standort.into(),
            ..Default::default()
        }
    }

    fn two_servers() -> Arc<FakeApi> {
        FakeApi::with(vec![server(1, "db1", "A"), server(2, "db2", "B")])
    }

    #[tokio::test]
    async fn load_fetches_all_records() {
        let mut controller = Controller::new(two_servers());
        controller.dispatch(Action::Load).await.unwrap();
        assert_eq!(controller.state().servers.len(), 2);
    }

    #[tokio::test]
    async fn add_requires_a_name() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller.edit(Edit::ToggleForm);
        controller.edit(Edit::SetDraftField {
            key: "serverName".into(),
            value: "  ".into(),
        });
        controller.dispatch(Action::SubmitNew).await.unwrap();

        assert_eq!(api.creates.load(Ordering::SeqCst), 0);
        assert!(controller.state().show_form);
    }

    #[tokio::test]
    async fn add_assigns_next_id_refetches_and_resets_form() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller.edit(Edit::ToggleForm);
        controller.edit(Edit::SetDraftField {
            key: "serverName".into(),
            value: "db3".into(),
        });
        controller.dispatch(Action::SubmitNew).await.unwrap();

        let state = controller.state();
        assert_eq!(state.servers.len(), 3);
        assert_eq!(state.servers[2].id, Some(3));
        assert_eq!(state.servers[2].server_name, "db3");
        assert_eq!(state.draft, ServerRecord::default());
        assert!(!state.show_form);
    }

    #[tokio::test]
    async fn edit_merges_and_clears_draft() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller.dispatch(Action::Load).await.unwrap();
        controller.edit(Edit::BeginEdit(1));
        controller.edit(Edit::SetEditField {
            key: "standort".into(),
            value: "C".into(),
        });
        controller.dispatch(Action::SubmitEdit).await.unwrap();

        assert!(controller.state().editing.is_none());
        assert_eq!(api.snapshot()[1].standort, "C");
        assert_eq!(controller.state().servers[1].standort, "C");
    }

    #[tokio::test]
    async fn edit_with_blank_name_is_not_submitted() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller.dispatch(Action::Load).await.unwrap();
        controller.edit(Edit::BeginEdit(0));
        controller.edit(Edit::SetEditField {
            key: "serverName".into(),
            value: "".into(),
        });
        controller.dispatch(Action::SubmitEdit).await.unwrap();

        assert!(controller.state().editing.is_some());
        assert_eq!(api.snapshot()[0].server_name, "db1");
    }

    #[tokio::test]
    async fn editing_record_without_id_reports_not_found() {
        let api = FakeApi::with(vec![ServerRecord {
            server_name: "orphan".into(),
            ..Default::default()
        }]);
        let mut controller = Controller::new(api);
        controller.dispatch(Action::Load).await.unwrap();
        controller.edit(Edit::BeginEdit(0));
        let err = controller.dispatch(Action::SubmitEdit).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(controller.state().last_error.is_some());
    }

    #[tokio::test]
    async fn column_filter_narrows_visible_rows_only() {
        let mut controller = Controller::new(two_servers());
        controller.dispatch(Action::Load).await.unwrap();
        controller.edit(Edit::SetFilter {
            key: "standort".into(),
            value: "A".into(),
        });

        let visible = controller.state().visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].1.server_name, "db1");
        assert_eq!(controller.state().servers.len(), 2);

        controller.edit(Edit::ClearFilters);
        assert_eq!(controller.state().visible().len(), 2);
    }

    #[tokio::test]
    async fn search_then_clear_restores_full_list() {
        let mut controller = Controller::new(two_servers());
        controller.edit(Edit::SetSearchQuery("db2".into()));
        controller.dispatch(Action::Search).await.unwrap();
        assert_eq!(controller.state().servers.len(), 1);
        assert_eq!(controller.state().servers[0].server_name, "db2");

        controller.edit(Edit::SetSearchQuery(String::new()));
        controller.dispatch(Action::Search).await.unwrap();
        assert_eq!(controller.state().servers.len(), 2);
    }

    #[tokio::test]
    async fn import_replaces_and_refetches() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller
            .dispatch(Action::Import("alpha\nbeta\ngamma".into()))
            .await
            .unwrap();
        assert_eq!(controller.state().servers.len(), 3);
        assert_eq!(controller.state().servers[0].server_name, "alpha");
        assert_eq!(controller.export().await.unwrap(), "alpha\nbeta\ngamma");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_list() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller.dispatch(Action::Load).await.unwrap();

        api.fail_list.store(true, Ordering::SeqCst);
        assert!(controller.dispatch(Action::Load).await.is_err());
        assert_eq!(controller.state().servers.len(), 2);
        assert!(controller.state().last_error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn refresh_picks_up_outside_writes_and_keeps_search() {
        let api = two_servers();
        let mut controller = Controller::new(api.clone());
        controller.refresh().await.unwrap();
        assert_eq!(controller.state().servers.len(), 2);

        api.create(&server(3, "db3", "C")).await.unwrap();
        controller.refresh().await.unwrap();
        assert_eq!(controller.state().servers.len(), 3);

        controller.edit(Edit::SetSearchQuery("db3".into()));
        api.create(&server(4, "web4", "D")).await.unwrap();
        controller.refresh().await.unwrap();
        assert_eq!(controller.state().servers, vec![server(3, "db3", "C")]);
    }

    #[tokio::test]
    async fn refresh_keeps_the_previous_error() {
        let mut controller = Controller::new(two_servers());
        controller.record_error("upload could not be read");
        controller.refresh().await.unwrap();
        assert_eq!(
            controller.state().last_error.as_deref(),
            Some("upload could not be read")
        );
    }

    #[test]
    fn next_id_starts_at_one() {
        assert_eq!(next_id(&[]), 1);
        assert_eq!(next_id(&[server(4, "a", ""), server(2, "b", "")]), 5);
    }
}
