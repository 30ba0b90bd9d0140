use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{
    ApiError, Backend, ConversationDetail, ConversationPage, ConversationSummary, FacetCounts,
    SessionInfo, Stats,
};
use crate::export;
use crate::state::{
    Chip, EditOutcome, EditableField, FacetGroup, FieldKind, FieldTxn, FieldUpdate, FieldValue,
    FilterSet, InlineEditor, Notifications, build_groups,
};
use crate::ui::{ConversationListState, ConversationState, FilterPaneState, Theme};

/// Editable fields in the order the details pane lists them.
pub const DETAIL_FIELDS: [EditableField; 11] = [
    EditableField::Category,
    EditableField::Subcategory,
    EditableField::Name,
    EditableField::Company,
    EditableField::Erp,
    EditableField::Channel,
    EditableField::CustomerNumber,
    EditableField::HasHandoff,
    EditableField::Resolution,
    EditableField::Rlhf,
    EditableField::Template,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Filters,
    Conversations,
    Messages,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Loading,
    Ready,
    /// Initial load aborted; the app stays empty until restarted.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selected {
    pub session_id: String,
    pub detail: ConversationDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailPane {
    Empty,
    Loading { session_id: String },
    Loaded(Box<Selected>),
    Failed { session_id: String, error: String },
}

#[derive(Debug)]
pub struct Bootstrap {
    pub facets: FacetCounts,
    pub stats: Stats,
    pub page: ConversationPage,
}

/// Results of background API calls, handled on the UI task.
#[derive(Debug)]
pub enum ApiMessage {
    Bootstrapped(Result<Bootstrap, ApiError>),
    ConversationsLoaded {
        request: u64,
        result: Result<ConversationPage, ApiError>,
    },
    DetailLoaded {
        token: u64,
        session_id: String,
        result: Result<ConversationDetail, ApiError>,
    },
    FieldSaved {
        session_id: String,
        field: EditableField,
        result: Result<(), ApiError>,
    },
}

pub struct App {
    pub focus: FocusPane,
    backend: Arc<dyn Backend>,
    api_tx: mpsc::UnboundedSender<ApiMessage>,
    pub api_rx: mpsc::UnboundedReceiver<ApiMessage>,
    pub boot: BootState,
    pub facets: FacetCounts,
    pub groups: Vec<FacetGroup>,
    pub stats: Option<Stats>,
    pub filters: FilterSet,
    pub conversations: Vec<ConversationSummary>,
    pub total_count: u64,
    list_request: u64,
    pub list_loading: bool,
    pub filter_state: FilterPaneState,
    pub list_state: ConversationListState,
    pub selected_session: Option<String>,
    selection_token: u64,
    pub detail: DetailPane,
    pub detail_cursor: usize,
    pub editor: Option<InlineEditor>,
    pub pending: HashMap<EditableField, FieldTxn>,
    pub message_state: ConversationState,
    pub notifications: Notifications,
    pub theme: Theme,
    pub show_help: bool,
    pub viewport_height: Option<usize>,
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, theme: Theme, export_dir: PathBuf) -> Self {
        let (api_tx, api_rx) = mpsc::unbounded_channel();
        Self {
            focus: FocusPane::Conversations,
            backend,
            api_tx,
            api_rx,
            boot: BootState::Loading,
            facets: FacetCounts::default(),
            groups: Vec::new(),
            stats: None,
            filters: FilterSet::default(),
            conversations: Vec::new(),
            total_count: 0,
            list_request: 0,
            list_loading: false,
            filter_state: FilterPaneState::new(),
            list_state: ConversationListState::new(),
            selected_session: None,
            selection_token: 0,
            detail: DetailPane::Empty,
            detail_cursor: 0,
            editor: None,
            pending: HashMap::new(),
            message_state: ConversationState::new(),
            notifications: Notifications::default(),
            theme,
            show_help: false,
            viewport_height: None,
            export_dir,
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ApiMessage> + Send + 'static,
    {
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            // Receiver only goes away on shutdown.
            let _ = tx.send(task.await);
        });
    }

    /// Filters, then stats, then the first page, stopping at the first failure.
    pub fn start(&mut self) {
        self.boot = BootState::Loading;
        let backend = Arc::clone(&self.backend);
        let filters = self.filters.clone();
        // Counts as list request #1 so later reloads supersede it.
        self.list_request += 1;
        self.spawn(async move {
            let result = async {
                let facets = backend.filters().await?;
                let stats = backend.stats().await?;
                let page = backend.conversations(&filters).await?;
                Ok(Bootstrap {
                    facets,
                    stats,
                    page,
                })
            }
            .await;
            ApiMessage::Bootstrapped(result)
        });
    }

    pub fn is_loading(&self) -> bool {
        self.boot == BootState::Loading
            || self.list_loading
            || matches!(self.detail, DetailPane::Loading { .. })
    }

    pub fn handle_api_message(&mut self, message: ApiMessage) {
        match message {
            ApiMessage::Bootstrapped(result) => self.handle_bootstrapped(result),
            ApiMessage::ConversationsLoaded { request, result } => {
                self.handle_conversations_loaded(request, result)
            }
            ApiMessage::DetailLoaded {
                token,
                session_id,
                result,
            } => self.handle_detail_loaded(token, session_id, result),
            ApiMessage::FieldSaved {
                session_id,
                field,
                result,
            } => self.handle_field_saved(session_id, field, result),
        }
    }

    fn handle_bootstrapped(&mut self, result: Result<Bootstrap, ApiError>) {
        match result {
            Ok(boot) => {
                tracing::info!(
                    "Initial load complete: {} conversations",
                    boot.page.total_count
                );
                self.groups = build_groups(&boot.facets);
                self.facets = boot.facets;
                self.stats = Some(boot.stats);
                self.boot = BootState::Ready;
                self.handle_conversations_loaded(1, Ok(boot.page));
            }
            Err(e) => {
                self.boot = BootState::Failed;
                self.notifications
                    .error(format!("Failed to load initial data: {}", e));
            }
        }
    }

    // ----- filters -----

    pub fn chips(&self) -> impl Iterator<Item = &Chip> {
        self.groups.iter().flat_map(|g| g.chips.iter())
    }

    pub fn chip_count(&self) -> usize {
        self.groups.iter().map(|g| g.chips.len()).sum()
    }

    pub fn toggle_chip(&mut self, index: usize) {
        let Some(chip) = self.chips().nth(index).cloned() else {
            return;
        };
        let active = self.filters.toggle(&chip);
        tracing::debug!(
            "Filter {} '{}' {}",
            chip.facet.title(),
            chip.label,
            if active { "on" } else { "off" }
        );
        self.reload_conversations();
    }

    pub fn toggle_focused_chip(&mut self) {
        self.toggle_chip(self.filter_state.cursor);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.reload_conversations();
    }

    pub fn reload_conversations(&mut self) {
        if self.boot != BootState::Ready {
            return;
        }
        self.list_request += 1;
        self.list_loading = true;
        let request = self.list_request;
        let backend = Arc::clone(&self.backend);
        let filters = self.filters.clone();
        self.spawn(async move {
            let result = backend.conversations(&filters).await;
            ApiMessage::ConversationsLoaded { request, result }
        });
    }

    fn handle_conversations_loaded(
        &mut self,
        request: u64,
        result: Result<ConversationPage, ApiError>,
    ) {
        // Only the newest request speaks for the current filters.
        if request != self.list_request {
            tracing::debug!("Dropping superseded list reply #{}", request);
            return;
        }
        self.list_loading = false;

        match result {
            Ok(page) => {
                self.conversations = page.conversations;
                self.total_count = page.total_count;

                // Keep the highlight on the selected conversation when it is still listed.
                let highlight = self
                    .selected_session
                    .as_ref()
                    .and_then(|id| self.conversations.iter().position(|c| &c.session_id == id))
                    .or(if self.conversations.is_empty() {
                        None
                    } else {
                        Some(0)
                    });
                self.list_state.select(highlight);
            }
            Err(e) => {
                self.notifications
                    .error(format!("Failed to load conversations: {}", e));
            }
        }
    }

    // ----- selection -----

    pub fn select_conversation(&mut self, index: usize) {
        if let Some(id) = self.conversations.get(index).map(|c| c.session_id.clone()) {
            self.list_state.select(Some(index));
            self.select_session(id);
        }
    }

    pub fn select_highlighted(&mut self) {
        if let Some(idx) = self.list_state.selected() {
            self.select_conversation(idx);
        }
    }

    pub fn select_session(&mut self, session_id: String) {
        self.selection_token += 1;
        let token = self.selection_token;
        self.selected_session = Some(session_id.clone());
        self.detail = DetailPane::Loading {
            session_id: session_id.clone(),
        };
        self.editor = None;
        self.pending.clear();
        self.detail_cursor = 0;
        self.message_state = ConversationState::new();

        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.conversation(&session_id).await;
            ApiMessage::DetailLoaded {
                token,
                session_id,
                result,
            }
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection_token += 1;
        self.selected_session = None;
        self.detail = DetailPane::Empty;
        self.editor = None;
        self.pending.clear();
        self.message_state = ConversationState::new();
    }

    fn handle_detail_loaded(
        &mut self,
        token: u64,
        session_id: String,
        result: Result<ConversationDetail, ApiError>,
    ) {
        if token != self.selection_token {
            tracing::debug!("Dropping stale detail reply for {}", session_id);
            return;
        }

        match result {
            Ok(detail) => {
                self.detail = DetailPane::Loaded(Box::new(Selected { session_id, detail }));
            }
            Err(e) => {
                self.notifications
                    .error(format!("Failed to load conversation details: {}", e));
                self.detail = DetailPane::Failed {
                    session_id,
                    error: e.to_string(),
                };
            }
        }
    }

    pub fn selected(&self) -> Option<&Selected> {
        match &self.detail {
            DetailPane::Loaded(selected) => Some(selected),
            _ => None,
        }
    }

    pub fn session_info(&self) -> Option<&SessionInfo> {
        self.selected()
            .and_then(|s| s.detail.session_info.as_ref())
    }

    fn session_info_mut(&mut self, session_id: &str) -> Option<&mut SessionInfo> {
        match &mut self.detail {
            DetailPane::Loaded(selected) if selected.session_id == session_id => {
                selected.detail.session_info.as_mut()
            }
            _ => None,
        }
    }

    // ----- editing -----

    pub fn focused_field(&self) -> EditableField {
        DETAIL_FIELDS[self.detail_cursor.min(DETAIL_FIELDS.len() - 1)]
    }

    pub fn move_field_cursor(&mut self, delta: isize) {
        let len = DETAIL_FIELDS.len() as isize;
        self.detail_cursor = (self.detail_cursor as isize + delta).rem_euclid(len) as usize;
    }

    /// Value to display for `field`: the pending one while an update is in flight.
    pub fn shown_value(&self, field: EditableField) -> Option<FieldValue> {
        if let Some(txn) = self.pending.get(&field) {
            return Some(txn.shown().clone());
        }
        self.session_info().map(|info| field.current(info))
    }

    /// Start editing the focused field. Checkboxes toggle immediately.
    pub fn activate_field(&mut self) {
        self.activate(self.focused_field());
    }

    pub fn activate(&mut self, field: EditableField) {
        if self.editor.is_some() {
            return;
        }
        if field.kind() == FieldKind::Checkbox {
            self.toggle_checkbox(field);
            return;
        }
        let Some(info) = self.session_info() else {
            return;
        };
        let editor = InlineEditor::open(field, info, &self.facets);
        self.editor = editor;
    }

    pub fn toggle_checkbox(&mut self, field: EditableField) {
        let Some(FieldValue::Flag(current)) = self.shown_value(field) else {
            return;
        };
        self.submit(FieldUpdate::new(field, FieldValue::Flag(!current)));
    }

    /// Enter or focus loss.
    pub fn confirm_edit(&mut self) {
        let Some(editor) = self.editor.take() else {
            return;
        };
        match editor.confirm() {
            EditOutcome::Unchanged => {}
            EditOutcome::Submit(update) => self.submit(update),
        }
    }

    /// Escape: restore the display without touching the backend.
    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    fn submit(&mut self, update: FieldUpdate) {
        let field = update.field;
        if self.pending.contains_key(&field) {
            return;
        }
        // Every body carries the classification, so saves must not overlap a change to it.
        let blocked = if field.is_classification() {
            !self.pending.is_empty()
        } else {
            self.pending.keys().any(|f| f.is_classification())
        };
        if blocked {
            self.notifications
                .error("Another change is still saving, try again in a moment");
            return;
        }
        let Some(selected) = self.selected() else {
            return;
        };
        let Some(info) = selected.detail.session_info.as_ref() else {
            return;
        };

        let session_id = selected.session_id.clone();
        let body = update.request_body(info);
        let txn = FieldTxn::begin(&session_id, info, update);
        self.pending.insert(field, txn);

        tracing::debug!("Saving {} for {}", field.wire_name(), session_id);
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.update(&session_id, &body).await;
            ApiMessage::FieldSaved {
                session_id,
                field,
                result,
            }
        });
    }

    fn handle_field_saved(
        &mut self,
        session_id: String,
        field: EditableField,
        result: Result<(), ApiError>,
    ) {
        let txn = match self.pending.get(&field) {
            Some(t) if t.session_id == session_id => self.pending.remove(&field),
            _ => None,
        };

        match result {
            Ok(()) => {
                let Some(txn) = txn else {
                    tracing::debug!(
                        "{} saved for {} after it was deselected",
                        field.wire_name(),
                        session_id
                    );
                    return;
                };
                let Some(info) = self.session_info_mut(&session_id) else {
                    return;
                };
                let update = txn.commit(info);
                if let Some(message) = update
                    .value
                    .as_flag()
                    .and_then(|checked| field.success_message(checked))
                {
                    self.notifications.success(message);
                }
            }
            Err(e) => {
                if let Some(txn) = txn {
                    let restored = txn.rollback();
                    tracing::debug!("Reverted {} to {:?}", field.wire_name(), restored);
                }
                self.notifications
                    .error(format!("{}: {}", field.failure_message(), e));
            }
        }
    }

    // ----- misc -----

    pub fn export_selected(&mut self) {
        let Some(selected) = self.selected() else {
            self.notifications.error("No conversation selected to export");
            return;
        };
        match export::write_transcript(&self.export_dir, &selected.session_id, &selected.detail) {
            Ok(path) => self
                .notifications
                .success(format!("Transcript exported to {}", path.display())),
            Err(e) => self
                .notifications
                .error(format!("Failed to export transcript: {:#}", e)),
        }
    }

    pub fn cycle_focus(&mut self) {
        self.confirm_edit();
        self.focus = match self.focus {
            FocusPane::Filters => FocusPane::Conversations,
            FocusPane::Conversations => FocusPane::Messages,
            FocusPane::Messages => FocusPane::Details,
            FocusPane::Details => FocusPane::Filters,
        };
    }

    pub fn cycle_focus_reverse(&mut self) {
        self.confirm_edit();
        self.focus = match self.focus {
            FocusPane::Filters => FocusPane::Details,
            FocusPane::Conversations => FocusPane::Filters,
            FocusPane::Messages => FocusPane::Conversations,
            FocusPane::Details => FocusPane::Messages,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeBackend};
    use crate::api::{Direction, FacetItem, Message};
    use crate::state::Severity;
    use crate::state::filters::{FilterKey, FilterValue};

    fn summary(id: &str) -> ConversationSummary {
        ConversationSummary {
            session_id: id.to_string(),
            classified_at: "2024-05-01 10:00:00".into(),
            summary: Some(format!("summary {}", id)),
            confidence: 0.9,
            rlhf: false,
        }
    }

    fn detail(category: &str) -> ConversationDetail {
        ConversationDetail {
            messages: vec![Message {
                content: "hello".into(),
                direction: Direction::Inbound,
                timestamp: "2024-05-01T10:00:00Z".into(),
                operator_info: None,
            }],
            session_info: Some(SessionInfo {
                category: category.into(),
                subcategory: "Invoice".into(),
                name: Some("Maria".into()),
                primary_agent: Some("ana".into()),
                final_agent: Some("bruno".into()),
                handoff_count: 1,
                ..SessionInfo::default()
            }),
        }
    }

    fn backend() -> Arc<FakeBackend> {
        let fake = FakeBackend::default();
        {
            let mut facets = fake.facets.lock().unwrap();
            facets.categories = ["Access", "Billing"]
                .iter()
                .map(|n| FacetItem {
                    name: n.to_string(),
                    count: 2,
                })
                .collect();
            facets.subcategories = vec![FacetItem {
                name: "Invoice".into(),
                count: 2,
            }];
        }
        {
            let mut page = fake.page.lock().unwrap();
            page.conversations = vec![summary("A"), summary("B")];
            page.total_count = 2;
        }
        {
            let mut details = fake.details.lock().unwrap();
            details.insert("A".into(), detail("Billing"));
            details.insert("B".into(), detail("Access"));
        }
        Arc::new(fake)
    }

    fn app(backend: &Arc<FakeBackend>) -> App {
        App::new(
            Arc::clone(backend) as Arc<dyn Backend>,
            Theme::default(),
            PathBuf::from("."),
        )
    }

    async fn pump(app: &mut App) {
        let message = app.api_rx.recv().await.expect("channel open");
        app.handle_api_message(message);
    }

    async fn ready(backend: &Arc<FakeBackend>) -> App {
        let mut app = app(backend);
        app.start();
        pump(&mut app).await;
        assert_eq!(app.boot, BootState::Ready);
        backend.clear_calls();
        app
    }

    async fn ready_with(backend: &Arc<FakeBackend>, session_id: &str) -> App {
        let mut app = ready(backend).await;
        app.select_session(session_id.to_string());
        pump(&mut app).await;
        assert!(app.selected().is_some());
        backend.clear_calls();
        app
    }

    fn info(app: &App) -> SessionInfo {
        app.session_info().cloned().unwrap()
    }

    #[tokio::test]
    async fn bootstrap_loads_in_order_with_default_filter() {
        let backend = backend();
        let mut app = app(&backend);
        app.start();
        assert!(app.is_loading());
        pump(&mut app).await;

        assert_eq!(
            backend.calls(),
            vec![
                Call::Filters,
                Call::Stats,
                Call::Conversations(vec![("rlhf", "false".into())]),
            ]
        );
        assert_eq!(app.boot, BootState::Ready);
        assert_eq!(app.conversations.len(), 2);
        assert_eq!(app.total_count, 2);
        assert_eq!(app.list_state.selected(), Some(0));
        assert!(!app.groups.is_empty());
        assert!(!app.is_loading());
    }

    #[tokio::test]
    async fn bootstrap_aborts_on_filters_failure() {
        let backend = backend();
        backend.reject("filters", "db down");
        let mut app = app(&backend);
        app.start();
        pump(&mut app).await;

        assert_eq!(backend.calls(), vec![Call::Filters]);
        assert_eq!(app.boot, BootState::Failed);
        assert!(app.conversations.is_empty());
        assert!(app.stats.is_none());
        let notice = app.notifications.current().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("db down"));
        assert!(!app.is_loading());
    }

    #[tokio::test]
    async fn chip_toggle_reloads_with_query() {
        let backend = backend();
        let mut app = ready(&backend).await;

        // First chip is the "Access" category.
        app.toggle_chip(0);
        assert!(app.list_loading);
        pump(&mut app).await;
        app.toggle_chip(0);
        pump(&mut app).await;

        assert_eq!(
            backend.calls(),
            vec![
                Call::Conversations(vec![
                    ("category", "Access".into()),
                    ("rlhf", "false".into()),
                ]),
                Call::Conversations(vec![("rlhf", "false".into())]),
            ]
        );
        assert_eq!(app.filters, FilterSet::default());
        assert!(!app.list_loading);
    }

    #[tokio::test]
    async fn clear_filters_resets_and_reloads() {
        let backend = backend();
        let mut app = ready(&backend).await;
        app.toggle_chip(0);
        pump(&mut app).await;
        app.clear_filters();
        pump(&mut app).await;

        assert_eq!(app.filters, FilterSet::default());
        assert_eq!(
            backend.calls().last(),
            Some(&Call::Conversations(vec![("rlhf", "false".into())]))
        );
    }

    #[tokio::test]
    async fn list_failure_keeps_previous_state() {
        let backend = backend();
        let mut app = ready(&backend).await;
        backend.reject("conversations", "timeout");

        app.toggle_chip(0);
        pump(&mut app).await;

        assert_eq!(app.conversations.len(), 2);
        assert_eq!(
            app.filters.get(FilterKey::Category),
            Some(&FilterValue::Text("Access".into()))
        );
        assert!(app.notifications.current().unwrap().message.contains("timeout"));
        assert!(!app.list_loading);

        backend.accept("conversations");
        backend.page.lock().unwrap().conversations.truncate(1);
        app.reload_conversations();
        pump(&mut app).await;
        assert_eq!(app.conversations.len(), 1);
    }

    #[tokio::test]
    async fn stale_list_reply_is_dropped() {
        let backend = backend();
        let mut app = ready(&backend).await;
        // Requests #2 and #3; their own replies stay queued.
        app.reload_conversations();
        app.reload_conversations();

        app.handle_api_message(ApiMessage::ConversationsLoaded {
            request: 3,
            result: Ok(ConversationPage {
                conversations: vec![summary("C")],
                total_count: 1,
            }),
        });
        app.handle_api_message(ApiMessage::ConversationsLoaded {
            request: 2,
            result: Ok(ConversationPage::default()),
        });

        assert_eq!(app.conversations, vec![summary("C")]);
        assert_eq!(app.total_count, 1);
        assert!(!app.list_loading);
    }

    #[tokio::test]
    async fn superseded_list_replies_are_ignored() {
        let backend = backend();
        let mut app = ready(&backend).await;
        let before = app.conversations.clone();
        app.reload_conversations();
        app.reload_conversations();

        // The newest request fails, then the older one succeeds late.
        app.handle_api_message(ApiMessage::ConversationsLoaded {
            request: 3,
            result: Err(ApiError::Rejected("db down".into())),
        });
        app.handle_api_message(ApiMessage::ConversationsLoaded {
            request: 2,
            result: Ok(ConversationPage {
                conversations: vec![summary("C")],
                total_count: 1,
            }),
        });
        assert_eq!(app.conversations, before);
        assert!(!app.list_loading);

        // A late failure of a superseded request raises nothing.
        app.notifications = Notifications::default();
        app.reload_conversations();
        app.handle_api_message(ApiMessage::ConversationsLoaded {
            request: 3,
            result: Err(ApiError::Rejected("db down".into())),
        });
        assert!(app.notifications.current().is_none());
        assert!(app.list_loading);
    }

    #[tokio::test]
    async fn last_selection_wins() {
        let backend = backend();
        let mut app = ready(&backend).await;
        let gate_a = backend.gate("A");

        app.select_session("A".into());
        app.select_session("B".into());
        pump(&mut app).await;
        assert_eq!(app.selected().unwrap().session_id, "B");

        gate_a.notify_one();
        pump(&mut app).await;

        let selected = app.selected().unwrap();
        assert_eq!(selected.session_id, "B");
        assert_eq!(info(&app).category, "Access");
        assert_eq!(app.selected_session.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn escape_discards_late_detail() {
        let backend = backend();
        let mut app = ready(&backend).await;
        let gate = backend.gate("A");

        app.select_session("A".into());
        app.clear_selection();
        gate.notify_one();
        pump(&mut app).await;

        assert_eq!(app.detail, DetailPane::Empty);
        assert!(app.selected_session.is_none());
    }

    #[tokio::test]
    async fn detail_failure_shows_error_pane_and_keeps_selection() {
        let backend = backend();
        let mut app = ready(&backend).await;
        backend.reject("conversation", "boom");

        app.select_conversation(1);
        pump(&mut app).await;

        assert!(matches!(
            &app.detail,
            DetailPane::Failed { session_id, .. } if session_id == "B"
        ));
        assert_eq!(app.selected_session.as_deref(), Some("B"));
        assert_eq!(app.conversations.len(), 2);
        assert_eq!(
            app.notifications.current().unwrap().severity,
            Severity::Error
        );
    }

    #[tokio::test]
    async fn unchanged_category_makes_no_call() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Category);
        assert!(app.editor.is_some());
        app.confirm_edit();

        assert!(app.editor.is_none());
        assert!(app.pending.is_empty());
        assert!(backend.calls().is_empty());
        assert!(!info(&app).rlhf);
    }

    #[tokio::test]
    async fn escape_cancels_without_call() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Name);
        app.editor.as_mut().unwrap().push_char('!');
        app.cancel_edit();

        assert!(app.editor.is_none());
        assert!(backend.calls().is_empty());
        assert_eq!(info(&app).name.as_deref(), Some("Maria"));
    }

    #[tokio::test]
    async fn category_edit_sends_classification_and_marks_rlhf() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Category);
        app.editor.as_mut().unwrap().move_selection(-1);
        app.confirm_edit();
        assert_eq!(
            app.shown_value(EditableField::Category),
            Some(FieldValue::Text("Access".into()))
        );
        pump(&mut app).await;

        assert_eq!(
            backend.calls(),
            vec![Call::Update(
                "A".into(),
                serde_json::json!({"category": "Access", "subcategory": "Invoice"})
            )]
        );
        let info = info(&app);
        assert_eq!(info.category, "Access");
        assert!(info.rlhf);
        assert!(app.pending.is_empty());
    }

    #[tokio::test]
    async fn saves_wait_for_classification_change() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Category);
        app.editor.as_mut().unwrap().move_selection(-1);
        app.confirm_edit();
        app.toggle_checkbox(EditableField::Template);
        assert!(!app.pending.contains_key(&EditableField::Template));
        assert_eq!(
            app.notifications.current().map(|n| n.severity),
            Some(Severity::Error)
        );
        pump(&mut app).await;

        // Once the category is saved the next body carries it.
        app.toggle_checkbox(EditableField::Template);
        pump(&mut app).await;
        assert_eq!(
            backend.calls(),
            vec![
                Call::Update(
                    "A".into(),
                    serde_json::json!({"category": "Access", "subcategory": "Invoice"})
                ),
                Call::Update(
                    "A".into(),
                    serde_json::json!({"category": "Access", "subcategory": "Invoice", "template": true})
                ),
            ]
        );
        let info = info(&app);
        assert_eq!(info.category, "Access");
        assert!(info.template);
    }

    #[tokio::test]
    async fn classification_change_waits_for_other_saves() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.toggle_checkbox(EditableField::Resolution);
        app.activate(EditableField::Category);
        app.editor.as_mut().unwrap().move_selection(-1);
        app.confirm_edit();
        assert!(!app.pending.contains_key(&EditableField::Category));
        pump(&mut app).await;

        assert_eq!(backend.calls().len(), 1);
        assert_eq!(info(&app).category, "Billing");
    }

    #[tokio::test]
    async fn text_edit_sends_changed_field() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Company);
        for c in "ACME ".chars() {
            app.editor.as_mut().unwrap().push_char(c);
        }
        app.confirm_edit();
        pump(&mut app).await;

        assert_eq!(
            backend.calls(),
            vec![Call::Update(
                "A".into(),
                serde_json::json!({
                    "category": "Billing",
                    "subcategory": "Invoice",
                    "company": "ACME",
                })
            )]
        );
        let info = info(&app);
        assert_eq!(info.company.as_deref(), Some("ACME"));
        assert!(info.rlhf);
    }

    #[tokio::test]
    async fn failed_handoff_toggle_reverts_and_keeps_info() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;
        backend.reject("update", "locked");
        let before = info(&app);

        app.activate(EditableField::HasHandoff);
        assert_eq!(
            app.shown_value(EditableField::HasHandoff),
            Some(FieldValue::Flag(true))
        );
        pump(&mut app).await;

        assert_eq!(info(&app), before);
        assert_eq!(info(&app).handoff_count, 1);
        assert_eq!(
            app.shown_value(EditableField::HasHandoff),
            Some(FieldValue::Flag(false))
        );
        let notice = app.notifications.current().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.starts_with("Failed to save handoff change"));
    }

    #[tokio::test]
    async fn failed_update_never_mutates_any_field() {
        for field in DETAIL_FIELDS {
            let backend = backend();
            let mut app = ready_with(&backend, "A").await;
            backend.reject("update", "nope");
            let before = info(&app);

            match field.kind() {
                FieldKind::Checkbox => app.activate(field),
                FieldKind::Dropdown => {
                    app.activate(field);
                    app.editor.as_mut().unwrap().move_selection(1);
                    app.confirm_edit();
                }
                FieldKind::Text => {
                    app.activate(field);
                    app.editor.as_mut().unwrap().push_char('x');
                    app.confirm_edit();
                }
            }
            if app.pending.is_empty() {
                // Single-option dropdown: nothing to send.
                continue;
            }
            pump(&mut app).await;

            assert_eq!(info(&app), before, "{:?} mutated the session", field);
            assert!(app.pending.is_empty());
        }
    }

    #[tokio::test]
    async fn template_toggle_announces_success() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Template);
        pump(&mut app).await;

        let info = info(&app);
        assert!(info.template);
        assert!(info.rlhf);
        let notice = app.notifications.current().unwrap();
        assert_eq!(notice.severity, Severity::Success);
        assert_eq!(notice.message, "Conversation marked as training template");
    }

    #[tokio::test]
    async fn rlhf_toggle_only_changes_rlhf() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Rlhf);
        pump(&mut app).await;
        assert!(info(&app).rlhf);

        app.activate(EditableField::Rlhf);
        pump(&mut app).await;
        assert!(!info(&app).rlhf);
        assert_eq!(
            app.notifications.current().unwrap().message,
            "RLHF marked as not validated"
        );
        assert_eq!(
            backend.calls().last(),
            Some(&Call::Update(
                "A".into(),
                serde_json::json!({"category": "Billing", "subcategory": "Invoice", "rlhf": false})
            ))
        );
    }

    #[tokio::test]
    async fn update_reply_after_reselection_leaves_new_session_alone() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Resolution);
        app.select_session("B".into());
        // Update reply and B's detail arrive in either order.
        pump(&mut app).await;
        pump(&mut app).await;

        let info = info(&app);
        assert_eq!(info.category, "Access");
        assert!(!info.resolution);
        assert!(!info.rlhf);
    }

    #[tokio::test]
    async fn late_reply_for_old_session_keeps_current_save_pending() {
        let backend = backend();
        let mut app = ready_with(&backend, "B").await;

        app.activate(EditableField::Resolution);
        app.handle_api_message(ApiMessage::FieldSaved {
            session_id: "A".into(),
            field: EditableField::Resolution,
            result: Ok(()),
        });
        assert!(app.pending.contains_key(&EditableField::Resolution));

        pump(&mut app).await;
        assert!(app.pending.is_empty());
        assert!(info(&app).resolution);
    }

    #[tokio::test]
    async fn only_one_editor_at_a_time() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;

        app.activate(EditableField::Name);
        app.activate(EditableField::Company);
        assert_eq!(app.editor.as_ref().unwrap().field, EditableField::Name);

        // Checkbox toggles are ignored while an editor is open.
        app.activate(EditableField::Template);
        assert!(app.pending.is_empty());
    }

    #[tokio::test]
    async fn focus_change_confirms_open_editor() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;
        app.focus = FocusPane::Details;

        app.activate(EditableField::Erp);
        for c in "SAP".chars() {
            app.editor.as_mut().unwrap().push_char(c);
        }
        app.cycle_focus();
        assert!(app.editor.is_none());
        assert_eq!(app.focus, FocusPane::Filters);
        pump(&mut app).await;

        assert_eq!(info(&app).erp.as_deref(), Some("SAP"));
    }

    #[tokio::test]
    async fn export_writes_selected_transcript() {
        let backend = backend();
        let mut app = ready_with(&backend, "A").await;
        let dir = tempfile::tempdir().unwrap();
        app.export_dir = dir.path().to_path_buf();

        app.export_selected();

        assert!(dir.path().join("A.html").exists());
        assert_eq!(
            app.notifications.current().unwrap().severity,
            Severity::Success
        );
    }

    #[test]
    fn field_cursor_wraps() {
        let backend = backend();
        let mut app = app(&backend);
        app.move_field_cursor(-1);
        assert_eq!(app.focused_field(), EditableField::Template);
        app.move_field_cursor(1);
        assert_eq!(app.focused_field(), EditableField::Category);
    }
}
