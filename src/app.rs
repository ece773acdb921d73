//! Session state of the panel and the operations the key bindings drive.
//!
//! Every handled key is followed by [`App::sync`], which re-evaluates what the
//! visible tab needs from the backend: the poll list when its cache is absent,
//! and the selected poll's results every time.

use std::path::PathBuf;

use log::{info, warn};
use serde_json::Value;

use crate::config::{Settings, save_action_param};
use crate::config_panel::ConfigPanel;
use crate::detail::DetailViewer;
use crate::dispatch;
use crate::error::PanelError;
use crate::models::{FormDraft, PollDetail, PollSummary};
use crate::network::ActionGateway;
use crate::polls::{LOAD_FAILED, PollList};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Dispatch,
    Manage,
    Configuration,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Dispatch, Tab::Manage, Tab::Configuration];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dispatch => "Dispatch New Poll",
            Tab::Manage => "Manage & View Polls",
            Tab::Configuration => "Configuration",
        }
    }

    pub fn as_index(self) -> usize {
        match self {
            Tab::Dispatch => 0,
            Tab::Manage => 1,
            Tab::Configuration => 2,
        }
    }

    pub fn next(self) -> Self {
        Tab::ALL[(self.as_index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Tab::ALL[(self.as_index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    TargetUser,
    PollName,
    Choices,
    SelectableCount,
    Duration,
    PreferredId,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::TargetUser,
        FormField::PollName,
        FormField::Choices,
        FormField::SelectableCount,
        FormField::Duration,
        FormField::PreferredId,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::TargetUser => "Target User Session ID (e.g., WhatsApp number)",
            FormField::PollName => "Poll Name/Question",
            FormField::Choices => "Poll Choices (comma-separated)",
            FormField::SelectableCount => "Selectable Count",
            FormField::Duration => "Poll Duration (minutes, 0 for indefinite)",
            FormField::PreferredId => "Preferred Internal ID (Optional)",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FormField::SelectableCount | FormField::Duration)
    }

    fn index(self) -> usize {
        FormField::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        FormField::ALL[(self.index() + 1).min(FormField::ALL.len() - 1)]
    }

    pub fn prev(self) -> Self {
        FormField::ALL[self.index().saturating_sub(1)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub details: Option<Value>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into(), details: None }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, text: text.into(), details: None }
    }

    pub fn error(err: &PanelError) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: err.to_string(),
            details: err.details().cloned(),
        }
    }
}

/// Everything that lives for one panel session.
#[derive(Debug)]
pub struct Session {
    pub draft: FormDraft,
    pub list: PollList,
    pub viewer: DetailViewer,
}

impl Session {
    pub fn new(page_limit: u32) -> Self {
        Self {
            draft: FormDraft::default(),
            list: PollList::new(page_limit),
            viewer: DetailViewer::new(),
        }
    }
}

pub struct App {
    pub settings: Settings,
    /// File that Configuration edits are written to.
    pub config_path: Option<PathBuf>,
    pub session: Session,
    pub tab: Tab,
    pub form_field: FormField,
    /// Highlighted row on the current page.
    pub cursor: usize,
    pub notice: Option<Notice>,
    pub detail: Option<Result<PollDetail, PanelError>>,
    pub raw: Option<Result<Value, PanelError>>,
    pub detail_scroll: u16,
    /// Poll id waiting for a y/n delete confirmation.
    pub confirm_delete: Option<String>,
    pub config_panel: ConfigPanel,
    pub should_quit: bool,
}

impl App {
    pub fn new(settings: Settings, config_path: Option<PathBuf>) -> Self {
        let session = Session::new(settings.page_limit);
        Self {
            settings,
            config_path,
            session,
            tab: Tab::Dispatch,
            form_field: FormField::TargetUser,
            cursor: 0,
            notice: None,
            detail: None,
            raw: None,
            detail_scroll: 0,
            confirm_delete: None,
            config_panel: ConfigPanel::default(),
            should_quit: false,
        }
    }

    /// Re-evaluates the visible tab against the backend.
    pub async fn sync<G: ActionGateway>(&mut self, gateway: &G) {
        if self.tab != Tab::Manage {
            return;
        }

        let load = self.session.list.get_page(gateway).await;
        let item_count = load.page.items.len();
        let empty = load.page.is_empty();
        if let Some(err) = load.failure {
            self.notice = Some(Notice {
                kind: NoticeKind::Error,
                text: LOAD_FAILED.to_string(),
                details: err.details().cloned(),
            });
        }
        self.cursor = self.cursor.min(item_count.saturating_sub(1));

        let selected = self.session.list.selected().map(str::to_string);
        match selected {
            Some(id) if !empty => {
                let detail = self.session.viewer.view_details(gateway, &id).await;
                self.raw = if detail.is_ok() && self.session.viewer.raw_enabled(&id) {
                    Some(self.session.viewer.raw_responses(gateway, &id).await)
                } else {
                    None
                };
                self.detail = Some(detail);
            }
            _ => {
                self.detail = None;
                self.raw = None;
            }
        }
    }

    pub fn polls(&self) -> &[PollSummary] {
        self.session
            .list
            .cache
            .get()
            .map(|p| p.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn highlighted_poll(&self) -> Option<&PollSummary> {
        self.polls().get(self.cursor)
    }

    /// Pagination is only offered when there is something to page through.
    pub fn navigation_offered(&self) -> bool {
        self.session.list.cache.get().is_some_and(|p| !p.is_empty())
    }

    pub async fn submit_dispatch<G: ActionGateway>(&mut self, gateway: &G) {
        let result = dispatch::submit(gateway, &self.session.draft, &mut self.session.list.cache).await;
        self.notice = Some(match result {
            Ok(outcome) => Notice {
                kind: NoticeKind::Success,
                text: outcome.message(),
                details: Some(outcome.raw),
            },
            Err(err) => Notice::error(&err),
        });
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor + 1 < self.polls().len() {
            self.cursor += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.navigation_offered() && self.session.list.prev() {
            self.cursor = 0;
        }
    }

    pub fn next_page(&mut self) {
        if self.navigation_offered() && self.session.list.next() {
            self.cursor = 0;
        }
    }

    pub fn refresh(&mut self) {
        self.session.list.refresh();
        self.cursor = 0;
        self.detail_scroll = 0;
        self.notice = None;
    }

    pub fn view_highlighted(&mut self) {
        if let Some(id) = self.highlighted_poll().map(|p| p.internal_poll_group_id.clone()) {
            self.session.list.select(&id);
            self.detail_scroll = 0;
        }
    }

    pub fn toggle_raw(&mut self) {
        if let Some(id) = self.session.list.selected().map(str::to_string) {
            self.session.viewer.toggle_raw(&id);
        }
    }

    pub async fn archive_highlighted<G: ActionGateway>(&mut self, gateway: &G) {
        let Some(id) = self.highlighted_poll().map(|p| p.internal_poll_group_id.clone()) else {
            return;
        };
        let result = self.session.list.archive(gateway, &id).await;
        self.notice = Some(crud_notice(result));
    }

    pub async fn complete_highlighted<G: ActionGateway>(&mut self, gateway: &G) {
        let Some(poll) = self.highlighted_poll().cloned() else {
            return;
        };
        if let Some(result) = self.session.list.mark_completed(gateway, &poll).await {
            self.notice = Some(crud_notice(result));
        }
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = self.highlighted_poll().map(|p| p.internal_poll_group_id.clone());
    }

    pub async fn confirm_delete<G: ActionGateway>(&mut self, gateway: &G, confirmed: bool) {
        let Some(id) = self.confirm_delete.take() else {
            return;
        };
        if !confirmed {
            return;
        }
        let result = self.session.list.delete(gateway, &id).await;
        self.notice = Some(crud_notice(result));
    }

    /// Applies the Configuration edit and writes it to the user config.
    pub fn commit_config_edit(&mut self) {
        let Some((key, value)) = self.config_panel.commit(&mut self.settings) else {
            return;
        };
        let Some(path) = self.config_path.clone() else {
            self.notice = Some(Notice::info(format!("{} updated for this session", key)));
            return;
        };
        self.notice = Some(match save_action_param(&path, &key, &value) {
            Ok(()) => {
                info!("saved action parameter {} to {}", key, path.display());
                Notice::success(format!("Saved {} to {}", key, path.display()))
            }
            Err(err) => {
                warn!("could not save {}: {:#}", key, err);
                Notice {
                    kind: NoticeKind::Error,
                    text: format!("Could not save {}: {}", key, err),
                    details: None,
                }
            }
        });
    }

    pub fn draft_field_mut(&mut self, field: FormField) -> Option<&mut String> {
        let draft = &mut self.session.draft;
        match field {
            FormField::TargetUser => Some(&mut draft.target_user),
            FormField::PollName => Some(&mut draft.poll_name),
            FormField::Choices => Some(&mut draft.choices),
            FormField::PreferredId => Some(&mut draft.preferred_internal_id),
            FormField::SelectableCount | FormField::Duration => None,
        }
    }

    pub fn draft_field_value(&self, field: FormField) -> String {
        let draft = &self.session.draft;
        match field {
            FormField::TargetUser => draft.target_user.clone(),
            FormField::PollName => draft.poll_name.clone(),
            FormField::Choices => draft.choices.clone(),
            FormField::SelectableCount => draft.selectable_count.to_string(),
            FormField::Duration => draft.duration_minutes.to_string(),
            FormField::PreferredId => draft.preferred_internal_id.clone(),
        }
    }

    /// Changes a numeric field, keeping selectable count ≥ 1 and duration ≥ 0.
    pub fn adjust_numeric(&mut self, field: FormField, update: impl Fn(i64) -> i64) {
        let draft = &mut self.session.draft;
        match field {
            FormField::SelectableCount => {
                let next = update(i64::from(draft.selectable_count)).clamp(1, i64::from(u32::MAX));
                draft.selectable_count = u32::try_from(next).unwrap_or(1);
            }
            FormField::Duration => {
                draft.duration_minutes = update(draft.duration_minutes).clamp(0, 525_600);
            }
            _ => {}
        }
    }
}

fn crud_notice(result: Result<&'static str, PanelError>) -> Notice {
    match result {
        Ok(message) => Notice::success(message),
        Err(err) => Notice::error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::FakeGateway;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn settings() -> Settings {
        Settings {
            base_url: "http://localhost:8000".into(),
            walker_endpoint: "/action/walker".into(),
            agent_id: "agent-1".into(),
            module_root: "actions/poll".into(),
            api_token: None,
            page_limit: 10,
            log_file: None,
            action: BTreeMap::new(),
        }
    }

    fn manage_app() -> App {
        let mut app = App::new(settings(), None);
        app.tab = Tab::Manage;
        app
    }

    fn one_poll() -> Value {
        json!({
            "items": [{"internal_poll_group_id": "g1", "name": "Lunch?", "status": "ACTIVE"}],
            "total_pages": 1,
            "total_items": 1,
        })
    }

    #[test]
    fn tabs_cycle_both_ways() {
        assert_eq!(Tab::Dispatch.next(), Tab::Manage);
        assert_eq!(Tab::Configuration.next(), Tab::Dispatch);
        assert_eq!(Tab::Dispatch.prev(), Tab::Configuration);
    }

    #[test]
    fn numeric_fields_are_clamped() {
        let mut app = App::new(settings(), None);
        app.adjust_numeric(FormField::SelectableCount, |v| v - 5);
        assert_eq!(app.session.draft.selectable_count, 1);
        app.adjust_numeric(FormField::Duration, |_| -3);
        assert_eq!(app.session.draft.duration_minutes, 0);
        app.adjust_numeric(FormField::Duration, |v| v * 10 + 7);
        assert_eq!(app.session.draft.duration_minutes, 7);
    }

    #[tokio::test]
    async fn sync_only_talks_to_backend_on_manage_tab() {
        let gateway = FakeGateway::new();
        let mut app = App::new(settings(), None);
        app.sync(&gateway).await;
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_load_sets_error_notice() {
        let gateway = FakeGateway::new().reply(json!({"oops": true}));
        let mut app = manage_app();
        app.sync(&gateway).await;
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, LOAD_FAILED);
        assert!(!app.navigation_offered());
    }

    #[tokio::test]
    async fn selected_poll_is_refetched_each_sync() {
        let detail = json!({"definition": {"name": "Lunch?"}, "counts": {"Pizza": 1}});
        let gateway = FakeGateway::new()
            .reply(one_poll())
            .reply(detail.clone())
            .reply(detail);
        let mut app = manage_app();
        app.sync(&gateway).await;
        app.view_highlighted();
        app.sync(&gateway).await;
        app.sync(&gateway).await;

        // one list load, then two detail loads
        assert_eq!(gateway.call_count(), 3);
        assert!(matches!(app.detail, Some(Ok(_))));
    }

    #[tokio::test]
    async fn raw_responses_are_lazy() {
        let detail = json!({"definition": {"name": "Lunch?"}});
        let gateway = FakeGateway::new()
            .reply(one_poll())
            .reply(detail.clone())
            .reply(detail)
            .reply(json!([{"voter": "+1"}]));
        let mut app = manage_app();
        app.sync(&gateway).await;
        app.view_highlighted();
        app.sync(&gateway).await;
        assert!(app.raw.is_none());

        app.toggle_raw();
        app.sync(&gateway).await;
        assert_eq!(app.raw.as_ref().unwrap().as_ref().unwrap(), &json!([{"voter": "+1"}]));
        assert_eq!(gateway.call_count(), 4);
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let gateway = FakeGateway::new().reply(one_poll());
        let mut app = manage_app();
        app.sync(&gateway).await;

        app.request_delete();
        assert_eq!(app.confirm_delete.as_deref(), Some("g1"));
        app.confirm_delete(&gateway, false).await;
        assert_eq!(gateway.call_count(), 1);
        assert!(app.session.list.cache.is_present());

        gateway.push(json!({"status": "succeeded"}));
        app.request_delete();
        app.confirm_delete(&gateway, true).await;
        assert_eq!(gateway.call_count(), 2);
        assert_eq!(app.notice.as_ref().unwrap().text, "Poll deleted.");
        assert!(!app.session.list.cache.is_present());
    }

    #[tokio::test]
    async fn dispatch_failure_is_shown_with_details() {
        let gateway = FakeGateway::new().reply(json!({"status": "failed", "details": {"code": 7}}));
        let mut app = App::new(settings(), None);
        app.session.draft.target_user = "+1555".into();
        app.session.draft.poll_name = "Lunch?".into();
        app.submit_dispatch(&gateway).await;
        let notice = app.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.details, Some(json!({"status": "failed", "details": {"code": 7}})));
    }

    #[test]
    fn saved_edit_names_the_file_written() {
        let mut path = std::env::temp_dir();
        path.push(format!("pollpanel-app-save-{}.toml", std::process::id()));
        let mut settings = settings();
        settings.action.insert("response_recorded_directive".into(), "Thanks!".into());
        let mut app = App::new(settings, Some(path.clone()));
        app.tab = Tab::Configuration;
        // connection rows come first, the single action row is last
        app.config_panel.selected = crate::config_panel::entries(&app.settings).len() - 1;

        assert!(app.config_panel.begin_edit(&app.settings));
        app.config_panel.editing = Some("Got it!".into());
        app.commit_config_edit();

        let notice = app.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert!(notice.text.contains(&path.display().to_string()));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Got it!"));
        let _ = std::fs::remove_file(&path);
    }
}
