use crate::model::{EntityKind, Entry, EntryEdit, ErrorClass, NewEntry, StoreError, Tag, Timer};
use crate::store::Store;
use crate::ui::form::{EntityForm, FormMode, FormOutcome, Prefill, Submission};
use crate::ui::list::EntityListCache;
use crate::ui::stopwatch::Stopwatch;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum View {
    Entries,
    Timers,
    TimerDetail,
    Tags,
}

impl View {
    /// Order used by left/right navigation.
    pub const CYCLE: [View; 4] = [View::Entries, View::Timers, View::TimerDetail, View::Tags];

    pub fn label(&self) -> &'static str {
        match self {
            View::Entries => "entries",
            View::Timers => "timers",
            View::TimerDetail => "timer",
            View::Tags => "tags",
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            View::Entries => EntityKind::Entry,
            View::Timers | View::TimerDetail => EntityKind::Timer,
            View::Tags => EntityKind::Tag,
        }
    }

    fn cycled(self, step: isize) -> View {
        let len = Self::CYCLE.len() as isize;
        let idx = Self::CYCLE.iter().position(|v| *v == self).unwrap_or(0) as isize;
        Self::CYCLE[(idx + step).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Add,
    Edit,
    Delete,
    Stop,
    Quit,
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Right),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('a') | KeyCode::Char('n') => {
            Some(Action::Add)
        }
        KeyCode::Char('e') => Some(Action::Edit),
        KeyCode::Char('d') => Some(Action::Delete),
        KeyCode::Char('t') => Some(Action::Stop),
        KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error(ErrorClass),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub level: StatusLevel,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Status {
            text: text.into(),
            level: StatusLevel::Info,
        }
    }
}

/// The interactive session: current view, one cached list per kind, the open
/// form if any, and the stopwatch for the selected timer.
pub struct App<S: Store> {
    store: S,
    view: View,
    entries: EntityListCache<Entry>,
    timers: EntityListCache<Timer>,
    tags: EntityListCache<Tag>,
    form: Option<EntityForm>,
    stopwatch: Stopwatch,
    status: Status,
}

impl<S: Store> App<S> {
    pub fn new(store: S, now: DateTime<Utc>) -> Self {
        let mut app = App {
            store,
            view: View::Entries,
            entries: EntityListCache::default(),
            timers: EntityListCache::default(),
            tags: EntityListCache::default(),
            form: None,
            stopwatch: Stopwatch::default(),
            status: Status::info("←/→ switch views • a add • e edit • d delete • q quit"),
        };
        app.refresh_all(now);
        app
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn form(&self) -> Option<&EntityForm> {
        self.form.as_ref()
    }

    pub fn form_active(&self) -> bool {
        self.form.is_some()
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn entries(&self) -> &EntityListCache<Entry> {
        &self.entries
    }

    pub fn timers(&self) -> &EntityListCache<Timer> {
        &self.timers
    }

    pub fn tags(&self) -> &EntityListCache<Tag> {
        &self.tags
    }

    /// Re-reads every collection. Runs before each draw so the screen always
    /// reflects the store, including writes from other processes.
    pub fn refresh_all(&mut self, now: DateTime<Utc>) {
        if let Err(err) = self.entries.refresh(&self.store) {
            self.report_refresh("Could not load entries", err);
        }
        self.refresh_timers(now);
        if let Err(err) = self.tags.refresh(&self.store) {
            self.report_refresh("Could not load tags", err);
        }
    }

    fn refresh_timers(&mut self, now: DateTime<Utc>) {
        let before = self.timers.selected().map(|t| (t.id, t.start));
        if let Err(err) = self.timers.refresh(&self.store) {
            self.report_refresh("Could not load timers", err);
            return;
        }
        let after = self.timers.selected().map(|t| (t.id, t.start));
        if before != after && self.view == View::TimerDetail {
            self.seed_stopwatch(now);
        }
    }

    fn refresh_kind(&mut self, kind: EntityKind, now: DateTime<Utc>) {
        match kind {
            EntityKind::Entry => {
                if let Err(err) = self.entries.refresh(&self.store) {
                    self.report_refresh("Could not load entries", err);
                }
            }
            EntityKind::Timer => self.refresh_timers(now),
            EntityKind::Tag => {
                if let Err(err) = self.tags.refresh(&self.store) {
                    self.report_refresh("Could not load tags", err);
                }
            }
        }
    }

    /// Handles one key press. Returns `true` when the session should end.
    pub fn handle_key(&mut self, key: KeyEvent, now: DateTime<Utc>) -> bool {
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c {
            return true;
        }
        if self.form_active() {
            self.handle_form_key(key, now);
            return false;
        }
        match action_for(key) {
            Some(action) => self.handle_action(action, now),
            None => false,
        }
    }

    pub fn handle_action(&mut self, action: Action, now: DateTime<Utc>) -> bool {
        match action {
            Action::Quit => return true,
            Action::Left => self.cycle_view(-1, now),
            Action::Right => self.cycle_view(1, now),
            Action::Up => self.move_cursor(-1, now),
            Action::Down => self.move_cursor(1, now),
            Action::Add => self.open_create_form(),
            Action::Edit => self.open_edit_form(),
            Action::Delete => self.delete_selected(now),
            Action::Stop => self.stop_selected(now),
        }
        false
    }

    /// Advances the stopwatch display. Only the timer detail view shows it.
    pub fn on_tick(&mut self, now: DateTime<Utc>) {
        if self.view == View::TimerDetail {
            self.stopwatch.tick(now);
        }
    }

    fn cycle_view(&mut self, step: isize, now: DateTime<Utc>) {
        self.view = self.view.cycled(step);
        debug!(view = self.view.label(), "switched view");
        if self.view == View::TimerDetail {
            self.seed_stopwatch(now);
        }
    }

    fn move_cursor(&mut self, delta: isize, now: DateTime<Utc>) {
        match self.view {
            View::Entries => {
                self.entries.move_cursor(delta);
            }
            View::Timers | View::TimerDetail => {
                if self.timers.move_cursor(delta) {
                    self.seed_stopwatch(now);
                }
            }
            View::Tags => {
                self.tags.move_cursor(delta);
            }
        }
    }

    fn seed_stopwatch(&mut self, now: DateTime<Utc>) {
        match self.timers.selected() {
            Some(timer) => self.stopwatch.start(now - timer.start, now),
            None => self.stopwatch.reset(),
        }
    }

    fn tag_options(&mut self) -> Vec<String> {
        match self.store.tag_names() {
            Ok(names) => names,
            Err(err) => {
                self.report("Could not load tags", err);
                Vec::new()
            }
        }
    }

    fn open_create_form(&mut self) {
        let kind = self.view.kind();
        let options = self.tag_options();
        let form = EntityForm::create(kind, options);
        self.status = Status::info(format!(
            "{} (Tab/Shift-Tab move, Space toggles tags, Enter save, Esc cancel)",
            form.title()
        ));
        self.form = Some(form);
    }

    fn open_edit_form(&mut self) {
        let kind = self.view.kind();
        let has_selection = match kind {
            EntityKind::Entry => self.entries.selected().is_some(),
            EntityKind::Timer => self.timers.selected().is_some(),
            EntityKind::Tag => self.tags.selected().is_some(),
        };
        if !has_selection {
            self.status = Status::info(format!("No {} selected to edit", kind));
            return;
        }
        let options = self.tag_options();
        let prefill = match kind {
            EntityKind::Entry => self.entries.selected().map(Prefill::Entry),
            EntityKind::Timer => self.timers.selected().map(Prefill::Timer),
            EntityKind::Tag => self.tags.selected().map(Prefill::Tag),
        };
        if let Some(prefill) = prefill {
            let form = EntityForm::edit(prefill, options);
            self.status = Status::info(format!("{} (Enter save, Esc cancel)", form.title()));
            self.form = Some(form);
        }
    }

    fn selected_id(&self, kind: EntityKind) -> Option<i64> {
        match kind {
            EntityKind::Entry => self.entries.selected().map(|e| e.id),
            EntityKind::Timer => self.timers.selected().map(|t| t.id),
            EntityKind::Tag => self.tags.selected().map(|t| t.id),
        }
    }

    fn delete_selected(&mut self, now: DateTime<Utc>) {
        let kind = self.view.kind();
        let Some(id) = self.selected_id(kind) else {
            self.status = Status::info(format!("No {} selected to delete", kind));
            return;
        };
        let result = match kind {
            EntityKind::Entry => self.store.delete_entry(id),
            EntityKind::Timer => self.store.delete_timer(id),
            EntityKind::Tag => self.store.delete_tag(id),
        };
        match result {
            Ok(()) => {
                info!(%kind, id, "deleted from ui");
                self.status = Status::info(format!("Deleted {} {}", kind, id));
            }
            Err(err) => self.report(&format!("Could not delete {}", kind), err),
        }
        self.refresh_kind(kind, now);
        if kind == EntityKind::Timer && self.view == View::TimerDetail {
            self.seed_stopwatch(now);
        }
    }

    fn stop_selected(&mut self, now: DateTime<Utc>) {
        if self.view.kind() != EntityKind::Timer {
            return;
        }
        let Some(name) = self.timers.selected().map(|t| t.name.clone()) else {
            self.status = Status::info("No timer selected to stop");
            return;
        };
        match self.store.stop_timer_at(&name, now) {
            Ok(entry_id) => {
                info!(name = %name, entry_id, "stopped timer from ui");
                self.status = Status::info(format!("Stopped {} (entry {})", name, entry_id));
            }
            Err(err) => self.report("Could not stop timer", err),
        }
        self.refresh_kind(EntityKind::Timer, now);
        self.refresh_kind(EntityKind::Entry, now);
        if self.view == View::TimerDetail {
            self.seed_stopwatch(now);
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.handle_key(key) {
            FormOutcome::StillOpen => {}
            FormOutcome::Cancelled => {
                self.form = None;
                self.status = Status::info("Canceled");
            }
            FormOutcome::Completed(submission) => {
                let mode = form.mode();
                let kind = form.kind();
                self.form = None;
                match self.apply(mode, submission, now) {
                    Ok(message) => self.status = Status::info(message),
                    Err(err) => self.report(&format!("Could not save {}", kind), err),
                }
                self.refresh_kind(kind, now);
                if kind == EntityKind::Timer && self.view == View::TimerDetail {
                    self.seed_stopwatch(now);
                }
            }
        }
    }

    fn apply(
        &mut self,
        mode: FormMode,
        submission: Submission,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        match (mode, submission) {
            (FormMode::Create, Submission::Entry(fields)) => {
                let id = self.store.create_entry(&NewEntry {
                    name: fields.name,
                    description: fields.description,
                    start: fields.start,
                    end: fields.end,
                    tags: fields.tags,
                })?;
                Ok(format!("Created entry {}", id))
            }
            (FormMode::Edit(id), Submission::Entry(fields)) => {
                self.store.edit_entry(
                    id,
                    &EntryEdit {
                        name: fields.name,
                        description: fields.description,
                        start: fields.start,
                        end: fields.end,
                        tags: fields.tags,
                    },
                )?;
                Ok(format!("Updated entry {}", id))
            }
            (FormMode::Create, Submission::Timer { name, tags }) => {
                self.store.create_timer_at(&name, &tags, now)?;
                Ok(format!("Started timer {}", name))
            }
            (FormMode::Edit(id), Submission::Timer { name, tags }) => {
                self.store.edit_timer(id, &name, &tags)?;
                Ok(format!("Updated timer {}", name))
            }
            (FormMode::Create, Submission::Tag { name }) => {
                self.store.create_tag(&name)?;
                Ok(format!("Created tag {}", name))
            }
            (FormMode::Edit(id), Submission::Tag { name }) => {
                self.store.rename_tag(id, &name)?;
                Ok(format!("Renamed tag {} to {}", id, name))
            }
        }
    }

    /// Refresh failures are logged, but an error already on the status line
    /// stays there so the failed action is still named.
    fn report_refresh(&mut self, context: &str, err: StoreError) {
        if self.status.level == StatusLevel::Info {
            self.report(context, err);
        } else {
            warn!(error = %err, class = ?err.class(), "{}", context);
        }
    }

    fn report(&mut self, context: &str, err: StoreError) {
        let class = err.class();
        warn!(error = %err, ?class, "{}", context);
        self.status = Status {
            text: format!("{}: {}", context, err),
            level: StatusLevel::Error(class),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::form::FieldKey;
    use crate::ui::testing::{FlakyStore, ts};

    fn press(app: &mut App<&FlakyStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), ts(12, 0))
    }

    fn type_text(app: &mut App<&FlakyStore>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn with_timers(names: &[&str]) -> FlakyStore {
        let store = FlakyStore::new();
        for (i, name) in names.iter().enumerate() {
            store
                .inner
                .create_timer_at(name, &[], ts(9, i as u32 * 10))
                .unwrap();
        }
        store
    }

    fn goto(app: &mut App<&FlakyStore>, view: View) {
        while app.view() != view {
            press(app, KeyCode::Right);
        }
    }

    #[test]
    fn starts_on_entries_without_a_form() {
        let store = FlakyStore::new();
        let app = App::new(&store, ts(12, 0));
        assert_eq!(app.view(), View::Entries);
        assert!(!app.form_active());
        assert_eq!(app.entries().cursor(), None);
    }

    #[test]
    fn four_rights_return_to_entries() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        let mut seen = Vec::new();
        for _ in 0..4 {
            press(&mut app, KeyCode::Right);
            seen.push(app.view());
        }
        assert_eq!(
            seen,
            vec![View::Timers, View::TimerDetail, View::Tags, View::Entries]
        );
        press(&mut app, KeyCode::Left);
        assert_eq!(app.view(), View::Tags);
    }

    #[test]
    fn timer_cursor_clamps_at_the_last_row() {
        let store = with_timers(&["a", "b", "c"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Timers);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.timers().cursor(), Some(2));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.timers().cursor(), Some(2));
        press(&mut app, KeyCode::Up);
        assert_eq!(app.timers().cursor(), Some(1));
    }

    #[test]
    fn detail_view_seeds_the_stopwatch_from_the_start_time() {
        let store = with_timers(&["a", "b"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::TimerDetail);
        assert!(app.stopwatch().running());
        assert_eq!(app.stopwatch().elapsed(), chrono::Duration::hours(3));

        press(&mut app, KeyCode::Down);
        assert_eq!(
            app.stopwatch().elapsed(),
            chrono::Duration::hours(3) - chrono::Duration::minutes(10)
        );

        app.on_tick(ts(12, 1));
        assert_eq!(
            app.stopwatch().elapsed(),
            chrono::Duration::hours(3) - chrono::Duration::minutes(9)
        );
    }

    #[test]
    fn detail_view_without_timers_is_idle() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::TimerDetail);
        assert!(!app.stopwatch().running());
        app.on_tick(ts(12, 5));
        assert_eq!(app.stopwatch().elapsed(), chrono::Duration::zero());
    }

    #[test]
    fn ticks_outside_detail_view_do_nothing() {
        let store = with_timers(&["a"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::TimerDetail);
        let before = app.stopwatch().elapsed();
        press(&mut app, KeyCode::Right);
        app.on_tick(ts(12, 30));
        assert_eq!(app.stopwatch().elapsed(), before);
    }

    #[test]
    fn cancelling_a_create_form_writes_nothing() {
        let store = with_timers(&["a"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Timers);
        let before = store.inner.list_timers().unwrap();

        press(&mut app, KeyCode::Char('a'));
        assert!(app.form_active());
        type_text(&mut app, "writing");
        press(&mut app, KeyCode::Esc);

        assert!(!app.form_active());
        assert_eq!(store.writes(), 0);
        assert_eq!(store.inner.list_timers().unwrap(), before);
    }

    #[test]
    fn quit_keys_inside_a_form_are_text() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        press(&mut app, KeyCode::Char('a'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(app.form_active());
        assert!(app.handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            ts(12, 0)
        ));
    }

    #[test]
    fn creating_a_running_name_twice_reports_a_conflict() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Timers);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "writing");
        press(&mut app, KeyCode::Enter);
        assert!(!app.form_active());
        assert_eq!(app.timers().len(), 1);
        assert_eq!(app.status().level, StatusLevel::Info);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "writing");
        press(&mut app, KeyCode::Enter);
        assert!(!app.form_active());
        assert_eq!(app.status().level, StatusLevel::Error(ErrorClass::Conflict));
        assert_eq!(store.inner.list_timers().unwrap().len(), 1);
    }

    #[test]
    fn invalid_entry_form_never_reaches_the_store() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "review");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-05-06 10:00:00");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-05-06 09:00:00");
        press(&mut app, KeyCode::Enter);

        let form = app.form().expect("form stays open");
        assert!(form.error(FieldKey::EndTime).is_some());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn valid_entry_form_creates_an_entry() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "review");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "pr 7");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-05-06 09:00:00");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-05-06 09:45:00");
        press(&mut app, KeyCode::Enter);

        assert!(!app.form_active());
        assert_eq!(app.entries().len(), 1);
        let entry = app.entries().selected().unwrap();
        assert_eq!(entry.description.as_deref(), Some("pr 7"));
        assert_eq!(entry.duration(), chrono::Duration::minutes(45));
    }

    #[test]
    fn delete_keeps_the_cursor_in_range() {
        let store = with_timers(&["a", "b", "c"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Timers);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);

        for expected in [Some(1), Some(0), None] {
            press(&mut app, KeyCode::Char('d'));
            assert_eq!(app.timers().cursor(), expected);
        }
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.status().text, "No timer selected to delete");
    }

    #[test]
    fn stopping_from_the_ui_moves_the_timer_into_entries() {
        let store = with_timers(&["writing"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::TimerDetail);
        press(&mut app, KeyCode::Char('t'));

        assert!(app.timers().is_empty());
        assert!(!app.stopwatch().running());
        assert_eq!(app.entries().len(), 1);
        let entry = &app.entries().items()[0];
        assert_eq!((entry.start, entry.end), (ts(9, 0), ts(12, 0)));
    }

    #[test]
    fn edit_form_updates_the_selected_tag() {
        let store = FlakyStore::new();
        store.inner.create_tag("deep").unwrap();
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Tags);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "ad work");
        press(&mut app, KeyCode::Enter);
        assert_eq!(store.inner.tag_names().unwrap(), vec!["dead work".to_string()]);
    }

    #[test]
    fn store_outage_keeps_stale_lists_and_reports() {
        let store = with_timers(&["a", "b"]);
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Timers);
        press(&mut app, KeyCode::Down);

        store.fail(true);
        press(&mut app, KeyCode::Char('d'));
        app.refresh_all(ts(12, 1));
        assert_eq!(app.timers().len(), 2);
        assert_eq!(app.timers().cursor(), Some(1));
        assert_eq!(
            app.status().level,
            StatusLevel::Error(ErrorClass::Unavailable)
        );
        assert!(
            app.status().text.starts_with("Could not delete timer"),
            "{}",
            app.status().text
        );

        store.fail(false);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.timers().len(), 1);
        assert_eq!(app.timers().cursor(), Some(0));
    }

    #[test]
    fn external_writes_show_up_on_the_next_refresh() {
        let store = FlakyStore::new();
        let mut app = App::new(&store, ts(12, 0));
        store.inner.create_timer_at("cli", &[], ts(11, 0)).unwrap();
        app.refresh_all(ts(12, 0));
        assert_eq!(app.timers().len(), 1);
    }

    #[test]
    fn editing_a_timer_keeps_every_stored_tag() {
        let store = FlakyStore::new();
        let tags: Vec<String> = ["a", "b", "c", "d"].map(String::from).to_vec();
        store.inner.create_timer_at("writing", &tags, ts(9, 0)).unwrap();
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Timers);

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "2");
        press(&mut app, KeyCode::Enter);

        assert!(!app.form_active());
        assert_eq!(app.status().level, StatusLevel::Info);
        let timers = store.inner.list_timers().unwrap();
        assert_eq!(timers[0].name, "writing2");
        assert_eq!(timers[0].tags, tags);
    }

    #[test]
    fn edit_form_updates_the_selected_entry() {
        let store = FlakyStore::new();
        store
            .inner
            .create_entry(&NewEntry {
                name: "review".into(),
                description: Some("pr 7".into()),
                start: ts(9, 0),
                end: ts(9, 45),
                tags: vec!["deep".into()],
            })
            .unwrap();
        let mut app = App::new(&store, ts(12, 0));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.form().map(|f| f.title()), Some("Edit Entry".to_string()));
        type_text(&mut app, "s");
        press(&mut app, KeyCode::Enter);

        assert!(!app.form_active());
        let entry = &store.inner.list_entries().unwrap()[0];
        assert_eq!(entry.name, "reviews");
        assert_eq!(entry.description.as_deref(), Some("pr 7"));
        assert_eq!((entry.start, entry.end), (ts(9, 0), ts(9, 45)));
        assert_eq!(entry.tags, vec!["deep".to_string()]);
        assert_eq!(app.entries().selected().map(|e| e.name.as_str()), Some("reviews"));
    }

    #[test]
    fn delete_works_from_entries_and_tags() {
        let store = FlakyStore::new();
        store
            .inner
            .create_entry(&NewEntry {
                name: "review".into(),
                description: None,
                start: ts(9, 0),
                end: ts(10, 0),
                tags: vec!["deep".into()],
            })
            .unwrap();
        let mut app = App::new(&store, ts(12, 0));

        press(&mut app, KeyCode::Char('d'));
        assert!(store.inner.list_entries().unwrap().is_empty());
        assert!(app.entries().is_empty());
        assert_eq!(app.entries().cursor(), None);

        goto(&mut app, View::Tags);
        assert_eq!(app.tags().len(), 1);
        press(&mut app, KeyCode::Char('d'));
        assert!(store.inner.list_tags().unwrap().is_empty());
        assert!(app.tags().is_empty());
        assert_eq!(app.status().level, StatusLevel::Info);
    }

    #[test]
    fn duplicate_tag_from_the_form_reports_a_conflict() {
        let store = FlakyStore::new();
        store.inner.create_tag("deep").unwrap();
        let mut app = App::new(&store, ts(12, 0));
        goto(&mut app, View::Tags);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "deep");
        press(&mut app, KeyCode::Enter);

        assert!(!app.form_active());
        assert_eq!(app.status().level, StatusLevel::Error(ErrorClass::Conflict));
        assert!(app.status().text.contains("tag already exists: deep"));
        assert_eq!(app.tags().len(), 1);
    }
}
