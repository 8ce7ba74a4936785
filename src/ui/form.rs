use crate::model::{EntityKind, Entry, Tag, Timer};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";
pub const MAX_TAGS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Name,
    Description,
    StartTime,
    EndTime,
    Tags,
}

impl FieldKey {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKey::Name => "Name",
            FieldKey::Description => "Description",
            FieldKey::StartTime => "Start (YYYY-MM-DD HH:MM:SS)",
            FieldKey::EndTime => "End (YYYY-MM-DD HH:MM:SS)",
            FieldKey::Tags => "Tags",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(value: &str) -> Self {
        TextInput {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn move_left(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.value.drain(idx..self.cursor);
            self.cursor = idx;
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert(self.cursor, '▌');
        text
    }
}

/// Multi-select over the known tag names, capped at [`MAX_TAGS`].
#[derive(Debug, Clone, Default)]
pub struct TagSelect {
    options: Vec<String>,
    selected: Vec<String>,
    highlight: usize,
}

impl TagSelect {
    fn new(mut options: Vec<String>, selected: &[String]) -> Self {
        for tag in selected {
            if !options.contains(tag) {
                options.push(tag.clone());
            }
        }
        TagSelect {
            options,
            selected: selected.to_vec(),
            highlight: 0,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn highlight(&self) -> usize {
        self.highlight
    }

    pub fn is_selected(&self, option: &str) -> bool {
        self.selected.iter().any(|s| s == option)
    }

    fn move_highlight(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() - 1;
        self.highlight = if delta < 0 {
            self.highlight.saturating_sub(delta.unsigned_abs())
        } else {
            (self.highlight + delta as usize).min(last)
        };
    }

    fn toggle(&mut self) -> Result<(), String> {
        let Some(option) = self.options.get(self.highlight).cloned() else {
            return Ok(());
        };
        if let Some(pos) = self.selected.iter().position(|s| *s == option) {
            self.selected.remove(pos);
            return Ok(());
        }
        if self.selected.len() >= MAX_TAGS {
            return Err(format!("at most {} tags", MAX_TAGS));
        }
        self.selected.push(option);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(TextInput),
    Tags(TagSelect),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub key: FieldKey,
    pub value: FieldValue,
    pub error: Option<String>,
}

impl Field {
    fn text(key: FieldKey, value: &str) -> Self {
        Field {
            key,
            value: FieldValue::Text(TextInput::new(value)),
            error: None,
        }
    }

    fn tags(options: Vec<String>, selected: &[String]) -> Self {
        Field {
            key: FieldKey::Tags,
            value: FieldValue::Tags(TagSelect::new(options, selected)),
            error: None,
        }
    }
}

/// Existing row used to pre-populate an edit form.
#[derive(Debug, Clone, Copy)]
pub enum Prefill<'a> {
    Entry(&'a Entry),
    Timer(&'a Timer),
    Tag(&'a Tag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub name: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Validated form contents, ready for a single store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Entry(EntryFields),
    Timer { name: String, tags: Vec<String> },
    Tag { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    StillOpen,
    Completed(Submission),
    Cancelled,
}

/// A modal create/edit form for one entity kind.
///
/// The field set is fixed when the form is built: tags get `name`, timers get
/// `name` and `tags`, entries get `name`, `description`, both times and
/// `tags`.
#[derive(Debug, Clone)]
pub struct EntityForm {
    kind: EntityKind,
    mode: FormMode,
    fields: Vec<Field>,
    focus: usize,
    completed: bool,
}

impl EntityForm {
    pub fn open(
        kind: EntityKind,
        mode: FormMode,
        tag_options: Vec<String>,
        prefill: Option<Prefill<'_>>,
    ) -> Self {
        let fields = match (kind, prefill) {
            (EntityKind::Entry, Some(Prefill::Entry(entry))) => vec![
                Field::text(FieldKey::Name, &entry.name),
                Field::text(
                    FieldKey::Description,
                    entry.description.as_deref().unwrap_or_default(),
                ),
                Field::text(FieldKey::StartTime, &format_local(entry.start)),
                Field::text(FieldKey::EndTime, &format_local(entry.end)),
                Field::tags(tag_options, &entry.tags),
            ],
            (EntityKind::Entry, _) => vec![
                Field::text(FieldKey::Name, ""),
                Field::text(FieldKey::Description, ""),
                Field::text(FieldKey::StartTime, ""),
                Field::text(FieldKey::EndTime, ""),
                Field::tags(tag_options, &[]),
            ],
            (EntityKind::Timer, Some(Prefill::Timer(timer))) => vec![
                Field::text(FieldKey::Name, &timer.name),
                Field::tags(tag_options, &timer.tags),
            ],
            (EntityKind::Timer, _) => vec![
                Field::text(FieldKey::Name, ""),
                Field::tags(tag_options, &[]),
            ],
            (EntityKind::Tag, Some(Prefill::Tag(tag))) => {
                vec![Field::text(FieldKey::Name, &tag.name)]
            }
            (EntityKind::Tag, _) => vec![Field::text(FieldKey::Name, "")],
        };
        EntityForm {
            kind,
            mode,
            fields,
            focus: 0,
            completed: false,
        }
    }

    pub fn create(kind: EntityKind, tag_options: Vec<String>) -> Self {
        Self::open(kind, FormMode::Create, tag_options, None)
    }

    pub fn edit(prefill: Prefill<'_>, tag_options: Vec<String>) -> Self {
        let (kind, id) = match prefill {
            Prefill::Entry(entry) => (EntityKind::Entry, entry.id),
            Prefill::Timer(timer) => (EntityKind::Timer, timer.id),
            Prefill::Tag(tag) => (EntityKind::Tag, tag.id),
        };
        Self::open(kind, FormMode::Edit(id), tag_options, Some(prefill))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn focus(&self) -> FieldKey {
        self.fields[self.focus].key
    }

    #[cfg(test)]
    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn values(&self) -> impl Iterator<Item = (FieldKey, &FieldValue)> {
        self.fields.iter().map(|f| (f.key, &f.value))
    }

    pub fn value(&self, key: FieldKey) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    pub fn error(&self, key: FieldKey) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| f.error.as_deref())
    }

    pub fn title(&self) -> String {
        let verb = match self.mode {
            FormMode::Create => "New",
            FormMode::Edit(_) => "Edit",
        };
        let noun = match self.kind {
            EntityKind::Entry => "Entry",
            EntityKind::Timer => "Timer",
            EntityKind::Tag => "Tag",
        };
        format!("{} {}", verb, noun)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        if self.completed {
            return FormOutcome::StillOpen;
        }
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancelled,
            KeyCode::Enter => return self.submit(),
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.prev_field(),
            KeyCode::Left => match &mut self.fields[self.focus].value {
                FieldValue::Text(input) => input.move_left(),
                FieldValue::Tags(select) => select.move_highlight(-1),
            },
            KeyCode::Right => match &mut self.fields[self.focus].value {
                FieldValue::Text(input) => input.move_right(),
                FieldValue::Tags(select) => select.move_highlight(1),
            },
            KeyCode::Backspace => {
                if let FieldValue::Text(input) = &mut self.fields[self.focus].value {
                    input.backspace();
                }
            }
            KeyCode::Char(c) if plain => {
                let field = &mut self.fields[self.focus];
                match &mut field.value {
                    FieldValue::Text(input) => input.insert_char(c),
                    FieldValue::Tags(select) if c == ' ' => {
                        field.error = select.toggle().err();
                    }
                    FieldValue::Tags(_) => {}
                }
            }
            _ => {}
        }
        FormOutcome::StillOpen
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn text(&self, key: FieldKey) -> &str {
        match self.value(key) {
            Some(FieldValue::Text(input)) => input.value().trim(),
            _ => "",
        }
    }

    fn selected_tags(&self) -> Vec<String> {
        match self.value(FieldKey::Tags) {
            Some(FieldValue::Tags(select)) => select.selected().to_vec(),
            _ => Vec::new(),
        }
    }

    fn set_error(&mut self, key: FieldKey, message: String) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.key == key) {
            field.error = Some(message);
        }
    }

    fn submit(&mut self) -> FormOutcome {
        for field in &mut self.fields {
            field.error = None;
        }
        let mut errors = Vec::new();
        let name = self.text(FieldKey::Name).to_string();
        if name.is_empty() {
            errors.push((FieldKey::Name, "name is required".to_string()));
        }

        let submission = match self.kind {
            EntityKind::Tag => Some(Submission::Tag { name }),
            EntityKind::Timer => Some(Submission::Timer {
                name,
                tags: self.selected_tags(),
            }),
            EntityKind::Entry => {
                let start = parse_local(self.text(FieldKey::StartTime));
                let end = parse_local(self.text(FieldKey::EndTime));
                if let Err(msg) = &start {
                    errors.push((FieldKey::StartTime, msg.clone()));
                }
                if let Err(msg) = &end {
                    errors.push((FieldKey::EndTime, msg.clone()));
                }
                match (start, end) {
                    (Ok(start), Ok(end)) if end < start => {
                        errors.push((
                            FieldKey::EndTime,
                            "end time cannot be before start time".to_string(),
                        ));
                        None
                    }
                    (Ok(start), Ok(end)) => {
                        let description = self.text(FieldKey::Description);
                        Some(Submission::Entry(EntryFields {
                            name,
                            description: (!description.is_empty())
                                .then(|| description.to_string()),
                            start,
                            end,
                            tags: self.selected_tags(),
                        }))
                    }
                    _ => None,
                }
            }
        };

        match submission {
            Some(submission) if errors.is_empty() => {
                self.completed = true;
                FormOutcome::Completed(submission)
            }
            _ => {
                for (key, message) in errors {
                    self.set_error(key, message);
                }
                FormOutcome::StillOpen
            }
        }
    }
}

/// Parses the fixed form layout as local wall-clock time.
pub fn parse_local(input: &str) -> Result<DateTime<Utc>, String> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), TIME_LAYOUT)
        .map_err(|_| "use YYYY-MM-DD HH:MM:SS".to_string())?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| "time does not exist in the local timezone".to_string())
}

pub fn format_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format(TIME_LAYOUT).to_string()
}
