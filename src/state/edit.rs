//! Inline editing of a session's classification record.
//!
//! Only one [`InlineEditor`] is open at a time. Confirming it yields an
//! [`EditOutcome`]; a [`FieldUpdate`] goes to the backend and is only applied to
//! the local [`SessionInfo`] once the backend accepts it.

use serde_json::{Map, Value};

use crate::api::{FacetCounts, SessionInfo, informed};

/// Literal shown for optional metadata that has no value.
pub const NOT_INFORMED: &str = "Not informed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Dropdown,
    Text,
    Checkbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    Category,
    Subcategory,
    Name,
    Company,
    Erp,
    Channel,
    CustomerNumber,
    HasHandoff,
    Resolution,
    Template,
    Rlhf,
}

impl EditableField {
    pub fn kind(self) -> FieldKind {
        match self {
            EditableField::Category | EditableField::Subcategory => FieldKind::Dropdown,
            EditableField::Name
            | EditableField::Company
            | EditableField::Erp
            | EditableField::Channel
            | EditableField::CustomerNumber => FieldKind::Text,
            EditableField::HasHandoff
            | EditableField::Resolution
            | EditableField::Template
            | EditableField::Rlhf => FieldKind::Checkbox,
        }
    }

    /// Category and subcategory travel in every update body.
    pub fn is_classification(self) -> bool {
        matches!(self, EditableField::Category | EditableField::Subcategory)
    }

    /// Key used in the update request body.
    pub fn wire_name(self) -> &'static str {
        match self {
            EditableField::Category => "category",
            EditableField::Subcategory => "subcategory",
            EditableField::Name => "name",
            EditableField::Company => "company",
            EditableField::Erp => "erp",
            EditableField::Channel => "channel",
            EditableField::CustomerNumber => "customerNumber",
            EditableField::HasHandoff => "has_handoff",
            EditableField::Resolution => "resolution",
            EditableField::Template => "template",
            EditableField::Rlhf => "rlhf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EditableField::Category => "Category",
            EditableField::Subcategory => "Subcategory",
            EditableField::Name => "Name",
            EditableField::Company => "Company",
            EditableField::Erp => "ERP",
            EditableField::Channel => "Channel",
            EditableField::CustomerNumber => "Customer no.",
            EditableField::HasHandoff => "Handoff active",
            EditableField::Resolution => "Resolution",
            EditableField::Template => "Template",
            EditableField::Rlhf => "RLHF",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            EditableField::Name => "customer name",
            EditableField::Company => "company name",
            EditableField::Erp => "ERP code",
            EditableField::Channel => "channel",
            EditableField::CustomerNumber => "customer number",
            _ => "value",
        }
    }

    /// Label next to a checkbox for the given state.
    pub fn checkbox_label(self, checked: bool) -> &'static str {
        match (self, checked) {
            (EditableField::HasHandoff, true) => "Yes",
            (EditableField::HasHandoff, false) => "No",
            (EditableField::Resolution, true) => "Resolved",
            (EditableField::Resolution, false) => "Pending",
            (EditableField::Template, true) => "Yes, use as template",
            (EditableField::Template, false) => "Do not use as template",
            (EditableField::Rlhf, true) => "Validated",
            (EditableField::Rlhf, false) => "Not validated",
            (_, true) => "Yes",
            (_, false) => "No",
        }
    }

    /// Success notice for toggles worth announcing.
    pub fn success_message(self, checked: bool) -> Option<&'static str> {
        match (self, checked) {
            (EditableField::Template, true) => Some("Conversation marked as training template"),
            (EditableField::Template, false) => {
                Some("Conversation removed from training templates")
            }
            (EditableField::Rlhf, true) => Some("RLHF marked as validated"),
            (EditableField::Rlhf, false) => Some("RLHF marked as not validated"),
            _ => None,
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            EditableField::HasHandoff => "Failed to save handoff change",
            EditableField::Resolution => "Failed to save resolution change",
            EditableField::Template => "Failed to save template setting",
            EditableField::Rlhf => "Failed to save RLHF change",
            _ => "Failed to save change",
        }
    }

    pub fn current(self, info: &SessionInfo) -> FieldValue {
        let text = |value: &Option<String>| FieldValue::Text(informed(value).unwrap_or("").into());
        match self {
            EditableField::Category => FieldValue::Text(info.category.clone()),
            EditableField::Subcategory => FieldValue::Text(info.subcategory.clone()),
            EditableField::Name => text(&info.name),
            EditableField::Company => text(&info.company),
            EditableField::Erp => text(&info.erp),
            EditableField::Channel => text(&info.channel),
            EditableField::CustomerNumber => text(&info.customer_number),
            EditableField::HasHandoff => FieldValue::Flag(info.has_handoff),
            EditableField::Resolution => FieldValue::Flag(info.resolution),
            EditableField::Template => FieldValue::Flag(info.template),
            EditableField::Rlhf => FieldValue::Flag(info.rlhf),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Text(_) => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Flag(flag) => Value::Bool(*flag),
        }
    }
}

/// One field changed to one new value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: EditableField,
    pub value: FieldValue,
}

impl FieldUpdate {
    pub fn new(field: EditableField, value: FieldValue) -> Self {
        Self { field, value }
    }

    /// Request body for the update endpoint. Category and subcategory always
    /// travel with the change.
    pub fn request_body(&self, info: &SessionInfo) -> Value {
        let mut body = Map::new();
        body.insert("category".into(), Value::String(info.category.clone()));
        body.insert(
            "subcategory".into(),
            Value::String(info.subcategory.clone()),
        );
        body.insert(self.field.wire_name().into(), self.value.to_json());
        Value::Object(body)
    }

    /// Apply an accepted update. Any edit other than RLHF itself marks the
    /// session as human-reviewed.
    pub fn apply(&self, info: &mut SessionInfo) {
        let text = || match &self.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Flag(flag) => flag.to_string(),
        };
        let optional = || Some(text()).filter(|t| !t.is_empty());
        let flag = self.value.as_flag().unwrap_or_default();

        match self.field {
            EditableField::Category => info.category = text(),
            EditableField::Subcategory => info.subcategory = text(),
            EditableField::Name => info.name = optional(),
            EditableField::Company => info.company = optional(),
            EditableField::Erp => info.erp = optional(),
            EditableField::Channel => info.channel = optional(),
            EditableField::CustomerNumber => info.customer_number = optional(),
            EditableField::HasHandoff => info.has_handoff = flag,
            EditableField::Resolution => info.resolution = flag,
            EditableField::Template => info.template = flag,
            EditableField::Rlhf => info.rlhf = flag,
        }

        if self.field != EditableField::Rlhf {
            info.rlhf = true;
        }
    }
}

/// What confirming an editor amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Nothing to send; just restore the display.
    Unchanged,
    Submit(FieldUpdate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorInput {
    Select { options: Vec<String>, cursor: usize },
    Text { buffer: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineEditor {
    pub field: EditableField,
    pub original: String,
    pub input: EditorInput,
}

impl InlineEditor {
    /// Open an editor for a dropdown or text field. Checkboxes have no editor.
    pub fn open(field: EditableField, info: &SessionInfo, facets: &FacetCounts) -> Option<Self> {
        let FieldValue::Text(original) = field.current(info) else {
            return None;
        };

        let input = match field.kind() {
            FieldKind::Dropdown => {
                let items = if field == EditableField::Category {
                    &facets.categories
                } else {
                    &facets.subcategories
                };
                let options: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
                let cursor = options.iter().position(|o| *o == original).unwrap_or(0);
                EditorInput::Select { options, cursor }
            }
            FieldKind::Text => EditorInput::Text {
                buffer: original.clone(),
            },
            FieldKind::Checkbox => return None,
        };

        Some(Self {
            field,
            original,
            input,
        })
    }

    pub fn move_selection(&mut self, delta: isize) {
        if let EditorInput::Select { options, cursor } = &mut self.input
            && !options.is_empty()
        {
            let len = options.len() as isize;
            *cursor = (*cursor as isize + delta).rem_euclid(len) as usize;
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let EditorInput::Text { buffer } = &mut self.input {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let EditorInput::Text { buffer } = &mut self.input {
            buffer.pop();
        }
    }

    /// Value the editor currently holds, trimmed.
    pub fn value(&self) -> String {
        match &self.input {
            EditorInput::Select { options, cursor } => options
                .get(*cursor)
                .map(|o| o.trim().to_string())
                .unwrap_or_default(),
            EditorInput::Text { buffer } => buffer.trim().to_string(),
        }
    }

    /// Dropdowns only submit a different, non-empty value. Text fields submit
    /// any difference, including clearing the value.
    pub fn confirm(&self) -> EditOutcome {
        let value = self.value();
        let changed = value != self.original;
        let submit = match self.field.kind() {
            FieldKind::Dropdown => changed && !value.is_empty(),
            _ => changed,
        };

        if submit {
            EditOutcome::Submit(FieldUpdate::new(self.field, FieldValue::Text(value)))
        } else {
            EditOutcome::Unchanged
        }
    }
}

/// A field update in flight: the value shown before, and the value proposed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTxn {
    pub session_id: String,
    pub snapshot: FieldValue,
    pub update: FieldUpdate,
}

impl FieldTxn {
    pub fn begin(session_id: &str, info: &SessionInfo, update: FieldUpdate) -> Self {
        Self {
            session_id: session_id.to_string(),
            snapshot: update.field.current(info),
            update,
        }
    }

    /// Value to display while the request is pending.
    pub fn shown(&self) -> &FieldValue {
        &self.update.value
    }

    pub fn commit(self, info: &mut SessionInfo) -> FieldUpdate {
        self.update.apply(info);
        self.update
    }

    /// Value to display again after a failure.
    pub fn rollback(self) -> FieldValue {
        self.snapshot
    }
}
