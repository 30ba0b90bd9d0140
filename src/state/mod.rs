pub mod edit;
pub mod filters;
pub mod notify;

pub use edit::{
    EditOutcome, EditableField, EditorInput, FieldKind, FieldTxn, FieldUpdate, FieldValue,
    InlineEditor, NOT_INFORMED,
};
pub use filters::{Chip, FacetGroup, FilterSet, build_groups};
pub use notify::{Notifications, Severity};
