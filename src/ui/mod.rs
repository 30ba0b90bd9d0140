pub mod conversation_list;
pub mod detail_panel;
pub mod filter_panel;
pub mod layout;
pub mod message_view;
pub mod styles;

pub use conversation_list::{ConversationList, ConversationListState};
pub use detail_panel::DetailPanel;
pub use filter_panel::{FilterPanel, FilterPaneState};
pub use layout::{AppLayout, FocusedPane, LayoutConfig};
pub use message_view::{ConversationState, ConversationView};
pub use styles::Theme;
