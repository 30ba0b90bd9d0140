pub mod handler;

pub use handler::{Action, handle_key_event};
