pub mod cover;
pub mod health;
pub mod history;
pub mod recommendations;

pub use cover::cover_config;
pub use health::health_check;
pub use history::{clear_history, delete_history_item, list_history};
pub use recommendations::recommendations_config;
