pub mod asset_state;
pub mod store;

pub use asset_state::{AssetState, DEFAULT_HISTORY_CAPACITY};
pub use store::HistoryStore;
