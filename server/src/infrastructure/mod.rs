pub mod event_bus;
pub mod state;

pub use event_bus::EventBus;
pub use state::AppState;
