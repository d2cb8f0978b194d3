pub mod actions;
pub mod effects;
pub mod native;
pub mod replay;
pub mod runner;
pub mod serialization;
pub mod settings;
pub mod state;
pub mod store;
pub mod versioned;

pub use actions::Action;
pub use effects::Effect;
pub use replay::Frame;
pub use runner::{Mode, Phase, Runner};
pub use settings::Settings;
pub use state::State;
pub use store::{EditError, Store};
