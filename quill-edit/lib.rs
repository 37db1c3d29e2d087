pub mod abbreviation;
pub mod auto_pairs;
pub mod dispatch;
pub mod placeholder;
pub mod session;
pub mod settings;
