use smartstring::{LazyCompact, SmartString};

pub mod case;
pub mod document;
pub mod selection;
pub mod transaction;

pub type Tendril = SmartString<LazyCompact>;
