mod selector;

pub use selector::TacticalModelSelector;
