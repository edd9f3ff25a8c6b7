pub mod definition;
pub mod element;
pub mod language;
pub mod pattern;
pub mod query;
pub mod summary;

pub use definition::*;
pub use element::*;
pub use language::*;
pub use pattern::*;
pub use query::*;
pub use summary::*;
