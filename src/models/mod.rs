pub mod candidate;
pub mod marker;
pub mod page;
pub mod resolution;
pub mod utterance;

pub use candidate::*;
pub use marker::*;
pub use page::*;
pub use resolution::*;
pub use utterance::*;
