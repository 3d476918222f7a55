pub mod entities;
pub mod rules;
pub mod tokenizer;

pub use entities::*;
pub use rules::*;
pub use tokenizer::*;
