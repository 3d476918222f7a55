pub mod diagnostics;
pub mod input;
pub mod output;

pub use diagnostics::*;
pub use input::*;
pub use output::*;
