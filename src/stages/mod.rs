pub mod stage0_extract;
pub mod stage1_normalize;
pub mod stage2_candidates;
pub mod stage3_resolve;
pub mod stage4_segment;
pub mod stage5_clean;

pub use stage0_extract::*;
pub use stage1_normalize::*;
pub use stage2_candidates::*;
pub use stage3_resolve::*;
pub use stage4_segment::*;
pub use stage5_clean::*;
