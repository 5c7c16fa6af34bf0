pub mod normalize;
pub mod sequence_matcher;

pub use normalize::{normalize, token_set, tokens};
pub use sequence_matcher::ratio;
