pub mod search;
pub mod similarity;

pub use search::{SearchMethod, SearchRequest, TrackQuery, TrackSearch};
pub use similarity::{SimilarityQuery, similarity_params};
