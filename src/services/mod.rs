pub mod metadata;
pub mod search_index;

pub use metadata::{ClaimFileNameExtractor, MetadataExtractor, PatternMetadataExtractor};
pub use search_index::{
    ApiKeyAuth, BasicAuth, HttpSearchIndex, NoAuth, NoopSearchIndex, RequestAuth, SearchIndex,
};
