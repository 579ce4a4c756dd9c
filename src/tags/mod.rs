pub mod catalog;
pub mod manager;
pub mod reader;

pub use catalog::{IconType, TagCatalog, TagInfo, TagType};
pub use manager::{Placement, TagManager};
pub use reader::{read_tags, MetadataSource, RawTagValue, StaticMetadata, TagValues};
