pub mod analysis;
pub mod media;
pub mod pricing;
pub mod queue_item;

pub use analysis::AnalysisResult;
pub use media::{mime_for_name, MediaFile, MediaKind};
pub use pricing::{rules_for_level, PricingRule, PRICING_CAUTION, PRICING_RULES};
pub use queue_item::{ItemState, ItemStatus, QueueItem, QueueItemView};
