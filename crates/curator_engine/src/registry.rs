use std::collections::BTreeMap;

use crate::extract::ContentExtractor;
use crate::types::ResourceType;

/// Maps resource types to the extractor that handles them.
///
/// Format-specific extractors register under their type; everything else is
/// served by the fallback. New formats plug in here without touching the
/// pipeline.
pub struct ExtractorRegistry {
    by_type: BTreeMap<ResourceType, Box<dyn ContentExtractor>>,
    fallback: Box<dyn ContentExtractor>,
}

impl ExtractorRegistry {
    pub fn new(fallback: Box<dyn ContentExtractor>) -> Self {
        Self {
            by_type: BTreeMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, resource_type: ResourceType, extractor: Box<dyn ContentExtractor>) {
        self.by_type.insert(resource_type, extractor);
    }

    pub fn select(&self, resource_type: ResourceType) -> &dyn ContentExtractor {
        self.by_type
            .get(&resource_type)
            .unwrap_or(&self.fallback)
            .as_ref()
    }
}
