//! Per-frame grouping of entities by model.

use std::collections::BTreeMap;

use engine_core::{Entity, ModelHandle};

/// Entities submitted this frame, grouped by [`ModelHandle`].
///
/// Iteration follows handle order so frames are reproducible.
#[derive(Debug, Default)]
pub struct RenderBatches {
    batches: BTreeMap<ModelHandle, Vec<Entity>>,
}

impl RenderBatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: &Entity) {
        self.batches.entry(entity.model).or_default().push(*entity);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelHandle, &[Entity])> {
        self.batches.iter().map(|(model, entities)| (*model, entities.as_slice()))
    }

    pub fn get(&self, model: ModelHandle) -> Option<&[Entity]> {
        self.batches.get(&model).map(Vec::as_slice)
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn entity_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}
