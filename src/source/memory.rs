use std::sync::Arc;

use super::{ImagerySource, SceneQuery, SourceError};
use crate::scene::{Scene, SceneCollection};

/// Scenes held in memory, for stubs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    collection: String,
    scenes: Vec<Arc<Scene>>,
}

impl InMemorySource {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scenes: Vec::new(),
        }
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.push(scene);
        self
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(Arc::new(scene));
    }
}

impl ImagerySource for InMemorySource {
    fn query(&self, query: &SceneQuery) -> Result<SceneCollection, SourceError> {
        if query.collection != self.collection {
            return Ok(SceneCollection::new(query.collection.clone(), Vec::new()));
        }

        let all = SceneCollection::new(self.collection.clone(), self.scenes.clone());
        Ok(all
            .filter_date(query.start, query.end)
            .filter_bounds(&query.region))
    }
}
