use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

/// Registry of live preview handles for locally selected images.
///
/// A handle stays registered for exactly as long as its [`PreviewHandle`]
/// value lives; dropping it releases the entry.
#[derive(Clone, Default)]
pub struct Previews {
    live: Arc<DashMap<Uuid, String>>,
}

impl Previews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live.insert(id, name.to_string());
        PreviewHandle {
            id,
            live: self.live.clone(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle_url: &str) -> bool {
        handle_url
            .strip_prefix("preview:")
            .and_then(|id| Uuid::parse_str(id).ok())
            .is_some_and(|id| self.live.contains_key(&id))
    }
}

#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    live: Arc<DashMap<Uuid, String>>,
}

impl PreviewHandle {
    pub fn url(&self) -> String {
        format!("preview:{}", self.id)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.live.remove(&self.id);
    }
}
