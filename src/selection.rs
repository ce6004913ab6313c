use crate::scene::LayerId;

/// Ordered set of selected layers plus the primary (rotation anchor).
///
/// The primary, when present, is always a member of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<LayerId>,
    primary: Option<LayerId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of `ids` in order, duplicates dropped, without a primary
    pub fn from_ids(ids: impl IntoIterator<Item = LayerId>) -> Self {
        let mut set = Self::new();
        for id in ids {
            set.insert(id);
        }
        set
    }

    pub fn with_primary(mut self, id: LayerId) -> Self {
        self.set_primary(id);
        self
    }

    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn primary(&self) -> Option<LayerId> {
        self.primary
    }

    pub fn first(&self) -> Option<LayerId> {
        self.ids.first().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }

    /// Add `id` at the end. Returns false if it was already selected.
    pub fn insert(&mut self, id: LayerId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: LayerId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&sid| sid != id);
        if self.primary == Some(id) {
            self.primary = None;
        }
        self.ids.len() != before
    }

    /// Add or remove `id`; a newly added id becomes the primary
    pub fn toggle(&mut self, id: LayerId) {
        if !self.remove(id) {
            self.insert(id);
            self.primary = Some(id);
        }
    }

    /// Make `id` the primary. Ignored unless `id` is selected.
    pub fn set_primary(&mut self, id: LayerId) -> bool {
        if self.contains(id) {
            self.primary = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.primary = None;
    }

    /// Drop every id that fails `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(LayerId) -> bool) {
        self.ids.retain(|&id| keep(id));
        if let Some(primary) = self.primary {
            if !self.ids.contains(&primary) {
                self.primary = None;
            }
        }
    }
}

/// In-flight combined transform of the selection, shared with other consumers
/// so they can read the group geometry without walking every node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionTransform {
    /// Group center, stage space
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for SelectionTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}
