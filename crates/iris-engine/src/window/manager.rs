/// Record of the open surfaces and which one is active.
///
/// Owned by the runtime, which is the only writer. Drawing targets the active
/// surface explicitly instead of tracking a process-wide "current window".
#[derive(Debug, Clone)]
pub struct SurfaceManager<K> {
    surfaces: Vec<K>,
    active: Option<K>,
}

impl<K> Default for SurfaceManager<K> {
    fn default() -> Self {
        Self {
            surfaces: Vec::new(),
            active: None,
        }
    }
}

impl<K: Copy + Eq + std::fmt::Debug> SurfaceManager<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface. The first one becomes active.
    pub fn register(&mut self, key: K) {
        if !self.surfaces.contains(&key) {
            self.surfaces.push(key);
        }
        if self.active.is_none() {
            self.active = Some(key);
        }
    }

    /// Removes a surface. If it was active, the oldest remaining surface
    /// takes over.
    pub fn remove(&mut self, key: K) {
        self.surfaces.retain(|k| *k != key);
        if self.active == Some(key) {
            self.active = self.surfaces.first().copied();
        }
    }

    /// Makes `key` active. Returns `false` for unknown surfaces.
    pub fn activate(&mut self, key: K) -> bool {
        if !self.surfaces.contains(&key) {
            return false;
        }
        if self.active != Some(key) {
            log::trace!("active surface -> {key:?}");
            self.active = Some(key);
        }
        true
    }

    #[inline]
    pub fn active(&self) -> Option<K> {
        self.active
    }

    #[inline]
    pub fn is_active(&self, key: K) -> bool {
        self.active == Some(key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.surfaces.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_surface_becomes_active() {
        let mut m = SurfaceManager::new();
        m.register(1);
        m.register(2);
        assert_eq!(m.active(), Some(1));
        assert!(m.contains(2));
    }

    #[test]
    fn activate_switches_known_surfaces_only() {
        let mut m = SurfaceManager::new();
        m.register(1);
        m.register(2);
        assert!(m.activate(2));
        assert!(m.is_active(2));
        assert!(!m.activate(9));
        assert!(m.is_active(2));
    }

    #[test]
    fn removing_last_clears_marker() {
        let mut m = SurfaceManager::new();
        m.register(1);
        m.remove(1);
        assert_eq!(m.active(), None);
        assert!(m.is_empty());
    }

    #[test]
    fn removing_active_hands_over_to_oldest() {
        let mut m = SurfaceManager::new();
        m.register(1);
        m.register(2);
        m.register(3);
        m.activate(3);
        m.remove(3);
        assert_eq!(m.active(), Some(1));

        m.remove(2);
        assert_eq!(m.active(), Some(1));
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut m = SurfaceManager::new();
        m.register(3);
        m.register(3);
        m.remove(3);
        assert!(m.is_empty());
    }
}
