//! Path-keyed storage for loaded sounds.

use std::collections::hash_map::{Entry, HashMap};

use super::{Sound, SoundKey};

/// Owns every loaded [`Sound`], at most one per path.
#[derive(Debug, Default)]
pub(crate) struct SoundRegistry {
    sounds: HashMap<SoundKey, Sound>,
}

impl SoundRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `path`, creating an unloaded one if needed.
    ///
    /// The flag is `true` when the entry was just created.
    pub(crate) fn create(&mut self, path: &str) -> (&mut Sound, bool) {
        match self.sounds.entry(SoundKey::new(path)) {
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                (slot.insert(Sound::new(key)), true)
            }
            Entry::Occupied(slot) => (slot.into_mut(), false),
        }
    }

    pub(crate) fn get(&self, path: &str) -> Option<&Sound> {
        self.sounds.get(path)
    }

    pub(crate) fn get_mut(&mut self, path: &str) -> Option<&mut Sound> {
        self.sounds.get_mut(path)
    }

    pub(crate) fn remove(&mut self, path: &str) -> Option<Sound> {
        self.sounds.remove(path)
    }

    pub(crate) fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Removes and yields every sound.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Sound> + '_ {
        self.sounds.drain().map(|(_, sound)| sound)
    }
}
