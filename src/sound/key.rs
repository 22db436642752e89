//! Sound identification type.

use std::borrow::Borrow;
use std::sync::Arc;

/// Registry key and public handle for a loaded sound.
///
/// `SoundKey` is the path the sound was loaded from. It uses `Arc<str>`
/// internally, so the registry and every handle given out share a single
/// copy of the string.
///
/// # Performance
///
/// Cloning a `SoundKey` is cheap (Arc pointer copy, no heap allocation).
///
/// # Example
///
/// ```
/// use stream_mixer::SoundKey;
///
/// let music = SoundKey::new("music/theme.wav");
/// let click = SoundKey::new("sfx/click.wav");
///
/// assert_ne!(music, click);
/// assert_eq!(music, SoundKey::new("music/theme.wav"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundKey(Arc<str>);

impl SoundKey {
    /// Creates a new key from a path string.
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if both keys share the same allocation.
    ///
    /// Keys handed out by the mixer for one registry entry always do.
    pub fn same_entry(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Display for SoundKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SoundKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SoundKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for SoundKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Hash/Eq of `Arc<str>` delegate to `str`, so map lookups by `&str` agree.
impl Borrow<str> for SoundKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
