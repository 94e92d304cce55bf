//! Preload manifest.

use crate::store::RequestIdentity;

/// Ordered set of identities warmed into the store at startup.
///
/// Created at process start and consumed exactly once by the startup
/// operation; it is not retained afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadSet {
    identities: Vec<RequestIdentity>,
}

impl PreloadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set of GET identities from manifest URLs, preserving order.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identities: urls
                .into_iter()
                .map(|url| RequestIdentity::get(url.as_ref()))
                .collect(),
        }
    }

    pub fn push(&mut self, identity: RequestIdentity) {
        self.identities.push(identity);
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn contains(&self, identity: &RequestIdentity) -> bool {
        self.identities.contains(identity)
    }
}

impl IntoIterator for PreloadSet {
    type Item = RequestIdentity;
    type IntoIter = std::vec::IntoIter<RequestIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.identities.into_iter()
    }
}
