use super::ids::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The ordered candidate set of assets considered for selection.
///
/// Discovery order is preserved: both the matrix builder and the greedy
/// selector walk the universe in this order, and their output depends on it.
/// Duplicate ids are dropped, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AssetId>", into = "Vec<AssetId>")]
pub struct Universe {
    assets: Vec<AssetId>,
}

impl Universe {
    pub fn new<I, A>(assets: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AssetId>,
    {
        let mut seen = HashSet::new();
        let assets = assets
            .into_iter()
            .map(Into::into)
            .filter(|id: &AssetId| seen.insert(id.clone()))
            .collect();
        Self { assets }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssetId> {
        self.assets.iter()
    }

    /// Number of unordered pairs `{i, j}` with `i < j`.
    pub fn pair_count(&self) -> usize {
        let n = self.assets.len();
        n * n.saturating_sub(1) / 2
    }
}

impl From<Vec<AssetId>> for Universe {
    fn from(assets: Vec<AssetId>) -> Self {
        Self::new(assets)
    }
}

impl From<Universe> for Vec<AssetId> {
    fn from(universe: Universe) -> Self {
        universe.assets
    }
}

impl<A: Into<AssetId>> FromIterator<A> for Universe {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a Universe {
    type Item = &'a AssetId;
    type IntoIter = std::slice::Iter<'a, AssetId>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
