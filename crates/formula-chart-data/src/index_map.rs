/// Active index → raw index mapping.
///
/// Filtering only ever keeps a subsequence, so the raw indices of a `Filtered` map are strictly
/// increasing and reverse lookups are a binary search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum IndexMap {
    Identity(usize),
    Filtered(Vec<usize>),
}

impl Default for IndexMap {
    fn default() -> Self {
        IndexMap::Identity(0)
    }
}

impl IndexMap {
    pub fn len(&self) -> usize {
        match self {
            IndexMap::Identity(count) => *count,
            IndexMap::Filtered(indices) => indices.len(),
        }
    }

    pub fn raw_index(&self, active: usize) -> Option<usize> {
        match self {
            IndexMap::Identity(count) => (active < *count).then_some(active),
            IndexMap::Filtered(indices) => indices.get(active).copied(),
        }
    }

    pub fn index_of_raw(&self, raw: usize) -> Option<usize> {
        match self {
            IndexMap::Identity(count) => (raw < *count).then_some(raw),
            IndexMap::Filtered(indices) => indices.binary_search(&raw).ok(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter_map(move |active| self.raw_index(active))
    }

    /// Keep the entries for which `keep(active, raw)` holds, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, usize) -> bool,
    {
        let kept: Vec<usize> = self
            .iter()
            .enumerate()
            .filter(|(active, raw)| keep(*active, *raw))
            .map(|(_, raw)| raw)
            .collect();
        *self = IndexMap::Filtered(kept);
    }
}
