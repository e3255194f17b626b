use crate::provider::DataProvider;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Read-only key lookup over an options object.
pub trait OptionSource: fmt::Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<&Value>;
}

/// Options carrier backed by a JSON object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionMap(Map<String, Value>);

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; anything other than an object yields an empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for OptionMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl OptionSource for OptionMap {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Extra fields of one record item, everything except `value`.
pub(crate) type Overlay = Arc<Map<String, Value>>;

/// Per-item view combining the fields a record carried next to its `value` with an optional
/// parent carrier.
///
/// Lookups never fail: a key that neither the overlay nor the parent defines is `None`.
#[derive(Clone)]
pub struct ItemModel {
    raw_index: usize,
    overlay: Option<Overlay>,
    provider: Arc<dyn DataProvider>,
    parent: Option<Arc<dyn OptionSource>>,
}

impl fmt::Debug for ItemModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemModel")
            .field("raw_index", &self.raw_index)
            .field("overlay", &self.overlay)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl ItemModel {
    pub(crate) fn new(
        raw_index: usize,
        overlay: Option<Overlay>,
        provider: Arc<dyn DataProvider>,
    ) -> Self {
        Self {
            raw_index,
            overlay,
            provider,
            parent: None,
        }
    }

    pub(crate) fn with_parent(mut self, parent: Arc<dyn OptionSource>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn raw_index(&self) -> usize {
        self.raw_index
    }

    /// The raw item exactly as it was supplied.
    pub fn option(&self) -> Option<Cow<'_, Value>> {
        self.provider.get_item(self.raw_index)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.overlay.as_ref().and_then(|o| o.get(key)) {
            return Some(value);
        }
        self.parent.as_ref()?.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    /// Keys supplied by the item itself (parent keys are not listed).
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.overlay
            .iter()
            .flat_map(|overlay| overlay.keys().map(String::as_str))
    }
}

impl OptionSource for ItemModel {
    fn get(&self, key: &str) -> Option<&Value> {
        ItemModel::get(self, key)
    }
}
