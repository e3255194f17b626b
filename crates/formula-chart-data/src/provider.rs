use crate::error::{ListError, ListResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// How the raw items of a provider are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceFormat {
    /// Scalars, rows or `{value, ...}` records, as authored.
    #[default]
    Original,
    /// Every item is a row.
    ArrayRows,
    /// A flat numeric buffer read `dimension_count` values at a time.
    TypedArray,
}

/// Shape metadata that accompanies raw input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub format: SourceFormat,
    /// Number of values in each row, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_count: Option<usize>,
    /// Name of each row position. When present, dimensions are matched by name instead of by
    /// position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_names: Option<Vec<String>>,
}

impl Source {
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_dimension_count(mut self, count: usize) -> Self {
        self.dimension_count = Some(count);
        self
    }

    pub fn with_dimension_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.dimension_count.get_or_insert(names.len());
        self.dimension_names = Some(names);
        self
    }
}

/// Pull-based access to raw items.
///
/// The dataset reads every item once during ingestion and again whenever a caller asks for a
/// raw payload, so implementations must return the same item for the same index.
pub trait DataProvider: fmt::Debug + Send + Sync {
    fn count(&self) -> usize;

    /// The raw item at `raw_index`, or `None` past the end.
    fn get_item(&self, raw_index: usize) -> Option<Cow<'_, Value>>;

    fn source(&self) -> Option<&Source> {
        None
    }
}

/// Provider over an owned list of items. This is what plain array input is adapted into.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayProvider {
    items: Vec<Value>,
    source: Option<Source>,
}

impl ArrayProvider {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl From<Vec<Value>> for ArrayProvider {
    fn from(items: Vec<Value>) -> Self {
        ArrayProvider::new(items)
    }
}

impl DataProvider for ArrayProvider {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn get_item(&self, raw_index: usize) -> Option<Cow<'_, Value>> {
        self.items.get(raw_index).map(Cow::Borrowed)
    }

    fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }
}

/// Provider over a flat numeric buffer holding `stride` interleaved values per item.
///
/// Trailing values that do not fill a whole item are ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct InterleavedProvider {
    values: Arc<[f64]>,
    stride: usize,
    source: Source,
}

impl InterleavedProvider {
    pub fn new(values: impl Into<Arc<[f64]>>, stride: usize) -> ListResult<Self> {
        if stride == 0 {
            return Err(ListError::InvalidOptions(
                "interleaved provider stride must be at least 1".into(),
            ));
        }
        Ok(Self {
            values: values.into(),
            stride,
            source: Source::new(SourceFormat::TypedArray).with_dimension_count(stride),
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl DataProvider for InterleavedProvider {
    fn count(&self) -> usize {
        self.values.len() / self.stride
    }

    fn get_item(&self, raw_index: usize) -> Option<Cow<'_, Value>> {
        if raw_index >= self.count() {
            return None;
        }
        let start = raw_index * self.stride;
        let row = self.values[start..start + self.stride]
            .iter()
            .map(|v| Value::from(*v))
            .collect();
        Some(Cow::Owned(Value::Array(row)))
    }

    fn source(&self) -> Option<&Source> {
        Some(&self.source)
    }
}
