use crate::coerce::{ordinal_text, parse_number};
use crate::column::{ColumnStore, OrdinalDictionary};
use crate::dimension::{Dimension, DimensionDef, DimensionType, Schema};
use crate::error::{ListError, ListResult};
use crate::extent::Extent;
use crate::index_map::IndexMap;
use crate::item::{ItemModel, OptionMap, OptionSource, Overlay};
use crate::nearest::{self, NearestTies};
use crate::provider::{ArrayProvider, DataProvider, Source};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Record field whose content feeds the columns.
const VALUE_KEY: &str = "value";
/// Record field used as the item name.
const NAME_KEY: &str = "name";

static NULL: Value = Value::Null;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetOptions {
    /// Rows per column chunk.
    pub chunk_size: usize,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self { chunk_size: 4096 }
    }
}

impl DatasetOptions {
    fn validate(&self) -> ListResult<()> {
        if self.chunk_size == 0 {
            return Err(ListError::InvalidOptions(
                "chunk_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Values produced by a [`Dataset::map`] callback, written to the mapped dimensions in order.
///
/// A single number only replaces the first mapped dimension. Dimensions the output does not
/// reach keep their current value and surplus values are ignored.
pub trait MapOutput {
    fn assign(self, out: &mut [f64]);
}

impl MapOutput for f64 {
    fn assign(self, out: &mut [f64]) {
        if let Some(first) = out.first_mut() {
            *first = self;
        }
    }
}

impl<const N: usize> MapOutput for [f64; N] {
    fn assign(self, out: &mut [f64]) {
        for (slot, value) in out.iter_mut().zip(self) {
            *slot = value;
        }
    }
}

impl MapOutput for Vec<f64> {
    fn assign(self, out: &mut [f64]) {
        for (slot, value) in out.iter_mut().zip(self) {
            *slot = value;
        }
    }
}

/// Columnar dataset backing a chart series.
///
/// Items keep their raw index (position in the ingested input) for the lifetime of the dataset.
/// Reads and transforms address items by *active* index, the position among the items that
/// survived filtering.
#[derive(Clone, Debug)]
pub struct Dataset {
    schema: Arc<Schema>,
    options: DatasetOptions,
    host: Arc<dyn OptionSource>,
    provider: Arc<dyn DataProvider>,
    store: ColumnStore,
    indices: IndexMap,
    overlays: Arc<Vec<Option<Overlay>>>,
    initialized: bool,
    extents: RefCell<HashMap<usize, Extent>>,
}

impl Dataset {
    /// Dataset with default options and an empty host options carrier.
    pub fn new<I, D>(dimensions: I) -> ListResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<DimensionDef>,
    {
        Self::with_host(
            dimensions,
            Arc::new(OptionMap::new()),
            DatasetOptions::default(),
        )
    }

    pub fn with_host<I, D>(
        dimensions: I,
        host: Arc<dyn OptionSource>,
        options: DatasetOptions,
    ) -> ListResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<DimensionDef>,
    {
        Self::from_schema(Arc::new(Schema::new(dimensions)?), host, options)
    }

    pub fn from_schema(
        schema: Arc<Schema>,
        host: Arc<dyn OptionSource>,
        options: DatasetOptions,
    ) -> ListResult<Self> {
        options.validate()?;
        let store = ColumnStore::new(&schema, options.chunk_size);
        Ok(Self {
            schema,
            options,
            host,
            provider: Arc::new(ArrayProvider::default()),
            store,
            indices: IndexMap::default(),
            overlays: Arc::new(Vec::new()),
            initialized: false,
            extents: RefCell::new(HashMap::new()),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> DatasetOptions {
        self.options
    }

    pub fn host_model(&self) -> &dyn OptionSource {
        self.host.as_ref()
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.schema.dimension(name)
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.schema.names().collect()
    }

    /// Ingest a list of raw items: scalars, rows, or `{"value": ..., ...}` records.
    pub fn init_data(&mut self, items: Vec<Value>) -> ListResult<()> {
        self.init_provider(ArrayProvider::new(items))
    }

    /// Ingest every item of `provider`.
    ///
    /// All items are parsed and shape-checked before anything is stored, so a failed ingestion
    /// leaves the dataset empty. A dataset can only be populated once.
    pub fn init_provider<P>(&mut self, provider: P) -> ListResult<()>
    where
        P: DataProvider + 'static,
    {
        self.init_shared_provider(Arc::new(provider))
    }

    pub fn init_shared_provider(&mut self, provider: Arc<dyn DataProvider>) -> ListResult<()> {
        if self.initialized {
            return Err(ListError::AlreadyInitialized);
        }

        let staged = self.stage(provider.as_ref())?;
        let dims = self.schema.len();

        let mut store = ColumnStore::new(&self.schema, self.options.chunk_size);
        for row in staged.values.chunks_exact(dims) {
            store.append_row(row);
        }
        for (dim, dictionary) in staged.dictionaries.into_iter().enumerate() {
            if let Some(dictionary) = dictionary {
                store.set_dictionary(dim, dictionary);
            }
        }

        let count = store.len();
        log::debug!(
            "ingested {count} items into {dims} dimensions ({} chunks per column)",
            store.chunk_count()
        );

        self.store = store;
        self.overlays = Arc::new(staged.overlays);
        self.indices = IndexMap::Identity(count);
        self.provider = provider;
        self.initialized = true;
        self.extents.get_mut().clear();
        Ok(())
    }

    fn stage(&self, provider: &dyn DataProvider) -> ListResult<Staged> {
        let dims = self.schema.len();
        let count = provider.count();
        let layout = RowLayout::resolve(&self.schema, provider.source());

        let mut dictionaries: Vec<Option<OrdinalDictionary>> = self
            .schema
            .dimensions()
            .iter()
            .map(|dim| (dim.dimension_type == DimensionType::Ordinal).then(Default::default))
            .collect();
        let mut values = Vec::with_capacity(count.saturating_mul(dims));
        let mut overlays = Vec::with_capacity(count);
        let mut row = vec![f64::NAN; dims];

        for raw_index in 0..count {
            let item = provider.get_item(raw_index);
            let item: &Value = item.as_deref().unwrap_or(&NULL);
            let (payload, overlay) = split_record(item);
            layout.parse(
                &self.schema,
                raw_index,
                payload,
                &mut row,
                &mut dictionaries,
            )?;
            values.extend_from_slice(&row);
            overlays.push(overlay);
        }

        Ok(Staged {
            values,
            overlays,
            dictionaries,
        })
    }

    /// Number of active items.
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    /// Number of ingested items, filtered or not.
    pub fn raw_count(&self) -> usize {
        self.store.len()
    }

    /// Chunks allocated per column.
    pub fn chunk_count(&self) -> usize {
        self.store.chunk_count()
    }

    pub fn raw_index(&self, index: usize) -> ListResult<usize> {
        self.indices.raw_index(index).ok_or(ListError::OutOfRange {
            index,
            len: self.count(),
        })
    }

    /// Active index of the item ingested at `raw_index`, or `None` if it was filtered out or
    /// never existed.
    pub fn index_of_raw_index(&self, raw_index: usize) -> Option<usize> {
        if raw_index >= self.raw_count() {
            return None;
        }
        self.indices.index_of_raw(raw_index)
    }

    /// Stored value of `dimension` for the active item `index`. Missing values are `NaN`.
    pub fn get(&self, dimension: &str, index: usize) -> ListResult<f64> {
        let dim = self.schema.resolve(dimension)?;
        let raw = self.raw_index(index)?;
        Ok(self.store.get(dim, raw))
    }

    pub fn get_by_raw_index(&self, dimension: &str, raw_index: usize) -> ListResult<f64> {
        let dim = self.schema.resolve(dimension)?;
        if raw_index >= self.raw_count() {
            return Err(ListError::OutOfRange {
                index: raw_index,
                len: self.raw_count(),
            });
        }
        Ok(self.store.get(dim, raw_index))
    }

    pub fn get_values(&self, dimensions: &[&str], index: usize) -> ListResult<Vec<f64>> {
        let dims = self.schema.resolve_all(dimensions)?;
        let raw = self.raw_index(index)?;
        let mut out = Vec::with_capacity(dims.len());
        self.read_row(&dims, raw, &mut out);
        Ok(out)
    }

    /// Whether every dimension of the item holds a value.
    pub fn has_value(&self, index: usize) -> ListResult<bool> {
        let raw = self.raw_index(index)?;
        Ok((0..self.schema.len()).all(|dim| !self.store.get(dim, raw).is_nan()))
    }

    /// Category text behind an ordinal code. `None` for non-ordinal dimensions and unknown codes.
    pub fn ordinal_category(&self, dimension: &str, code: f64) -> ListResult<Option<&str>> {
        let dim = self.schema.resolve(dimension)?;
        if !(code >= 0.0) || code.fract() != 0.0 {
            return Ok(None);
        }
        Ok(self
            .store
            .dictionary(dim)
            .and_then(|dict| dict.category(code as usize)))
    }

    /// Number of distinct category strings seen in an ordinal dimension.
    pub fn ordinal_category_count(&self, dimension: &str) -> ListResult<usize> {
        let dim = self.schema.resolve(dimension)?;
        Ok(self.store.dictionary(dim).map_or(0, OrdinalDictionary::len))
    }

    /// The raw item exactly as supplied at ingestion (or as the provider returns it).
    pub fn raw_data_item(&self, index: usize) -> ListResult<Cow<'_, Value>> {
        let raw = self.raw_index(index)?;
        self.provider
            .get_item(raw)
            .ok_or(ListError::OutOfRange { index, len: self.count() })
    }

    /// The raw value of an item: a record's `value` field, otherwise the raw item itself.
    pub fn raw_value(&self, index: usize) -> ListResult<Cow<'_, Value>> {
        Ok(record_value(self.raw_data_item(index)?))
    }

    /// Overlay view of the fields a record item carried next to its value.
    pub fn item_model(&self, index: usize) -> ListResult<ItemModel> {
        let raw = self.raw_index(index)?;
        let overlay = self.overlays.get(raw).cloned().flatten();
        Ok(ItemModel::new(raw, overlay, self.provider.clone()))
    }

    /// Like [`Dataset::item_model`], falling back to the host options carrier for absent keys.
    pub fn item_model_with_defaults(&self, index: usize) -> ListResult<ItemModel> {
        Ok(self.item_model(index)?.with_parent(self.host.clone()))
    }

    fn overlay(&self, raw: usize) -> Option<&Overlay> {
        self.overlays.get(raw)?.as_ref()
    }

    /// The `name` field of a record item.
    pub fn name(&self, index: usize) -> ListResult<Option<&str>> {
        let raw = self.raw_index(index)?;
        Ok(self
            .overlay(raw)
            .and_then(|overlay| overlay.get(NAME_KEY))
            .and_then(Value::as_str))
    }

    /// Active index of the first item named `name`.
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.indices.iter().position(|raw| {
            self.overlay(raw)
                .and_then(|overlay| overlay.get(NAME_KEY))
                .and_then(Value::as_str)
                == Some(name)
        })
    }

    fn read_row(&self, dims: &[usize], raw: usize, out: &mut Vec<f64>) {
        out.clear();
        out.extend(dims.iter().map(|dim| self.store.get(*dim, raw)));
    }

    /// `[min, max]` of `dimension` over the active items. Cached until the next filter.
    pub fn data_extent(&self, dimension: &str) -> ListResult<Extent> {
        let dim = self.schema.resolve(dimension)?;
        let cached = self.extents.borrow().get(&dim).copied();
        if let Some(extent) = cached {
            return Ok(extent);
        }

        let extent: Extent = self
            .indices
            .iter()
            .map(|raw| self.store.get(dim, raw))
            .collect();
        self.extents.borrow_mut().insert(dim, extent);
        Ok(extent)
    }

    /// Sum of the defined values of `dimension` over the active items.
    pub fn sum(&self, dimension: &str) -> ListResult<f64> {
        let dim = self.schema.resolve(dimension)?;
        Ok(self
            .indices
            .iter()
            .map(|raw| self.store.get(dim, raw))
            .filter(|v| !v.is_nan())
            .sum())
    }

    /// Median of the defined values of `dimension` over the active items.
    pub fn median(&self, dimension: &str) -> ListResult<Option<f64>> {
        let dim = self.schema.resolve(dimension)?;
        let mut values: Vec<OrderedFloat<f64>> = self
            .indices
            .iter()
            .map(|raw| self.store.get(dim, raw))
            .filter(|v| !v.is_nan())
            .map(OrderedFloat)
            .collect();
        if values.is_empty() {
            return Ok(None);
        }
        values.sort_unstable();
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 1 {
            values[mid].0
        } else {
            (values[mid - 1].0 + values[mid].0) / 2.0
        };
        Ok(Some(median))
    }

    /// Active indices whose value of `dimension` is nearest to `target`.
    ///
    /// Every index at the minimal distance is returned, grouped by value. With `max_distance`,
    /// anything farther than that is excluded and the result may be empty.
    pub fn indices_of_nearest(
        &self,
        dimension: &str,
        target: f64,
        max_distance: Option<f64>,
    ) -> ListResult<Vec<usize>> {
        self.indices_of_nearest_with(dimension, target, max_distance, NearestTies::All)
    }

    pub fn indices_of_nearest_with(
        &self,
        dimension: &str,
        target: f64,
        max_distance: Option<f64>,
        ties: NearestTies,
    ) -> ListResult<Vec<usize>> {
        let dim = self.schema.resolve(dimension)?;
        let values = self.indices.iter().map(|raw| self.store.get(dim, raw));
        Ok(nearest::indices_of_nearest(
            values,
            target,
            max_distance,
            ties,
        ))
    }

    /// Call `f(values, index)` for every active item in order.
    pub fn each<F>(&self, dimensions: &[&str], mut f: F) -> ListResult<()>
    where
        F: FnMut(&[f64], usize),
    {
        let dims = self.schema.resolve_all(dimensions)?;
        let mut buf = Vec::with_capacity(dims.len());
        for (index, raw) in self.indices.iter().enumerate() {
            self.read_row(&dims, raw, &mut buf);
            f(&buf, index);
        }
        Ok(())
    }

    /// Collect `f(values, index)` over the active items, in active order.
    pub fn map_array<T, F>(&self, dimensions: &[&str], mut f: F) -> ListResult<Vec<T>>
    where
        F: FnMut(&[f64], usize) -> T,
    {
        let dims = self.schema.resolve_all(dimensions)?;
        let mut buf = Vec::with_capacity(dims.len());
        let mut out = Vec::with_capacity(self.count());
        for (index, raw) in self.indices.iter().enumerate() {
            self.read_row(&dims, raw, &mut buf);
            out.push(f(&buf, index));
        }
        Ok(out)
    }

    /// Derive a new dataset whose `dimensions` hold `f(values, index)` for every active item.
    ///
    /// The result has the same schema, the same active items and the same raw payloads. Its
    /// column storage is independent: `self` is left untouched.
    pub fn map<R, F>(&self, dimensions: &[&str], mut f: F) -> ListResult<Dataset>
    where
        R: MapOutput,
        F: FnMut(&[f64], usize) -> R,
    {
        let dims = self.schema.resolve_all(dimensions)?;
        log::debug!("mapping {dimensions:?} over {} items", self.count());

        let mut mapped = self.clone();
        mapped.extents = RefCell::new(HashMap::new());

        let mut input = Vec::with_capacity(dims.len());
        let mut output = vec![f64::NAN; dims.len()];
        for (index, raw) in self.indices.iter().enumerate() {
            self.read_row(&dims, raw, &mut input);
            output.copy_from_slice(&input);
            f(&input, index).assign(&mut output);
            for (dim, value) in dims.iter().zip(&output) {
                mapped.store.set(*dim, raw, *value);
            }
        }
        Ok(mapped)
    }

    /// Narrow the active items, in place, to those for which `predicate(values, index)` holds.
    ///
    /// This mutates `self` and returns it for chaining; no new dataset is allocated and column
    /// storage is not touched. Relative order is preserved and active indices are reassigned
    /// contiguously.
    pub fn filter_self<F>(&mut self, dimensions: &[&str], mut predicate: F) -> ListResult<&mut Self>
    where
        F: FnMut(&[f64], usize) -> bool,
    {
        let dims = self.schema.resolve_all(dimensions)?;
        let before = self.count();
        let store = &self.store;
        let mut buf = Vec::with_capacity(dims.len());
        self.indices.retain(|index, raw| {
            buf.clear();
            buf.extend(dims.iter().map(|dim| store.get(*dim, raw)));
            predicate(&buf, index)
        });
        self.after_filter(before);
        Ok(self)
    }

    /// Like [`Dataset::filter_self`] with a predicate over the active index alone.
    pub fn filter_self_indexed<F>(&mut self, mut predicate: F) -> &mut Self
    where
        F: FnMut(usize) -> bool,
    {
        let before = self.count();
        self.indices.retain(|index, _| predicate(index));
        self.after_filter(before);
        self
    }

    /// Keep the items whose values fall inside every `[low, high]` range (inclusive).
    pub fn select_range(&mut self, ranges: &[(&str, [f64; 2])]) -> ListResult<&mut Self> {
        let names: Vec<&str> = ranges.iter().map(|(name, _)| *name).collect();
        self.filter_self(&names, |values, _| {
            values
                .iter()
                .zip(ranges)
                .all(|(value, (_, [low, high]))| *value >= *low && *value <= *high)
        })
    }

    fn after_filter(&mut self, before: usize) {
        log::debug!("filtered {before} items down to {}", self.count());
        self.extents.get_mut().clear();
    }
}

struct Staged {
    /// Row-major, `schema.len()` values per item.
    values: Vec<f64>,
    overlays: Vec<Option<Overlay>>,
    dictionaries: Vec<Option<OrdinalDictionary>>,
}

/// How row positions map onto schema dimensions.
struct RowLayout {
    /// Row position feeding each dimension.
    columns: Vec<Option<usize>>,
    /// Longest row that can be reconciled with the schema.
    max_len: usize,
}

impl RowLayout {
    fn resolve(schema: &Schema, source: Option<&Source>) -> Self {
        let dims = schema.len();
        let Some(source) = source else {
            return Self {
                columns: (0..dims).map(Some).collect(),
                max_len: dims,
            };
        };

        let declared = source.dimension_count.unwrap_or(dims);
        match &source.dimension_names {
            Some(names) => {
                let columns = schema
                    .dimensions()
                    .iter()
                    .map(|dim| {
                        let position = names.iter().position(|n| *n == dim.name);
                        if position.is_none() {
                            log::warn!(
                                "source does not name dimension `{}`; it will hold no values",
                                dim.name
                            );
                        }
                        position
                    })
                    .collect();
                Self {
                    columns,
                    max_len: declared.max(names.len()),
                }
            }
            None => Self {
                columns: (0..dims).map(Some).collect(),
                max_len: declared.max(dims),
            },
        }
    }

    fn parse(
        &self,
        schema: &Schema,
        raw_index: usize,
        payload: &Value,
        row: &mut [f64],
        dictionaries: &mut [Option<OrdinalDictionary>],
    ) -> ListResult<()> {
        match payload {
            Value::Array(cells) => {
                if cells.len() > self.max_len {
                    log::warn!(
                        "rejecting raw item {raw_index}: {} values for {} dimensions",
                        cells.len(),
                        self.max_len
                    );
                    return Err(ListError::SchemaMismatch {
                        raw_index,
                        expected: self.max_len,
                        actual: cells.len(),
                    });
                }
                for (dim, slot) in schema.dimensions().iter().zip(row.iter_mut()) {
                    *slot = match self.columns[dim.index].and_then(|c| cells.get(c)) {
                        Some(cell) => parse_cell(cell, dim, dictionaries),
                        None => f64::NAN,
                    };
                }
            }
            scalar => {
                for (dim, slot) in schema.dimensions().iter().zip(row.iter_mut()) {
                    *slot = parse_cell(scalar, dim, dictionaries);
                }
            }
        }
        Ok(())
    }
}

fn parse_cell(
    cell: &Value,
    dim: &Dimension,
    dictionaries: &mut [Option<OrdinalDictionary>],
) -> f64 {
    if let Some(dictionary) = dictionaries[dim.index].as_mut() {
        if let Some(text) = ordinal_text(cell) {
            return dictionary.code_for(text);
        }
    }
    parse_number(cell)
}

/// Split a raw item into the payload that feeds the columns and its overlay fields.
fn split_record(item: &Value) -> (&Value, Option<Overlay>) {
    let Value::Object(map) = item else {
        return (item, None);
    };
    let payload = map.get(VALUE_KEY).unwrap_or(&NULL);
    let mut overlay = map.clone();
    overlay.remove(VALUE_KEY);
    let overlay = (!overlay.is_empty()).then(|| Arc::new(overlay));
    (payload, overlay)
}

fn record_value(item: Cow<'_, Value>) -> Cow<'_, Value> {
    match item {
        Cow::Borrowed(value) => Cow::Borrowed(match value {
            Value::Object(map) => map.get(VALUE_KEY).unwrap_or(value),
            _ => value,
        }),
        Cow::Owned(Value::Object(mut map)) if map.contains_key(VALUE_KEY) => {
            Cow::Owned(map.remove(VALUE_KEY).unwrap_or(Value::Null))
        }
        owned => owned,
    }
}
