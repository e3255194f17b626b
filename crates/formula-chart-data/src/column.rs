use crate::bitmap::BitVec;
use crate::coerce::coerce_number;
use crate::dimension::{DimensionType, Schema};
use std::collections::HashMap;
use std::sync::Arc;

/// A fixed-capacity segment of a column.
///
/// Integer chunks keep a validity mask; float chunks store `NaN` for missing values.
#[derive(Clone, Debug)]
enum Chunk {
    Float(Vec<f64>),
    Int { values: Vec<i64>, validity: BitVec },
}

impl Chunk {
    fn with_capacity(dimension_type: DimensionType, capacity: usize) -> Self {
        match dimension_type {
            DimensionType::Int => Chunk::Int {
                values: Vec::with_capacity(capacity),
                validity: BitVec::with_capacity_bits(capacity),
            },
            DimensionType::Float | DimensionType::Ordinal => {
                Chunk::Float(Vec::with_capacity(capacity))
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Chunk::Float(values) => values.len(),
            Chunk::Int { values, .. } => values.len(),
        }
    }

    fn get(&self, idx: usize) -> f64 {
        match self {
            Chunk::Float(values) => values.get(idx).copied().unwrap_or(f64::NAN),
            Chunk::Int { values, validity } => match values.get(idx) {
                Some(v) if validity.get(idx) => *v as f64,
                _ => f64::NAN,
            },
        }
    }

    fn push(&mut self, value: f64) {
        match self {
            Chunk::Float(values) => values.push(value),
            Chunk::Int { values, validity } => {
                if value.is_nan() {
                    values.push(0);
                    validity.push(false);
                } else {
                    values.push(value as i64);
                    validity.push(true);
                }
            }
        }
    }

    fn set(&mut self, idx: usize, value: f64) {
        match self {
            Chunk::Float(values) => values[idx] = value,
            Chunk::Int { values, validity } => {
                if value.is_nan() {
                    values[idx] = 0;
                    validity.set(idx, false);
                } else {
                    values[idx] = value as i64;
                    validity.set(idx, true);
                }
            }
        }
    }
}

/// One logical column split into `chunk_size` segments.
///
/// Chunks are reference counted so that clones share storage until one side writes; a write
/// copies only the chunk it touches.
#[derive(Clone, Debug)]
pub(crate) struct ChunkedColumn {
    dimension_type: DimensionType,
    chunk_size: usize,
    chunks: Vec<Arc<Chunk>>,
    len: usize,
}

impl ChunkedColumn {
    pub fn new(dimension_type: DimensionType, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            dimension_type,
            chunk_size,
            chunks: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn locate(&self, raw_index: usize) -> (usize, usize) {
        (raw_index / self.chunk_size, raw_index % self.chunk_size)
    }

    pub fn push(&mut self, value: f64) {
        let value = coerce_number(value, self.dimension_type);
        if self.len % self.chunk_size == 0 {
            self.chunks.push(Arc::new(Chunk::with_capacity(
                self.dimension_type,
                self.chunk_size,
            )));
        }
        if let Some(last) = self.chunks.last_mut() {
            Arc::make_mut(last).push(value);
        }
        self.len += 1;
    }

    /// Stored value at `raw_index`, `NaN` when missing or past the end.
    pub fn get(&self, raw_index: usize) -> f64 {
        if raw_index >= self.len {
            return f64::NAN;
        }
        let (chunk_idx, in_chunk) = self.locate(raw_index);
        self.chunks[chunk_idx].get(in_chunk)
    }

    /// Overwrite an existing slot. Returns `false` if `raw_index` was never ingested.
    pub fn set(&mut self, raw_index: usize, value: f64) -> bool {
        if raw_index >= self.len {
            return false;
        }
        let value = coerce_number(value, self.dimension_type);
        let (chunk_idx, in_chunk) = self.locate(raw_index);
        let chunk = Arc::make_mut(&mut self.chunks[chunk_idx]);
        debug_assert!(in_chunk < chunk.len());
        chunk.set(in_chunk, value);
        true
    }
}

/// Category table of an ordinal dimension. Codes follow first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct OrdinalDictionary {
    categories: Vec<Arc<str>>,
    codes: HashMap<Arc<str>, u32>,
}

impl OrdinalDictionary {
    pub fn code_for(&mut self, text: &str) -> f64 {
        if let Some(code) = self.codes.get(text) {
            return *code as f64;
        }
        let code = self.categories.len() as u32;
        let text: Arc<str> = Arc::from(text);
        self.categories.push(text.clone());
        self.codes.insert(text, code);
        code as f64
    }

    pub fn category(&self, code: usize) -> Option<&str> {
        self.categories.get(code).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

/// Typed storage for every dimension of a dataset, addressed by raw index.
#[derive(Clone, Debug)]
pub(crate) struct ColumnStore {
    columns: Vec<ChunkedColumn>,
    dictionaries: Vec<Option<Arc<OrdinalDictionary>>>,
}

impl ColumnStore {
    pub fn new(schema: &Schema, chunk_size: usize) -> Self {
        let columns = schema
            .dimensions()
            .iter()
            .map(|dim| ChunkedColumn::new(dim.dimension_type, chunk_size))
            .collect();
        Self {
            columns,
            dictionaries: vec![None; schema.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, ChunkedColumn::len)
    }

    pub fn chunk_count(&self) -> usize {
        self.columns.first().map_or(0, ChunkedColumn::chunk_count)
    }

    pub fn append_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.columns.len(), "row length must match schema");
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(*value);
        }
    }

    pub fn get(&self, dim: usize, raw_index: usize) -> f64 {
        self.columns
            .get(dim)
            .map_or(f64::NAN, |column| column.get(raw_index))
    }

    pub fn set(&mut self, dim: usize, raw_index: usize, value: f64) -> bool {
        self.columns
            .get_mut(dim)
            .is_some_and(|column| column.set(raw_index, value))
    }

    pub fn set_dictionary(&mut self, dim: usize, dictionary: OrdinalDictionary) {
        if let Some(slot) = self.dictionaries.get_mut(dim) {
            *slot = Some(Arc::new(dictionary));
        }
    }

    pub fn dictionary(&self, dim: usize) -> Option<&OrdinalDictionary> {
        self.dictionaries.get(dim)?.as_deref()
    }
}
