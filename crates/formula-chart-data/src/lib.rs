//! Columnar datasets backing chart series.
//!
//! A [`Dataset`] ingests raw series data (scalars, rows, `{value, ...}` records, or any
//! [`DataProvider`]) into typed, chunked columns, one per dimension. It keeps:
//! - a stable raw index per item, with the raw payload retrievable verbatim
//! - an active view narrowed in place by filtering, addressed by active index
//! - per-item overlay fields from record input ([`ItemModel`])
//! - cached extents and nearest-value search for axis and tooltip lookups

#![forbid(unsafe_code)]

mod bitmap;
mod coerce;
mod column;
mod dataset;
mod dimension;
mod error;
mod extent;
mod index_map;
mod item;
mod nearest;
mod provider;

pub use crate::dataset::{Dataset, DatasetOptions, MapOutput};
pub use crate::dimension::{Dimension, DimensionDef, DimensionType, Schema};
pub use crate::error::{ListError, ListResult};
pub use crate::extent::Extent;
pub use crate::item::{ItemModel, OptionMap, OptionSource};
pub use crate::nearest::NearestTies;
pub use crate::provider::{
    ArrayProvider, DataProvider, InterleavedProvider, Source, SourceFormat,
};
