use crate::error::{ListError, ListResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage type of a dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    #[default]
    Float,
    Int,
    /// Categorical values. Numbers are stored as-is, strings are dictionary encoded.
    #[serde(alias = "raw")]
    Ordinal,
}

/// A dimension as declared by the caller, before it is assigned a column index.
///
/// Deserializes from either a bare name (`"x"`, typed as float) or a record
/// (`{"name": "x", "type": "int"}`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DimensionDefRepr")]
pub struct DimensionDef {
    pub name: String,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionDefRepr {
    Name(String),
    Typed {
        name: String,
        #[serde(rename = "type", default)]
        dimension_type: DimensionType,
    },
}

impl From<DimensionDefRepr> for DimensionDef {
    fn from(repr: DimensionDefRepr) -> Self {
        match repr {
            DimensionDefRepr::Name(name) => DimensionDef::new(name, DimensionType::Float),
            DimensionDefRepr::Typed {
                name,
                dimension_type,
            } => DimensionDef::new(name, dimension_type),
        }
    }
}

impl DimensionDef {
    pub fn new(name: impl Into<String>, dimension_type: DimensionType) -> Self {
        Self {
            name: name.into(),
            dimension_type,
        }
    }
}

impl From<&str> for DimensionDef {
    fn from(name: &str) -> Self {
        DimensionDef::new(name, DimensionType::Float)
    }
}

impl From<String> for DimensionDef {
    fn from(name: String) -> Self {
        DimensionDef::new(name, DimensionType::Float)
    }
}

impl From<(&str, DimensionType)> for DimensionDef {
    fn from((name, dimension_type): (&str, DimensionType)) -> Self {
        DimensionDef::new(name, dimension_type)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub dimension_type: DimensionType,
    /// Column position within the schema.
    pub index: usize,
}

/// Ordered, immutable set of dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    dimensions: Vec<Dimension>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn new<I, D>(defs: I) -> ListResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<DimensionDef>,
    {
        let mut dimensions = Vec::new();
        let mut by_name = HashMap::new();
        for (index, def) in defs.into_iter().map(Into::into).enumerate() {
            if by_name.insert(def.name.clone(), index).is_some() {
                return Err(ListError::DuplicateDimension(def.name));
            }
            dimensions.push(Dimension {
                name: def.name,
                dimension_type: def.dimension_type,
                index,
            });
        }

        if dimensions.is_empty() {
            return Err(ListError::EmptySchema);
        }

        Ok(Self {
            dimensions,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.index_of(name).map(|idx| &self.dimensions[idx])
    }

    pub(crate) fn resolve(&self, name: &str) -> ListResult<usize> {
        self.index_of(name)
            .ok_or_else(|| ListError::UnknownDimension(name.to_string()))
    }

    pub(crate) fn resolve_all(&self, names: &[&str]) -> ListResult<Vec<usize>> {
        names.iter().map(|name| self.resolve(name)).collect()
    }
}
