//! # Component Schemas
//!
//! A schema is a tree of named fields. Leaves are primitive types (scalar
//! fields) or `(type, length)` pairs (fixed-length array fields); inner
//! nodes are nested groups. A schema with no fields describes a tag
//! component.
//!
//! Schemas are built with the builder methods or parsed from TOML:
//!
//! ```toml
//! health = "u16"
//! position = ["f32", 3]
//!
//! [transform]
//! rotation = ["f32", 4]
//! parent = "eid"
//! ```
//!
//! Fields within a group are kept in name order, which is also the order
//! the compiler carves array fields in.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tessera_shared::PrimitiveType;

use crate::error::{StorageError, StorageResult};

/// One node of a schema tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaNode {
    /// One element per entity.
    Scalar(PrimitiveType),
    /// A fixed number of elements per entity.
    Array(PrimitiveType, usize),
    /// A nested group of fields.
    Group(Schema),
}

impl SchemaNode {
    /// Short name of the node kind, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Array(..) => "array",
            Self::Group(_) => "group",
        }
    }
}

/// Declarative description of a component's fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    /// Fields by name.
    fields: BTreeMap<String, SchemaNode>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tag schema (no fields).
    #[must_use]
    pub fn tag() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any field of the same name.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    /// Adds a scalar field.
    #[must_use]
    pub fn scalar(self, name: impl Into<String>, ty: PrimitiveType) -> Self {
        self.with_field(name, SchemaNode::Scalar(ty))
    }

    /// Adds a fixed-length array field.
    #[must_use]
    pub fn array(self, name: impl Into<String>, ty: PrimitiveType, length: usize) -> Self {
        self.with_field(name, SchemaNode::Array(ty, length))
    }

    /// Adds a nested group.
    #[must_use]
    pub fn group(self, name: impl Into<String>, group: Schema) -> Self {
        self.with_field(name, SchemaNode::Group(group))
    }

    /// Returns true if this schema describes a tag component.
    #[inline]
    #[must_use]
    pub fn is_tag(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of top-level fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no top-level fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a top-level field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    /// Iterates top-level fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Counts array fields per primitive type across the whole tree.
    ///
    /// Pools are sized from this before any of them is allocated.
    #[must_use]
    pub fn census(&self) -> ArrayCensus {
        let mut census = ArrayCensus::default();
        self.collect_census(&mut census);
        census
    }

    fn collect_census(&self, census: &mut ArrayCensus) {
        for node in self.fields.values() {
            match node {
                SchemaNode::Scalar(_) => {}
                SchemaNode::Array(ty, length) => census.record(*ty, *length),
                SchemaNode::Group(group) => group.collect_census(census),
            }
        }
    }

    /// Parses a schema from a TOML document.
    ///
    /// # Errors
    ///
    /// - `InvalidSchema` if the document is not TOML or has a malformed leaf
    /// - `UnknownPrimitiveType` if a leaf names a type outside the table
    /// - `InvalidFieldLength` if an array leaf has no length
    pub fn from_toml(source: &str) -> StorageResult<Self> {
        let table: toml::Table = source
            .parse()
            .map_err(|e: toml::de::Error| StorageError::InvalidSchema(e.message().to_string()))?;
        Self::from_table(&table, "")
    }

    fn from_table(table: &toml::Table, prefix: &str) -> StorageResult<Self> {
        let mut schema = Self::new();
        for (name, value) in table {
            let path = join_path(prefix, name);
            let node = match value {
                toml::Value::String(tag) => SchemaNode::Scalar(parse_tag(tag)?),
                toml::Value::Array(pair) => parse_array(pair, &path)?,
                toml::Value::Table(group) => SchemaNode::Group(Self::from_table(group, &path)?),
                other => {
                    return Err(StorageError::InvalidSchema(format!(
                        "field {path}: expected a type tag, [type, length] or a table, got {}",
                        other.type_str()
                    )))
                }
            };
            schema.fields.insert(name.clone(), node);
        }
        Ok(schema)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let table = toml::Table::deserialize(deserializer)?;
        Self::from_table(&table, "").map_err(serde::de::Error::custom)
    }
}

/// Joins a group path and a field name with `.`.
pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn parse_tag(tag: &str) -> StorageResult<PrimitiveType> {
    PrimitiveType::from_name(tag).ok_or_else(|| StorageError::UnknownPrimitiveType(tag.to_string()))
}

fn parse_array(pair: &[toml::Value], path: &str) -> StorageResult<SchemaNode> {
    let Some(toml::Value::String(tag)) = pair.first() else {
        return Err(StorageError::InvalidSchema(format!(
            "field {path}: array fields are written [type, length]"
        )));
    };
    let ty = parse_tag(tag)?;

    match pair.get(1) {
        None => Err(StorageError::InvalidFieldLength {
            field: path.to_string(),
            length: 0,
        }),
        Some(toml::Value::Integer(length)) if pair.len() == 2 => {
            let length = usize::try_from(*length).map_err(|_| {
                StorageError::InvalidSchema(format!("field {path}: negative length {length}"))
            })?;
            Ok(SchemaNode::Array(ty, length))
        }
        Some(_) => Err(StorageError::InvalidSchema(format!(
            "field {path}: array fields are written [type, length]"
        ))),
    }
}

/// Array field totals for one primitive type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CensusEntry {
    /// Number of distinct array fields of the type.
    pub fields: usize,
    /// Sum of their declared lengths: pool elements needed per entity.
    pub summed_length: usize,
}

/// Array field totals per primitive type, gathered before any pool exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayCensus {
    entries: BTreeMap<PrimitiveType, CensusEntry>,
}

impl ArrayCensus {
    /// Records one array field.
    pub fn record(&mut self, ty: PrimitiveType, length: usize) {
        let entry = self.entries.entry(ty).or_default();
        entry.fields += 1;
        // Saturates; pool sizing rejects the result.
        entry.summed_length = entry.summed_length.saturating_add(length);
    }

    /// Number of array fields of `ty`.
    #[must_use]
    pub fn field_count(&self, ty: PrimitiveType) -> usize {
        self.entries.get(&ty).map_or(0, |e| e.fields)
    }

    /// Pool elements needed per entity for `ty`.
    #[must_use]
    pub fn summed_length(&self, ty: PrimitiveType) -> usize {
        self.entries.get(&ty).map_or(0, |e| e.summed_length)
    }

    /// Iterates types that have at least one array field.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveType, CensusEntry)> + '_ {
        self.entries.iter().map(|(ty, entry)| (*ty, *entry))
    }

    /// Returns true if the schema has no array fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
