//! Schema compilation: one buffer per scalar field, one carve per array field.

use super::columns::{ArrayField, Columns, Field, Group, ScalarField};
use crate::error::{StorageError, StorageResult};
use crate::memory::{check_column_len, Buffer, PoolSet};
use crate::schema::{join_path, Schema, SchemaNode};

impl Columns {
    /// Compiles `schema` at `capacity`.
    ///
    /// The census runs first so every pool is sized for the whole schema
    /// before the first window is carved.
    pub(crate) fn compile(schema: &Schema, capacity: usize) -> StorageResult<Self> {
        if schema.is_tag() {
            return Ok(Self::empty(capacity));
        }

        let mut buffers = Vec::new();
        let mut pools = PoolSet::new(schema.census(), capacity);
        let root = compile_group(schema, "", &mut buffers, &mut pools, capacity)?;

        if root.is_empty() {
            return Err(StorageError::EmptySchemaButNotTag);
        }

        Ok(Self {
            root,
            buffers,
            pools,
            capacity,
        })
    }
}

fn compile_group(
    schema: &Schema,
    prefix: &str,
    buffers: &mut Vec<Buffer>,
    pools: &mut PoolSet,
    capacity: usize,
) -> StorageResult<Group> {
    let mut group = Group::default();

    for (name, node) in schema.iter() {
        if name.is_empty() || name.contains('.') {
            return Err(StorageError::InvalidSchema(format!(
                "field name {name:?} under {prefix:?} must be non-empty and contain no '.'"
            )));
        }
        let path = join_path(prefix, name);

        let field = match node {
            SchemaNode::Scalar(ty) => {
                check_column_len(*ty, capacity)?;
                buffers.push(Buffer::zeroed(*ty, capacity));
                Field::Scalar(ScalarField {
                    ty: *ty,
                    buffer: buffers.len() - 1,
                })
            }
            SchemaNode::Array(ty, length) => {
                let carved = pools.carve(&path, *ty, *length)?;
                Field::Array(ArrayField {
                    ty: *ty,
                    length: *length,
                    windows: carved.windows,
                    parent: carved.parent,
                })
            }
            SchemaNode::Group(inner) => {
                Field::Group(compile_group(inner, &path, buffers, pools, capacity)?)
            }
        };

        group.fields.insert(name.to_string(), field);
    }

    Ok(group)
}
