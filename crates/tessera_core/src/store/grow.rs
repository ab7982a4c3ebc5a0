//! Capacity growth.
//!
//! Growth never touches the live buffer set. A complete replacement is
//! staged here and the store swaps it in only if staging succeeded.

use super::columns::{ArrayField, Columns, Field, Group};
use crate::error::StorageResult;
use crate::memory::{check_column_len, PoolSet};
use crate::schema::join_path;

impl Columns {
    /// Stages a copy of this buffer set at `new_capacity`.
    ///
    /// Scalar columns keep their prefix. Pools are re-sized from the same
    /// census and every array field is re-carved in compile order; each
    /// field's old parent range lands at the start of its new one. The
    /// stride per entity is the field length in both layouts, so every
    /// entity keeps its elements.
    ///
    /// The caller guarantees `new_capacity >= self.capacity()`.
    pub(crate) fn grown(&self, new_capacity: usize) -> StorageResult<Self> {
        for buffer in &self.buffers {
            check_column_len(buffer.primitive_type(), new_capacity)?;
        }

        let buffers = self
            .buffers
            .iter()
            .map(|buffer| buffer.resized(new_capacity))
            .collect();

        let mut pools = PoolSet::new(self.pools.census().clone(), new_capacity);
        let root = regrow_group(&self.root, "", &self.pools, &mut pools)?;

        Ok(Self {
            root,
            buffers,
            pools,
            capacity: new_capacity,
        })
    }
}

fn regrow_group(old: &Group, prefix: &str, old_pools: &PoolSet, pools: &mut PoolSet) -> StorageResult<Group> {
    let mut group = Group::default();

    for (name, field) in &old.fields {
        let path = join_path(prefix, name);
        let field = match field {
            Field::Scalar(scalar) => Field::Scalar(*scalar),
            Field::Array(array) => {
                let carved = pools.carve(&path, array.ty, array.length)?;
                if let (Some(src), Some(dst)) = (old_pools.pool(array.ty), pools.pool_mut(array.ty)) {
                    dst.buffer_mut()
                        .copy_from(src.buffer(), array.parent_range(), carved.parent.start)?;
                }
                Field::Array(ArrayField {
                    ty: array.ty,
                    length: array.length,
                    windows: carved.windows,
                    parent: carved.parent,
                })
            }
            Field::Group(inner) => Field::Group(regrow_group(inner, &path, old_pools, pools)?),
        };
        group.fields.insert(name.clone(), field);
    }

    Ok(group)
}
