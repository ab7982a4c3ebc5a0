//! Bulk and per-entity zeroing.

use super::columns::{Columns, Field, Group};
use crate::error::{StorageError, StorageResult};
use crate::memory::PoolSet;

impl Columns {
    /// Zeroes every scalar column and every pool.
    pub(crate) fn reset_all(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill_zero();
        }
        self.pools.fill_zero();
    }

    /// Zeroes entity `eid` in every scalar column and every array window.
    pub(crate) fn reset_entity(&mut self, eid: usize) -> StorageResult<()> {
        if eid >= self.capacity {
            return Err(StorageError::EntityOutOfBounds {
                eid,
                capacity: self.capacity,
            });
        }

        for buffer in &mut self.buffers {
            buffer.zero_range(eid..eid + 1);
        }
        zero_windows(&self.root, &mut self.pools, eid);
        Ok(())
    }
}

fn zero_windows(group: &Group, pools: &mut PoolSet, eid: usize) {
    for field in group.fields.values() {
        match field {
            Field::Scalar(_) => {}
            Field::Array(array) => {
                if let (Some(window), Some(pool)) = (array.window(eid), pools.pool_mut(array.ty)) {
                    pool.buffer_mut().zero_range(window.range());
                }
            }
            Field::Group(inner) => zero_windows(inner, pools, eid),
        }
    }
}
