//! # Store Verification Tests
//!
//! End-to-end checks of the storage engine through its public API:
//!
//! 1. **Layout**: buffer and pool sizes, window offsets
//! 2. **Growth**: data survives, new entities read zero
//! 3. **Reset & Shadow**: per-entity zeroing, snapshot independence
//! 4. **Registry**: handle lifecycle
//!
//! Run with: cargo test --test store_verification

use std::sync::Arc;

use tessera_core::{
    IndexWidth, PrimitiveType, Schema, StorageConfig, StorageError, Store, StoreRegistry,
};

fn body() -> Schema {
    Schema::new()
        .array("position", PrimitiveType::F32, 3)
        .scalar("health", PrimitiveType::U16)
}

fn nested() -> Schema {
    Schema::new()
        .scalar("health", PrimitiveType::U16)
        .array("position", PrimitiveType::F32, 3)
        .array("inventory", PrimitiveType::U8, 300)
        .group(
            "transform",
            Schema::new()
                .array("rotation", PrimitiveType::F32, 4)
                .scalar("parent", PrimitiveType::Eid)
                .array("children", PrimitiveType::Eid, 2),
        )
}

/// Distinct value per (field, entity) pair.
fn owner_tag(field: usize, eid: usize) -> f32 {
    f32::from(u16::try_from(field * 100 + eid).unwrap())
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn verify_end_to_end_layout_and_growth() {
    let mut registry = StoreRegistry::new();
    let handle = registry.compile(&body(), 4).unwrap();
    let shared = registry.get(handle).unwrap();

    {
        let mut store = shared.write();
        assert_eq!(store.scalar::<u16>("health").unwrap().len(), 4);
        assert_eq!(store.pool(PrimitiveType::F32).unwrap().len(), 12);

        let window = store.window("position", 2).unwrap();
        assert_eq!((window.from(), window.to()), (6, 9));

        store
            .array_mut::<f32>("position")
            .unwrap()
            .get_mut(2)
            .unwrap()
            .copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(&store.parent_slice::<f32>("position").unwrap()[6..9], &[1.0, 2.0, 3.0]);
    }

    registry.grow_to(handle, 8).unwrap();

    let store = shared.read();
    assert_eq!(store.capacity(), 8);
    assert_eq!(store.scalar::<u16>("health").unwrap().len(), 8);
    assert_eq!(store.pool(PrimitiveType::F32).unwrap().len(), 24);

    let window = store.window("position", 2).unwrap();
    let pool = store.pool(PrimitiveType::F32).unwrap().buffer().as_slice::<f32>().unwrap();
    assert_eq!(&pool[window.range()], &[1.0, 2.0, 3.0]);
    assert_eq!(store.array::<f32>("position").unwrap().get(2).unwrap(), &[1.0, 2.0, 3.0]);
}

#[test]
fn verify_scalar_fields_start_zeroed() {
    let store = Store::compile(&nested(), 5).unwrap();

    assert_eq!(store.scalar::<u16>("health").unwrap(), &[0; 5]);
    assert_eq!(store.scalar::<u32>("transform.parent").unwrap(), &[0; 5]);
    assert!(store.flat_buffers().all(|b| b.as_bytes().iter().all(|&byte| byte == 0)));
}

#[test]
fn verify_pool_sizes_sum_every_field() {
    let store = Store::compile(&nested(), 5).unwrap();

    // f32: (3 + 4) * 5 = 35 -> 36
    assert_eq!(store.pool(PrimitiveType::F32).unwrap().len(), 36);
    // eid: 2 * 5 = 10 -> 12
    assert_eq!(store.pool(PrimitiveType::Eid).unwrap().len(), 12);
    // u8: 300 * 5 = 1500
    assert_eq!(store.pool(PrimitiveType::U8).unwrap().len(), 1500);

    assert_eq!(store.array_field_count(PrimitiveType::F32), 2);
    assert_eq!(store.cursor(PrimitiveType::F32), 35);
    assert!(store.pool(PrimitiveType::U16).is_none());

    // 2 scalar columns, 3 pools
    assert_eq!(store.flat_buffers().count(), 5);
}

#[test]
fn verify_window_metadata() {
    let store = Store::compile(&nested(), 2).unwrap();

    let inventory = store.field("inventory").unwrap().as_array().unwrap();
    assert_eq!(inventory.length(), 300);
    assert_eq!(inventory.index_width(), IndexWidth::U16);
    assert_eq!(inventory.parent_range(), 0..600);
    assert_eq!(store.pool(PrimitiveType::U8).unwrap().index_width(), IndexWidth::U16);

    let children = store.field("transform.children").unwrap();
    assert!(children.is_entity_ref());
    assert_eq!(children.as_array().unwrap().index_width(), IndexWidth::U8);
    assert!(store.field("transform.parent").unwrap().is_entity_ref());
    assert!(!store.field("health").unwrap().is_entity_ref());
    assert_eq!(store.field("transform").unwrap().kind(), "group");
}

#[test]
fn verify_windows_never_alias() {
    let mut store = Store::compile(&nested(), 6).unwrap();

    // Tag every element with its owner: field id * 100 + eid
    for (id, path) in ["position", "transform.rotation"].into_iter().enumerate() {
        let mut view = store.array_mut::<f32>(path).unwrap();
        for eid in 0..6 {
            view.get_mut(eid).unwrap().fill(owner_tag(id, eid));
        }
    }

    for (id, path) in ["position", "transform.rotation"].into_iter().enumerate() {
        let view = store.array::<f32>(path).unwrap();
        for eid in 0..6 {
            let expected = owner_tag(id, eid);
            assert!(view.get(eid).unwrap().iter().all(|&v| v == expected));
        }
    }
}

#[test]
fn verify_clamped_bytes() {
    let schema = Schema::new().scalar("alpha", PrimitiveType::U8Clamped);
    let mut store = Store::compile(&schema, 3).unwrap();

    let alpha = store.scalar_mut::<u8>("alpha").unwrap();
    alpha[0] = PrimitiveType::clamp_u8(-20.0);
    alpha[1] = PrimitiveType::clamp_u8(127.5);
    alpha[2] = PrimitiveType::clamp_u8(999.0);

    assert_eq!(store.scalar::<u8>("alpha").unwrap(), &[0, 128, 255]);
    assert_eq!(store.field("alpha").unwrap().primitive_type(), Some(PrimitiveType::U8Clamped));
}

// ============================================================================
// GROWTH
// ============================================================================

#[test]
fn verify_growth_preserves_every_field() {
    let mut store = Store::compile(&nested(), 3).unwrap();

    for eid in 0..3 {
        let v = u16::try_from(eid + 1).unwrap();
        store.scalar_mut::<u16>("health").unwrap()[eid] = v * 10;
        store.scalar_mut::<u32>("transform.parent").unwrap()[eid] = u32::from(v);
        store.array_mut::<f32>("position").unwrap().get_mut(eid).unwrap().fill(f32::from(v));
        store
            .array_mut::<f32>("transform.rotation")
            .unwrap()
            .get_mut(eid)
            .unwrap()
            .fill(-f32::from(v));
        store.array_mut::<u32>("transform.children").unwrap().get_mut(eid).unwrap().fill(u32::from(v) + 7);
        store.array_mut::<u8>("inventory").unwrap().get_mut(eid).unwrap()[299] = u8::try_from(v).unwrap();
    }

    store.grow(7).unwrap();

    for eid in 0..7 {
        let v = if eid < 3 { u16::try_from(eid + 1).unwrap() } else { 0 };
        let children = if eid < 3 { u32::from(v) + 7 } else { 0 };

        assert_eq!(store.scalar::<u16>("health").unwrap()[eid], v * 10);
        assert_eq!(store.scalar::<u32>("transform.parent").unwrap()[eid], u32::from(v));
        assert!(store.array::<f32>("position").unwrap().get(eid).unwrap().iter().all(|&x| x == f32::from(v)));
        assert!(store
            .array::<f32>("transform.rotation")
            .unwrap()
            .get(eid)
            .unwrap()
            .iter()
            .all(|&x| x == -f32::from(v)));
        assert_eq!(store.array::<u32>("transform.children").unwrap().get(eid).unwrap(), &[children; 2]);
        assert_eq!(
            store.array::<u8>("inventory").unwrap().get(eid).unwrap()[299],
            u8::try_from(v).unwrap()
        );
    }
}

#[test]
fn verify_growth_recomputes_offsets() {
    let mut store = Store::compile(&nested(), 2).unwrap();
    assert_eq!(store.window("transform.rotation", 1).unwrap().range(), 10..14);

    store.grow(4).unwrap();

    // position (3 * 4 = 12) is carved before transform.rotation
    assert_eq!(store.window("transform.rotation", 1).unwrap().range(), 16..20);
    assert_eq!(store.cursor(PrimitiveType::F32), 28);
}

#[test]
fn verify_failed_growth_leaves_store_intact() {
    let mut store = Store::compile(&body(), 4).unwrap();
    store.scalar_mut::<u16>("health").unwrap()[3] = 33;

    assert!(matches!(store.grow(3), Err(StorageError::CapacityViolation { .. })));
    assert_eq!(store.capacity(), 4);
    assert_eq!(store.scalar::<u16>("health").unwrap()[3], 33);
}

// ============================================================================
// RESET & SHADOW
// ============================================================================

#[test]
fn verify_reset_entity_zeroes_exactly_one_entity() {
    let mut store = Store::compile(&nested(), 4).unwrap();
    for buffer_path in ["position", "transform.rotation"] {
        store.array_mut::<f32>(buffer_path).unwrap().parent_mut().fill(5.0);
    }
    store.scalar_mut::<u16>("health").unwrap().fill(5);
    store.array_mut::<u8>("inventory").unwrap().parent_mut().fill(5);

    store.reset_entity(2).unwrap();

    for eid in 0..4 {
        let expected = if eid == 2 { 0 } else { 5 };
        assert_eq!(store.scalar::<u16>("health").unwrap()[eid], expected);
        assert!(store
            .array::<u8>("inventory")
            .unwrap()
            .get(eid)
            .unwrap()
            .iter()
            .all(|&x| x == u8::try_from(expected).unwrap()));
        for path in ["position", "transform.rotation"] {
            assert!(store
                .array::<f32>(path)
                .unwrap()
                .get(eid)
                .unwrap()
                .iter()
                .all(|&x| x == f32::from(expected)));
        }
    }
}

#[test]
fn verify_reset_all() {
    let mut registry = StoreRegistry::new();
    let handle = registry.compile(&nested(), 3).unwrap();
    {
        let shared = registry.get(handle).unwrap();
        let mut store = shared.write();
        store.scalar_mut::<u16>("health").unwrap().fill(1);
        store.array_mut::<u32>("transform.children").unwrap().parent_mut().fill(1);
    }

    registry.reset_all(handle).unwrap();

    let shared = registry.get(handle).unwrap();
    let store = shared.read();
    assert!(store.flat_buffers().all(|b| b.as_bytes().iter().all(|&byte| byte == 0)));
}

#[test]
fn verify_snapshot_is_independent() {
    let mut registry = StoreRegistry::new();
    let handle = registry.compile(&body(), 2).unwrap();
    let shared = registry.get(handle).unwrap();

    shared.write().scalar_mut::<u16>("health").unwrap()[1] = 50;
    let shadow = registry.snapshot(handle, "frame").unwrap();

    shared.write().scalar_mut::<u16>("health").unwrap()[1] = 75;
    registry.grow_to(handle, 4).unwrap();

    assert_eq!(shadow.scalar::<u16>("health").unwrap(), &[0, 50]);
    assert_eq!(shadow.capacity(), 2);
    assert_eq!(shared.read().scalar::<u16>("health").unwrap(), &[0, 75, 0, 0]);
    assert!(Arc::ptr_eq(&shadow, &shared.read().shadow_of("frame").unwrap()));
}

// ============================================================================
// TAG STORES
// ============================================================================

#[test]
fn verify_tag_store_is_inert() {
    let mut registry = StoreRegistry::new();
    let handle = registry.compile(&Schema::tag(), 16).unwrap();

    registry.grow_to(handle, 64).unwrap();
    registry.reset_all(handle).unwrap();
    registry.reset_entity(handle, 10_000).unwrap();

    let shared = registry.get(handle).unwrap();
    let store = shared.read();
    assert!(store.is_tag());
    assert_eq!(store.capacity(), 16);
    assert_eq!(store.flat_buffers().count(), 0);
    assert!(store.fields().is_empty());
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn verify_disjoint_entities_write_in_parallel() {
    let mut store = Store::compile(&body(), 64).unwrap();

    {
        let mut position = store.array_mut::<f32>("position").unwrap();
        std::thread::scope(|s| {
            for (eid, entity) in position.entities_mut().enumerate() {
                s.spawn(move || entity.fill(owner_tag(0, eid)));
            }
        });
    }

    {
        let health = store.scalar_mut::<u16>("health").unwrap();
        let (low, high) = health.split_at_mut(32);
        std::thread::scope(|s| {
            s.spawn(|| low.fill(1));
            s.spawn(|| high.fill(2));
        });
    }

    let position = store.array::<f32>("position").unwrap();
    for eid in 0..64 {
        let expected = owner_tag(0, eid);
        assert_eq!(position.get(eid).unwrap(), &[expected; 3]);
    }
    let health = store.scalar::<u16>("health").unwrap();
    assert!(health[..32].iter().all(|&h| h == 1));
    assert!(health[32..].iter().all(|&h| h == 2));
}

#[test]
fn verify_registry_shares_stores_across_threads() {
    let mut registry = StoreRegistry::new();
    let handle = registry.compile(&body(), 8).unwrap();
    let shared = registry.get(handle).unwrap();

    std::thread::scope(|s| {
        for eid in 0..8 {
            let shared = Arc::clone(&shared);
            s.spawn(move || {
                shared.write().scalar_mut::<u16>("health").unwrap()[eid] = u16::try_from(eid).unwrap();
            });
        }
    });

    assert_eq!(shared.read().scalar::<u16>("health").unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7]);
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
fn verify_released_handle_is_invalid() {
    let mut registry = StoreRegistry::new();
    let handle = registry.compile(&body(), 2).unwrap();

    let released = registry.release(handle).unwrap();
    assert_eq!(released.read().handle(), handle);

    for result in [
        registry.grow_to(handle, 4),
        registry.reset_all(handle),
        registry.reset_entity(handle, 0),
        registry.snapshot(handle, "late").map(|_| ()),
    ] {
        assert_eq!(result.unwrap_err(), StorageError::InvalidHandle(handle));
    }

    // The caller still owns the released store
    released.write().grow(4).unwrap();
    assert_eq!(released.read().capacity(), 4);
}

#[test]
fn verify_config_driven_registry() {
    let config = StorageConfig::from_toml(
        r"
        [storage]
        default_capacity = 32
        max_capacity = 128
        warn_capacity = 64
        ",
    )
    .unwrap();
    let mut registry = StoreRegistry::with_config(config).unwrap();

    let handle = registry.compile_default(&body()).unwrap();
    assert_eq!(registry.get(handle).unwrap().read().capacity(), 32);

    // Above the soft ceiling: warns, still grows
    registry.grow_to(handle, 100).unwrap();
    assert_eq!(registry.get(handle).unwrap().read().capacity(), 100);

    assert!(matches!(
        registry.grow_to(handle, 129),
        Err(StorageError::CapacityViolation { current: 128, requested: 129 })
    ));
}

#[test]
fn verify_schema_from_toml_compiles() {
    let schema = Schema::from_toml(
        r#"
        health = "ui16"
        position = ["f32", 3]

        [transform]
        parent = "eid"
        "#,
    )
    .unwrap();
    let store = Store::compile(&schema, 4).unwrap();

    assert_eq!(store.schema(), &schema);
    assert_eq!(store.window("position", 3).unwrap().range(), 9..12);
    assert!(store.field("transform.parent").unwrap().is_entity_ref());
    assert_eq!(
        store.field("transform.missing").unwrap_err(),
        StorageError::FieldNotFound("transform.missing".to_string())
    );
}
