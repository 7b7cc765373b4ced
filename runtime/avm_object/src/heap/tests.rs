#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{constant_getter, heap, hierarchy, int, int_value, name, native, put};
use crate::ObjectErrorKind;

#[test]
fn test_heap_is_sync() {
    fn assert_sync<T: Sync + Send>() {}
    assert_sync::<ObjectHeap>();
}

#[test]
fn test_alloc_starts_at_one() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    assert_eq!(heap.ref_count(obj).unwrap(), 1);
    assert!(heap.is_live(obj));
    assert_eq!(heap.tag(obj).unwrap(), ObjectTag::Object);
}

#[test]
fn test_inc_dec_pair_keeps_object() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    heap.inc_ref(obj).unwrap();
    heap.dec_ref(obj).unwrap();
    assert_eq!(heap.ref_count(obj).unwrap(), 1);
    assert_eq!(heap.stats().destroyed, 0);
}

#[test]
fn test_last_release_destroys() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    heap.dec_ref(obj).unwrap();
    assert!(!heap.is_live(obj));

    let err = heap.inc_ref(obj).unwrap_err();
    assert_eq!(err.kind, ObjectErrorKind::DanglingObject { index: obj.index() });
    assert!(err.is_fatal());
}

#[test]
fn test_reused_cell_gets_new_generation() {
    let mut heap = heap();
    let first = heap.alloc(ObjectKind::Object);
    heap.dec_ref(first).unwrap();
    let second = heap.alloc(ObjectKind::Null);
    assert_eq!(first.index(), second.index());
    assert_ne!(first, second);
    assert!(heap.is_live(second));
    assert!(!heap.is_live(first));
}

#[test]
fn test_fake_dec_ref_never_destroys() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    heap.fake_dec_ref(obj).unwrap();
    assert_eq!(heap.ref_count(obj).unwrap(), 0);
    assert!(heap.is_live(obj));

    let err = heap.fake_dec_ref(obj).unwrap_err();
    assert_eq!(err.kind, ObjectErrorKind::RefCountUnderflow { index: obj.index() });
    assert!(heap.dec_ref(obj).unwrap_err().is_fatal());
}

#[test]
fn test_destruction_releases_members() {
    let mut heap = heap();
    let owner = heap.alloc(ObjectKind::Object);
    let member = int(&mut heap, 3);
    heap.inc_ref(member).unwrap();
    put(&mut heap, owner, "m", member);
    assert_eq!(heap.ref_count(member).unwrap(), 2);

    heap.dec_ref(owner).unwrap();
    assert_eq!(heap.ref_count(member).unwrap(), 1);
    heap.dec_ref(member).unwrap();
    assert_eq!(heap.stats().live_objects, 0);
}

#[test]
fn test_long_ownership_chain_releases_iteratively() {
    let mut heap = heap();
    let head = heap.alloc(ObjectKind::Object);
    let mut tail = head;
    for _ in 0..50_000 {
        let next = heap.alloc(ObjectKind::Object);
        put(&mut heap, tail, "next", next);
        tail = next;
    }
    heap.dec_ref(head).unwrap();
    assert_eq!(heap.stats().live_objects, 0);
    assert_eq!(heap.stats().destroyed, 50_001);
}

#[test]
fn test_deferred_release_from_threads() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);

    std::thread::scope(|scope| {
        let shared = &heap;
        for _ in 0..4 {
            scope.spawn(move || {
                for _ in 0..1_000 {
                    shared.inc_ref(obj).unwrap();
                }
                for _ in 0..1_000 {
                    shared.release_deferred(obj).unwrap();
                }
            });
        }
    });
    assert_eq!(heap.ref_count(obj).unwrap(), 1);

    heap.release_deferred(obj).unwrap();
    assert!(heap.is_live(obj));
    assert_eq!(heap.reclaim_deferred().unwrap(), 1);
    assert!(!heap.is_live(obj));
    assert_eq!(heap.reclaim_deferred().unwrap(), 0);
}

#[test]
fn test_pool_retains_fifteen() {
    let mut heap = heap();
    let pool = heap.create_manager(ObjectTag::Integer);
    let objects: Vec<ObjectId> = (0..16)
        .map(|i| heap.pool_get(pool, i).unwrap())
        .collect();
    for obj in &objects {
        heap.dec_ref(*obj).unwrap();
    }

    let stats = heap.stats();
    assert_eq!(stats.pooled_objects, 15);
    assert_eq!(stats.destroyed, 1);
    assert!(objects.iter().all(|obj| !heap.is_live(*obj)));

    let recycled = heap.pool_get(pool, 99).unwrap();
    assert!(objects.contains(&recycled));
    assert_eq!(int_value(&heap, recycled), 99);
    assert_eq!(heap.ref_count(recycled).unwrap(), 1);
    assert_eq!(heap.stats().recycled, 1);
}

#[test]
fn test_pool_type_must_match() {
    let mut heap = heap();
    let pool = heap.create_manager(ObjectTag::Number);
    let err = heap.pool_get(pool, 1_i32).unwrap_err();
    assert!(err.is_fatal());
    assert!(heap.pool_get(pool, 1.5_f64).is_ok());
}

#[test]
fn test_pooled_object_drops_its_members() {
    let mut heap = heap();
    let pool = heap.create_manager(ObjectTag::Boolean);
    let flag = heap.pool_get(pool, true).unwrap();
    let member = int(&mut heap, 1);
    put(&mut heap, flag, "tag", member);
    heap.dec_ref(flag).unwrap();

    assert!(!heap.is_live(member));
    let again = heap.pool_get(pool, false).unwrap();
    assert_eq!(again, flag);
    assert_eq!(heap.object(again).unwrap().variables().len(), 0);
}

#[test]
fn test_class_levels() {
    let mut heap = heap();
    let classes = hierarchy(&mut heap, 3);
    let levels: Vec<u32> = classes
        .iter()
        .map(|class| heap.class_info(*class).unwrap().max_level)
        .collect();
    assert_eq!(levels, vec![0, 1, 2]);
    // Each subclass owns its parent
    assert_eq!(heap.ref_count(classes[0]).unwrap(), 2);
    assert_eq!(heap.ref_count(classes[2]).unwrap(), 1);
}

#[test]
fn test_instance_level_handling() {
    let mut heap = heap();
    let classes = hierarchy(&mut heap, 3);
    let obj = heap.alloc_instance(classes[2]).unwrap();
    assert_eq!(heap.level(obj).unwrap(), 2);
    assert_eq!(heap.max_level(obj).unwrap(), 2);
    assert_eq!(heap.object(obj).unwrap().prototype(), Some(classes[2]));

    heap.dec_level(obj).unwrap();
    assert_eq!(heap.level(obj).unwrap(), 1);
    assert_eq!(heap.actual_prototype(obj).unwrap(), Some(classes[1]));

    let err = heap.set_level(obj, 3).unwrap_err();
    assert_eq!(
        err.kind,
        ObjectErrorKind::LevelOutOfRange {
            level: 3,
            max_level: 2
        }
    );

    heap.set_level(obj, 0).unwrap();
    assert!(heap.dec_level(obj).unwrap_err().is_fatal());
    heap.reset_level(obj).unwrap();
    assert_eq!(heap.level(obj).unwrap(), 2);
    assert_eq!(heap.actual_prototype(obj).unwrap(), Some(classes[2]));
}

#[test]
fn test_instances_release_their_class() {
    let mut heap = heap();
    let classes = hierarchy(&mut heap, 2);
    let obj = heap.alloc_instance(classes[1]).unwrap();
    for class in classes.iter().rev() {
        heap.dec_ref(*class).unwrap();
    }
    assert!(heap.is_live(classes[0]));
    heap.dec_ref(obj).unwrap();
    assert_eq!(heap.stats().live_objects, 0);
}

#[test]
fn test_alloc_instance_requires_class() {
    let mut heap = heap();
    let plain = heap.alloc(ObjectKind::Object);
    let err = heap.alloc_instance(plain).unwrap_err();
    assert!(!err.is_fatal());
}

#[test]
fn test_override_chain() {
    let mut heap = heap();
    let base = constant_getter(&mut heap, 1);
    let middle = constant_getter(&mut heap, 2);
    let derived = constant_getter(&mut heap, 3);
    heap.set_override(base, middle).unwrap();
    heap.set_override(middle, derived).unwrap();
    assert_eq!(heap.resolve_override(base).unwrap(), derived);
    assert_eq!(heap.resolve_override(derived).unwrap(), derived);

    let err = heap.set_override(derived, base).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_call_function() {
    let mut heap = heap();
    let this = heap.alloc(ObjectKind::Object);
    let add = name(&heap, "add");
    let function = heap.new_function(
        add,
        native(|heap, _, args, _| {
            let sum = args
                .iter()
                .map(|arg| heap.to_int(*arg))
                .sum::<ObjectResult<i32>>()?;
            Ok(Some(heap.alloc(ObjectKind::Integer(sum))))
        }),
    );
    let (a, b) = (int(&mut heap, 2), int(&mut heap, 5));
    let result = heap.call_function(function, this, &[a, b], 0).unwrap().unwrap();
    assert_eq!(int_value(&heap, result), 7);

    let err = heap.call_function(this, this, &[], 0).unwrap_err();
    assert_eq!(err.kind, ObjectErrorKind::NotCallable { type_name: "Object" });
}

#[test]
fn test_errors_carry_origin() {
    let mut heap = heap();
    heap.set_origin(Some("movie.swf".to_owned()));
    let obj = heap.alloc(ObjectKind::Object);
    heap.dec_ref(obj).unwrap();
    let err = heap.inc_ref(obj).unwrap_err();
    assert_eq!(err.origin.as_deref(), Some("movie.swf"));
    assert_eq!(heap.origin(), Some("movie.swf"));
}

#[test]
fn test_unknown_manager() {
    let heap = heap();
    let err = heap.manager(ManagerId(7)).unwrap_err();
    assert_eq!(err.kind, ObjectErrorKind::UnknownPool { index: 7 });
}

#[test]
fn test_mark_initialized_sets_flag() {
    let mut heap = heap();
    let obj = heap.alloc(ObjectKind::Object);
    heap.mark_initialized(obj).unwrap();
    assert!(heap.object(obj).unwrap().flags().contains(ObjectFlags::INITIALIZED));
}
