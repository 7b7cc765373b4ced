//! Fixtures shared by the heap unit tests.

#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use avm_names::{Multiname, Name, Namespace, SharedInterner};

use crate::{HeapConfig, ObjectHeap, ObjectId, ObjectKind, ObjectResult};

/// A heap that checks table consistency after every mutation.
pub(crate) fn heap() -> ObjectHeap {
    ObjectHeap::with_config(
        SharedInterner::new(),
        HeapConfig::default().with_verify_tables(true),
    )
}

/// Pins a closure to the function-body signature.
pub(crate) fn native<F>(f: F) -> F
where
    F: Fn(&mut ObjectHeap, ObjectId, &[ObjectId], u32) -> ObjectResult<Option<ObjectId>>
        + Send
        + Sync
        + 'static,
{
    f
}

pub(crate) fn name(heap: &ObjectHeap, text: &str) -> Name {
    heap.interner().intern(text)
}

pub(crate) fn public(heap: &ObjectHeap, text: &str) -> Multiname {
    Multiname::public(name(heap, text))
}

pub(crate) fn int(heap: &mut ObjectHeap, value: i32) -> ObjectId {
    heap.alloc(ObjectKind::Integer(value))
}

pub(crate) fn int_value(heap: &ObjectHeap, id: ObjectId) -> i32 {
    match heap.kind(id).unwrap() {
        ObjectKind::Integer(value) => *value,
        other => panic!("expected an int, got {other:?}"),
    }
}

/// A getter that returns a fresh int on every call.
pub(crate) fn constant_getter(heap: &mut ObjectHeap, value: i32) -> ObjectId {
    let getter_name = name(heap, "get");
    heap.new_function(
        getter_name,
        native(move |heap, _, _, _| Ok(Some(heap.alloc(ObjectKind::Integer(value))))),
    )
}

/// Store `value` under the public `text` at the current level.
pub(crate) fn put(heap: &mut ObjectHeap, obj: ObjectId, text: &str, value: ObjectId) {
    let key = name(heap, text);
    heap.set_property_qname(obj, key, &Namespace::PUBLIC, value, false)
        .unwrap();
}

/// Classes `levels` deep, returning them root first.
pub(crate) fn hierarchy(heap: &mut ObjectHeap, levels: u32) -> Vec<ObjectId> {
    let mut classes: Vec<ObjectId> = Vec::new();
    for level in 0..levels {
        let class_name = name(heap, &format!("C{level}"));
        let parent = classes.last().copied();
        classes.push(heap.new_class(class_name, parent).unwrap());
    }
    classes
}
