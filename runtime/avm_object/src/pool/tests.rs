#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::*;

fn id(index: u32) -> ObjectId {
    ObjectId::from_parts(index, 0)
}

#[test]
fn retains_up_to_capacity() {
    let mut manager = Manager::new(ObjectTag::Integer, 2);
    assert_eq!(
        manager.on_release(id(1), ObjectTag::Integer).unwrap(),
        Release::Retained
    );
    assert_eq!(
        manager.on_release(id(2), ObjectTag::Integer).unwrap(),
        Release::Retained
    );
    assert_eq!(
        manager.on_release(id(3), ObjectTag::Integer).unwrap(),
        Release::Discard
    );
    assert_eq!(manager.len(), 2);
}

#[test]
fn take_is_last_in_first_out() {
    let mut manager = Manager::new(ObjectTag::Number, 4);
    manager.on_release(id(1), ObjectTag::Number).unwrap();
    manager.on_release(id(2), ObjectTag::Number).unwrap();
    assert_eq!(manager.take(), Some(id(2)));
    assert_eq!(manager.take(), Some(id(1)));
    assert_eq!(manager.take(), None);
    assert!(manager.is_empty());
}

#[test]
fn wrong_type_is_rejected() {
    let mut manager = Manager::new(ObjectTag::Integer, 4);
    let err = manager.on_release(id(1), ObjectTag::Number).unwrap_err();
    assert!(err.is_fatal());
    assert!(manager.is_empty());
}

#[test]
fn poolable_payloads() {
    assert_eq!(<i32 as Poolable>::TAG, ObjectTag::Integer);
    assert_eq!(7_i32.into_kind().tag(), ObjectTag::Integer);
    assert_eq!(1.5_f64.into_kind().tag(), ObjectTag::Number);
    assert_eq!(true.into_kind().tag(), ObjectTag::Boolean);
}
