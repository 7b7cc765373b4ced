use pretty_assertions::assert_eq;

use super::*;

#[test]
fn kind_tags() {
    assert_eq!(ObjectKind::Integer(3).tag(), ObjectTag::Integer);
    assert_eq!(ObjectKind::Str("a".to_owned()).tag(), ObjectTag::Str);
    assert_eq!(ObjectTag::Number.name(), "Number");
    assert!(ObjectTag::Null.is_nullish());
    assert!(!ObjectTag::Object.is_nullish());
}

#[test]
fn new_object_starts_owned_once() {
    let object = ScriptObject::new(ObjectKind::Object);
    assert_eq!(object.ref_count(), 1);
    assert_eq!(object.cur_level(), 0);
    assert!(object.flags().is_empty());
    assert!(object.variables().is_empty());
}

#[test]
fn class_payload_owns_its_super() {
    let parent = ObjectId::from_parts(4, 1);
    let kind = ObjectKind::Class(ClassInfo {
        name: Name::EMPTY,
        max_level: 1,
        super_class: Some(parent),
    });
    assert_eq!(kind.owned_references().collect::<Vec<_>>(), vec![parent]);
    assert_eq!(ObjectKind::Number(1.0).owned_references().count(), 0);
}

#[test]
fn handle_debug_shows_generation() {
    assert_eq!(format!("{:?}", ObjectId::from_parts(7, 2)), "ObjectId(7v2)");
}
