#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::{MemberKey, NamespaceKind};

#[test]
fn test_candidates_sorted_and_deduplicated() {
    let interner = StringInterner::new();
    let b = Namespace::named(interner.intern("b"));
    let a = Namespace::named(interner.intern("a"));
    let x = interner.intern("x");

    let mname = Multiname::new(LocalName::Str(x), [b, a, b]);

    assert_eq!(mname.namespaces().len(), 2);
    assert!(mname.namespaces()[0] <= mname.namespaces()[1]);
    assert!(mname.has_namespace(&a));
    assert!(mname.has_namespace(&b));
    assert!(!mname.has_namespace(&Namespace::PUBLIC));
    assert!(mname.is_ambiguous());
}

#[test]
fn test_empty_candidates_become_public() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mname = Multiname::new(LocalName::Str(x), []);
    assert_eq!(mname.namespaces(), &[Namespace::PUBLIC]);
    assert!(!mname.is_ambiguous());
}

#[test]
fn test_numeric_names_share_index_key() {
    let interner = StringInterner::new();
    let three = interner.intern("3");
    let before = interner.len();

    assert_eq!(Multiname::index(3).key(&interner), Ok(MemberKey::Index(3)));
    assert_eq!(
        Multiname::new(LocalName::Number(3.0), []).key(&interner),
        Ok(MemberKey::Index(3))
    );
    assert_eq!(
        Multiname::new(LocalName::Number(-0.0), []).key(&interner),
        Ok(MemberKey::Index(0))
    );
    assert_eq!(Multiname::public(three).key(&interner), Ok(MemberKey::Index(3)));
    assert_eq!(interner.len(), before);
}

#[test]
fn test_integer_keys_do_not_intern() {
    let interner = StringInterner::new();
    let before = interner.len();
    for i in 0..10_000 {
        Multiname::index(i).key(&interner).unwrap();
    }
    assert_eq!(interner.len(), before);
}

#[test]
fn test_fractional_names_key_by_text() {
    let interner = StringInterner::new();
    let half = Multiname::new(LocalName::Number(0.5), []).key(&interner).unwrap();
    assert_eq!(half, MemberKey::Name(interner.intern("0.5")));

    let nan = Multiname::new(LocalName::Number(f64::NAN), []).key(&interner).unwrap();
    assert_eq!(nan.text(&interner), "NaN");
}

#[test]
fn test_qualified_string() {
    let interner = StringInterner::new();
    let ns = Namespace::new(interner.intern("flash.events"), NamespaceKind::Package);
    let name = interner.intern("Event");

    let mname = Multiname::qname(name, ns);
    assert_eq!(
        mname.qualified_string(&interner).unwrap(),
        "flash.events::Event"
    );

    let ambiguous = Multiname::new(LocalName::Str(name), [ns, Namespace::PUBLIC]);
    assert_eq!(
        ambiguous.qualified_string(&interner),
        Err(QualifiedStringError::AmbiguousNamespace { candidates: 2 })
    );
    assert_eq!(
        Multiname::index(1).qualified_string(&interner),
        Err(QualifiedStringError::NonStringLocal)
    );
}

#[test]
fn test_display_prints_namespace_prefixes() {
    let interner = StringInterner::new();
    let private = Namespace::new(interner.intern("Foo"), NamespaceKind::Private);
    let name = interner.intern("secret");

    let mname = Multiname::qname(name, private);
    assert_eq!(mname.display(&interner).to_string(), "[privns:Foo] secret");
    assert_eq!(Multiname::index(7).display(&interner).to_string(), "[ns:] 7");
}
