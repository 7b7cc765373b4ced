//! Callable objects.
//!
//! Getters, setters and the `valueOf`/`equals`/`toString` overloads are
//! function objects whose body is a [`NativeFunction`]. The interpreter
//! supplies bodies that run bytecode; the heap only invokes them.

use std::fmt;
use std::sync::Arc;

use avm_names::Name;

use crate::{ObjectHeap, ObjectId, ObjectKind, ObjectResult};

/// Body of a function object.
///
/// `args` are borrowed for the duration of the call. A returned object is
/// owned by the caller. `level` is the inheritance level the member was
/// resolved at, so a body can dispatch `super` correctly.
pub trait NativeFunction: Send + Sync {
    fn call(
        &self,
        heap: &mut ObjectHeap,
        this: ObjectId,
        args: &[ObjectId],
        level: u32,
    ) -> ObjectResult<Option<ObjectId>>;
}

impl<F> NativeFunction for F
where
    F: Fn(&mut ObjectHeap, ObjectId, &[ObjectId], u32) -> ObjectResult<Option<ObjectId>>
        + Send
        + Sync,
{
    fn call(
        &self,
        heap: &mut ObjectHeap,
        this: ObjectId,
        args: &[ObjectId],
        level: u32,
    ) -> ObjectResult<Option<ObjectId>> {
        self(heap, this, args, level)
    }
}

/// Payload of a function object.
#[derive(Clone)]
pub struct FunctionObject {
    pub name: Name,
    body: Arc<dyn NativeFunction>,
    /// Owned reference to the more-derived function replacing this one.
    overridden_by: Option<ObjectId>,
}

impl FunctionObject {
    pub fn new(name: Name, body: impl NativeFunction + 'static) -> Self {
        FunctionObject {
            name,
            body: Arc::new(body),
            overridden_by: None,
        }
    }

    #[inline]
    pub fn overridden_by(&self) -> Option<ObjectId> {
        self.overridden_by
    }

    pub(crate) fn replace_override(&mut self, derived: ObjectId) -> Option<ObjectId> {
        self.overridden_by.replace(derived)
    }

    /// Shared handle to the body, callable while the heap is borrowed mutably.
    pub(crate) fn body(&self) -> Arc<dyn NativeFunction> {
        Arc::clone(&self.body)
    }
}

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionObject")
            .field("name", &self.name)
            .field("overridden_by", &self.overridden_by)
            .finish_non_exhaustive()
    }
}

/// Body of the lazily defined `toString`: the receiver's plain string form.
pub(crate) fn default_to_string(
    heap: &mut ObjectHeap,
    this: ObjectId,
    _args: &[ObjectId],
    _level: u32,
) -> ObjectResult<Option<ObjectId>> {
    let text = heap.to_string(this, true)?;
    Ok(Some(heap.alloc(ObjectKind::Str(text))))
}
