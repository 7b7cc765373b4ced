//! The object heap: arena storage, reference counting and pools.
//!
//! # Ownership
//!
//! Every `ObjectId` a caller holds is either *owned* (it accounts for one unit
//! of the target's count and must eventually be passed to [`ObjectHeap::dec_ref`]
//! or handed to an operation that consumes it) or *borrowed* (valid only while
//! some owner keeps the target alive). Allocation returns an owned handle.
//!
//! # Threads
//!
//! The heap is `Sync`. [`ObjectHeap::inc_ref`], [`ObjectHeap::fake_dec_ref`]
//! and [`ObjectHeap::release_deferred`] take `&self` and may run on auxiliary
//! threads that share the heap. Everything that mutates objects or tables
//! takes `&mut self` and belongs to the script thread.

use std::mem;

use avm_names::{Name, SharedInterner};
use parking_lot::Mutex;

use crate::refcount::Transition;
use crate::{
    ClassInfo, FunctionObject, HeapConfig, Manager, ManagerId, NativeFunction, ObjectError,
    ObjectFlags, ObjectId, ObjectKind, ObjectResult, ObjectTag, OnRelease, Poolable, Release,
    ScriptObject,
};

#[derive(Debug)]
struct Cell {
    generation: u32,
    object: Option<ScriptObject>,
}

/// Point-in-time heap counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects reachable through a handle.
    pub live_objects: usize,
    /// Retired objects held by pools.
    pub pooled_objects: usize,
    /// Arena cells waiting for reuse.
    pub free_slots: usize,
    pub allocated: u64,
    pub destroyed: u64,
    /// Pool hits.
    pub recycled: u64,
    /// Creates that fell back to the public namespace for an ambiguous multiname.
    pub ambiguous_inserts: u64,
}

/// Arena of scripted objects.
pub struct ObjectHeap {
    cells: Vec<Cell>,
    free_list: Vec<u32>,
    managers: Vec<Manager>,
    /// Objects released from auxiliary threads, retired on the script thread.
    deferred: Mutex<Vec<ObjectId>>,
    interner: SharedInterner,
    config: HeapConfig,
    /// Diagnostic origin of the running script.
    origin: Option<String>,
    allocated: u64,
    destroyed: u64,
    recycled: u64,
    retired_ambiguous_inserts: u64,
}

impl ObjectHeap {
    pub fn new(interner: SharedInterner) -> Self {
        Self::with_config(interner, HeapConfig::default())
    }

    pub fn with_config(interner: SharedInterner, config: HeapConfig) -> Self {
        ObjectHeap {
            cells: Vec::new(),
            free_list: Vec::new(),
            managers: Vec::new(),
            deferred: Mutex::new(Vec::new()),
            interner,
            config,
            origin: None,
            allocated: 0,
            destroyed: 0,
            recycled: 0,
            retired_ambiguous_inserts: 0,
        }
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Set the origin (movie URL or file) reported with every error.
    pub fn set_origin(&mut self, origin: Option<String>) {
        self.origin = origin;
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Attach the heap's diagnostic context to an error.
    pub(crate) fn raise(&self, err: ObjectError) -> ObjectError {
        err.with_origin(self.origin.as_deref())
    }

    // Storage

    /// Allocate an object with a count of 1, owned by the caller.
    pub fn alloc(&mut self, kind: ObjectKind) -> ObjectId {
        self.allocated += 1;
        let object = ScriptObject::new(kind);
        let id = if let Some(index) = self.free_list.pop() {
            let cell = &mut self.cells[index as usize];
            cell.object = Some(object);
            ObjectId::from_parts(index, cell.generation)
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "arena indices are u32 by construction"
            )]
            let index = self.cells.len() as u32;
            self.cells.push(Cell {
                generation: 0,
                object: Some(object),
            });
            ObjectId::from_parts(index, 0)
        };
        tracing::trace!(?id, "allocated");
        id
    }

    fn lookup(&self, id: ObjectId) -> Option<&ScriptObject> {
        self.cells
            .get(id.index() as usize)
            .filter(|cell| cell.generation == id.generation())
            .and_then(|cell| cell.object.as_ref())
            .filter(|object| !object.flags.contains(ObjectFlags::POOLED))
    }

    /// The object behind a live handle.
    pub fn object(&self, id: ObjectId) -> ObjectResult<&ScriptObject> {
        self.lookup(id).ok_or_else(|| self.raise(ObjectError::dangling(id)))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> ObjectResult<&mut ScriptObject> {
        let origin = self.origin.as_deref();
        self.cells
            .get_mut(id.index() as usize)
            .filter(|cell| cell.generation == id.generation())
            .and_then(|cell| cell.object.as_mut())
            .filter(|object| !object.flags.contains(ObjectFlags::POOLED))
            .ok_or_else(|| ObjectError::dangling(id).with_origin(origin))
    }

    /// Pooled objects are invisible to [`Self::object_mut`]; pools reach them here.
    fn pooled_mut(&mut self, id: ObjectId) -> ObjectResult<&mut ScriptObject> {
        let origin = self.origin.as_deref();
        self.cells
            .get_mut(id.index() as usize)
            .filter(|cell| cell.generation == id.generation())
            .and_then(|cell| cell.object.as_mut())
            .filter(|object| object.flags.contains(ObjectFlags::POOLED))
            .ok_or_else(|| ObjectError::dangling(id).with_origin(origin))
    }

    #[inline]
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.lookup(id).is_some()
    }

    pub fn kind(&self, id: ObjectId) -> ObjectResult<&ObjectKind> {
        self.object(id).map(ScriptObject::kind)
    }

    pub fn tag(&self, id: ObjectId) -> ObjectResult<ObjectTag> {
        self.object(id).map(ScriptObject::tag)
    }

    /// Close class setup: accessor declarations are rejected from now on.
    pub fn mark_initialized(&mut self, id: ObjectId) -> ObjectResult<()> {
        self.object_mut(id)?.flags.insert(ObjectFlags::INITIALIZED);
        Ok(())
    }

    // Reference counting

    pub fn ref_count(&self, id: ObjectId) -> ObjectResult<u32> {
        self.object(id).map(ScriptObject::ref_count)
    }

    /// Take one more reference to `id`.
    pub fn inc_ref(&self, id: ObjectId) -> ObjectResult<()> {
        self.object(id)?.ref_count.increment();
        Ok(())
    }

    /// Drop one unit of count without ever retiring the object.
    ///
    /// Marks a callee's owned result as borrowed by the caller.
    pub fn fake_dec_ref(&self, id: ObjectId) -> ObjectResult<()> {
        if self.object(id)?.ref_count.fake_decrement() {
            Ok(())
        } else {
            Err(self.raise(ObjectError::ref_count_underflow(id)))
        }
    }

    /// Release one reference; the last release destroys or pools the object.
    ///
    /// References owned by a retired object are released in turn. The walk
    /// uses an explicit worklist, so long ownership chains do not recurse.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn dec_ref(&mut self, id: ObjectId) -> ObjectResult<()> {
        self.release_all(vec![id])
    }

    /// Release one reference from a thread that only shares the heap.
    ///
    /// If this was the last reference, retirement waits for
    /// [`Self::reclaim_deferred`] on the script thread.
    pub fn release_deferred(&self, id: ObjectId) -> ObjectResult<()> {
        match self.object(id)?.ref_count.decrement() {
            Some(Transition::Released) => {
                self.deferred.lock().push(id);
                Ok(())
            }
            Some(Transition::Shared(_)) => Ok(()),
            None => Err(self.raise(ObjectError::ref_count_underflow(id))),
        }
    }

    /// Retire every object whose last reference was released off-thread.
    ///
    /// Returns how many were queued.
    pub fn reclaim_deferred(&mut self) -> ObjectResult<usize> {
        let queued = mem::take(self.deferred.get_mut());
        let count = queued.len();
        let mut pending = Vec::new();
        for id in queued {
            self.retire(id, &mut pending)?;
        }
        self.release_all(pending)?;
        Ok(count)
    }

    fn release_all(&mut self, mut pending: Vec<ObjectId>) -> ObjectResult<()> {
        while let Some(id) = pending.pop() {
            let transition = self
                .object(id)?
                .ref_count
                .decrement()
                .ok_or_else(|| self.raise(ObjectError::ref_count_underflow(id)))?;
            if transition == Transition::Released {
                self.retire(id, &mut pending)?;
            }
        }
        Ok(())
    }

    /// Tear down an object whose count reached zero.
    ///
    /// References it owned are pushed onto `pending` for release.
    fn retire(&mut self, id: ObjectId, pending: &mut Vec<ObjectId>) -> ObjectResult<()> {
        let object = self.object_mut(id)?;
        let mut table = mem::take(&mut object.variables);
        pending.extend(object.prototype.take());
        pending.extend(object.kind.owned_references());
        let tag = object.kind.tag();
        let manager = object.manager;
        table.drain_into(pending);
        self.retired_ambiguous_inserts += table.ambiguous_inserts();

        let fate = match manager {
            Some(manager) => {
                let origin = self.origin.as_deref();
                self.managers
                    .get_mut(manager.0 as usize)
                    .ok_or_else(|| ObjectError::unknown_pool(manager.0).with_origin(origin))?
                    .on_release(id, tag)
                    .map_err(|err| err.with_origin(origin))?
            }
            None => Release::Discard,
        };

        match fate {
            Release::Retained => {
                let object = self.object_mut(id)?;
                object.flags = ObjectFlags::POOLED;
                object.cur_level = 0;
                tracing::trace!(?id, ?tag, "object pooled");
            }
            Release::Discard => {
                let cell = &mut self.cells[id.index() as usize];
                cell.object = None;
                cell.generation = cell.generation.wrapping_add(1);
                self.free_list.push(id.index());
                self.destroyed += 1;
                tracing::trace!(?id, ?tag, "object destroyed");
            }
        }
        Ok(())
    }

    // Pools

    /// Register a pool for objects of type `tag`.
    pub fn create_manager(&mut self, tag: ObjectTag) -> ManagerId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a heap registers a handful of pools"
        )]
        let id = ManagerId(self.managers.len() as u32);
        self.managers.push(Manager::new(tag, self.config.pool_capacity));
        id
    }

    pub fn manager(&self, id: ManagerId) -> ObjectResult<&Manager> {
        self.managers
            .get(id.0 as usize)
            .ok_or_else(|| self.raise(ObjectError::unknown_pool(id.0)))
    }

    /// An object holding `value`, recycled from the pool when it has one.
    ///
    /// The returned handle is owned and its release returns it to the pool.
    pub fn pool_get<T: Poolable>(&mut self, manager: ManagerId, value: T) -> ObjectResult<ObjectId> {
        let pool_tag = self.manager(manager)?.tag();
        if pool_tag != T::TAG {
            return Err(self.raise(ObjectError::pool_type_mismatch(
                pool_tag.name(),
                T::TAG.name(),
            )));
        }
        let recycled = self
            .managers
            .get_mut(manager.0 as usize)
            .and_then(Manager::take);

        match recycled {
            Some(id) => {
                let object = self.pooled_mut(id)?;
                object.kind = value.into_kind();
                object.flags = ObjectFlags::empty();
                object.ref_count.revive();
                self.recycled += 1;
                tracing::trace!(?id, "object recycled");
                Ok(id)
            }
            None => {
                let id = self.alloc(value.into_kind());
                self.object_mut(id)?.manager = Some(manager);
                Ok(id)
            }
        }
    }

    // Functions and classes

    /// Allocate a function object.
    pub fn new_function(&mut self, name: Name, body: impl NativeFunction + 'static) -> ObjectId {
        self.alloc(ObjectKind::Function(FunctionObject::new(name, body)))
    }

    pub(crate) fn function(&self, id: ObjectId) -> ObjectResult<&FunctionObject> {
        let object = self.object(id)?;
        object
            .as_function()
            .ok_or_else(|| self.raise(ObjectError::not_callable(object.tag().name())))
    }

    /// Record `derived` as the override of `base`. The heap takes its own
    /// reference to `derived`.
    pub fn set_override(&mut self, base: ObjectId, derived: ObjectId) -> ObjectResult<()> {
        self.function(base)?;
        let mut link = Some(derived);
        while let Some(current) = link {
            if current == base {
                return Err(self.raise(ObjectError::duplicate_declaration("override cycle")));
            }
            link = self.function(current)?.overridden_by();
        }
        self.inc_ref(derived)?;
        let previous = match &mut self.object_mut(base)?.kind {
            ObjectKind::Function(function) => function.replace_override(derived),
            _ => None,
        };
        if let Some(previous) = previous {
            self.dec_ref(previous)?;
        }
        Ok(())
    }

    /// The most-derived function reachable through the override chain.
    pub fn resolve_override(&self, function: ObjectId) -> ObjectResult<ObjectId> {
        let mut current = function;
        while let Some(next) = self.function(current)?.overridden_by() {
            current = next;
        }
        Ok(current)
    }

    /// Invoke a function object. Arguments are borrowed; the result is owned.
    pub fn call_function(
        &mut self,
        function: ObjectId,
        this: ObjectId,
        args: &[ObjectId],
        level: u32,
    ) -> ObjectResult<Option<ObjectId>> {
        let body = self.function(function)?.body();
        tracing::trace!(?function, ?this, level, "calling function");
        avm_stack::ensure_sufficient_stack(|| body.call(self, this, args, level))
            .map_err(|err| self.raise(err))
    }

    /// Allocate a class object.
    ///
    /// A root class has `max_level` 0; a subclass sits one level above its
    /// superclass and holds a reference to it.
    pub fn new_class(&mut self, name: Name, super_class: Option<ObjectId>) -> ObjectResult<ObjectId> {
        let max_level = match super_class {
            Some(parent) => {
                let level = self.class_info(parent)?.max_level + 1;
                self.inc_ref(parent)?;
                level
            }
            None => 0,
        };
        Ok(self.alloc(ObjectKind::Class(ClassInfo {
            name,
            max_level,
            super_class,
        })))
    }

    pub fn class_info(&self, id: ObjectId) -> ObjectResult<&ClassInfo> {
        let object = self.object(id)?;
        object.as_class().ok_or_else(|| {
            self.raise(ObjectError::conversion_failed(
                object.tag().name(),
                ObjectTag::Class.name(),
            ))
        })
    }

    /// Allocate a plain instance of `class`, at the class's level.
    pub fn alloc_instance(&mut self, class: ObjectId) -> ObjectResult<ObjectId> {
        let max_level = self.class_info(class)?.max_level;
        self.inc_ref(class)?;
        let id = self.alloc(ObjectKind::Object);
        let object = self.object_mut(id)?;
        object.prototype = Some(class);
        object.cur_level = max_level;
        Ok(id)
    }

    // Levels

    pub fn level(&self, id: ObjectId) -> ObjectResult<u32> {
        self.object(id).map(ScriptObject::cur_level)
    }

    /// Highest valid level: the prototype's `max_level`, or 0 without one.
    pub fn max_level(&self, id: ObjectId) -> ObjectResult<u32> {
        match self.object(id)?.prototype {
            Some(prototype) => Ok(self.class_info(prototype)?.max_level),
            None => Ok(0),
        }
    }

    pub fn set_level(&mut self, id: ObjectId, level: u32) -> ObjectResult<()> {
        let max_level = self.max_level(id)?;
        if level > max_level {
            return Err(self.raise(ObjectError::level_out_of_range(level, max_level)));
        }
        self.object_mut(id)?.cur_level = level;
        Ok(())
    }

    /// Step toward the base class, as a `super` call does.
    pub fn dec_level(&mut self, id: ObjectId) -> ObjectResult<()> {
        let level = self.level(id)?;
        match level.checked_sub(1) {
            Some(lower) => self.set_level(id, lower),
            None => Err(self.raise(ObjectError::level_out_of_range(0, self.max_level(id)?))),
        }
    }

    pub fn reset_level(&mut self, id: ObjectId) -> ObjectResult<()> {
        let max_level = self.max_level(id)?;
        self.object_mut(id)?.cur_level = max_level;
        Ok(())
    }

    /// The class in the prototype's ancestry that declares `cur_level`.
    pub fn actual_prototype(&self, id: ObjectId) -> ObjectResult<Option<ObjectId>> {
        let object = self.object(id)?;
        let Some(mut class) = object.prototype else {
            return Ok(None);
        };
        loop {
            let info = self.class_info(class)?;
            if info.max_level <= object.cur_level {
                return Ok(Some(class));
            }
            match info.super_class {
                Some(parent) => class = parent,
                None => return Ok(Some(class)),
            }
        }
    }

    // Diagnostics

    pub fn stats(&self) -> HeapStats {
        let (live_objects, ambiguous_live) = self
            .cells
            .iter()
            .filter_map(|cell| cell.object.as_ref())
            .filter(|object| !object.flags.contains(ObjectFlags::POOLED))
            .fold((0, 0), |(count, ambiguous), object| {
                (count + 1, ambiguous + object.variables.ambiguous_inserts())
            });
        HeapStats {
            live_objects,
            pooled_objects: self.managers.iter().map(Manager::len).sum(),
            free_slots: self.free_list.len(),
            allocated: self.allocated,
            destroyed: self.destroyed,
            recycled: self.recycled,
            ambiguous_inserts: self.retired_ambiguous_inserts + ambiguous_live,
        }
    }
}

#[cfg(test)]
mod tests;
