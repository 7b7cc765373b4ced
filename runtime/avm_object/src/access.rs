//! The property-access API consumed by the interpreter.
//!
//! # Levels
//!
//! Reads walk the receiver's table from `cur_level` toward level 0, so a
//! subclass declaration shadows its ancestors'. Writes resolve at `cur_level`
//! and create the member there when nothing is found. The interpreter lowers
//! `cur_level` around `super` calls to address a specific ancestor.
//!
//! # Ownership
//!
//! Values passed to setters are consumed. Values returned by reads are
//! borrowed: a getter's result is handed back with
//! [`ObjectHeap::fake_dec_ref`] applied, so the caller must `inc_ref` it to
//! keep it beyond the next mutation.

use avm_names::{MemberKey, Multiname, Name, Namespace};
use smallvec::SmallVec;

use crate::function::default_to_string;
use crate::{
    Declared, MemberSlot, NsQuery, ObjectError, ObjectFlags, ObjectHeap, ObjectId, ObjectResult,
    ObjectTag, Readable,
};

/// A member read: the value and the level its declaration was found at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub value: ObjectId,
    pub level: u32,
}

impl ObjectHeap {
    fn check_table(&self, obj: ObjectId) -> ObjectResult<()> {
        if self.config().verify_tables {
            self.object(obj)?
                .variables
                .verify(self.interner())
                .map_err(|err| self.raise(err))?;
        }
        Ok(())
    }

    fn named(&self, err: ObjectError, mname: &Multiname) -> ObjectError {
        if err.name.is_some() {
            return err;
        }
        err.with_name(mname.display(self.interner()).to_string())
    }

    fn member_key(&self, mname: &Multiname) -> ObjectResult<MemberKey> {
        mname
            .key(self.interner())
            .map_err(|err| self.raise(ObjectError::names_exhausted(&err)))
    }

    fn qname_key(&self, name: Name) -> MemberKey {
        MemberKey::of_name(name, self.interner())
    }

    // Reads

    /// Read `mname` from `obj`.
    ///
    /// Setter-only declarations are skipped. A miss falls back to the lazily
    /// defined `toString`, then to `call` on functions, then to the
    /// prototype. `Ok(None)` means undefined.
    #[tracing::instrument(level = "trace", skip(self, mname))]
    pub fn get_property(
        &mut self,
        obj: ObjectId,
        mname: &Multiname,
        allow_override: bool,
    ) -> ObjectResult<Option<Resolved>> {
        avm_stack::ensure_sufficient_stack(|| self.lookup_property(obj, mname, allow_override))
            .map_err(|err| self.named(err, mname))
    }

    fn lookup_property(
        &mut self,
        obj: ObjectId,
        mname: &Multiname,
        allow_override: bool,
    ) -> ObjectResult<Option<Resolved>> {
        let key = self.member_key(mname)?;
        let object = self.object(obj)?;

        let mut hit = None;
        let mut next = Some(object.cur_level);
        while let Some(start) = next {
            let Some(found) = object
                .variables
                .locate(key, NsQuery::AnyOf(mname), start, true)
            else {
                break;
            };
            match object.variables.slot(found.entry)?.readable() {
                Some(readable) => {
                    hit = Some((readable, found.level));
                    break;
                }
                None => next = found.level.checked_sub(1),
            }
        }
        let prototype = object.prototype;
        let tag = object.tag();

        match hit {
            Some((Readable::Value(value), level)) => return Ok(Some(Resolved { value, level })),
            Some((Readable::Getter(getter), level)) => {
                return self
                    .invoke_getter(obj, getter, level, allow_override)
                    .map(Some);
            }
            None => {}
        }

        let names = *self.interner().well_known();
        if mname.is_named(names.to_string) {
            return self.define_default_to_string(obj).map(Some);
        }
        if tag == ObjectTag::Function && mname.is_named(names.call) {
            return Ok(Some(Resolved {
                value: obj,
                level: 0,
            }));
        }
        match prototype {
            Some(prototype) => self.get_property(prototype, mname, allow_override),
            None => Ok(None),
        }
    }

    /// Read a qualified name: one lookup over levels `<= cur_level`, then the prototype.
    ///
    /// Getters always dispatch through their override.
    pub fn get_property_qname(
        &mut self,
        obj: ObjectId,
        name: Name,
        ns: &Namespace,
    ) -> ObjectResult<Option<Resolved>> {
        avm_stack::ensure_sufficient_stack(|| {
            let key = self.qname_key(name);
            let object = self.object(obj)?;
            let readable = match object
                .variables
                .locate(key, NsQuery::Exact(ns), object.cur_level, true)
            {
                Some(found) => object
                    .variables
                    .slot(found.entry)?
                    .readable()
                    .map(|readable| (readable, found.level)),
                None => None,
            };
            let prototype = object.prototype;

            match (readable, prototype) {
                (Some((Readable::Value(value), level)), _) => Ok(Some(Resolved { value, level })),
                (Some((Readable::Getter(getter), level)), _) => {
                    self.invoke_getter(obj, getter, level, true).map(Some)
                }
                (None, Some(prototype)) => self.get_property_qname(prototype, name, ns),
                (None, None) => Ok(None),
            }
        })
    }

    fn invoke_getter(
        &mut self,
        obj: ObjectId,
        getter: ObjectId,
        level: u32,
        allow_override: bool,
    ) -> ObjectResult<Resolved> {
        let getter = if allow_override {
            self.resolve_override(getter)?
        } else {
            getter
        };
        tracing::trace!(?obj, ?getter, level, "calling getter");
        let value = self
            .call_function(getter, obj, &[], level)?
            .ok_or_else(|| self.raise(ObjectError::unexpected_result("object", "nothing")))?;
        // The caller borrows what the getter returned
        self.fake_dec_ref(value)?;
        Ok(Resolved { value, level })
    }

    fn define_default_to_string(&mut self, obj: ObjectId) -> ObjectResult<Resolved> {
        let name = self.interner().well_known().to_string;
        let function = self.new_function(name, default_to_string);
        let previous = {
            let object = self.object_mut(obj)?;
            let found = object
                .variables
                .find_or_create(MemberKey::Name(name), NsQuery::Exact(&Namespace::PUBLIC), 0, false);
            object
                .variables
                .slot_mut(found.entry)
                .and_then(|slot| slot.replace_value(function))
        }
        .map_err(|err| self.raise(err))?;
        if let Some(previous) = previous {
            self.dec_ref(previous)?;
        }
        tracing::trace!(?obj, "defined default toString");
        Ok(Resolved {
            value: function,
            level: 0,
        })
    }

    // Writes

    /// Write `value` to `mname` on `obj`, consuming the caller's reference.
    ///
    /// Resolves at `cur_level`, searching earlier levels first and creating
    /// the member at `cur_level` on a miss. A setter receives the value as a
    /// borrowed argument and must return nothing.
    #[tracing::instrument(level = "trace", skip(self, mname))]
    pub fn set_property(
        &mut self,
        obj: ObjectId,
        mname: &Multiname,
        value: ObjectId,
        allow_override: bool,
    ) -> ObjectResult<()> {
        let key = self.member_key(mname)?;
        avm_stack::ensure_sufficient_stack(|| {
            self.store(obj, key, NsQuery::AnyOf(mname), value, allow_override, true)
        })
        .map_err(|err| self.named(err, mname))
    }

    /// Write a qualified name. Without `find_back` only `cur_level` is searched.
    pub fn set_property_qname(
        &mut self,
        obj: ObjectId,
        name: Name,
        ns: &Namespace,
        value: ObjectId,
        find_back: bool,
    ) -> ObjectResult<()> {
        let key = self.qname_key(name);
        avm_stack::ensure_sufficient_stack(|| {
            self.store(obj, key, NsQuery::Exact(ns), value, true, find_back)
        })
    }

    fn store(
        &mut self,
        obj: ObjectId,
        key: MemberKey,
        query: NsQuery<'_>,
        value: ObjectId,
        allow_override: bool,
        find_back: bool,
    ) -> ObjectResult<()> {
        let (slot, found) = {
            let object = self.object_mut(obj)?;
            let found = object
                .variables
                .find_or_create(key, query, object.cur_level, find_back);
            object
                .variables
                .slot(found.entry)
                .map(|slot| (slot.clone(), found))
        }
        .map_err(|err| self.raise(err))?;

        match slot {
            MemberSlot::Accessor {
                setter: Some(setter),
                ..
            } => self.invoke_setter(obj, setter, value, found.level, allow_override)?,
            MemberSlot::Accessor { setter: None, .. } => {
                self.dec_ref(value)?;
                return Err(self.raise(ObjectError::read_only_property()));
            }
            MemberSlot::Direct(_) => {
                let previous = self
                    .object_mut(obj)?
                    .variables
                    .slot_mut(found.entry)
                    .and_then(|slot| slot.replace_value(value))
                    .map_err(|err| self.raise(err))?;
                if let Some(previous) = previous {
                    self.dec_ref(previous)?;
                }
            }
        }
        self.check_table(obj)
    }

    fn invoke_setter(
        &mut self,
        obj: ObjectId,
        setter: ObjectId,
        value: ObjectId,
        level: u32,
        allow_override: bool,
    ) -> ObjectResult<()> {
        let setter = if allow_override {
            self.resolve_override(setter)?
        } else {
            setter
        };
        tracing::trace!(?obj, ?setter, level, "calling setter");
        let returned = self.call_function(setter, obj, &[value], level);
        self.dec_ref(value)?;
        match returned? {
            None => Ok(()),
            Some(unexpected) => {
                self.dec_ref(unexpected)?;
                Err(self.raise(ObjectError::setter_returned_value()))
            }
        }
    }

    /// Install a getter for `name` at `cur_level`, consuming the reference.
    pub fn set_getter_by_qname(
        &mut self,
        obj: ObjectId,
        name: Name,
        ns: &Namespace,
        getter: ObjectId,
    ) -> ObjectResult<()> {
        self.declare_accessor(obj, name, ns, getter, MemberSlot::declare_getter)
    }

    /// Install a setter for `name` at `cur_level`, consuming the reference.
    pub fn set_setter_by_qname(
        &mut self,
        obj: ObjectId,
        name: Name,
        ns: &Namespace,
        setter: ObjectId,
    ) -> ObjectResult<()> {
        self.declare_accessor(obj, name, ns, setter, MemberSlot::declare_setter)
    }

    fn declare_accessor(
        &mut self,
        obj: ObjectId,
        name: Name,
        ns: &Namespace,
        function: ObjectId,
        declare: fn(&mut MemberSlot, ObjectId) -> ObjectResult<Declared>,
    ) -> ObjectResult<()> {
        self.function(function)?;
        let key = self.qname_key(name);
        let declared = {
            let object = self.object_mut(obj)?;
            if object.flags.contains(ObjectFlags::INITIALIZED) {
                Err(ObjectError::already_initialized())
            } else {
                let found = object.variables.find_or_create(
                    key,
                    NsQuery::Exact(ns),
                    object.cur_level,
                    false,
                );
                object
                    .variables
                    .slot_mut(found.entry)
                    .and_then(|slot| declare(slot, function))
            }
        };

        match declared {
            Ok(Declared::Installed) => {}
            Ok(Declared::AlreadyPresent) => self.dec_ref(function)?,
            Err(err) => {
                // The consumed reference has nowhere to go
                self.dec_ref(function)?;
                return Err(self.raise(err));
            }
        }
        self.check_table(obj)
    }

    /// Remove `mname` from `obj`, releasing what its slot owned.
    ///
    /// Absent names are a no-op. A name declared at more than one level
    /// cannot be deleted.
    pub fn delete_property(&mut self, obj: ObjectId, mname: &Multiname) -> ObjectResult<()> {
        let key = self.member_key(mname)?;
        let max_level = self.max_level(obj)?;
        let object = self.object(obj)?;
        let declaring: SmallVec<[u32; 2]> = (0..=max_level)
            .rev()
            .filter(|level| {
                object
                    .variables
                    .locate(key, NsQuery::AnyOf(mname), *level, false)
                    .is_some()
            })
            .collect();

        let level = match declaring.as_slice() {
            [] => return Ok(()),
            [level] => *level,
            many => {
                let err = ObjectError::ambiguous_deletion(many.len());
                return Err(self.named(self.raise(err), mname));
            }
        };
        let removed = self
            .object_mut(obj)?
            .variables
            .erase(key, mname, level)
            .map_err(|err| self.named(self.raise(err), mname))?;
        for owned in removed.into_owned() {
            self.dec_ref(owned)?;
        }
        self.check_table(obj)
    }

    /// Whether any level of `obj`'s own table declares `mname`.
    ///
    /// Accessors are not invoked.
    pub fn has_property(&self, obj: ObjectId, mname: &Multiname) -> ObjectResult<bool> {
        let key = self.member_key(mname)?;
        let level = self.max_level(obj)?;
        Ok(self
            .object(obj)?
            .variables
            .locate(key, NsQuery::AnyOf(mname), level, true)
            .is_some())
    }

    pub fn has_property_qname(&self, obj: ObjectId, name: Name, ns: &Namespace) -> ObjectResult<bool> {
        let key = self.qname_key(name);
        let level = self.max_level(obj)?;
        Ok(self
            .object(obj)?
            .variables
            .locate(key, NsQuery::Exact(ns), level, true)
            .is_some())
    }

    // Slots

    /// Bind slot `n` to the declaration of `name` at `cur_level`.
    pub fn init_slot(&mut self, obj: ObjectId, n: u32, name: Name, ns: &Namespace) -> ObjectResult<()> {
        let key = self.qname_key(name);
        let bound = {
            let object = self.object_mut(obj)?;
            if object.flags.contains(ObjectFlags::INITIALIZED) {
                Err(ObjectError::already_initialized())
            } else {
                let level = object.cur_level;
                object.variables.init_slot(n, level, key, ns)
            }
        };
        bound.map_err(|err| self.raise(err))
    }

    /// Borrowed value of slot `n`.
    pub fn get_slot(&self, obj: ObjectId, n: u32) -> ObjectResult<Option<ObjectId>> {
        self.object(obj)?
            .variables
            .get_slot(n)
            .map_err(|err| self.raise(err))
    }

    /// Store into slot `n`, consuming `value` and releasing the previous value.
    pub fn set_slot(&mut self, obj: ObjectId, n: u32, value: ObjectId) -> ObjectResult<()> {
        match self.object_mut(obj)?.variables.set_slot(n, value) {
            Ok(Some(previous)) => self.dec_ref(previous),
            Ok(None) => Ok(()),
            Err(err) => {
                self.dec_ref(value)?;
                Err(self.raise(err))
            }
        }
    }

    // Enumeration

    pub fn num_variables(&self, obj: ObjectId) -> ObjectResult<usize> {
        Ok(self.object(obj)?.variables.len())
    }

    /// Key of the `index`-th member in table order.
    pub fn name_at(&self, obj: ObjectId, index: usize) -> ObjectResult<MemberKey> {
        self.object(obj)?
            .variables
            .nth(index)
            .map(|view| view.key)
            .ok_or_else(|| self.raise(ObjectError::index_out_of_bounds(index)))
    }

    /// Borrowed value of the `index`-th member, invoking its getter if it has one.
    pub fn value_at(&mut self, obj: ObjectId, index: usize) -> ObjectResult<Option<ObjectId>> {
        let (readable, level) = {
            let view = self
                .object(obj)?
                .variables
                .nth(index)
                .ok_or_else(|| self.raise(ObjectError::index_out_of_bounds(index)))?;
            (view.slot.readable(), view.level)
        };
        match readable {
            Some(Readable::Value(value)) => Ok(Some(value)),
            Some(Readable::Getter(getter)) => self
                .invoke_getter(obj, getter, level, true)
                .map(|resolved| Some(resolved.value)),
            None => Ok(None),
        }
    }

    /// Linear lookup by `"namespace.name"`, or the bare name for the public namespace.
    pub fn get_variable_by_string(&self, obj: ObjectId, path: &str) -> ObjectResult<Option<ObjectId>> {
        let interner = self.interner();
        for view in self.object(obj)?.variables.iter() {
            let ns = interner.lookup(view.namespace.name());
            let local = view.key.text(interner);
            let matches = if ns.is_empty() {
                path == local
            } else {
                path.strip_prefix(ns)
                    .and_then(|rest| rest.strip_prefix('.'))
                    == Some(&*local)
            };
            if !matches {
                continue;
            }
            if view.slot.getter().is_some() {
                return Err(self.raise(ObjectError::getter_in_string_lookup().with_name(path)));
            }
            return Ok(view.slot.value());
        }
        Ok(None)
    }

    /// Log every member of `obj` at debug level.
    pub fn dump_variables(&self, obj: ObjectId) -> ObjectResult<()> {
        let interner = self.interner();
        for view in self.object(obj)?.variables.iter() {
            tracing::debug!(
                level = view.level,
                namespace = interner.lookup(view.namespace.name()),
                name = %view.key.text(interner),
                value = ?view.slot.value(),
                getter = ?view.slot.getter(),
                setter = ?view.slot.setter(),
                "variable"
            );
        }
        Ok(())
    }
}
