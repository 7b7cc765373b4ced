//! Level-aware variable tables.
//!
//! A table maps a member name to every declaration of it, one per
//! `(level, namespace)`. Declarations of one name are kept in descending
//! level order, so the most-derived declaration is seen first and a scan
//! that "searches previous levels" is a bounded walk toward level 0.
//!
//! Entries live in a position-stable arena. A numeric slot array records
//! positions resolved once at link time, giving O(1) access that bypasses
//! the name lookup.

use std::collections::BTreeMap;

use avm_names::{MemberKey, Multiname, Namespace, StringLookup};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{MemberSlot, ObjectError, ObjectId, ObjectResult};

/// Stable position of an entry inside its table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

impl EntryId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Namespace constraint of a lookup.
#[derive(Copy, Clone, Debug)]
pub enum NsQuery<'a> {
    /// Exactly this namespace.
    Exact(&'a Namespace),
    /// Any candidate of the multiname.
    AnyOf(&'a Multiname),
}

impl NsQuery<'_> {
    #[inline]
    fn matches(&self, ns: &Namespace) -> bool {
        match self {
            NsQuery::Exact(exact) => *exact == ns,
            NsQuery::AnyOf(mname) => mname.has_namespace(ns),
        }
    }

    /// The namespace a created entry is declared under.
    ///
    /// An ambiguous multiname cannot say which candidate the member was
    /// declared in; the entry goes under the public namespace.
    fn insertion_namespace(&self) -> (Namespace, bool) {
        match self {
            NsQuery::Exact(exact) => (**exact, false),
            NsQuery::AnyOf(mname) if mname.is_ambiguous() => (Namespace::PUBLIC, true),
            NsQuery::AnyOf(mname) => (mname.namespaces()[0], false),
        }
    }
}

/// A lookup hit: where the entry is and the level it was declared at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Found {
    pub entry: EntryId,
    pub level: u32,
}

#[derive(Clone, Debug)]
struct TableEntry {
    key: MemberKey,
    level: u32,
    ns: Namespace,
    slot: MemberSlot,
}

/// Borrowed view of one entry, yielded in table order.
#[derive(Copy, Clone, Debug)]
pub struct EntryView<'a> {
    pub id: EntryId,
    pub key: MemberKey,
    pub level: u32,
    pub namespace: Namespace,
    pub slot: &'a MemberSlot,
}

/// Ordered `(key, level) -> (namespace, slot)` multimap with slot indexing.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    entries: Vec<Option<TableEntry>>,
    vacant: Vec<u32>,
    /// Per key, entry positions sorted by level, descending.
    by_key: BTreeMap<MemberKey, SmallVec<[EntryId; 2]>>,
    /// `slots[n - 1]` is the position bound to slot `n`.
    slots: Vec<Option<EntryId>>,
    ambiguous_inserts: u64,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Times a create fell back to the public namespace for an ambiguous multiname.
    pub fn ambiguous_inserts(&self) -> u64 {
        self.ambiguous_inserts
    }

    fn entry(&self, id: EntryId) -> ObjectResult<&TableEntry> {
        self.entries
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ObjectError::corrupt_table(id.0))
    }

    /// Declarations of `key` at `level`, or at every level `<= level` when
    /// `search_previous` is set, most-derived first.
    fn candidates(
        &self,
        key: MemberKey,
        level: u32,
        search_previous: bool,
    ) -> impl Iterator<Item = (EntryId, &TableEntry)> + '_ {
        self.by_key
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(move |id| {
                self.entries
                    .get(id.index())
                    .and_then(Option::as_ref)
                    .map(|entry| (*id, entry))
            })
            .skip_while(move |(_, entry)| entry.level > level)
            .take_while(move |(_, entry)| search_previous || entry.level == level)
    }

    /// Every namespace-matching declaration in the candidate range.
    pub fn matches<'a>(
        &'a self,
        key: MemberKey,
        query: NsQuery<'a>,
        level: u32,
        search_previous: bool,
    ) -> impl Iterator<Item = Found> + 'a {
        self.candidates(key, level, search_previous)
            .filter(move |(_, entry)| query.matches(&entry.ns))
            .map(|(entry, record)| Found {
                entry,
                level: record.level,
            })
    }

    /// First namespace-matching declaration, without creating one.
    pub fn locate(
        &self,
        key: MemberKey,
        query: NsQuery<'_>,
        level: u32,
        search_previous: bool,
    ) -> Option<Found> {
        self.matches(key, query, level, search_previous).next()
    }

    /// Find a declaration of `key`, scanning from `level` downward when
    /// `search_previous` is set.
    ///
    /// The hit reports the level it was declared at. With `create`, a miss
    /// inserts an empty slot at the starting `level`, so the result is
    /// always `Some`.
    pub fn find(
        &mut self,
        key: MemberKey,
        query: NsQuery<'_>,
        level: u32,
        create: bool,
        search_previous: bool,
    ) -> Option<Found> {
        match self.locate(key, query, level, search_previous) {
            Some(found) => Some(found),
            None if create => Some(self.create(key, query, level)),
            None => None,
        }
    }

    /// [`Self::find`] with `create` set.
    pub fn find_or_create(
        &mut self,
        key: MemberKey,
        query: NsQuery<'_>,
        level: u32,
        search_previous: bool,
    ) -> Found {
        match self.locate(key, query, level, search_previous) {
            Some(found) => found,
            None => self.create(key, query, level),
        }
    }

    fn create(&mut self, key: MemberKey, query: NsQuery<'_>, level: u32) -> Found {
        let (ns, ambiguous) = query.insertion_namespace();
        if ambiguous {
            self.ambiguous_inserts += 1;
            tracing::debug!(
                ?key,
                level,
                total = self.ambiguous_inserts,
                "ambiguous multiname declared under the public namespace"
            );
            // The fallback declaration may already exist
            if let Some(found) = self.locate(key, NsQuery::Exact(&Namespace::PUBLIC), level, false) {
                return found;
            }
        }
        let entry = self.insert(key, level, ns, MemberSlot::EMPTY);
        Found { entry, level }
    }

    fn insert(&mut self, key: MemberKey, level: u32, ns: Namespace, slot: MemberSlot) -> EntryId {
        let record = TableEntry {
            key,
            level,
            ns,
            slot,
        };
        let id = match self.vacant.pop() {
            Some(position) => {
                self.entries[position as usize] = Some(record);
                EntryId(position)
            }
            None => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "tables never approach u32::MAX members"
                )]
                let position = self.entries.len() as u32;
                self.entries.push(Some(record));
                EntryId(position)
            }
        };

        let entries = &self.entries;
        let list = self.by_key.entry(key).or_default();
        // After every declaration at a level >= `level`
        let at = list
            .iter()
            .position(|other| {
                entries
                    .get(other.index())
                    .and_then(Option::as_ref)
                    .is_some_and(|entry| entry.level < level)
            })
            .unwrap_or(list.len());
        list.insert(at, id);
        id
    }

    pub fn slot(&self, id: EntryId) -> ObjectResult<&MemberSlot> {
        self.entry(id).map(|entry| &entry.slot)
    }

    pub fn slot_mut(&mut self, id: EntryId) -> ObjectResult<&mut MemberSlot> {
        self.entries
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .map(|entry| &mut entry.slot)
            .ok_or(ObjectError::corrupt_table(id.0))
    }

    /// The declaration at `level` matching the candidates of `mname`.
    ///
    /// Candidates are tried in their order; the first match is removed and its
    /// slot handed back so the caller can release the references it owns.
    pub fn erase(&mut self, key: MemberKey, mname: &Multiname, level: u32) -> ObjectResult<MemberSlot> {
        let range: SmallVec<[(EntryId, Namespace); 2]> = self
            .candidates(key, level, false)
            .map(|(id, entry)| (id, entry.ns))
            .collect();
        if range.is_empty() {
            return Err(ObjectError::variable_not_found());
        }

        let physical = range
            .iter()
            .filter(|(_, ns)| mname.has_namespace(ns))
            .count();
        if physical > 1 {
            return Err(ObjectError::duplicate_declaration(format!(
                "{physical} namespaces at level {level}"
            )));
        }

        let target = mname
            .namespaces()
            .iter()
            .find_map(|wanted| range.iter().find(|(_, ns)| ns == wanted))
            .map(|(id, _)| *id)
            .ok_or(ObjectError::variable_not_found())?;
        self.remove(target)
    }

    fn remove(&mut self, id: EntryId) -> ObjectResult<MemberSlot> {
        let entry = self
            .entries
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(ObjectError::corrupt_table(id.0))?;

        if let Some(list) = self.by_key.get_mut(&entry.key) {
            list.retain(|other| *other != id);
            if list.is_empty() {
                self.by_key.remove(&entry.key);
            }
        }
        for bound in &mut self.slots {
            if *bound == Some(id) {
                *bound = None;
            }
        }
        self.vacant.push(id.0);
        Ok(entry.slot)
    }

    /// Bind slot `n` (1-based) to the declaration `(key, level, ns)`.
    pub fn init_slot(&mut self, n: u32, level: u32, key: MemberKey, ns: &Namespace) -> ObjectResult<()> {
        if n == 0 {
            return Err(ObjectError::slot_out_of_bounds(n, self.slots.len()));
        }
        if n as usize > self.slots.len() {
            self.slots.resize(n as usize, None);
        }
        let found = self
            .locate(key, NsQuery::Exact(ns), level, false)
            .ok_or(ObjectError::variable_not_found())?;
        self.slots[n as usize - 1] = Some(found.entry);
        Ok(())
    }

    fn bound_slot(&self, n: u32) -> ObjectResult<Option<EntryId>> {
        match n.checked_sub(1).and_then(|i| self.slots.get(i as usize)) {
            Some(bound) => Ok(*bound),
            None => Err(ObjectError::slot_out_of_bounds(n, self.slots.len())),
        }
    }

    /// Value stored in slot `n`; `None` when unbound or unassigned.
    pub fn get_slot(&self, n: u32) -> ObjectResult<Option<ObjectId>> {
        match self.bound_slot(n)? {
            Some(id) => Ok(self.slot(id)?.value()),
            None => Ok(None),
        }
    }

    /// Store `value` in slot `n`, returning the previous value to release.
    pub fn set_slot(&mut self, n: u32, value: ObjectId) -> ObjectResult<Option<ObjectId>> {
        let id = self
            .bound_slot(n)?
            .ok_or(ObjectError::slot_uninitialized(n))?;
        let slot = self.slot_mut(id)?;
        if slot.is_accessor() {
            return Err(ObjectError::slot_has_accessor(n));
        }
        slot.replace_value(value)
    }

    /// Number of slot indices allocated so far.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Entries in table order: by key, then by level descending.
    pub fn iter(&self) -> impl Iterator<Item = EntryView<'_>> + '_ {
        self.by_key.values().flatten().filter_map(|id| {
            self.entries
                .get(id.index())
                .and_then(Option::as_ref)
                .map(|entry| EntryView {
                    id: *id,
                    key: entry.key,
                    level: entry.level,
                    namespace: entry.ns,
                    slot: &entry.slot,
                })
        })
    }

    /// The `index`-th entry in table order.
    pub fn nth(&self, index: usize) -> Option<EntryView<'_>> {
        self.iter().nth(index)
    }

    /// Empty the table, collecting every owned reference into `released`.
    pub fn drain_into(&mut self, released: &mut Vec<ObjectId>) {
        for entry in self.entries.drain(..).flatten() {
            released.extend(entry.slot.into_owned());
        }
        self.vacant.clear();
        self.by_key.clear();
        self.slots.clear();
    }

    /// Structural consistency check.
    ///
    /// Every indexed position is live, levels descend per key, and no
    /// `(key, level, namespace)` is declared twice. `names` renders the
    /// offending member.
    pub fn verify<L: StringLookup + ?Sized>(&self, names: &L) -> ObjectResult<()> {
        let mut seen = FxHashSet::default();
        for (key, list) in &self.by_key {
            let mut previous = u32::MAX;
            for id in list {
                let entry = self.entry(*id)?;
                if entry.key != *key || entry.level > previous {
                    return Err(ObjectError::corrupt_table(id.0));
                }
                previous = entry.level;
                if !seen.insert((entry.key, entry.level, entry.ns)) {
                    return Err(ObjectError::duplicate_declaration(format!(
                        "{} at level {}",
                        key.text(names),
                        entry.level
                    )));
                }
            }
        }
        if seen.len() != self.len() {
            return Err(ObjectError::corrupt_table(u32::MAX));
        }
        for id in self.slots.iter().flatten() {
            self.entry(*id)?;
        }
        Ok(())
    }
}
