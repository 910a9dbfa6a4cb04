//! Append-only value interning.
//!
//! Repeated identifiers (operation names, image filenames, symbol names)
//! are stored once and referred to by a stable small [`Index`]. The table
//! never evicts; indices stay valid for the life of the process. The
//! dedup map stores only indices and hashes the interned value they point
//! at, so each value is kept exactly once.

use hashbrown::hash_map::{DefaultHashBuilder, HashMap, RawEntryMut};
use std::hash::{BuildHasher, Hash, Hasher};
use std::num::NonZeroUsize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Index(NonZeroUsize);

impl Index {
    #[inline]
    fn try_from_usize(index: usize) -> Option<Self> {
        NonZeroUsize::new(index.wrapping_add(1)).map(Self)
    }

    #[inline]
    pub fn to_usize(self) -> usize {
        self.0.get() - 1
    }
}

pub struct Flyweight<T> {
    dedup: HashMap<Index, (), ()>,
    hasher: DefaultHashBuilder,
    values: Vec<T>,
}

impl<T> Flyweight<T> {
    pub fn new() -> Self {
        Self {
            dedup: HashMap::default(),
            hasher: Default::default(),
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reverse lookup. Stable once the index has been issued.
    #[inline]
    pub fn resolve(&self, index: Index) -> Option<&T> {
        self.values.get(index.to_usize())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}

impl<T> Default for Flyweight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Flyweight<T>
where
    T: PartialEq + Eq + Hash,
{
    /// Returns the index of a previously interned value.
    #[inline]
    pub fn get(&self, value: &T) -> Option<Index> {
        let Self {
            dedup,
            hasher,
            values,
        } = self;
        let hash = make_hash(hasher, value);
        dedup
            .raw_entry()
            .from_hash(hash, |index| value == &values[index.to_usize()])
            .map(|(&index, &())| index)
    }

    /// Returns the existing index for `value` or allocates a new one.
    pub fn get_or_intern(&mut self, value: T) -> Index {
        let Self {
            dedup,
            hasher,
            values,
        } = self;
        let hash = make_hash(hasher, &value);
        let entry = dedup
            .raw_entry_mut()
            .from_hash(hash, |index| value == values[index.to_usize()]);

        let (&mut index, &mut ()) = match entry {
            RawEntryMut::Occupied(occupied) => occupied.into_key_value(),
            RawEntryMut::Vacant(vacant) => {
                let index = Index::try_from_usize(values.len()).expect("out of indices");
                values.push(value);
                vacant.insert_with_hasher(hash, index, (), |index| {
                    make_hash(hasher, &values[index.to_usize()])
                })
            }
        };

        index
    }
}

fn make_hash<T>(builder: &impl BuildHasher, value: &T) -> u64
where
    T: ?Sized + Hash,
{
    let state = &mut builder.build_hasher();
    value.hash(state);
    state.finish()
}
