//! Per-process image maps and address-to-symbol resolution.
//!
//! The resolver tracks which image occupies which address interval in each
//! process, driven by load/unload notifications from the state sink. Symbol
//! tables are produced by an external [`SymbolEnumerator`] the first time an
//! image is queried and cached for the rest of the run.

use hashbrown::HashMap;
use std::collections::BTreeMap;

pub type Pid = u64;
pub type Address = u64;
pub type Offset = u64;

/// A loaded module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Image {
    pub size: u64,
    pub checksum: u32,
    pub timestamp: u32,
    pub filename: String,
}

/// A named code region, at `offset` relative to its image's base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub offset: Offset,
    pub size: u64,
}

/// External collaborator producing the symbols of an image.
///
/// The production binding wraps the platform debug-information library;
/// tests supply a programmable fake.
pub trait SymbolEnumerator {
    fn enumerate(&mut self, image: &Image) -> Vec<Symbol>;
}

/// Enumerator used when no debug information source is available.
#[derive(Debug, Default)]
pub struct NullEnumerator;

impl SymbolEnumerator for NullEnumerator {
    fn enumerate(&mut self, _image: &Image) -> Vec<Symbol> {
        Vec::new()
    }
}

pub struct SymbolResolver<E> {
    enumerator: E,

    /// Images loaded in each process, keyed by base address.
    pid_to_images: HashMap<Pid, BTreeMap<Address, Image>>,

    /// Symbols of every image queried so far, sorted by offset.
    symbol_cache: HashMap<Image, Vec<Symbol>>,
}

impl<E> SymbolResolver<E> {
    pub fn new(enumerator: E) -> Self {
        Self {
            enumerator,
            pid_to_images: HashMap::new(),
            symbol_cache: HashMap::new(),
        }
    }

    /// Records that `image` has been loaded at `base_address`. A second
    /// load at the same `(pid, base)` overwrites the first.
    pub fn load_image(&mut self, pid: Pid, base_address: Address, image: Image) {
        self.pid_to_images
            .entry(pid)
            .or_default()
            .insert(base_address, image);
    }

    /// Records that the image at `base_address` has been unloaded.
    /// Tolerates an unknown pid or base; the pid bucket persists even when
    /// it empties.
    pub fn unload_image(&mut self, pid: Pid, base_address: Address) {
        if let Some(images) = self.pid_to_images.get_mut(&pid) {
            images.remove(&base_address);
        }
    }

    /// Finds the image whose interval `[base, base + size)` contains
    /// `address`: the greatest base not exceeding the address, bounds
    /// checked against that image's size. Overlapping intervals are not an
    /// error; the later-based image wins for addresses inside it.
    pub fn find_image(&self, pid: Pid, address: Address) -> Option<(Address, &Image)> {
        let images = self.pid_to_images.get(&pid)?;
        let (&base, image) = images.range(..=address).next_back()?;
        if address >= base.wrapping_add(image.size) {
            return None;
        }
        Some((base, image))
    }
}

impl<E: SymbolEnumerator> SymbolResolver<E> {
    /// Resolves `address` within process `pid` to a symbol.
    ///
    /// The containing symbol is the one with the greatest offset not
    /// exceeding `address - base`; the span check uses a closed upper
    /// bound, so the address one past a symbol's last byte still resolves
    /// to it.
    pub fn resolve_symbol(&mut self, pid: Pid, address: Address) -> Option<Symbol> {
        let (base, image) = {
            let (base, image) = self.find_image(pid, address)?;
            (base, image.clone())
        };

        let enumerator = &mut self.enumerator;
        let symbols = self.symbol_cache.entry(image).or_insert_with_key(|image| {
            let mut symbols = enumerator.enumerate(image);
            symbols.sort_by_key(|symbol| symbol.offset);
            symbols
        });

        let offset = address - base;
        let candidates = symbols.partition_point(|symbol| symbol.offset <= offset);
        let symbol = symbols[..candidates].last()?;
        if offset > symbol.offset + symbol.size {
            return None;
        }
        Some(symbol.clone())
    }
}
