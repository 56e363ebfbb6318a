//! Bit-packed per-position records and the store that holds two dense
//! arrays of them (one per side to move), backed either by heap memory
//! during a build or by a read-only memory map when reading a finished
//! tablebase back.

use std::fs::File;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::{ConfigError, PersistError};
use crate::geometry::BoardConfig;
use crate::position::Side;

pub const CLASS_MATE: u8 = 1;
pub const CLASS_STALEMATE: u8 = 2;
pub const CLASS_DRAW: u8 = 4;
pub const CLASS_CHECK: u8 = 8;
pub const CLASS_LEGAL: u8 = 16;

const CLASSIFICATION_BITS: u32 = 5;

/// Bit widths and shifts for a single record, derived once from a
/// [`BoardConfig`] and shared by every record in both arrays.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    pub ply_bits: u32,
    pub children_bits: u32,
    classification_shift: u32,
    ply_shift: u32,
    children_shift: u32,
    visited_shift: u32,
    classification_mask: u64,
    ply_mask: u64,
    children_mask: u64,
    visited_mask: u64,
}

impl RecordLayout {
    pub fn new(config: &BoardConfig) -> Result<Self, ConfigError> {
        let ply_bits = config.ply_bits;
        let children_bits = config.children_bits;
        let total = CLASSIFICATION_BITS + ply_bits + 2 * children_bits;
        if total > 64 {
            return Err(ConfigError::RecordTooWide { bits: total });
        }

        let classification_shift = 0;
        let ply_shift = classification_shift + CLASSIFICATION_BITS;
        let children_shift = ply_shift + ply_bits;
        let visited_shift = children_shift + children_bits;

        Ok(Self {
            ply_bits,
            children_bits,
            classification_shift,
            ply_shift,
            children_shift,
            visited_shift,
            classification_mask: (1u64 << CLASSIFICATION_BITS) - 1,
            ply_mask: (1u64 << ply_bits) - 1,
            children_mask: (1u64 << children_bits) - 1,
            visited_mask: (1u64 << children_bits) - 1,
        })
    }

    /// Packs a freshly classified position: classification bits and the
    /// non-drawn child count, ply unknown (0) and visited count 0.
    pub fn encode_initial(&self, classification: u8, children: u32) -> u64 {
        (classification as u64 & self.classification_mask)
            | ((children as u64 & self.children_mask) << self.children_shift)
    }

    pub fn decode(&self, raw: u64) -> RecordView {
        let classification = ((raw >> self.classification_shift) & self.classification_mask) as u8;
        let ply_field = (raw >> self.ply_shift) & self.ply_mask;
        let ply = if ply_field == 0 { None } else { Some((ply_field - 1) as u32) };
        let children = ((raw >> self.children_shift) & self.children_mask) as u32;
        let visited = ((raw >> self.visited_shift) & self.visited_mask) as u32;
        RecordView { classification, ply, children, visited }
    }
}

/// The decoded view of a record: classification flags, the resolved mate
/// ply (if any), and the bookkeeping fields used by the retrograde pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView {
    pub classification: u8,
    pub ply: Option<u32>,
    pub children: u32,
    pub visited: u32,
}

impl RecordView {
    pub fn is_legal(&self) -> bool {
        self.classification & CLASS_LEGAL != 0
    }
    pub fn is_check(&self) -> bool {
        self.classification & CLASS_CHECK != 0
    }
    pub fn is_mate(&self) -> bool {
        self.classification & CLASS_MATE != 0
    }
    pub fn is_stalemate(&self) -> bool {
        self.classification & CLASS_STALEMATE != 0
    }
    pub fn is_draw(&self) -> bool {
        self.classification & CLASS_DRAW != 0
    }
}

enum Backing {
    Heap(Vec<AtomicU64>),
    /// A byte range within a shared file mapping: `offset_elements` and
    /// `len_elements` pick out this side's half of the two-array file.
    Mmap { mapping: Arc<Mmap>, offset_elements: usize, len_elements: usize },
}

impl Backing {
    fn as_atomic_slice(&self) -> &[AtomicU64] {
        match self {
            Backing::Heap(v) => v.as_slice(),
            Backing::Mmap { mapping, offset_elements, len_elements } => {
                // SAFETY: `persistence::write` lays out the black array
                // followed by the white array as contiguous, 8-byte-aligned
                // big-endian-on-disk-but-native-in-memory u64 cells (the
                // mapping is page-aligned, hence 8-byte-aligned); this
                // store is only ever constructed read-only over a
                // completed file, so nothing else in this process writes
                // through this mapping.
                let base = unsafe { (mapping.as_ptr() as *const AtomicU64).add(*offset_elements) };
                unsafe { std::slice::from_raw_parts(base, *len_elements) }
            }
        }
    }
}

/// Two parallel arrays of records, one per side to move, indexed by the
/// dense position index from [`BoardConfig`].
pub struct RecordStore {
    layout: RecordLayout,
    len: u64,
    black: Backing,
    white: Backing,
    mutable: bool,
}

impl RecordStore {
    pub fn new_heap(config: &BoardConfig) -> Result<Self, ConfigError> {
        let layout = RecordLayout::new(config)?;
        let len = config.total_positions;
        let make = || (0..len).map(|_| AtomicU64::new(0)).collect::<Vec<_>>();
        Ok(Self {
            layout,
            len,
            black: Backing::Heap(make()),
            white: Backing::Heap(make()),
            mutable: true,
        })
    }

    pub(crate) fn from_mmap(layout: RecordLayout, len: u64, mapping: Mmap) -> Self {
        let mapping = Arc::new(mapping);
        let black = Backing::Mmap { mapping: Arc::clone(&mapping), offset_elements: 0, len_elements: len as usize };
        let white = Backing::Mmap { mapping, offset_elements: len as usize, len_elements: len as usize };
        Self { layout, len, black, white, mutable: false }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn backing(&self, side: Side) -> &Backing {
        match side {
            Side::Black => &self.black,
            Side::White => &self.white,
        }
    }

    fn slice(&self, side: Side) -> &[AtomicU64] {
        self.backing(side).as_atomic_slice()
    }

    pub fn get(&self, side: Side, idx: u64) -> RecordView {
        let raw = self.slice(side)[idx as usize].load(Ordering::Acquire);
        self.layout.decode(raw)
    }

    pub fn get_raw(&self, side: Side, idx: u64) -> u64 {
        self.slice(side)[idx as usize].load(Ordering::Acquire)
    }

    pub fn set_classification(&self, side: Side, idx: u64, classification: u8, children: u32) {
        assert!(self.mutable, "set_classification called on a read-only record store");
        let raw = self.layout.encode_initial(classification, children);
        self.slice(side)[idx as usize].store(raw, Ordering::Release);
    }

    /// Increments the visited-children counter and returns the new count.
    /// Used to detect the moment a black-to-move parent has had every
    /// non-drawn child resolved.
    pub fn atomic_increment_visited(&self, side: Side, idx: u64) -> u32 {
        assert!(self.mutable, "atomic_increment_visited called on a read-only record store");
        let delta = 1u64 << self.layout.visited_shift;
        let prev = self.slice(side)[idx as usize].fetch_add(delta, Ordering::AcqRel);
        (((prev >> self.layout.visited_shift) & self.layout.visited_mask) as u32) + 1
    }

    /// Sets the ply field only if it is currently unknown, via
    /// compare-and-swap. Returns true if this call was the one that set it
    /// (first-writer-wins), false if another writer already had.
    pub fn try_set_ply(&self, side: Side, idx: u64, ply: u32) -> bool {
        assert!(self.mutable, "try_set_ply called on a read-only record store");
        let cell = &self.slice(side)[idx as usize];
        loop {
            let cur = cell.load(Ordering::Acquire);
            let ply_field = (cur >> self.layout.ply_shift) & self.layout.ply_mask;
            if ply_field != 0 {
                return false;
            }
            let new = (cur & !(self.layout.ply_mask << self.layout.ply_shift))
                | (((ply as u64) + 1) << self.layout.ply_shift);
            match cell.compare_exchange(cur, new, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(_) => continue,
            }
        }
    }

    /// Sets the ply field unconditionally. Only safe to call when exactly
    /// one thread can reach this point for a given record, as is the case
    /// for a black-to-move parent the instant its visited count reaches
    /// its child count.
    pub fn set_ply_direct(&self, side: Side, idx: u64, ply: u32) {
        assert!(self.mutable, "set_ply_direct called on a read-only record store");
        let cell = &self.slice(side)[idx as usize];
        loop {
            let cur = cell.load(Ordering::Acquire);
            let new = (cur & !(self.layout.ply_mask << self.layout.ply_shift))
                | (((ply as u64) + 1) << self.layout.ply_shift);
            if cell.compare_exchange(cur, new, Ordering::AcqRel, Ordering::Acquire).is_ok() {
                break;
            }
        }
    }
}

pub(crate) fn checked_mmap(file: &File) -> Result<Mmap, PersistError> {
    // SAFETY: the caller guarantees the backing file is not concurrently
    // modified by another process for the lifetime of the mapping, which
    // holds for the build/compare/probe-server binaries: a tablebase file
    // is only ever written once, atomically, before anything maps it.
    Ok(unsafe { Mmap::map(file)? })
}
