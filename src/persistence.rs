//! On-disk format: the black-to-move array, then the white-to-move array,
//! each record written as a raw 8-byte word in the host's native byte
//! order (so a completed file can be mapped back in directly as
//! `AtomicU64`s with no deserialization step), followed by a 16-byte
//! trailer `{magic, level_count}` that marks the file complete and
//! records how many retrograde BFS levels it took to build.
//!
//! Note for anyone reading a file with an external tool: a record's
//! packed fields (classification, ply, children, visited) only ever need
//! `ceil((5 + ply_bits + 2 * children_bits) / 8)` bytes — 4 for the 64x64
//! target — but this implementation rounds every record's on-disk width
//! up to a full 8-byte cell. That's what lets `open_mmap` map the file
//! straight in as an `&[AtomicU64]`; a tightly packed record can't be
//! read or written atomically without an unpack/repack step on every
//! access. A consumer computing the expected file size from the packed
//! bit width alone will get a smaller number than `store_len`'s.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::geometry::BoardConfig;
use crate::error::PersistError;
use crate::position::Side;
use crate::record::{checked_mmap, RecordLayout, RecordStore};

const MAGIC: u64 = 0x4b524b5f54423031; // "KRK_TB01" in ASCII, read in native byte order.
const TRAILER_BYTES: u64 = 16;

/// The self-describing-by-convention path for a board's tablebase file:
/// `<prefix>/board{Bx}x{By}/partition{Px}x{Py}/tablebase.bin`.
pub fn table_path(prefix: &Path, config: &BoardConfig) -> PathBuf {
    prefix
        .join(format!("board{}x{}", config.board_x, config.board_y))
        .join(format!("partition{}x{}", config.blocks_x, config.blocks_y))
        .join("tablebase.bin")
}

/// Writes a heap-backed store to a new file. Refuses to overwrite an
/// existing file: tablebases are large and expensive to rebuild, so an
/// accidental overwrite is not something to recover from silently.
pub fn write(store: &RecordStore, path: &Path, level_count: u64) -> Result<(), PersistError> {
    if path.exists() {
        return Err(PersistError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for side in [Side::Black, Side::White] {
        for idx in 0..store.len() {
            writer.write_all(&store.get_raw(side, idx).to_ne_bytes())?;
        }
    }
    writer.write_all(&MAGIC.to_ne_bytes())?;
    writer.write_all(&level_count.to_ne_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Opens a previously written tablebase as a read-only memory map. The
/// in-memory record arrays are direct views over the mapping: there is no
/// deserialization step.
pub fn open_mmap(path: &Path, config: &BoardConfig) -> Result<(RecordStore, u64), PersistError> {
    if !path.exists() {
        return Err(PersistError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let len = store_len(config);
    let expected = 2 * len * 8 + TRAILER_BYTES;
    let actual = file.metadata()?.len();
    if actual != expected {
        return Err(PersistError::SizeMismatch { expected, actual });
    }

    let mapping = checked_mmap(&file)?;
    let trailer_offset = (expected - TRAILER_BYTES) as usize;
    let magic = u64::from_ne_bytes(mapping[trailer_offset..trailer_offset + 8].try_into().unwrap());
    if magic != MAGIC {
        return Err(PersistError::BadTrailer);
    }
    let level_count = u64::from_ne_bytes(mapping[trailer_offset + 8..trailer_offset + 16].try_into().unwrap());

    let layout = RecordLayout::new(config).map_err(|_| PersistError::BadTrailer)?;
    let store = RecordStore::from_mmap(layout, len, mapping);
    Ok((store, level_count))
}

fn store_len(config: &BoardConfig) -> u64 {
    config.total_positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoardConfig;
    use crate::position::Side;

    #[test]
    fn round_trips_heap_to_mmap() {
        let config = BoardConfig::new(16, 16, 4, 4).unwrap();
        let store = RecordStore::new_heap(&config).unwrap();
        store.set_classification(Side::Black, 7, crate::record::CLASS_LEGAL, 3);
        store.set_ply_direct(Side::Black, 7, 5);
        store.set_classification(Side::White, 42, crate::record::CLASS_LEGAL | crate::record::CLASS_DRAW, 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tb.bin");
        write(&store, &path, 5).unwrap();

        let (mapped, level_count) = open_mmap(&path, &config).unwrap();
        assert_eq!(level_count, 5);
        for side in [Side::Black, Side::White] {
            for idx in 0..config.total_positions {
                assert_eq!(store.get_raw(side, idx), mapped.get_raw(side, idx));
            }
        }
    }

    #[test]
    fn refuses_to_overwrite_existing_file() {
        let config = BoardConfig::new(8, 8, 4, 4).unwrap();
        let store = RecordStore::new_heap(&config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tb.bin");
        write(&store, &path, 0).unwrap();
        assert!(matches!(write(&store, &path, 0), Err(PersistError::AlreadyExists(_))));
    }

    #[test]
    fn table_path_embeds_board_and_partition_dimensions() {
        let config = BoardConfig::new(64, 64, 8, 8).unwrap();
        let path = table_path(Path::new("/data"), &config);
        assert_eq!(path, Path::new("/data/board64x64/partition8x8/tablebase.bin"));
    }

    #[test]
    fn rejects_size_mismatch() {
        let small_config = BoardConfig::new(8, 8, 4, 4).unwrap();
        let store = RecordStore::new_heap(&small_config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tb.bin");
        write(&store, &path, 0).unwrap();

        let big_config = BoardConfig::new(16, 16, 4, 4).unwrap();
        assert!(matches!(open_mmap(&path, &big_config), Err(PersistError::SizeMismatch { .. })));
    }
}
