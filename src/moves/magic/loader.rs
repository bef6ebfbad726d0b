// Process-wide magic bitboard tables, generated once on first use.
//
// Generation costs a few million magic-number probes; cache the result in a
// `OnceCell` rather than redo it per search or per test (mirrors the
// `zobrist_keys()` singleton pattern in `hash::zobrist`).

use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;
use once_cell::sync::OnceCell;

#[cfg(feature = "deterministic_magic")]
const MAGIC_SEED: u64 = 0x5EED_C0FF_EE15_BEEF;

fn seed() -> MagicTableSeed {
    #[cfg(feature = "deterministic_magic")]
    {
        MagicTableSeed::Fixed(MAGIC_SEED)
    }
    #[cfg(not(feature = "deterministic_magic"))]
    {
        MagicTableSeed::Random
    }
}

/// Returns the process-wide magic bitboard tables, generating them on first
/// call. Safe to call from every thread/test; generation happens once.
pub fn load_magic_tables() -> MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    // `MagicTables` doesn't implement Clone (boxed attack tables per square),
    // so callers get their own copy: cheap relative to a search tree, and it
    // keeps `MagicTables` an owned value everywhere else in the crate.
    let cached = TABLES.get_or_init(|| {
        generate_magic_tables(seed()).expect("magic table generation should not fail")
    });
    clone_tables(cached)
}

fn clone_tables(tables: &MagicTables) -> MagicTables {
    use super::structs::{BishopMagicTables, MagicEntry, RookMagicTables};

    fn clone_entry(e: &MagicEntry) -> MagicEntry {
        MagicEntry {
            magic: e.magic,
            shift: e.shift,
            mask: e.mask,
            table: e.table.clone(),
        }
    }

    MagicTables {
        rook: RookMagicTables {
            entries: tables.rook.entries.iter().map(clone_entry).collect(),
        },
        bishop: BishopMagicTables {
            entries: tables.bishop.entries.iter().map(clone_entry).collect(),
        },
    }
}
