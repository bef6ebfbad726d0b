// Magic-number search and table construction for rook/bishop sliding attacks.
//
// For each square we compute the "relevant occupancy" mask (the ray squares
// that can ever matter, excluding the board edge a blocker sits on since
// nothing lies beyond it), enumerate every blocker subset of that mask, and
// search for a magic multiplier that hashes each subset to a unique index
// without colliding attack sets (`search::find_magic_number_for_square`).

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub enum MagicTableSeed {
    /// Seeded deterministically; same seed always yields the same tables.
    Fixed(u64),
    /// Seeded from OS entropy; tables differ across process runs.
    Random,
}

fn rook_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;
    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }
    mask
}

fn bishop_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;
    let dirs = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
    for (dr, df) in dirs {
        let mut r = rank + dr;
        let mut f = file + df;
        while r >= 1 && r <= 6 && f >= 1 && f <= 6 {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// Maps a 0..(1<<bits) subset index to the corresponding blocker bitboard
/// drawn from the bits set in `mask` (the classic "carry-rippler" trick).
fn blockers_from_index(index: usize, mask: u64) -> u64 {
    let mut blockers = 0u64;
    let mut m = mask;
    let mut i = index;
    while m != 0 {
        let bit = m & m.wrapping_neg();
        if i & 1 != 0 {
            blockers |= bit;
        }
        m &= m - 1;
        i >>= 1;
    }
    blockers
}

fn build_entry(
    square: usize,
    mask: u64,
    attack_fn: fn(usize, u64) -> u64,
    rng: &mut StdRng,
) -> Result<MagicEntry, String> {
    let bits = mask.count_ones();
    let size = 1usize << bits;
    let shift = 64 - bits;

    let mut blockers = Vec::with_capacity(size);
    let mut attacks = Vec::with_capacity(size);
    for index in 0..size {
        let b = blockers_from_index(index, mask);
        blockers.push(b);
        attacks.push(attack_fn(square, b));
    }

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let mut table = vec![0u64; size];
    for (&b, &a) in blockers.iter().zip(attacks.iter()) {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = a;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => {
            let mut raw = [0u8; 32];
            rand::RngCore::fill_bytes(&mut rand::rng(), &mut raw);
            StdRng::from_seed(raw)
        }
    };

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        let mask = rook_relevant_mask(square);
        rook_entries.push(build_entry(square, mask, rook_attacks_per_square, &mut rng)?);
    }
    for square in 0..64 {
        let mask = bishop_relevant_mask(square);
        bishop_entries.push(build_entry(square, mask, bishop_attacks_per_square, &mut rng)?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_mask_excludes_edges() {
        let mask = rook_relevant_mask(0); // a1
        assert_eq!(mask & 0x0101_0101_0101_0101, 0x0001_0101_0101_0100 & mask);
        assert_eq!(mask & (1 << 56), 0); // a8 edge excluded
        assert_eq!(mask & (1 << 7), 0); // h1 edge excluded
    }

    #[test]
    fn generated_tables_match_scan_for_every_square() {
        let tables = generate_magic_tables(MagicTableSeed::Fixed(7)).unwrap();
        for square in 0..64 {
            let blockers = 0x0000_1000_0010_0000u64;
            assert_eq!(
                tables.rook.get_attacks(square, blockers),
                rook_attacks_per_square(square, blockers)
            );
            assert_eq!(
                tables.bishop.get_attacks(square, blockers),
                bishop_attacks_per_square(square, blockers)
            );
        }
    }
}
