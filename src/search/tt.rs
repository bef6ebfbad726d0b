use crate::moves::types::Move;

// Make sure MATE_THRESHOLD matches what we define in search.rs (30000)
pub const MATE_THRESHOLD: i32 = 30000;

/// Entries sharing a bucket absorb key collisions instead of evicting each
/// other outright; four slots keeps probe/store cache-friendly (one or two
/// cache lines) while still giving a replacement scheme room to prefer
/// deeper searches over shallow ones.
const BUCKET_SIZE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeType {
    Exact = 0,
    LowerBound = 1, // Beta cutoff (failed high)
    UpperBound = 2, // Alpha cutoff (failed low)
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i16,
    pub depth: u8,
    pub bound: u8, // 0=Exact, 1=Lower, 2=Upper
    pub generation: u8,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        key: 0,
        best_move: None,
        score: 0,
        depth: 0,
        bound: 0,
        generation: 0,
    };

    fn is_empty(&self) -> bool {
        self.key == 0 && self.depth == 0 && self.best_move.is_none()
    }
}

pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    num_buckets: usize,
    pub generation: u8,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        // Allocate TT based on size in MB, rounding down to a power-of-two
        // bucket count so the index can be a mask instead of a modulo.
        let entry_size = std::mem::size_of::<TTEntry>();
        let num_entries = (size_mb * 1024 * 1024) / entry_size;
        let num_buckets_target = (num_entries / BUCKET_SIZE).max(1);

        let mut num_buckets = 1;
        while num_buckets * 2 <= num_buckets_target {
            num_buckets *= 2;
        }

        Self {
            entries: vec![TTEntry::EMPTY; num_buckets * BUCKET_SIZE],
            num_buckets,
            generation: 0,
        }
    }

    fn bucket(&self, key: u64) -> &[TTEntry] {
        let base = (key as usize & (self.num_buckets - 1)) * BUCKET_SIZE;
        &self.entries[base..base + BUCKET_SIZE]
    }

    fn bucket_mut(&mut self, key: u64) -> &mut [TTEntry] {
        let base = (key as usize & (self.num_buckets - 1)) * BUCKET_SIZE;
        &mut self.entries[base..base + BUCKET_SIZE]
    }

    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = TTEntry::EMPTY;
        }
        self.generation = 0;
    }

    pub fn save(
        &mut self,
        key: u64,
        mv: Option<Move>,
        score: i32,
        depth: u8,
        bound: u8,
        _ply: i32,
    ) {
        let score_i16 = score.clamp(-32000, 32000) as i16;
        let generation = self.generation;
        let bucket = self.bucket_mut(key);

        if let Some(slot) = bucket.iter_mut().find(|e| e.key == key) {
            if depth >= slot.depth || slot.generation != generation {
                let best_move = if mv.is_some() { mv } else { slot.best_move };
                *slot = TTEntry {
                    key,
                    best_move,
                    score: score_i16,
                    depth,
                    bound,
                    generation,
                };
            }
            return;
        }

        if let Some(slot) = bucket.iter_mut().find(|e| e.is_empty()) {
            *slot = TTEntry {
                key,
                best_move: mv,
                score: score_i16,
                depth,
                bound,
                generation,
            };
            return;
        }

        // No free slot and no matching key: replace the weakest entry,
        // preferring the shallowest depth and, among equal depths, the
        // oldest generation. Only overwrite if the new entry is at least
        // as valuable, so a deep hit isn't evicted by a shallow probe.
        let weakest = bucket
            .iter_mut()
            .min_by_key(|e| (e.depth, std::cmp::Reverse(generation.wrapping_sub(e.generation))))
            .expect("bucket is never empty");

        if depth >= weakest.depth {
            *weakest = TTEntry {
                key,
                best_move: mv,
                score: score_i16,
                depth,
                bound,
                generation,
            };
        }
    }

    pub fn probe(
        &self,
        key: u64,
        _depth: u8,
        _alpha: i32,
        _beta: i32,
        _ply: i32,
    ) -> Option<(Option<Move>, i32, u8, u8)> {
        self.bucket(key)
            .iter()
            .find(|e| e.key == key)
            .map(|e| (e.best_move, e.score as i32, e.depth, e.bound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_after_save_round_trips() {
        let mut tt = TranspositionTable::new(1);
        tt.save(42, None, 100, 5, NodeType::Exact as u8, 0);
        let (mv, score, depth, bound) = tt.probe(42, 0, -1000, 1000, 0).unwrap();
        assert_eq!(mv, None);
        assert_eq!(score, 100);
        assert_eq!(depth, 5);
        assert_eq!(bound, NodeType::Exact as u8);
    }

    #[test]
    fn probe_miss_on_different_key_in_same_bucket() {
        let mut tt = TranspositionTable::new(1);
        tt.save(1, None, 10, 1, NodeType::Exact as u8, 0);
        assert!(tt.probe(2, 0, -1000, 1000, 0).is_none());
    }

    #[test]
    fn bucket_prefers_deepest_entry_when_full() {
        // size_mb = 0 rounds down to a single bucket, so every key below
        // collides into the same BUCKET_SIZE-slot bucket.
        let mut tt = TranspositionTable::new(0);
        for key in 1..=BUCKET_SIZE as u64 {
            tt.save(key, None, 0, key as u8, NodeType::Exact as u8, 0);
        }
        // Bucket is now full (depths 1..=BUCKET_SIZE). A shallower probe
        // should not evict any of the existing, deeper entries.
        tt.save(100, None, 0, 0, NodeType::Exact as u8, 0);
        for key in 1..=BUCKET_SIZE as u64 {
            assert!(tt.probe(key, 0, -1000, 1000, 0).is_some());
        }
        assert!(tt.probe(100, 0, -1000, 1000, 0).is_none());

        // A deep enough probe does evict the weakest (depth 1) entry.
        tt.save(200, None, 0, 9, NodeType::Exact as u8, 0);
        assert!(tt.probe(200, 0, -1000, 1000, 0).is_some());
        assert!(tt.probe(1, 0, -1000, 1000, 0).is_none());
    }

    #[test]
    fn clear_resets_generation_and_entries() {
        let mut tt = TranspositionTable::new(1);
        tt.save(7, None, 1, 1, NodeType::Exact as u8, 0);
        tt.new_search();
        tt.clear();
        assert_eq!(tt.generation, 0);
        assert!(tt.probe(7, 0, -1000, 1000, 0).is_none());
    }
}
