//! Hopscotch-hashed interning table.
//!
//! Open-addressed hash table with a fixed neighborhood of `H` = bits-in-word
//! slots per home bucket. Each home bucket stores a `hop` bitmap marking which
//! of the next `H` slots hold an entry whose home is this bucket. Lookup only
//! ever scans those `H` slots. Insertion walks forward for the first empty
//! slot, then displaces entries backward toward home, following neighboring
//! buckets' hop chains, until an empty slot lands inside the neighborhood (or
//! the table doubles and rehashes). Load factor target is 60%.
//!
//! Ported from the C hopscotch table in the original MPPL compiler
//! (`hash_table.c`): same neighborhood size, same displacement search, same
//! growth trigger. `HopscotchTable` is parameterized by a hash function and an
//! equality function rather than `std::hash::Hash`/`PartialEq`, so the same
//! implementation backs pointer-identity, bytewise, and structural interning
//! strategies (`spec.md` §4.1's "three equality/hash strategies... used with
//! the same hopscotch implementation... parameterized, not inherited").

const NEIGHBORHOOD: usize = u64::BITS as usize;

struct Entry<K, V> {
    hop: u64,
    slot: Option<(u64, K, V)>,
}

/// A hopscotch-hashed table mapping `K` to `V`.
pub struct HopscotchTable<K, V> {
    buckets: Vec<Entry<K, V>>,
    capacity: usize,
    size: usize,
    hash: fn(&K) -> u64,
    eq: fn(&K, &K) -> bool,
}

impl<K: Clone, V: Clone> HopscotchTable<K, V> {
    pub fn new(hash: fn(&K) -> u64, eq: fn(&K, &K) -> bool) -> Self {
        let capacity = 1usize << 6;
        let mut table = HopscotchTable {
            buckets: Vec::new(),
            capacity,
            size: 0,
            hash,
            eq,
        };
        table.init_buckets();
        table
    }

    fn init_buckets(&mut self) {
        let bucket_count = self.capacity + NEIGHBORHOOD;
        self.buckets = (0..bucket_count)
            .map(|_| Entry { hop: 0, slot: None })
            .collect();
        self.size = 0;
    }

    fn home_index(&self, hash: u64) -> usize {
        (hash as usize) & (self.capacity - 1)
    }

    /// Find the value for a key equal to `key` under this table's equality
    /// function, if any.
    pub fn find(&self, key: &K) -> Option<&V> {
        let hash = (self.hash)(key);
        let home = self.home_index(hash);
        let mut hop = self.buckets[home].hop;
        while hop != 0 {
            let t = hop.trailing_zeros() as usize;
            if let Some((h, k, v)) = &self.buckets[home + t].slot {
                if *h == hash && (self.eq)(k, key) {
                    return Some(v);
                }
            }
            hop &= !(1u64 << t);
        }
        None
    }

    /// Insert `(key, value)` without checking whether an equal key already
    /// exists; callers that want upsert semantics call `find` first.
    pub fn insert_unchecked(&mut self, key: K, value: V) {
        let hash = (self.hash)(&key);
        self.insert_hashed(hash, key, value);
    }

    fn insert_hashed(&mut self, hash: u64, key: K, value: V) {
        let home = self.home_index(hash);
        let mut dist = 0usize;
        let mut empty = loop {
            if home + dist >= self.buckets.len() {
                break None;
            }
            if self.buckets[home + dist].slot.is_none() {
                break Some(home + dist);
            }
            dist += 1;
        };

        while let Some(empty_idx) = empty {
            if dist < NEIGHBORHOOD {
                break;
            }
            let search_start = empty_idx + 1 - NEIGHBORHOOD;
            let mut displaced = None;
            for i in 0..NEIGHBORHOOD {
                let candidate_home = search_start + i;
                let hop = self.buckets[candidate_home].hop;
                if hop == 0 {
                    continue;
                }
                let t = hop.trailing_zeros() as usize;
                if i + t < NEIGHBORHOOD {
                    let next = candidate_home + t;
                    let moved = self.buckets[next].slot.take();
                    self.buckets[empty_idx].slot = moved;
                    self.buckets[next].hop &= !(1 << t);
                    self.buckets[candidate_home].hop |= 1 << (NEIGHBORHOOD - i - 1);
                    dist -= NEIGHBORHOOD - 1 - i - t;
                    displaced = Some(next);
                    break;
                }
            }
            empty = displaced;
        }

        match empty {
            Some(idx) => {
                self.buckets[idx].slot = Some((hash, key, value));
                self.buckets[home].hop |= 1 << dist;
                self.size += 1;
                if 100 * self.size / self.buckets.len() >= 60 {
                    self.grow();
                }
            }
            None => {
                self.grow();
                self.insert_hashed(hash, key, value);
            }
        }
    }

    fn grow(&mut self) {
        let old = std::mem::replace(&mut self.buckets, Vec::new());
        self.capacity <<= 1;
        self.init_buckets();
        for entry in old {
            if let Some((hash, k, v)) = entry.slot {
                self.insert_hashed(hash, k, v);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// FNV-1a over raw bytes, used to hash interned string/byte content.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// An interned string: an index into a `StringInterner`'s arena. Equality
/// between two `Symbol`s from the same interner is index equality, which
/// matches `spec.md`'s "pointer equality downstream" guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// The interner-local index backing this symbol, for callers (e.g. the
    /// IR's constant pool) that need to hash or key on it directly.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Deduplicates strings by byte content (`spec.md` §4.1 strategy (b),
/// bytewise). Canonical bytes live in a growable arena so `Symbol` stays a
/// plain index; the hopscotch table only stores `(hash, index)` pairs with an
/// equality check that dereferences into the arena.
pub struct StringInterner {
    arena: Vec<Box<str>>,
    table: HopscotchTable<u32, ()>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            arena: Vec::new(),
            table: HopscotchTable::new(hash_by_arena_index, |_, _| false),
        }
    }

    /// Interns `text`, returning the same `Symbol` for equal byte content on
    /// every call.
    pub fn intern(&mut self, text: &str) -> Symbol {
        let hash = fnv1a(text.as_bytes());
        if let Some(id) = self.find_by_hash_and_text(hash, text) {
            return Symbol(id);
        }
        let id = self.arena.len() as u32;
        self.arena.push(text.into());
        self.table.insert_hashed_pub(hash, id);
        Symbol(id)
    }

    fn find_by_hash_and_text(&self, hash: u64, text: &str) -> Option<u32> {
        self.table.find_hashed_pub(hash, |&id| &*self.arena[id as usize] == text)
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.arena[symbol.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

/// Never called: `StringInterner` always looks itself up via
/// `find_by_hash_and_text` before falling back to `insert_hashed_pub`, so the
/// table's own `eq` closure (which has no arena access) is unreachable.
fn hash_by_arena_index(_id: &u32) -> u64 {
    0
}

// `StringInterner` needs hash-keyed lookup/insert with an externally supplied
// equality predicate (arena dereference), which the generic `eq: fn(&K,&K)`
// signature can't express. These inherent methods give it direct access to
// the table's bucket machinery without duplicating the hopscotch algorithm.
impl<V: Clone> HopscotchTable<u32, V> {
    pub(crate) fn find_hashed_pub(&self, hash: u64, mut matches: impl FnMut(&u32) -> bool) -> Option<u32> {
        let home = self.home_index(hash);
        let mut hop = self.buckets[home].hop;
        while hop != 0 {
            let t = hop.trailing_zeros() as usize;
            if let Some((h, k, _)) = &self.buckets[home + t].slot {
                if *h == hash && matches(k) {
                    return Some(*k);
                }
            }
            hop &= !(1u64 << t);
        }
        None
    }
}

impl HopscotchTable<u32, ()> {
    pub(crate) fn insert_hashed_pub(&mut self, hash: u64, id: u32) {
        self.insert_hashed(hash, id, ());
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_returns_same_symbol() {
        let mut interner = StringInterner::new();
        let a = interner.intern("hello");
        let b = interner.intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_distinct_text_returns_distinct_symbols() {
        let mut interner = StringInterner::new();
        let a = interner.intern("hello");
        let b = interner.intern("world");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_round_trips_text() {
        let mut interner = StringInterner::new();
        let sym = interner.intern("procedure");
        assert_eq!(interner.resolve(sym), "procedure");
    }

    #[test]
    fn survives_growth_past_initial_capacity() {
        let mut interner = StringInterner::new();
        let mut symbols = Vec::new();
        for i in 0..500 {
            symbols.push((i, interner.intern(&format!("sym{i}"))));
        }
        for (i, sym) in symbols {
            assert_eq!(interner.resolve(sym), format!("sym{i}"));
        }
    }

    #[test]
    fn fnv1a_matches_known_vector() {
        // FNV-1a of the empty string is the offset basis.
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
    }

    #[test]
    fn generic_table_round_trips_pointer_identity() {
        fn hash_ptr(v: &&str) -> u64 {
            fnv1a(&(*v as *const str as *const u8 as usize).to_ne_bytes())
        }
        let mut table: HopscotchTable<&str, i32> = HopscotchTable::new(hash_ptr, |a, b| {
            std::ptr::eq(*a as *const str, *b as *const str)
        });
        let s = "fixed";
        table.insert_unchecked(s, 42);
        assert_eq!(table.find(&s), Some(&42));
    }
}
