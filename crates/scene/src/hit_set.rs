/// Fixed-capacity set of "hit" grid-cell ordinals, backed by a bitset.
///
/// Storage is allocated once for `capacity` ordinals and never grows. A
/// dataset reload with a different cell count builds a new set.
///
/// Ordinals must lie in `[0, capacity)`. That is the caller's contract: the
/// mutating paths only `debug_assert!` it, and an ordinal past the last
/// storage word panics on indexing.
///
/// Ordering contract:
/// - `iter`, `snapshot` and `clear` yield ordinals in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitIndexSet {
    words: Box<[u64]>,
    capacity: u32,
    len: usize,
}

impl HitIndexSet {
    pub fn new(capacity: u32) -> Self {
        Self {
            words: vec![0u64; words_for(capacity)].into_boxed_slice(),
            capacity,
            len: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of ordinals currently hit.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        let (word, bit) = word_bit(index);
        (self.words[word] & (1u64 << bit)) != 0
    }

    /// Marks `index` hit.
    ///
    /// Returns `true` if the set changed.
    #[inline]
    pub fn add(&mut self, index: u32) -> bool {
        debug_assert!(index < self.capacity, "hit index {index} out of range");
        let (word, bit) = word_bit(index);
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        self.len += 1;
        true
    }

    /// Unmarks `index`.
    ///
    /// Returns `true` if the set changed.
    #[inline]
    pub fn remove(&mut self, index: u32) -> bool {
        debug_assert!(index < self.capacity, "hit index {index} out of range");
        let (word, bit) = word_bit(index);
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) == 0 {
            return false;
        }
        *w &= !mask;
        self.len -= 1;
        true
    }

    /// Drops all prior membership and marks exactly `indices` hit.
    ///
    /// Duplicates collapse: the cardinality afterwards is the number of
    /// distinct ordinals given.
    pub fn replace_all<I>(&mut self, indices: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.reset();
        for index in indices {
            self.add(index);
        }
    }

    /// All hit ordinals, ascending, in a vector sized exactly to `len()`.
    pub fn snapshot(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter());
        out
    }

    /// Empties the set and returns what `snapshot()` held just before.
    pub fn clear(&mut self) -> Vec<u32> {
        let prior = self.snapshot();
        self.reset();
        prior
    }

    /// Iterates hit ordinals in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        HitIter {
            words: &self.words,
            word_index: 0,
            current_word: 0,
            base_index: 0,
        }
    }

    fn reset(&mut self) {
        self.words.fill(0);
        self.len = 0;
    }
}

fn words_for(capacity: u32) -> usize {
    (capacity as usize).div_ceil(64)
}

#[inline]
fn word_bit(index: u32) -> (usize, u32) {
    ((index / 64) as usize, index % 64)
}

struct HitIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current_word: u64,
    base_index: u32,
}

impl Iterator for HitIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let tz = self.current_word.trailing_zeros();
                self.current_word &= self.current_word - 1;
                return Some(self.base_index + tz);
            }

            let w = *self.words.get(self.word_index)?;
            self.current_word = w;
            self.base_index = (self.word_index as u32) * 64;
            self.word_index += 1;
        }
    }
}
