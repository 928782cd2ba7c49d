//! Substitution tables for the escaper
//!
//! A table maps every byte below [`TABLE_SIZE`] to an optional replacement
//! fragment. Tables are built by a `const fn`, so the statics below are fully
//! initialized before any code can read them.

/// Bytes at or above this value never have a substitution
pub const TABLE_SIZE: usize = 63;

/// One substitution: the fragment written in place of the original byte and
/// the number of bytes it adds to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub fragment: &'static str,
    pub extra: usize,
}

#[derive(Debug)]
pub struct SubstitutionTable {
    entries: [Option<Entry>; TABLE_SIZE],
}

impl SubstitutionTable {
    const fn build(pairs: &[(u8, &'static str)]) -> Self {
        let mut entries = [None; TABLE_SIZE];
        let mut i = 0;
        while i < pairs.len() {
            let (byte, fragment) = pairs[i];
            assert!((byte as usize) < TABLE_SIZE, "substituted byte outside table");
            entries[byte as usize] = Some(Entry {
                fragment,
                extra: fragment.len() - 1,
            });
            i += 1;
        }
        Self { entries }
    }

    /// Look up the substitution for a byte
    #[inline]
    pub fn get(&self, byte: u8) -> Option<Entry> {
        self.entries.get(byte as usize).copied().flatten()
    }

    /// Extra output length caused by a byte, zero when it is copied verbatim
    #[inline]
    pub fn extra(&self, byte: u8) -> usize {
        self.get(byte).map_or(0, |entry| entry.extra)
    }

    /// Count substitution sites and the total extra length for `bytes`
    pub fn measure(&self, bytes: &[u8]) -> (usize, usize) {
        bytes.iter().fold((0, 0), |(sites, delta), &byte| match self.get(byte) {
            Some(entry) => (sites + 1, delta + entry.extra),
            None => (sites, delta),
        })
    }
}

/// Full table: `"`, `'`, `&`, `<` and `>`
pub static HTML: SubstitutionTable = SubstitutionTable::build(&[
    (b'"', "&#34;"),
    (b'\'', "&#39;"),
    (b'&', "&amp;"),
    (b'<', "&lt;"),
    (b'>', "&gt;"),
]);

/// Element content only: `&`, `<` and `>`
pub static TEXT: SubstitutionTable =
    SubstitutionTable::build(&[(b'&', "&amp;"), (b'<', "&lt;"), (b'>', "&gt;")]);
