//! Bundled verse tables.
//!
//! All bundled text is the King James Version, which is in the public domain.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use lectio_canon::VerseReference;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Translation of every bundled text.
pub const BUNDLED_VERSION: &str = "KJV";

const POPULAR: [&str; 28] = [
    "Jeremiah 29:11",
    "Psalm 23:1",
    "Philippians 4:13",
    "Romans 8:28",
    "Isaiah 40:31",
    "John 3:16",
    "Proverbs 3:5-6",
    "Matthew 11:28",
    "John 14:27",
    "Romans 15:13",
    "Psalm 91:1-2",
    "James 1:5",
    "Psalm 37:5",
    "2 Corinthians 12:9",
    "Isaiah 26:3",
    "Psalm 103:3",
    "Colossians 3:23",
    "Ephesians 2:8",
    "1 John 4:19",
    "Psalm 46:10",
    "Romans 5:8",
    "Galatians 2:20",
    "Hebrews 11:1",
    "Matthew 6:26",
    "Psalm 139:14",
    "Isaiah 41:10",
    "Lamentations 3:22-23",
    "Psalm 27:1",
];

const JEREMIAH_29_11: &str = "For I know the thoughts that I think toward you, saith the LORD, thoughts of peace, \
    and not of evil, to give you an expected end.";
const PSALM_23_1: &str = "The LORD is my shepherd; I shall not want.";
const PHILIPPIANS_4_13: &str = "I can do all things through Christ which strengtheneth me.";
const ROMANS_8_28: &str = "And we know that all things work together for good to them that love God, \
    to them who are the called according to his purpose.";
const ISAIAH_40_31: &str = "But they that wait upon the LORD shall renew their strength; they shall mount up with \
    wings as eagles; they shall run, and not be weary; and they shall walk, and not faint.";
const JOHN_3_16: &str = "For God so loved the world, that he gave his only begotten Son, that whosoever believeth \
    in him should not perish, but have everlasting life.";

const OFFLINE: [(&str, &str); 18] = [
    ("Jeremiah 29:11", JEREMIAH_29_11),
    ("Psalm 23:1", PSALM_23_1),
    ("Philippians 4:13", PHILIPPIANS_4_13),
    ("Romans 8:28", ROMANS_8_28),
    ("Isaiah 40:31", ISAIAH_40_31),
    ("John 3:16", JOHN_3_16),
    (
        "Proverbs 3:5-6",
        "Trust in the LORD with all thine heart; and lean not unto thine own understanding. \
         In all thy ways acknowledge him, and he shall direct thy paths.",
    ),
    (
        "Matthew 11:28",
        "Come unto me, all ye that labour and are heavy laden, and I will give you rest.",
    ),
    (
        "John 14:27",
        "Peace I leave with you, my peace I give unto you: not as the world giveth, give I unto you. \
         Let not your heart be troubled, neither let it be afraid.",
    ),
    (
        "Romans 15:13",
        "Now the God of hope fill you with all joy and peace in believing, that ye may abound in hope, \
         through the power of the Holy Ghost.",
    ),
    (
        "Psalm 91:1-2",
        "He that dwelleth in the secret place of the most High shall abide under the shadow of the Almighty. \
         I will say of the LORD, He is my refuge and my fortress: my God; in him will I trust.",
    ),
    (
        "James 1:5",
        "If any of you lack wisdom, let him ask of God, that giveth to all men liberally, and upbraideth not; \
         and it shall be given him.",
    ),
    (
        "Psalm 37:5",
        "Commit thy way unto the LORD; trust also in him; and he shall bring it to pass.",
    ),
    (
        "2 Corinthians 12:9",
        "And he said unto me, My grace is sufficient for thee: for my strength is made perfect in weakness. \
         Most gladly therefore will I rather glory in my infirmities, that the power of Christ may rest upon me.",
    ),
    (
        "Isaiah 26:3",
        "Thou wilt keep him in perfect peace, whose mind is stayed on thee: because he trusteth in thee.",
    ),
    ("Psalm 103:3", "Who forgiveth all thine iniquities; who healeth all thy diseases;"),
    ("Colossians 3:23", "And whatsoever ye do, do it heartily, as to the Lord, and not unto men;"),
    (
        "Ephesians 2:8",
        "For by grace are ye saved through faith; and that not of yourselves: it is the gift of God:",
    ),
];

const HARDCODED: [(&str, &str); 6] = [
    (
        "Joshua 1:9",
        "Have not I commanded thee? Be strong and of a good courage; be not afraid, neither be thou dismayed: \
         for the LORD thy God is with thee whithersoever thou goest.",
    ),
    ("Psalm 46:1", "God is our refuge and strength, a very present help in trouble."),
    ("Psalm 118:24", "This is the day which the LORD hath made; we will rejoice and be glad in it."),
    (
        "Philippians 4:6",
        "Be careful for nothing; but in every thing by prayer and supplication with thanksgiving \
         let your requests be made known unto God.",
    ),
    ("1 Peter 5:7", "Casting all your care upon him; for he careth for you."),
    (
        "Matthew 6:34",
        "Take therefore no thought for the morrow: for the morrow shall take thought for the things of itself. \
         Sufficient unto the day is the evil thereof.",
    ),
];

// The bundled tables are checked by the tests below; they cannot fail to parse.
static POPULAR_REFERENCES: LazyLock<Vec<VerseReference>> =
    LazyLock::new(|| POPULAR.iter().map(|reference| reference.parse().unwrap()).collect());
static OFFLINE_TABLE: LazyLock<StaticVerseTable> = LazyLock::new(|| StaticVerseTable::from_entries(OFFLINE).unwrap());
static HARDCODED_TABLE: LazyLock<StaticVerseTable> =
    LazyLock::new(|| StaticVerseTable::from_entries(HARDCODED).unwrap());
static FAILSAFE: LazyLock<(VerseReference, &'static str)> =
    LazyLock::new(|| ("Jeremiah 29:11".parse().unwrap(), JEREMIAH_29_11));

/// Widely loved references, used by the popular tier.
pub fn popular_references() -> &'static [VerseReference] {
    &POPULAR_REFERENCES
}

/// The single verse that is always available.
pub fn failsafe() -> (VerseReference, &'static str) {
    *FAILSAFE
}

/// Read-only mapping from reference to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticVerseTable {
    entries: Vec<(VerseReference, String)>,
}

impl StaticVerseTable {
    /// Build a table from `(reference, text)` pairs.
    ///
    /// # Errors
    ///
    /// If any reference fails to parse.
    pub fn from_entries<R: AsRef<str>, T: Into<String>>(entries: impl IntoIterator<Item = (R, T)>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(|(reference, text)| {
                let reference = reference.as_ref();
                let parsed = reference
                    .parse::<VerseReference>()
                    .or_raise(|| ErrorKind::InvalidReference(reference.to_string()))?;
                Ok((parsed, text.into()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// The bundled offline table (18 verses).
    pub fn offline() -> &'static Self {
        &OFFLINE_TABLE
    }

    /// The bundled hardcoded table (6 verses).
    pub fn hardcoded() -> &'static Self {
        &HARDCODED_TABLE
    }

    pub fn get(&self, reference: &VerseReference) -> Option<&str> {
        self.entries.iter().find(|(candidate, _)| candidate == reference).map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn references(&self) -> impl Iterator<Item = &VerseReference> {
        self.entries.iter().map(|(reference, _)| reference)
    }

    /// Up to `amount` distinct entries chosen at random, skipping `exclude`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        amount: usize,
        exclude: &HashSet<VerseReference>,
        rng: &mut R,
    ) -> Vec<(VerseReference, &str)> {
        let candidates: Vec<_> = self.entries.iter().filter(|(reference, _)| !exclude.contains(reference)).collect();
        candidates
            .choose_multiple(rng, amount)
            .copied()
            .map(|(reference, text)| (*reference, text.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_bundled_tables() {
        assert_eq!(popular_references().len(), 28);
        assert_eq!(StaticVerseTable::offline().len(), 18);
        assert_eq!(StaticVerseTable::hardcoded().len(), 6);
        let (reference, text) = failsafe();
        assert_eq!(reference.to_string(), "Jeremiah 29:11");
        assert_eq!(StaticVerseTable::offline().get(&reference), Some(text));
    }

    #[test]
    fn test_bundled_tables_are_layered() {
        let offline = StaticVerseTable::offline();
        let popular: HashSet<_> = popular_references().iter().collect();
        assert!(offline.references().all(|reference| popular.contains(reference)));
        // Each tier must have something the earlier tiers cannot have served.
        for reference in StaticVerseTable::hardcoded().references() {
            assert!(offline.get(reference).is_none(), "{reference} is also an offline verse");
            assert!(!popular.contains(reference), "{reference} is also a popular verse");
        }
    }

    #[test]
    fn test_bundled_texts_are_clean() {
        for table in [StaticVerseTable::offline(), StaticVerseTable::hardcoded()] {
            for reference in table.references() {
                let text = table.get(reference).unwrap();
                assert!(!text.contains("  "), "{reference} has doubled whitespace");
                assert_eq!(text.trim(), text);
            }
        }
    }

    #[test]
    fn test_from_entries_rejects_invalid_references() {
        let err = StaticVerseTable::from_entries([("Hezekiah 1:1", "no such book")]).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidReference("Hezekiah 1:1".to_string()));
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = StaticVerseTable::offline();
        let sample = table.sample(10, &HashSet::new(), &mut rng);
        let distinct: HashSet<_> = sample.iter().map(|(reference, _)| *reference).collect();
        assert_eq!(distinct.len(), 10);
        assert_eq!(table.sample(100, &HashSet::new(), &mut rng).len(), 18);
    }

    #[test]
    fn test_sample_skips_excluded() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = StaticVerseTable::hardcoded();
        let exclude: HashSet<_> = table.references().take(4).copied().collect();
        let sample = table.sample(6, &exclude, &mut rng);
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|(reference, _)| !exclude.contains(reference)));
    }
}
