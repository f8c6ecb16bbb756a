//! The reference universe: every verse of the canon, exactly once.

use crate::book::Book;
use crate::reference::VerseReference;
use std::sync::LazyLock;

static UNIVERSE: LazyLock<Vec<VerseReference>> = LazyLock::new(generate_all);

/// Enumerate every single-verse reference in canonical order.
///
/// Pure and deterministic: every call returns the same sequence. Prefer
/// [`universe()`] when a shared copy is enough.
pub fn generate_all() -> Vec<VerseReference> {
    let mut all = Vec::with_capacity(count());
    for book in Book::all() {
        for chapter in 1..=book.chapter_count() {
            let verses = book.verse_count(chapter).unwrap_or(0);
            all.extend((1..=verses).map(|verse| VerseReference::new_unchecked(book, chapter, verse)));
        }
    }
    all
}

/// Size of the universe (31,102).
pub fn count() -> usize {
    Book::all().map(|book| book.total_verses() as usize).sum()
}

/// Process-wide copy of [`generate_all()`], built on first use.
pub fn universe() -> &'static [VerseReference] {
    &UNIVERSE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_count() {
        assert_eq!(count(), 31_102);
        assert_eq!(generate_all().len(), count());
        assert_eq!(universe().len(), count());
    }

    #[test]
    fn test_deterministic_and_canonical() {
        let first = generate_all();
        assert_eq!(first, generate_all());
        assert!(first.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(first.first().unwrap().to_string(), "Genesis 1:1");
        assert_eq!(first.last().unwrap().to_string(), "Revelation 22:21");
    }

    #[test]
    fn test_every_reference_is_unique_and_valid() {
        let all = universe();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        for reference in all {
            let reparsed: VerseReference = reference.to_string().parse().unwrap();
            assert_eq!(&reparsed, reference);
        }
    }
}
