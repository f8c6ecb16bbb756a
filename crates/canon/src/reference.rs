use crate::book::Book;
use crate::error::{Error, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::LazyLock;

static REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?<book>[1-3]?\s*[a-z][a-z .]*?)\s*(?<chapter>\d{1,3})\s*:\s*(?<start>\d{1,3})(?:\s*[-–]\s*(?<end>\d{1,3}))?\s*$")
        .unwrap()
});

/// An immutable reference to a single verse or a contiguous range of verses
/// within one chapter.
///
/// References are always valid against the canon table: constructing one
/// for a chapter or verse that does not exist fails. Ordering is canonical
/// (book, then chapter, then verse range).
///
/// ```
/// use lectio_canon::VerseReference;
///
/// let reference: VerseReference = "prov 3:5-6".parse().unwrap();
/// assert_eq!(reference.to_string(), "Proverbs 3:5-6");
/// assert_eq!(reference.verses().count(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseReference {
    book: Book,
    chapter: u16,
    start: u16,
    end: u16,
}

impl VerseReference {
    /// Reference to a single verse.
    pub fn new(book: Book, chapter: u16, verse: u16) -> Result<Self> {
        Self::range(book, chapter, verse, verse)
    }

    /// Reference to the inclusive range `start..=end` within one chapter.
    pub fn range(book: Book, chapter: u16, start: u16, end: u16) -> Result<Self> {
        if end < start {
            exn::bail!(ErrorKind::ReversedRange { start, end });
        }
        let out_of_range = |verse| ErrorKind::OutOfRange { book: book.name(), chapter, verse };
        let available = book.verse_count(chapter).ok_or_raise(|| out_of_range(start))?;
        if start == 0 {
            exn::bail!(out_of_range(start));
        }
        if end > available {
            exn::bail!(out_of_range(end));
        }
        Ok(Self { book, chapter, start, end })
    }

    /// Construct without validation; the caller guarantees the verse exists.
    pub(crate) fn new_unchecked(book: Book, chapter: u16, verse: u16) -> Self {
        Self { book, chapter, start: verse, end: verse }
    }

    pub fn book(&self) -> Book {
        self.book
    }

    pub fn chapter(&self) -> u16 {
        self.chapter
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// All verse numbers covered by this reference.
    pub fn verses(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }

    pub fn is_single_verse(&self) -> bool {
        self.start == self.end
    }

    /// Verse part of the reference on its own: `"16"` or `"5-6"`.
    pub fn verse_label(&self) -> String {
        match self.is_single_verse() {
            true => self.start.to_string(),
            false => format!("{}-{}", self.start, self.end),
        }
    }
}

impl FromStr for VerseReference {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let captures = REFERENCE_REGEX.captures(s).ok_or_raise(|| ErrorKind::Malformed(s.to_string()))?;
        let number = |name: &str| -> Result<Option<u16>> {
            captures
                .name(name)
                .map(|m| m.as_str().parse::<u16>().or_raise(|| ErrorKind::Malformed(s.to_string())))
                .transpose()
        };
        // The regex guarantees these groups participate in every match.
        let chapter = number("chapter")?.ok_or_raise(|| ErrorKind::Malformed(s.to_string()))?;
        let start = number("start")?.ok_or_raise(|| ErrorKind::Malformed(s.to_string()))?;
        let end = number("end")?.unwrap_or(start);
        let book = captures["book"].parse::<Book>()?;
        Self::range(book, chapter, start, end)
    }
}

impl TryFrom<&str> for VerseReference {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl Display for VerseReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse_label())
    }
}

// Persisted and exchanged as the canonical display string.
impl Serialize for VerseReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerseReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|err: Error| serde::de::Error::custom(&*err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("John 3:16", "John 3:16")]
    #[case("john 3:16", "John 3:16")]
    #[case("  John   3 : 16 ", "John 3:16")]
    #[case("Proverbs 3:5-6", "Proverbs 3:5-6")]
    #[case("Prov 3:5 - 6", "Proverbs 3:5-6")]
    #[case("1 John 4:19", "1 John 4:19")]
    #[case("1jn 4:19", "1 John 4:19")]
    #[case("2 Corinthians 12:9", "2 Corinthians 12:9")]
    #[case("Song of Solomon 2:4", "Song of Solomon 2:4")]
    #[case("Psalm 119:176", "Psalms 119:176")]
    #[case("Lamentations 3:22-23", "Lamentations 3:22-23")]
    fn test_parse_and_display(#[case] input: &str, #[case] expected: &str) {
        let reference = input.parse::<VerseReference>().unwrap();
        assert_eq!(reference.to_string(), expected);
    }

    #[rstest]
    #[case("", |k: &ErrorKind| matches!(k, ErrorKind::Malformed(_)))]
    #[case("John", |k: &ErrorKind| matches!(k, ErrorKind::Malformed(_)))]
    #[case("John 3", |k: &ErrorKind| matches!(k, ErrorKind::Malformed(_)))]
    #[case("Hezekiah 1:1", |k: &ErrorKind| matches!(k, ErrorKind::UnknownBook(_)))]
    #[case("John 22:1", |k: &ErrorKind| matches!(k, ErrorKind::OutOfRange { .. }))]
    #[case("John 3:37", |k: &ErrorKind| matches!(k, ErrorKind::OutOfRange { .. }))]
    #[case("John 3:0", |k: &ErrorKind| matches!(k, ErrorKind::OutOfRange { .. }))]
    #[case("John 0:1", |k: &ErrorKind| matches!(k, ErrorKind::OutOfRange { .. }))]
    #[case("John 3:17-16", |k: &ErrorKind| matches!(k, ErrorKind::ReversedRange { .. }))]
    fn test_parse_invalid(#[case] input: &str, #[case] check: fn(&ErrorKind) -> bool) {
        let err = input.parse::<VerseReference>().unwrap_err();
        assert!(check(&*err), "unexpected error for {input:?}: {}", *err);
    }

    #[test]
    fn test_canonical_ordering() {
        let mut references: Vec<VerseReference> =
            ["Revelation 1:1", "John 3:16", "Genesis 2:1", "Genesis 1:31", "Genesis 1:1-3", "Genesis 1:1"]
                .into_iter()
                .map(|r| r.parse().unwrap())
                .collect();
        references.sort();
        let sorted: Vec<String> = references.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, ["Genesis 1:1", "Genesis 1:1-3", "Genesis 1:31", "Genesis 2:1", "John 3:16", "Revelation 1:1"]);
    }

    #[test]
    fn test_serde_uses_display_form() {
        let reference: VerseReference = "ps 23:1".parse().unwrap();
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, r#""Psalms 23:1""#);
        let back: VerseReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
        assert!(serde_json::from_str::<VerseReference>(r#""Psalms 151:1""#).is_err());
    }
}
