//! Static structure of the canon: books, chapters and verse counts.
//!
//! Verse counts follow the King James versification (66 books, 1,189
//! chapters, 31,102 verses). Other versifications differ by a handful of
//! verses, but the universe only needs to be stable, not universal.

use crate::error::{ErrorKind, Result};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;

/// Which half of the canon a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Testament {
    Old,
    New,
}

pub(crate) struct BookInfo {
    name: &'static str,
    testament: Testament,
    aliases: &'static [&'static str],
    /// Verse count of each chapter, in order.
    verses: &'static [u16],
}

pub(crate) static BOOKS: [BookInfo; Book::COUNT] = [
    BookInfo {
        name: "Genesis",
        testament: Testament::Old,
        aliases: &["gen", "ge", "gn"],
        verses: &[31, 25, 24, 26, 32, 22, 24, 22, 29, 32, 32, 20, 18, 24, 21, 16, 27, 33, 38, 18, 34, 24, 20, 67, 34, 35, 46, 22, 35, 43, 55, 32, 20, 31, 29, 43, 36, 30, 23, 23, 57, 38, 34, 34, 28, 34, 31, 22, 33, 26],
    },
    BookInfo {
        name: "Exodus",
        testament: Testament::Old,
        aliases: &["exod", "exo", "ex"],
        verses: &[22, 25, 22, 31, 23, 30, 25, 32, 35, 29, 10, 51, 22, 31, 27, 36, 16, 27, 25, 26, 36, 31, 33, 18, 40, 37, 21, 43, 46, 38, 18, 35, 23, 35, 35, 38, 29, 31, 43, 38],
    },
    BookInfo {
        name: "Leviticus",
        testament: Testament::Old,
        aliases: &["lev", "le", "lv"],
        verses: &[17, 16, 17, 35, 19, 30, 38, 36, 24, 20, 47, 8, 59, 57, 33, 34, 16, 30, 37, 27, 24, 33, 44, 23, 55, 46, 34],
    },
    BookInfo {
        name: "Numbers",
        testament: Testament::Old,
        aliases: &["num", "nu", "nm"],
        verses: &[54, 34, 51, 49, 31, 27, 89, 26, 23, 36, 35, 16, 33, 45, 41, 50, 13, 32, 22, 29, 35, 41, 30, 25, 18, 65, 23, 31, 40, 16, 54, 42, 56, 29, 34, 13],
    },
    BookInfo {
        name: "Deuteronomy",
        testament: Testament::Old,
        aliases: &["deut", "deu", "de", "dt"],
        verses: &[46, 37, 29, 49, 33, 25, 26, 20, 29, 22, 32, 32, 18, 29, 23, 22, 20, 22, 21, 20, 23, 30, 25, 22, 19, 19, 26, 68, 29, 20, 30, 52, 29, 12],
    },
    BookInfo {
        name: "Joshua",
        testament: Testament::Old,
        aliases: &["josh", "jos"],
        verses: &[18, 24, 17, 24, 15, 27, 26, 35, 27, 43, 23, 24, 33, 15, 63, 10, 18, 28, 51, 9, 45, 34, 16, 33],
    },
    BookInfo {
        name: "Judges",
        testament: Testament::Old,
        aliases: &["judg", "jdg"],
        verses: &[36, 23, 31, 24, 31, 40, 25, 35, 57, 18, 40, 15, 25, 20, 20, 31, 13, 31, 30, 48, 25],
    },
    BookInfo {
        name: "Ruth",
        testament: Testament::Old,
        aliases: &["ru", "rth"],
        verses: &[22, 23, 18, 22],
    },
    BookInfo {
        name: "1 Samuel",
        testament: Testament::Old,
        aliases: &["1 sam", "1sam", "1sa", "i samuel", "first samuel"],
        verses: &[28, 36, 21, 22, 12, 21, 17, 22, 27, 27, 15, 25, 23, 52, 35, 23, 58, 30, 24, 42, 15, 23, 29, 22, 44, 25, 12, 25, 11, 31, 13],
    },
    BookInfo {
        name: "2 Samuel",
        testament: Testament::Old,
        aliases: &["2 sam", "2sam", "2sa", "ii samuel", "second samuel"],
        verses: &[27, 32, 39, 12, 25, 23, 29, 18, 13, 19, 27, 31, 39, 33, 37, 23, 29, 33, 43, 26, 22, 51, 39, 25],
    },
    BookInfo {
        name: "1 Kings",
        testament: Testament::Old,
        aliases: &["1 kgs", "1kgs", "1ki", "1 kin", "i kings", "first kings"],
        verses: &[53, 46, 28, 34, 18, 38, 51, 66, 28, 29, 43, 33, 34, 31, 34, 34, 24, 46, 21, 43, 29, 53],
    },
    BookInfo {
        name: "2 Kings",
        testament: Testament::Old,
        aliases: &["2 kgs", "2kgs", "2ki", "2 kin", "ii kings", "second kings"],
        verses: &[18, 25, 27, 44, 27, 33, 20, 29, 37, 36, 21, 21, 25, 29, 38, 20, 41, 37, 37, 21, 26, 20, 37, 20, 30],
    },
    BookInfo {
        name: "1 Chronicles",
        testament: Testament::Old,
        aliases: &["1 chr", "1chr", "1chron", "1ch", "i chronicles", "first chronicles"],
        verses: &[54, 55, 24, 43, 26, 81, 40, 40, 44, 14, 47, 40, 14, 17, 29, 43, 27, 17, 19, 8, 30, 19, 32, 31, 31, 32, 34, 21, 30],
    },
    BookInfo {
        name: "2 Chronicles",
        testament: Testament::Old,
        aliases: &["2 chr", "2chr", "2chron", "2ch", "ii chronicles", "second chronicles"],
        verses: &[17, 18, 17, 22, 14, 42, 22, 18, 31, 19, 23, 16, 22, 15, 19, 14, 19, 34, 11, 37, 20, 12, 21, 27, 28, 23, 9, 27, 36, 27, 21, 33, 25, 33, 27, 23],
    },
    BookInfo {
        name: "Ezra",
        testament: Testament::Old,
        aliases: &["ezr"],
        verses: &[11, 70, 13, 24, 17, 22, 28, 36, 15, 44],
    },
    BookInfo {
        name: "Nehemiah",
        testament: Testament::Old,
        aliases: &["neh", "ne"],
        verses: &[11, 20, 32, 23, 19, 19, 73, 18, 38, 39, 36, 47, 31],
    },
    BookInfo {
        name: "Esther",
        testament: Testament::Old,
        aliases: &["est", "es"],
        verses: &[22, 23, 15, 17, 14, 14, 10, 17, 32, 3],
    },
    BookInfo {
        name: "Job",
        testament: Testament::Old,
        aliases: &["jb"],
        verses: &[22, 13, 26, 21, 27, 30, 21, 22, 35, 22, 20, 25, 28, 22, 35, 22, 16, 21, 29, 29, 34, 30, 17, 25, 6, 14, 23, 28, 25, 31, 40, 22, 33, 37, 16, 33, 24, 41, 30, 24, 34, 17],
    },
    BookInfo {
        name: "Psalms",
        testament: Testament::Old,
        aliases: &["psalm", "ps", "psa", "pss"],
        verses: &[6, 12, 8, 8, 12, 10, 17, 9, 20, 18, 7, 8, 6, 7, 5, 11, 15, 50, 14, 9, 13, 31, 6, 10, 22, 12, 14, 9, 11, 12, 24, 11, 22, 22, 28, 12, 40, 22, 13, 17, 13, 11, 5, 26, 17, 11, 9, 14, 20, 23, 19, 9, 6, 7, 23, 13, 11, 11, 17, 12, 8, 12, 11, 10, 13, 20, 7, 35, 36, 5, 24, 20, 28, 23, 10, 12, 20, 72, 13, 19, 16, 8, 18, 12, 13, 17, 7, 18, 52, 17, 16, 15, 5, 23, 11, 13, 12, 9, 9, 5, 8, 28, 22, 35, 45, 48, 43, 13, 31, 7, 10, 10, 9, 8, 18, 19, 2, 29, 176, 7, 8, 9, 4, 8, 5, 6, 5, 6, 8, 8, 3, 18, 3, 3, 21, 26, 9, 8, 24, 13, 10, 7, 12, 15, 21, 10, 20, 14, 9, 6],
    },
    BookInfo {
        name: "Proverbs",
        testament: Testament::Old,
        aliases: &["prov", "pro", "pr"],
        verses: &[33, 22, 35, 27, 23, 35, 27, 36, 18, 32, 31, 28, 25, 35, 33, 33, 28, 24, 29, 30, 31, 29, 35, 34, 28, 28, 27, 28, 27, 33, 31],
    },
    BookInfo {
        name: "Ecclesiastes",
        testament: Testament::Old,
        aliases: &["eccl", "ecc", "ec", "qoh"],
        verses: &[18, 26, 22, 16, 20, 12, 29, 17, 18, 20, 10, 14],
    },
    BookInfo {
        name: "Song of Solomon",
        testament: Testament::Old,
        aliases: &["song of songs", "song", "sos", "ss", "canticles"],
        verses: &[17, 17, 11, 16, 16, 13, 13, 14],
    },
    BookInfo {
        name: "Isaiah",
        testament: Testament::Old,
        aliases: &["isa", "is"],
        verses: &[31, 22, 26, 6, 30, 13, 25, 22, 21, 34, 16, 6, 22, 32, 9, 14, 14, 7, 25, 6, 17, 25, 18, 23, 12, 21, 13, 29, 24, 33, 9, 20, 24, 17, 10, 22, 38, 22, 8, 31, 29, 25, 28, 28, 25, 13, 15, 22, 26, 11, 23, 15, 12, 17, 13, 12, 21, 14, 21, 22, 11, 12, 19, 12, 25, 24],
    },
    BookInfo {
        name: "Jeremiah",
        testament: Testament::Old,
        aliases: &["jer", "je"],
        verses: &[19, 37, 25, 31, 31, 30, 34, 22, 26, 25, 23, 17, 27, 22, 21, 21, 27, 23, 15, 18, 14, 30, 40, 10, 38, 24, 22, 17, 32, 24, 40, 44, 26, 22, 19, 32, 21, 28, 18, 16, 18, 22, 13, 30, 5, 28, 7, 47, 39, 46, 64, 34],
    },
    BookInfo {
        name: "Lamentations",
        testament: Testament::Old,
        aliases: &["lam", "la"],
        verses: &[22, 22, 66, 22, 22],
    },
    BookInfo {
        name: "Ezekiel",
        testament: Testament::Old,
        aliases: &["ezek", "eze", "ezk"],
        verses: &[28, 10, 27, 17, 17, 14, 27, 18, 11, 22, 25, 28, 23, 23, 8, 63, 24, 32, 14, 49, 32, 31, 49, 27, 17, 21, 36, 26, 21, 26, 18, 32, 33, 31, 15, 38, 28, 23, 29, 49, 26, 20, 27, 31, 25, 24, 23, 35],
    },
    BookInfo {
        name: "Daniel",
        testament: Testament::Old,
        aliases: &["dan", "da", "dn"],
        verses: &[21, 49, 30, 37, 31, 28, 28, 27, 27, 21, 45, 13],
    },
    BookInfo {
        name: "Hosea",
        testament: Testament::Old,
        aliases: &["hos", "ho"],
        verses: &[11, 23, 5, 19, 15, 11, 16, 14, 17, 15, 12, 14, 16, 9],
    },
    BookInfo {
        name: "Joel",
        testament: Testament::Old,
        aliases: &["joe", "jl"],
        verses: &[20, 32, 21],
    },
    BookInfo {
        name: "Amos",
        testament: Testament::Old,
        aliases: &["am"],
        verses: &[15, 16, 15, 13, 27, 14, 17, 14, 15],
    },
    BookInfo {
        name: "Obadiah",
        testament: Testament::Old,
        aliases: &["obad", "ob"],
        verses: &[21],
    },
    BookInfo {
        name: "Jonah",
        testament: Testament::Old,
        aliases: &["jon", "jnh"],
        verses: &[17, 10, 10, 11],
    },
    BookInfo {
        name: "Micah",
        testament: Testament::Old,
        aliases: &["mic", "mi"],
        verses: &[16, 13, 12, 13, 15, 16, 20],
    },
    BookInfo {
        name: "Nahum",
        testament: Testament::Old,
        aliases: &["nah", "na"],
        verses: &[15, 13, 19],
    },
    BookInfo {
        name: "Habakkuk",
        testament: Testament::Old,
        aliases: &["hab", "hb"],
        verses: &[17, 20, 19],
    },
    BookInfo {
        name: "Zephaniah",
        testament: Testament::Old,
        aliases: &["zeph", "zep"],
        verses: &[18, 15, 20],
    },
    BookInfo {
        name: "Haggai",
        testament: Testament::Old,
        aliases: &["hag", "hg"],
        verses: &[15, 23],
    },
    BookInfo {
        name: "Zechariah",
        testament: Testament::Old,
        aliases: &["zech", "zec"],
        verses: &[21, 13, 10, 14, 11, 15, 14, 23, 17, 12, 17, 14, 9, 21],
    },
    BookInfo {
        name: "Malachi",
        testament: Testament::Old,
        aliases: &["mal", "ml"],
        verses: &[14, 17, 18, 6],
    },
    BookInfo {
        name: "Matthew",
        testament: Testament::New,
        aliases: &["matt", "mat", "mt"],
        verses: &[25, 23, 17, 25, 48, 34, 29, 34, 38, 42, 30, 50, 58, 36, 39, 28, 27, 35, 30, 34, 46, 46, 39, 51, 46, 75, 66, 20],
    },
    BookInfo {
        name: "Mark",
        testament: Testament::New,
        aliases: &["mar", "mrk", "mk"],
        verses: &[45, 28, 35, 41, 43, 56, 37, 38, 50, 52, 33, 44, 37, 72, 47, 20],
    },
    BookInfo {
        name: "Luke",
        testament: Testament::New,
        aliases: &["luk", "lk"],
        verses: &[80, 52, 38, 44, 39, 49, 50, 56, 62, 42, 54, 59, 35, 35, 32, 31, 37, 43, 48, 47, 38, 71, 56, 53],
    },
    BookInfo {
        name: "John",
        testament: Testament::New,
        aliases: &["joh", "jhn", "jn"],
        verses: &[51, 25, 36, 54, 47, 71, 53, 59, 41, 42, 57, 50, 38, 31, 27, 33, 26, 40, 42, 31, 25],
    },
    BookInfo {
        name: "Acts",
        testament: Testament::New,
        aliases: &["act", "ac"],
        verses: &[26, 47, 26, 37, 42, 15, 60, 40, 43, 48, 30, 25, 52, 28, 41, 40, 34, 28, 41, 38, 40, 30, 35, 27, 27, 32, 44, 31],
    },
    BookInfo {
        name: "Romans",
        testament: Testament::New,
        aliases: &["rom", "ro"],
        verses: &[32, 29, 31, 25, 21, 23, 25, 39, 33, 21, 36, 21, 14, 23, 33, 27],
    },
    BookInfo {
        name: "1 Corinthians",
        testament: Testament::New,
        aliases: &["1 cor", "1cor", "1co", "i corinthians", "first corinthians"],
        verses: &[31, 16, 23, 21, 13, 20, 40, 13, 27, 33, 34, 31, 13, 40, 58, 24],
    },
    BookInfo {
        name: "2 Corinthians",
        testament: Testament::New,
        aliases: &["2 cor", "2cor", "2co", "ii corinthians", "second corinthians"],
        verses: &[24, 17, 18, 18, 21, 18, 16, 24, 15, 18, 33, 21, 14],
    },
    BookInfo {
        name: "Galatians",
        testament: Testament::New,
        aliases: &["gal", "ga"],
        verses: &[24, 21, 29, 31, 26, 18],
    },
    BookInfo {
        name: "Ephesians",
        testament: Testament::New,
        aliases: &["eph", "ep"],
        verses: &[23, 22, 21, 32, 33, 24],
    },
    BookInfo {
        name: "Philippians",
        testament: Testament::New,
        aliases: &["phil", "php"],
        verses: &[30, 30, 21, 23],
    },
    BookInfo {
        name: "Colossians",
        testament: Testament::New,
        aliases: &["col"],
        verses: &[29, 23, 25, 18],
    },
    BookInfo {
        name: "1 Thessalonians",
        testament: Testament::New,
        aliases: &["1 thess", "1thess", "1th", "i thessalonians", "first thessalonians"],
        verses: &[10, 20, 13, 18, 28],
    },
    BookInfo {
        name: "2 Thessalonians",
        testament: Testament::New,
        aliases: &["2 thess", "2thess", "2th", "ii thessalonians", "second thessalonians"],
        verses: &[12, 17, 18],
    },
    BookInfo {
        name: "1 Timothy",
        testament: Testament::New,
        aliases: &["1 tim", "1tim", "1ti", "i timothy", "first timothy"],
        verses: &[20, 15, 16, 16, 25, 21],
    },
    BookInfo {
        name: "2 Timothy",
        testament: Testament::New,
        aliases: &["2 tim", "2tim", "2ti", "ii timothy", "second timothy"],
        verses: &[18, 26, 17, 22],
    },
    BookInfo {
        name: "Titus",
        testament: Testament::New,
        aliases: &["tit"],
        verses: &[16, 15, 15],
    },
    BookInfo {
        name: "Philemon",
        testament: Testament::New,
        aliases: &["phlm", "phm"],
        verses: &[25],
    },
    BookInfo {
        name: "Hebrews",
        testament: Testament::New,
        aliases: &["heb"],
        verses: &[14, 18, 19, 16, 14, 20, 28, 13, 28, 39, 40, 29, 25],
    },
    BookInfo {
        name: "James",
        testament: Testament::New,
        aliases: &["jas", "jam", "jm"],
        verses: &[27, 26, 18, 17, 20],
    },
    BookInfo {
        name: "1 Peter",
        testament: Testament::New,
        aliases: &["1 pet", "1pet", "1pe", "i peter", "first peter"],
        verses: &[25, 25, 22, 19, 14],
    },
    BookInfo {
        name: "2 Peter",
        testament: Testament::New,
        aliases: &["2 pet", "2pet", "2pe", "ii peter", "second peter"],
        verses: &[21, 22, 18],
    },
    BookInfo {
        name: "1 John",
        testament: Testament::New,
        aliases: &["1 jn", "1jn", "1jo", "i john", "first john"],
        verses: &[10, 29, 24, 21, 21],
    },
    BookInfo {
        name: "2 John",
        testament: Testament::New,
        aliases: &["2 jn", "2jn", "2jo", "ii john", "second john"],
        verses: &[13],
    },
    BookInfo {
        name: "3 John",
        testament: Testament::New,
        aliases: &["3 jn", "3jn", "3jo", "iii john", "third john"],
        verses: &[14],
    },
    BookInfo {
        name: "Jude",
        testament: Testament::New,
        aliases: &["jud", "jd"],
        verses: &[25],
    },
    BookInfo {
        name: "Revelation",
        testament: Testament::New,
        aliases: &["rev", "re", "revelations", "apocalypse"],
        verses: &[20, 29, 22, 11, 14, 17, 17, 13, 21, 11, 19, 17, 18, 20, 8, 21, 18, 24, 21, 15, 27, 21],
    },
];

static LOOKUP: LazyLock<HashMap<String, Book>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for book in Book::all() {
        let info = book.info();
        for name in std::iter::once(info.name).chain(info.aliases.iter().copied()) {
            let name = name.to_lowercase();
            map.insert(name.replace(' ', ""), book);
            map.insert(name, book);
        }
    }
    map
});

/// One of the 66 canonical books, identified by its canonical position.
///
/// Ordering follows canonical order (Genesis first, Revelation last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Book(u8);

impl Book {
    /// Number of books in the canon.
    pub const COUNT: usize = 66;

    /// Book at a zero-based canonical position, if one exists.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::COUNT).then(|| Self(index as u8))
    }

    /// Iterate over all books in canonical order.
    pub fn all() -> impl Iterator<Item = Book> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Look up a book by name or common abbreviation.
    ///
    /// Matching is case-insensitive, ignores a trailing period and repeated
    /// whitespace, and accepts both `"1 John"` and `"1john"` forms.
    ///
    /// ```
    /// use lectio_canon::Book;
    ///
    /// assert_eq!(Book::lookup("Ps").unwrap().name(), "Psalms");
    /// assert_eq!(Book::lookup("1 jn").unwrap().name(), "1 John");
    /// assert_eq!(Book::lookup("I John").unwrap().name(), "1 John");
    /// assert!(Book::lookup("Hezekiah").is_none());
    /// ```
    pub fn lookup(name: &str) -> Option<Self> {
        let normalized = name.trim().trim_end_matches('.').split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        LOOKUP.get(&normalized).or_else(|| LOOKUP.get(&normalized.replace(' ', ""))).copied()
    }

    fn info(&self) -> &'static BookInfo {
        &BOOKS[self.0 as usize]
    }

    /// Zero-based canonical position.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    /// Lowercase, space-free identifier (`"1 John"` becomes `"1john"`), as
    /// used by most upstream text providers in their URLs.
    pub fn id(&self) -> String {
        self.name().to_lowercase().replace(' ', "")
    }

    pub fn testament(&self) -> Testament {
        self.info().testament
    }

    pub fn chapter_count(&self) -> u16 {
        self.info().verses.len() as u16
    }

    /// Number of verses in a (one-based) chapter, or `None` if the chapter
    /// does not exist.
    pub fn verse_count(&self, chapter: u16) -> Option<u16> {
        let index = usize::from(chapter).checked_sub(1)?;
        self.info().verses.get(index).copied()
    }

    /// Total number of verses in the book.
    pub fn total_verses(&self) -> u32 {
        self.info().verses.iter().map(|&v| u32::from(v)).sum()
    }
}

impl FromStr for Book {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self> {
        match Self::lookup(s) {
            Some(book) => Ok(book),
            None => exn::bail!(ErrorKind::UnknownBook(s.to_string())),
        }
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}
