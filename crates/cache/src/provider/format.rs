//! Known upstream response layouts.
//!
//! Each endpoint declares which layout it answers with, and that layout's
//! parser is the only one applied to its responses.

use super::error::{ErrorKind, Result};
use exn::ResultExt;
use lectio_canon::VerseReference;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response layout of a text endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// `{"text": "..."}`, the whole passage as one string.
    Passage,
    /// `{"verses": [{"verse": 16, "text": "..."}, ...]}`, one item per verse.
    VerseList,
    /// `{"16": "...", "17": "..."}`, a whole chapter keyed by verse number.
    ChapterMap,
}

#[derive(Deserialize)]
struct PassageBody {
    text: String,
}

#[derive(Deserialize)]
struct VerseListBody {
    verses: Vec<VerseItem>,
}

#[derive(Deserialize)]
struct VerseItem {
    #[serde(default)]
    chapter: Option<u16>,
    verse: u16,
    text: String,
}

impl ResponseFormat {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passage => "passage",
            Self::VerseList => "verse_list",
            Self::ChapterMap => "chapter_map",
        }
    }

    /// Extract the text of `reference` from a response body.
    ///
    /// Whitespace runs are collapsed to single spaces, and multiple verses
    /// are joined with a space.
    pub fn parse(&self, body: &str, reference: &VerseReference) -> Result<String> {
        let text = match self {
            Self::Passage => parse_passage(body),
            Self::VerseList => parse_verse_list(body, reference),
            Self::ChapterMap => parse_chapter_map(body, reference),
        }
        .or_raise(|| ErrorKind::Format(self.label()))?;
        let text = collapse_whitespace(&text);
        if text.is_empty() {
            exn::bail!(ErrorKind::Empty);
        }
        Ok(text)
    }
}

fn parse_passage(body: &str) -> serde_json::Result<String> {
    Ok(serde_json::from_str::<PassageBody>(body)?.text)
}

fn parse_verse_list(body: &str, reference: &VerseReference) -> serde_json::Result<String> {
    let verses = serde_json::from_str::<VerseListBody>(body)?.verses;
    Ok(verses
        .into_iter()
        .filter(|item| item.chapter.is_none_or(|chapter| chapter == reference.chapter()))
        .filter(|item| reference.verses().contains(&item.verse))
        .map(|item| item.text)
        .collect::<Vec<_>>()
        .join(" "))
}

fn parse_chapter_map(body: &str, reference: &VerseReference) -> serde_json::Result<String> {
    let mut chapter = serde_json::from_str::<HashMap<String, String>>(body)?;
    Ok(reference
        .verses()
        .filter_map(|verse| chapter.remove(&verse.to_string()))
        .collect::<Vec<_>>()
        .join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
