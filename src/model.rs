use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SourceBook {
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<SourceChapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceChapter {
    #[serde(alias = "number")]
    pub chapter: i64,
    #[serde(default)]
    pub verses: Vec<SourceVerse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceVerse {
    #[serde(alias = "number")]
    pub verse: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceReference {
    pub from: VerseLocation,
    #[serde(default)]
    pub to: Vec<VerseRange>,
    #[serde(default)]
    pub votes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerseLocation {
    pub book: String,
    pub chapter: i64,
    pub verse: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerseRange {
    pub book: String,
    pub chapter: i64,
    pub verse_start: i64,
    pub verse_end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
    pub references: usize,
    pub flushes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub name: String,
    pub status: String,
    pub source_sha256: Option<String>,
    pub counts: ImportCounts,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub command: String,
    pub mode: String,
    pub started_at: String,
    pub finished_at: String,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}
