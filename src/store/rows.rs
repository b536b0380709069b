use crate::model::{ImportCounts, SourceBook, SourceReference};
use crate::normalize::normalize_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRow {
    pub code: String,
    pub name: String,
    pub category: String,
    pub license: String,
}

/// One step of a translation import, in source order. A `Chapter` belongs to
/// the most recent `Book`, a `Verse` to the most recent `Chapter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRow<'a> {
    Book { name: &'a str, position: i64 },
    Chapter { number: i64 },
    Verse { number: i64, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow<'a> {
    pub from_book: &'a str,
    pub from_chapter: i64,
    pub from_verse: i64,
    pub to_book: &'a str,
    pub to_chapter: i64,
    pub to_verse_start: i64,
    pub to_verse_end: i64,
    pub votes: i64,
}

pub fn translation_rows(books: &[SourceBook]) -> impl Iterator<Item = ContentRow<'_>> {
    books.iter().enumerate().flat_map(|(index, book)| {
        std::iter::once(ContentRow::Book {
            name: book.name.trim(),
            position: index as i64 + 1,
        })
        .chain(book.chapters.iter().flat_map(|chapter| {
            std::iter::once(ContentRow::Chapter {
                number: chapter.chapter,
            })
            .chain(chapter.verses.iter().map(|verse| ContentRow::Verse {
                number: verse.verse,
                text: normalize_text(verse.text.as_deref()),
            }))
        }))
    })
}

pub fn reference_rows(records: &[SourceReference]) -> impl Iterator<Item = ReferenceRow<'_>> {
    records.iter().flat_map(|record| {
        record.to.iter().map(move |range| ReferenceRow {
            from_book: record.from.book.as_str(),
            from_chapter: record.from.chapter,
            from_verse: record.from.verse,
            to_book: range.book.as_str(),
            to_chapter: range.chapter,
            to_verse_start: range.verse_start,
            to_verse_end: range.verse_end.unwrap_or(range.verse_start),
            votes: record.votes,
        })
    })
}

impl ImportCounts {
    pub fn record(&mut self, row: &ContentRow<'_>) {
        match row {
            ContentRow::Book { .. } => self.books += 1,
            ContentRow::Chapter { .. } => self.chapters += 1,
            ContentRow::Verse { .. } => self.verses += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceChapter, SourceVerse, VerseLocation, VerseRange};

    fn book(name: &str, chapters: &[(i64, &[(i64, &str)])]) -> SourceBook {
        SourceBook {
            name: name.to_string(),
            chapters: chapters
                .iter()
                .map(|(number, verses)| SourceChapter {
                    chapter: *number,
                    verses: verses
                        .iter()
                        .map(|(verse, text)| SourceVerse {
                            verse: *verse,
                            text: Some(text.to_string()),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn translation_rows_preserve_source_order_and_positions() {
        let books = vec![
            book("Genesis", &[(1, &[(1, "a"), (2, "b")])]),
            book(" Exodus ", &[(3, &[(7, "\u{201C}c\u{201D}")])]),
        ];

        let rows: Vec<_> = translation_rows(&books).collect();
        assert_eq!(
            rows,
            vec![
                ContentRow::Book { name: "Genesis", position: 1 },
                ContentRow::Chapter { number: 1 },
                ContentRow::Verse { number: 1, text: "a".to_string() },
                ContentRow::Verse { number: 2, text: "b".to_string() },
                ContentRow::Book { name: "Exodus", position: 2 },
                ContentRow::Chapter { number: 3 },
                ContentRow::Verse { number: 7, text: "\"c\"".to_string() },
            ]
        );
    }

    #[test]
    fn reference_rows_expand_each_destination_range() {
        let records = vec![SourceReference {
            from: VerseLocation {
                book: "Genesis".to_string(),
                chapter: 1,
                verse: 1,
            },
            to: vec![
                VerseRange {
                    book: "John".to_string(),
                    chapter: 1,
                    verse_start: 1,
                    verse_end: Some(3),
                },
                VerseRange {
                    book: "Hebrews".to_string(),
                    chapter: 11,
                    verse_start: 3,
                    verse_end: None,
                },
            ],
            votes: 51,
        }];

        let rows: Vec<_> = reference_rows(&records).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_book, "John");
        assert_eq!(rows[0].to_verse_end, 3);
        assert_eq!(rows[1].to_verse_start, 3);
        assert_eq!(rows[1].to_verse_end, 3);
        assert!(rows.iter().all(|row| row.votes == 51 && row.from_book == "Genesis"));
    }
}
