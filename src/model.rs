use crate::library::BookId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub comments: Vec<String>,
}

/// Row of the book listing; carries the comment count instead of the comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    pub commentcount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedBook {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
}

impl From<Book> for CreatedBook {
    fn from(book: Book) -> Self {
        CreatedBook {
            id: book.id,
            title: book.title,
        }
    }
}
