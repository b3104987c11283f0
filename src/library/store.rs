use anyhow::{Context, Result};
use libsql::{Connection, Row};

use super::BookId;
use crate::model::{Book, BookSummary};

pub struct Bookshelf<'a> {
    conn: &'a Connection,
}

impl<'a> Bookshelf<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let query = r#"
            SELECT id, title, json_array_length(comments)
            FROM books
            ORDER BY rowid
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut books = vec![];

        while let Some(row) = rows.next().await? {
            books.push(BookSummary {
                id: Self::row_id(&row)?,
                title: row.get(1)?,
                commentcount: row.get(2)?,
            });
        }

        Ok(books)
    }

    pub async fn create_book(&self, title: &str) -> Result<Book> {
        let query = r#"
            INSERT INTO books (id, title)
            VALUES (?, ?)
            RETURNING id, title, comments
        "#;

        let id = BookId::generate();
        let mut rows = self
            .conn
            .query(query, libsql::params![id.as_str(), title])
            .await?;

        match rows.next().await? {
            Some(row) => self.row_to_book(&row),
            None => anyhow::bail!("insert of book {id} returned no row"),
        }
    }

    pub async fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        let query = r#"
            SELECT id, title, comments
            FROM books WHERE id = ?
        "#;

        let mut rows = self.conn.query(query, libsql::params![id.as_str()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(self.row_to_book(&row)?)),
            None => Ok(None),
        }
    }

    /// Appends in a single statement so concurrent appends never overwrite each other.
    pub async fn append_comment(&self, id: &BookId, comment: &str) -> Result<Option<Book>> {
        let query = r#"
            UPDATE books
            SET comments = json_insert(comments, '$[#]', ?)
            WHERE id = ?
            RETURNING id, title, comments
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![comment, id.as_str()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(self.row_to_book(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_book(&self, id: &BookId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![id.as_str()])
            .await?;
        Ok(affected > 0)
    }

    pub async fn delete_all_books(&self) -> Result<u64> {
        let affected = self.conn.execute("DELETE FROM books", ()).await?;
        Ok(affected)
    }

    fn row_id(row: &Row) -> Result<BookId> {
        let raw: String = row.get(0)?;
        BookId::parse(&raw).with_context(|| format!("stored book id {raw:?} is malformed"))
    }

    fn row_to_book(&self, row: &Row) -> Result<Book> {
        let id = Self::row_id(row)?;
        let comments: String = row.get(2)?;
        let comments = serde_json::from_str(&comments)
            .with_context(|| format!("comments of book {id} are not a list of strings"))?;

        Ok(Book {
            id,
            title: row.get(1)?,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn memory_db() -> Database {
        Database::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn created_book_starts_without_comments() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());

        let book = shelf.create_book("The Hobbit").await.unwrap();
        assert_eq!(book.title, "The Hobbit");
        assert!(book.comments.is_empty());

        let fetched = shelf.get_book(&book.id).await.unwrap();
        assert_eq!(fetched, Some(book));
    }

    #[tokio::test]
    async fn comments_keep_insertion_order() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());
        let book = shelf.create_book("Dune").await.unwrap();

        for comment in ["first", "second", "third"] {
            shelf.append_comment(&book.id, comment).await.unwrap();
        }

        let book = shelf.get_book(&book.id).await.unwrap().unwrap();
        assert_eq!(book.comments, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn comments_are_stored_verbatim() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());
        let book = shelf.create_book("Quotes").await.unwrap();

        let tricky = r#"she said "hi", then ["left"] \ '$[#]'"#;
        let book = shelf.append_comment(&book.id, tricky).await.unwrap().unwrap();
        assert_eq!(book.comments, vec![tricky.to_string()]);
    }

    #[tokio::test]
    async fn append_to_missing_book_returns_none() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());
        let missing = BookId::parse("000000000000000000000000").unwrap();

        assert_eq!(shelf.append_comment(&missing, "hello").await.unwrap(), None);
        assert!(shelf.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_counts_comments_in_insertion_order() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());
        let first = shelf.create_book("First").await.unwrap();
        let second = shelf.create_book("Second").await.unwrap();
        shelf.append_comment(&second.id, "a").await.unwrap();
        shelf.append_comment(&second.id, "b").await.unwrap();

        let listed = shelf.list_books().await.unwrap();
        assert_eq!(
            listed,
            vec![
                BookSummary {
                    id: first.id,
                    title: "First".into(),
                    commentcount: 0
                },
                BookSummary {
                    id: second.id,
                    title: "Second".into(),
                    commentcount: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn delete_book_reports_whether_it_existed() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());
        let book = shelf.create_book("Gone").await.unwrap();

        assert!(shelf.delete_book(&book.id).await.unwrap());
        assert!(!shelf.delete_book(&book.id).await.unwrap());
        assert_eq!(shelf.get_book(&book.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_all_empties_the_shelf() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());
        shelf.create_book("One").await.unwrap();
        shelf.create_book("Two").await.unwrap();

        assert_eq!(shelf.delete_all_books().await.unwrap(), 2);
        assert!(shelf.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_title_is_rejected_by_the_schema() {
        let db = memory_db().await;
        let shelf = Bookshelf::new(db.connection());

        assert!(shelf.create_book("").await.is_err());
        assert!(shelf.list_books().await.unwrap().is_empty());
    }
}
