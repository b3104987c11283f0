//! Book Library Module
//!
//! Stores books (a title plus an append-only list of comments) and exposes
//! them over HTTP.
//!
//! # Features
//!
//! - Store operations on [`Bookshelf`], borrowing a libsql connection
//! - Handlers and routes mounted under `/api/books`
//! - Database migrations included
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookshelf::library;
//!
//! let app = Router::new()
//!     .nest("/api/books", library::routes())
//!     .with_state(app_state);
//!
//! let shelf = library::Bookshelf::new(connection);
//! let book = shelf.create_book("The Hobbit").await?;
//! ```

mod handler;
mod id;
mod routes;
mod store;

pub use id::BookId;
pub use routes::routes;
pub use store::Bookshelf;

/// Returns the migrations for the library module, in application order.
pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[("library_001_books.sql", include_str!("migrations/001_books.sql"))]
}
