//! Typed catalog operations over the generic record store.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error,
    catalog::{Book, CollectionItem, Comment, Record, RecordId, Stored, ThematicCategory},
    error::StorageError,
    repositories::CatalogRepository,
    validation::{validate_book, validate_comment},
};

/// Service for book, comment, and category operations.
///
/// Wraps the generic [`CatalogRepository`] with typed entities, id
/// generation, envelope timestamps, and submission validation.
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Add a book to the log.
    pub async fn add_book(&self, book: Book) -> Result<Stored<Book>, Error> {
        validate_book(&book)?;
        self.insert(book).await
    }

    /// Replace a book's fields, keeping its id and creation time.
    pub async fn update_book(&self, id: &RecordId, book: Book) -> Result<Stored<Book>, Error> {
        validate_book(&book)?;
        self.replace(id, book).await
    }

    pub async fn delete_book(&self, id: &RecordId) -> Result<(), Error> {
        self.repository.delete(Book::COLLECTION, id).await
    }

    /// All books, oldest first.
    pub async fn books(&self) -> Result<Vec<Stored<Book>>, Error> {
        self.list().await
    }

    pub async fn book(&self, id: &RecordId) -> Result<Option<Stored<Book>>, Error> {
        self.fetch(id).await
    }

    /// Bulk-import books, e.g. an initial collection seed.
    ///
    /// Books are inserted in order; the first invalid entry aborts the
    /// import and earlier inserts remain.
    pub async fn seed_books(&self, books: Vec<Book>) -> Result<Vec<Stored<Book>>, Error> {
        let mut stored = Vec::with_capacity(books.len());
        for book in books {
            stored.push(self.add_book(book).await?);
        }

        tracing::info!(count = stored.len(), "Seeded book collection");
        Ok(stored)
    }

    /// All thematic categories, oldest first.
    pub async fn categories(&self) -> Result<Vec<Stored<ThematicCategory>>, Error> {
        self.list().await
    }

    pub async fn add_category(
        &self,
        category: ThematicCategory,
    ) -> Result<Stored<ThematicCategory>, Error> {
        self.insert(category).await
    }

    /// Record a visitor comment.
    pub async fn submit_comment(&self, comment: Comment) -> Result<Stored<Comment>, Error> {
        validate_comment(&comment)?;
        self.insert(comment).await
    }

    /// All comments, oldest first.
    pub async fn comments(&self) -> Result<Vec<Stored<Comment>>, Error> {
        self.list().await
    }

    /// Comments attached to one book. Comments stored without a book id
    /// are not included.
    pub async fn comments_for_book(
        &self,
        book_id: &RecordId,
    ) -> Result<Vec<Stored<Comment>>, Error> {
        Ok(self
            .comments()
            .await?
            .into_iter()
            .filter(|stored| stored.item.book_id.as_ref() == Some(book_id))
            .collect())
    }

    /// Remove a comment (owner moderation).
    pub async fn delete_comment(&self, id: &RecordId) -> Result<(), Error> {
        self.repository.delete(Comment::COLLECTION, id).await
    }

    async fn insert<T: CollectionItem>(&self, item: T) -> Result<Stored<T>, Error> {
        let now = Utc::now();
        let record = Record {
            id: RecordId::new_random(T::ID_PREFIX),
            created_at: now,
            updated_at: now,
            fields: encode(&item)?,
        };

        let record = self.repository.create(T::COLLECTION, record).await?;
        Ok(Stored {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            item,
        })
    }

    async fn replace<T: CollectionItem>(&self, id: &RecordId, item: T) -> Result<Stored<T>, Error> {
        let existing = self
            .repository
            .get_by_id(T::COLLECTION, id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let record = Record {
            id: existing.id,
            created_at: existing.created_at,
            updated_at: Utc::now(),
            fields: encode(&item)?,
        };

        let record = self.repository.update(T::COLLECTION, record).await?;
        Ok(Stored {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            item,
        })
    }

    async fn list<T: CollectionItem>(&self) -> Result<Vec<Stored<T>>, Error> {
        let page = self.repository.get_all(T::COLLECTION).await?;
        page.items
            .into_iter()
            .map(|record| Stored::from_record(record).map_err(Error::from))
            .collect()
    }

    async fn fetch<T: CollectionItem>(&self, id: &RecordId) -> Result<Option<Stored<T>>, Error> {
        match self.repository.get_by_id(T::COLLECTION, id).await? {
            Some(record) => Ok(Some(Stored::from_record(record)?)),
            None => Ok(None),
        }
    }
}

fn encode<T: CollectionItem>(item: &T) -> Result<serde_json::Value, Error> {
    serde_json::to_value(item)
        .map_err(|e| StorageError::Malformed(e.to_string()))
        .map_err(Error::from)
}
