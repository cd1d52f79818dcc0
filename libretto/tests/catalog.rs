//! End-to-end catalog flows against the SQLite backend.

use chrono::Utc;
use libretto::{
    Book, Comment, Libretto, LibrettoBuilder, SqliteRepositoryProvider, ThematicCategory,
};

const OWNER_EMAIL: &str = "owner@example.com";
const OWNER_PASSWORD: &str = "Library2025top!";

async fn libretto() -> Libretto<SqliteRepositoryProvider> {
    LibrettoBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .unwrap()
        .with_owner(OWNER_EMAIL, OWNER_PASSWORD)
        .apply_migrations(true)
        .build()
        .await
        .unwrap()
}

fn book(title: &str, year: i32) -> Book {
    Book {
        title: title.to_string(),
        author: "Elsa Morante".to_string(),
        category: Some("fiction".to_string()),
        is_must_read: false,
        micro_review: None,
        cover_image: None,
        year_read: Some(year),
        synopsis: Some("A synopsis.".to_string()),
    }
}

fn comment(text: &str) -> Comment {
    Comment {
        book_id: None,
        visitor_name: "Anna".to_string(),
        visitor_email: Some("anna@example.com".to_string()),
        comment_text: text.to_string(),
        rating: Some(4),
        comment_date: Utc::now(),
    }
}

#[tokio::test]
async fn test_migrated_backend_is_healthy() {
    let libretto = libretto().await;
    libretto.health_check().await.unwrap();
}

#[tokio::test]
async fn test_book_crud_round_trip() {
    let libretto = libretto().await;
    let catalog = libretto.catalog();

    let stored = catalog.add_book(book("La Storia", 2022)).await.unwrap();
    assert!(stored.id.as_str().starts_with("bk_"));

    let mut revised = stored.item.clone();
    revised.micro_review = Some("Unforgettable.".to_string());
    let updated = catalog.update_book(&stored.id, revised).await.unwrap();
    assert_eq!(updated.id, stored.id);

    let fetched = catalog.book(&stored.id).await.unwrap().unwrap();
    assert_eq!(fetched.item.micro_review.as_deref(), Some("Unforgettable."));

    catalog.delete_book(&stored.id).await.unwrap();
    assert!(catalog.book(&stored.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_seeded_books_list_in_order() {
    let libretto = libretto().await;

    libretto
        .catalog()
        .seed_books(vec![
            book("L'isola di Arturo", 2021),
            book("Menzogna e sortilegio", 2022),
            book("Aracoeli", 2023),
        ])
        .await
        .unwrap();

    let titles: Vec<_> = libretto
        .catalog()
        .books()
        .await
        .unwrap()
        .into_iter()
        .map(|stored| stored.item.title)
        .collect();
    assert_eq!(
        titles,
        ["L'isola di Arturo", "Menzogna e sortilegio", "Aracoeli"]
    );
}

#[tokio::test]
async fn test_visitor_comments_and_owner_moderation() {
    let libretto = libretto().await;
    let catalog = libretto.catalog();

    let stored_book = catalog.add_book(book("Commented", 2024)).await.unwrap();

    let mut scoped = comment("Right where I left my heart.");
    scoped.book_id = Some(stored_book.id.clone());
    let scoped = catalog.submit_comment(scoped).await.unwrap();
    catalog
        .submit_comment(comment("General praise."))
        .await
        .unwrap();

    assert_eq!(catalog.comments().await.unwrap().len(), 2);
    assert_eq!(
        catalog.comments_for_book(&stored_book.id).await.unwrap().len(),
        1
    );

    // Moderation requires no login at this layer; the guard protects the
    // calling surface, not the service.
    catalog.delete_comment(&scoped.id).await.unwrap();
    assert_eq!(catalog.comments().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_comment_is_rejected() {
    let libretto = libretto().await;

    let mut invalid = comment("");
    invalid.rating = Some(3);
    let result = libretto.catalog().submit_comment(invalid).await;
    assert!(result.is_err());
    assert!(libretto.catalog().comments().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_categories_round_trip() {
    let libretto = libretto().await;

    libretto
        .catalog()
        .add_category(ThematicCategory {
            category_key: "islands".to_string(),
            category_name: "Isole".to_string(),
            category_description: Some("Books set on islands.".to_string()),
            creation_date: Some(Utc::now()),
            is_active: true,
            order_index: Some(1),
        })
        .await
        .unwrap();

    let categories = libretto.catalog().categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].item.category_name, "Isole");
}

#[tokio::test]
async fn test_owner_manages_books_after_login() {
    let libretto = libretto().await;

    let outcome = libretto.login(OWNER_EMAIL, OWNER_PASSWORD).await;
    assert!(outcome.success);

    libretto
        .catalog()
        .add_book(book("Added while logged in", 2024))
        .await
        .unwrap();

    libretto.logout().await;
    assert_eq!(libretto.catalog().books().await.unwrap().len(), 1);
}
