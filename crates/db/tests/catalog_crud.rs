//! Integration tests for the catalog and review repositories.
//!
//! Exercises the repository layer against a real database:
//! - Title create/update with genre associations
//! - Title filters and review totals
//! - Cascade delete behaviour
//! - One review per author and title

use sqlx::PgPool;
use yamdb_db::models::category::CreateCategory;
use yamdb_db::models::comment::{CreateComment, UpdateComment};
use yamdb_db::models::genre::CreateGenre;
use yamdb_db::models::review::{CreateReview, UpdateReview};
use yamdb_db::models::title::{CreateTitle, TitleFilter, UpdateTitle};
use yamdb_db::models::user::CreateUser;
use yamdb_db::repositories::{
    CategoryRepo, CommentRepo, GenreRepo, ReviewRepo, TitleRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_category(pool: &PgPool, slug: &str) -> i64 {
    CategoryRepo::create(
        pool,
        &CreateCategory {
            name: format!("Category {slug}"),
            slug: slug.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_genre(pool: &PgPool, slug: &str) -> i64 {
    GenreRepo::create(
        pool,
        &CreateGenre {
            name: format!("Genre {slug}"),
            slug: slug.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    UserRepo::create(pool, &CreateUser::new(username, format!("{username}@example.com")))
        .await
        .unwrap()
        .id
}

fn new_title(name: &str, year: i32, category_id: i64, genre_ids: Vec<i64>) -> CreateTitle {
    CreateTitle {
        name: name.to_string(),
        year,
        description: String::new(),
        category_id,
        genre_ids,
    }
}

fn new_review(title_id: i64, author_id: i64, score: i16) -> CreateReview {
    CreateReview {
        title_id,
        author_id,
        text: "Worth watching".to_string(),
        score,
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_title_create_with_genres(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let drama = seed_genre(&pool, "drama").await;
    let comedy = seed_genre(&pool, "comedy").await;

    let title = TitleRepo::create(&pool, &new_title("Amelie", 2001, category, vec![drama, comedy]))
        .await
        .unwrap();

    let genres = TitleRepo::genres_for_titles(&pool, &[title.id]).await.unwrap();
    let slugs: Vec<&str> = genres.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["comedy", "drama"]);

    let stats = TitleRepo::find_with_stats(&pool, title.id)
        .await
        .unwrap()
        .expect("title should exist");
    assert_eq!(stats.category_slug, "films");
    assert_eq!(stats.review_count, 0);
    assert_eq!(stats.score_sum, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_title_update_replaces_genres_only_when_given(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let drama = seed_genre(&pool, "drama").await;
    let horror = seed_genre(&pool, "horror").await;
    let title = TitleRepo::create(&pool, &new_title("Alien", 1979, category, vec![drama]))
        .await
        .unwrap();

    let renamed = TitleRepo::update(
        &pool,
        title.id,
        &UpdateTitle {
            name: Some("Alien (Director's Cut)".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(renamed.name, "Alien (Director's Cut)");
    assert_eq!(renamed.year, 1979);
    let genres = TitleRepo::genres_for_titles(&pool, &[title.id]).await.unwrap();
    assert_eq!(genres.len(), 1);

    TitleRepo::update(
        &pool,
        title.id,
        &UpdateTitle {
            genre_ids: Some(vec![horror]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let genres = TitleRepo::genres_for_titles(&pool, &[title.id]).await.unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].slug, "horror");

    let missing = TitleRepo::update(&pool, i64::MAX, &UpdateTitle::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_title_filters(pool: PgPool) {
    let films = seed_category(&pool, "films").await;
    let books = seed_category(&pool, "books").await;
    let drama = seed_genre(&pool, "drama").await;
    let fantasy = seed_genre(&pool, "fantasy").await;

    TitleRepo::create(&pool, &new_title("The Hobbit", 1937, books, vec![fantasy]))
        .await
        .unwrap();
    TitleRepo::create(&pool, &new_title("The Hobbit", 2012, films, vec![fantasy, drama]))
        .await
        .unwrap();
    TitleRepo::create(&pool, &new_title("Heat", 1995, films, vec![drama]))
        .await
        .unwrap();

    let by_genre = TitleFilter {
        genre: Some("fantasy".into()),
        ..Default::default()
    };
    assert_eq!(TitleRepo::count(&pool, &by_genre).await.unwrap(), 2);

    let by_category_and_genre = TitleFilter {
        genre: Some("drama".into()),
        category: Some("films".into()),
        ..Default::default()
    };
    assert_eq!(TitleRepo::count(&pool, &by_category_and_genre).await.unwrap(), 2);

    let by_name = TitleFilter {
        name: Some("hobb".into()),
        ..Default::default()
    };
    let rows = TitleRepo::list_with_stats(&pool, &by_name, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.name == "The Hobbit"));

    let by_year = TitleFilter {
        year: Some(1995),
        ..Default::default()
    };
    let rows = TitleRepo::list_with_stats(&pool, &by_year, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Heat");

    let nothing = TitleFilter {
        genre: Some("western".into()),
        ..Default::default()
    };
    assert_eq!(TitleRepo::count(&pool, &nothing).await.unwrap(), 0);

    // Pagination over the unfiltered set.
    let all = TitleFilter::default();
    assert_eq!(TitleRepo::count(&pool, &all).await.unwrap(), 3);
    let page = TitleRepo::list_with_stats(&pool, &all, 2, 2).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_review_totals_follow_writes(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let title = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![]))
        .await
        .unwrap();
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;

    let review = ReviewRepo::create(&pool, &new_review(title.id, alice, 8))
        .await
        .unwrap();
    assert_eq!(review.author, "alice");
    ReviewRepo::create(&pool, &new_review(title.id, bob, 5))
        .await
        .unwrap();

    let stats = TitleRepo::find_with_stats(&pool, title.id).await.unwrap().unwrap();
    assert_eq!(stats.review_count, 2);
    assert_eq!(stats.score_sum, 13);

    ReviewRepo::update(
        &pool,
        review.id,
        &UpdateReview {
            score: Some(10),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    let stats = TitleRepo::find_with_stats(&pool, title.id).await.unwrap().unwrap();
    assert_eq!(stats.score_sum, 15);

    assert!(ReviewRepo::delete(&pool, review.id).await.unwrap());
    let stats = TitleRepo::find_with_stats(&pool, title.id).await.unwrap().unwrap();
    assert_eq!(stats.review_count, 1);
    assert_eq!(stats.score_sum, 5);
}

// ---------------------------------------------------------------------------
// Reviews and comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_second_review_by_same_author_fails(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let title = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![]))
        .await
        .unwrap();
    let alice = seed_user(&pool, "alice").await;

    ReviewRepo::create(&pool, &new_review(title.id, alice, 7))
        .await
        .unwrap();
    assert!(ReviewRepo::exists_for_author(&pool, title.id, alice).await.unwrap());

    let err = ReviewRepo::create(&pool, &new_review(title.id, alice, 3))
        .await
        .unwrap_err();
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_string);
    assert_eq!(constraint.as_deref(), Some("uq_reviews_author_title"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_score_outside_range_is_rejected(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let title = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![]))
        .await
        .unwrap();
    let alice = seed_user(&pool, "alice").await;

    assert!(ReviewRepo::create(&pool, &new_review(title.id, alice, 11))
        .await
        .is_err());
    assert!(ReviewRepo::create(&pool, &new_review(title.id, alice, 0))
        .await
        .is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lookups_are_scoped_to_parent(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let heat = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![]))
        .await
        .unwrap();
    let alien = TitleRepo::create(&pool, &new_title("Alien", 1979, category, vec![]))
        .await
        .unwrap();
    let alice = seed_user(&pool, "alice").await;

    let review = ReviewRepo::create(&pool, &new_review(heat.id, alice, 9))
        .await
        .unwrap();
    assert!(ReviewRepo::find_in_title(&pool, heat.id, review.id)
        .await
        .unwrap()
        .is_some());
    assert!(ReviewRepo::find_in_title(&pool, alien.id, review.id)
        .await
        .unwrap()
        .is_none());

    let other_review = ReviewRepo::create(&pool, &new_review(alien.id, alice, 4))
        .await
        .unwrap();
    let comment = CommentRepo::create(
        &pool,
        &CreateComment {
            review_id: review.id,
            author_id: alice,
            text: "Agreed".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(comment.author, "alice");
    assert!(CommentRepo::find_in_review(&pool, review.id, comment.id)
        .await
        .unwrap()
        .is_some());
    assert!(CommentRepo::find_in_review(&pool, other_review.id, comment.id)
        .await
        .unwrap()
        .is_none());

    let edited = CommentRepo::update(
        &pool,
        comment.id,
        &UpdateComment {
            text: Some("Strongly agreed".to_string()),
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(edited.text, "Strongly agreed");
    assert_eq!(CommentRepo::count_for_review(&pool, review.id).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_category_cascades_to_titles_reviews_comments(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let drama = seed_genre(&pool, "drama").await;
    let title = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![drama]))
        .await
        .unwrap();
    let alice = seed_user(&pool, "alice").await;
    let review = ReviewRepo::create(&pool, &new_review(title.id, alice, 9))
        .await
        .unwrap();
    let comment = CommentRepo::create(
        &pool,
        &CreateComment {
            review_id: review.id,
            author_id: alice,
            text: "Agreed".to_string(),
        },
    )
    .await
    .unwrap();

    assert!(CategoryRepo::delete_by_slug(&pool, "films").await.unwrap());

    assert!(!TitleRepo::exists(&pool, title.id).await.unwrap());
    assert!(ReviewRepo::find_in_title(&pool, title.id, review.id)
        .await
        .unwrap()
        .is_none());
    assert!(CommentRepo::find_in_review(&pool, review.id, comment.id)
        .await
        .unwrap()
        .is_none());
    // Genres are independent of titles.
    assert!(GenreRepo::find_by_slug(&pool, "drama").await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_genre_detaches_titles(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let drama = seed_genre(&pool, "drama").await;
    let title = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![drama]))
        .await
        .unwrap();

    assert!(GenreRepo::delete_by_slug(&pool, "drama").await.unwrap());

    assert!(TitleRepo::exists(&pool, title.id).await.unwrap());
    let genres = TitleRepo::genres_for_titles(&pool, &[title.id]).await.unwrap();
    assert!(genres.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_user_removes_their_reviews(pool: PgPool) {
    let category = seed_category(&pool, "films").await;
    let title = TitleRepo::create(&pool, &new_title("Heat", 1995, category, vec![]))
        .await
        .unwrap();
    let alice = seed_user(&pool, "alice").await;
    ReviewRepo::create(&pool, &new_review(title.id, alice, 9))
        .await
        .unwrap();

    assert!(UserRepo::delete(&pool, alice).await.unwrap());
    assert_eq!(ReviewRepo::count_for_title(&pool, title.id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_slug_fails(pool: PgPool) {
    seed_category(&pool, "films").await;
    let result = CategoryRepo::create(
        &pool,
        &CreateCategory {
            name: "Other".to_string(),
            slug: "films".to_string(),
        },
    )
    .await;
    assert!(result.is_err(), "Duplicate category slug should fail");

    seed_genre(&pool, "drama").await;
    let found = GenreRepo::find_by_slugs(&pool, &["drama".to_string(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}
