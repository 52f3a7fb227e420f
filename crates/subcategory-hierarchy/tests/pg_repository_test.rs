//! PostgreSQL 仓储测试
//!
//! 需要可用的数据库，通过 DATABASE_URL 指定：
//! `DATABASE_URL=postgres://... cargo test -p subcategory-hierarchy -- --ignored`

use catalog_shared::config::DatabaseConfig;
use catalog_shared::database::Database;
use subcategory_hierarchy::{
    LevelAssignment, LocalizedText, NewSubcategory, PgSubcategoryRepository, SubcategoryFilter,
    SubcategoryPatch, SubcategoryRepositoryTrait, SubtreeMove,
};

async fn setup() -> (Database, i64) {
    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DatabaseConfig::default().url),
        ..Default::default()
    };
    let db = Database::connect(&config).await.unwrap();
    db.run_migrations().await.unwrap();

    let category_id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name_en, name_ar) VALUES ($1, NULL) RETURNING id",
    )
    .bind(format!("pg-test-{}", unique_suffix()))
    .fetch_one(db.pool())
    .await
    .unwrap();

    (db, category_id)
}

fn unique_suffix() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn new_node(category_id: i64, parent_id: Option<i64>, level: i32, name: &str) -> NewSubcategory {
    NewSubcategory {
        category_id,
        parent_id,
        level,
        name: LocalizedText::new(name, None),
        description: Some(LocalizedText::new("desc", Some("وصف".to_string()))),
        display_order: 0,
        is_active: true,
        is_featured: false,
        image: Some("sub/a.png".to_string()),
    }
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_crud_and_name_exists() {
    let (db, category_id) = setup().await;
    let repo = PgSubcategoryRepository::new(db.pool().clone());

    let root = repo.create(&new_node(category_id, None, 1, "Phones")).await.unwrap();
    assert_eq!(root.description.as_ref().unwrap().ar, "وصف");
    assert!(repo.name_exists(" phones ", category_id, None).await.unwrap());
    assert!(!repo.name_exists("Phones", category_id, Some(root.id)).await.unwrap());

    let updated = repo
        .update(
            root.id,
            &SubcategoryPatch {
                description: Some(None),
                image: Some(None),
                display_order: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.image, None);
    assert_eq!(updated.display_order, 4);
    assert_eq!(updated.name.en, "Phones");

    repo.delete(root.id).await.unwrap();
    assert!(repo.delete(root.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_subtree_move_and_listing() {
    let (db, category_id) = setup().await;
    let repo = PgSubcategoryRepository::new(db.pool().clone());

    let a = repo.create(&new_node(category_id, None, 1, "A")).await.unwrap();
    let b = repo.create(&new_node(category_id, Some(a.id), 2, "B")).await.unwrap();
    let p = repo.create(&new_node(category_id, None, 1, "P")).await.unwrap();

    repo.apply_subtree_move(&SubtreeMove {
        node_id: a.id,
        new_parent_id: Some(p.id),
        category_id,
        levels: vec![
            LevelAssignment { id: a.id, level: 2 },
            LevelAssignment { id: b.id, level: 3 },
        ],
    })
    .await
    .unwrap();

    let children = repo.list_by_parents(&[p.id, a.id]).await.unwrap();
    let levels: Vec<(i64, i32)> = children.iter().map(|n| (n.id, n.level)).collect();
    assert!(levels.contains(&(a.id, 2)));
    assert!(levels.contains(&(b.id, 3)));
    assert_eq!(repo.count_children(p.id).await.unwrap(), 1);

    let roots = repo.list_roots_by_category(category_id).await.unwrap();
    assert_eq!(roots.len(), 1);

    let (page, total) = repo
        .list(
            &SubcategoryFilter {
                category_id: Some(category_id),
                keyword: Some("b".to_string()),
                ..Default::default()
            },
            10,
            0,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].id, b.id);
}
