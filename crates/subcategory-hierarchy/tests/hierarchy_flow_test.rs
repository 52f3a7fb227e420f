//! 层级服务集成测试
//!
//! 使用内存存储跑通完整的创建、导航、迁移、删除流程。

use std::sync::Arc;

use fake::Fake;
use fake::faker::company::en::CatchPhrase;
use subcategory_hierarchy::{
    BreadcrumbKind, CreateSubcategory, HierarchyError, HierarchyServices, MemoryCatalog,
    MemoryImageStorage, MemorySubcategoryRepository, SubcategoryNode, SubcategoryRepositoryTrait,
    UpdateSubcategory,
};

const ELECTRONICS_CATEGORY: i64 = 1;
const HOME_CATEGORY: i64 = 2;

struct Fixture {
    services: HierarchyServices,
    repo: Arc<MemorySubcategoryRepository>,
    catalog: Arc<MemoryCatalog>,
    images: Arc<MemoryImageStorage>,
}

fn setup() -> Fixture {
    let repo = Arc::new(MemorySubcategoryRepository::new());
    let catalog = Arc::new(MemoryCatalog::new());
    let images = Arc::new(MemoryImageStorage::new());
    catalog.add_category(ELECTRONICS_CATEGORY, "Catalog", Some("الكتالوج"));
    catalog.add_category(HOME_CATEGORY, "Home", None);

    let services = HierarchyServices::new(
        repo.clone(),
        catalog.clone(),
        catalog.clone(),
        images.clone(),
    );
    Fixture {
        services,
        repo,
        catalog,
        images,
    }
}

impl Fixture {
    async fn create(&self, category_id: i64, parent_id: Option<i64>, name: &str) -> SubcategoryNode {
        let mut input = CreateSubcategory::new(category_id, name);
        input.parent_id = parent_id;
        self.services
            .mutator
            .create_node(input, Some(1))
            .await
            .unwrap()
    }

    /// Electronics(1) -> Phones(2) -> Smartphones(3)
    async fn electronics_chain(&self) -> (SubcategoryNode, SubcategoryNode, SubcategoryNode) {
        let electronics = self.create(ELECTRONICS_CATEGORY, None, "Electronics").await;
        let phones = self
            .create(ELECTRONICS_CATEGORY, Some(electronics.id), "Phones")
            .await;
        let smartphones = self
            .create(ELECTRONICS_CATEGORY, Some(phones.id), "Smartphones")
            .await;
        (electronics, phones, smartphones)
    }

    async fn node(&self, id: i64) -> SubcategoryNode {
        self.repo.get_by_id(id).await.unwrap().unwrap()
    }
}

fn random_name(i: usize) -> String {
    format!("{} {i}", CatchPhrase().fake::<String>())
}

#[tokio::test]
async fn test_breadcrumb_chain_for_three_levels() {
    let f = setup();
    let (electronics, phones, smartphones) = f.electronics_chain().await;

    assert_eq!(electronics.level, 1);
    assert_eq!(phones.level, 2);
    assert_eq!(smartphones.level, 3);

    let chain = f
        .services
        .navigator
        .get_parent_chain(smartphones.id)
        .await
        .unwrap();
    let summary: Vec<(BreadcrumbKind, i64, i32)> =
        chain.iter().map(|c| (c.kind, c.id, c.level)).collect();
    assert_eq!(
        summary,
        vec![
            (BreadcrumbKind::Category, ELECTRONICS_CATEGORY, 0),
            (BreadcrumbKind::Subcategory, electronics.id, 1),
            (BreadcrumbKind::Subcategory, phones.id, 2),
            (BreadcrumbKind::Subcategory, smartphones.id, 3),
        ]
    );
    assert_eq!(chain[3].name.en, "Smartphones");
}

#[tokio::test]
async fn test_reparent_root_under_own_grandchild_rejected() {
    let f = setup();
    let (electronics, phones, smartphones) = f.electronics_chain().await;

    let err = f
        .services
        .mutator
        .reparent(electronics.id, Some(smartphones.id), Some(1))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation(_)));

    // 数据保持不变
    assert_eq!(f.node(electronics.id).await.parent_id, None);
    assert_eq!(f.node(phones.id).await.level, 2);
}

#[tokio::test]
async fn test_delete_node_with_children_rejected() {
    let f = setup();
    let (_, phones, smartphones) = f.electronics_chain().await;

    let err = f.services.mutator.delete(phones.id, None).await.unwrap_err();
    assert!(matches!(err, HierarchyError::Validation(msg) if msg.contains("children")));
    assert_eq!(f.node(smartphones.id).await.parent_id, Some(phones.id));

    // 叶子节点可以删除
    f.services.mutator.delete(smartphones.id, None).await.unwrap();
    f.services.mutator.delete(phones.id, None).await.unwrap();
    assert!(f.repo.get_by_id(phones.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_blocked_by_products_until_released() {
    let f = setup();
    let leaf = f.create(ELECTRONICS_CATEGORY, None, "Tablets").await;
    f.catalog.assign_product(leaf.id);
    f.catalog.assign_product(leaf.id);

    let err = f.services.mutator.delete(leaf.id, None).await.unwrap_err();
    assert!(matches!(err, HierarchyError::Validation(msg) if msg.contains("products")));

    let released = f
        .services
        .products
        .reassign_products_to_null(leaf.id, Some(1))
        .await
        .unwrap();
    assert_eq!(released, 2);
    f.services.mutator.delete(leaf.id, None).await.unwrap();
}

#[tokio::test]
async fn test_cascade_levels_after_reparent() {
    let f = setup();

    // P 位于 level 5
    let mut parent_id = None;
    let mut p = None;
    for i in 0..5 {
        let node = f.create(ELECTRONICS_CATEGORY, parent_id, &random_name(i)).await;
        parent_id = Some(node.id);
        p = Some(node);
    }
    let p = p.unwrap();
    assert_eq!(p.level, 5);

    let a = f.create(ELECTRONICS_CATEGORY, None, "A").await;
    let b = f.create(ELECTRONICS_CATEGORY, Some(a.id), "B").await;
    let c = f.create(ELECTRONICS_CATEGORY, Some(b.id), "C").await;

    let moved = f
        .services
        .mutator
        .reparent(a.id, Some(p.id), Some(1))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(p.id));
    assert_eq!(moved.level, 6);
    assert_eq!(f.node(b.id).await.level, 7);
    assert_eq!(f.node(c.id).await.level, 8);

    // 再提升回根节点
    f.services.mutator.reparent(b.id, None, None).await.unwrap();
    assert_eq!(f.node(b.id).await.level, 1);
    assert_eq!(f.node(c.id).await.level, 2);
    assert_eq!(f.node(a.id).await.level, 6);
}

#[tokio::test]
async fn test_level_invariant_holds_for_random_tree() {
    let f = setup();
    let mut created: Vec<SubcategoryNode> = Vec::new();
    for i in 0..30 {
        let parent = if created.is_empty() || i % 4 == 0 {
            None
        } else {
            Some(created[(i * 7) % created.len()].id)
        };
        created.push(f.create(ELECTRONICS_CATEGORY, parent, &random_name(i)).await);
    }

    for node in &created {
        let stored = f.node(node.id).await;
        match stored.parent_id {
            None => assert_eq!(stored.level, 1),
            Some(parent_id) => {
                let parent = f.node(parent_id).await;
                assert_eq!(stored.level, parent.level + 1);
                assert_eq!(stored.category_id, parent.category_id);
            }
        }
    }

    let tree = f
        .services
        .navigator
        .get_nested_tree(ELECTRONICS_CATEGORY)
        .await
        .unwrap();
    let total: usize = tree.iter().map(|t| t.size()).sum();
    assert_eq!(total, created.len());
}

/// 逐个节点检查层级、分类与祖先链
async fn assert_tree_invariants(f: &Fixture, ids: &[i64]) {
    for &id in ids {
        let node = f.node(id).await;
        match node.parent_id {
            None => assert_eq!(node.level, 1, "root {id} must be level 1"),
            Some(parent_id) => {
                let parent = f.node(parent_id).await;
                assert_eq!(node.level, parent.level + 1, "level of {id}");
                assert_eq!(node.category_id, parent.category_id, "category of {id}");
            }
        }

        // 沿父链向上，最多 level 步就应到达根节点
        let mut current = node.clone();
        let mut steps = 0;
        while let Some(parent_id) = current.parent_id {
            steps += 1;
            assert!(steps < node.level, "parent chain of {id} does not terminate");
            current = f.node(parent_id).await;
        }
    }
}

#[tokio::test]
async fn test_invariants_hold_across_random_reparents_and_moves() {
    let f = setup();
    let categories = [ELECTRONICS_CATEGORY, HOME_CATEGORY];
    let mut ids: Vec<i64> = Vec::new();
    for i in 0..40 {
        // ids[i - 2] 与当前节点同属一个分类
        let category_id = categories[i % 2];
        let parent = (i >= 2 && i % 3 != 0).then(|| ids[i - 2]);
        ids.push(f.create(category_id, parent, &random_name(i)).await.id);
    }
    assert_tree_invariants(&f, &ids).await;

    let (mut applied, mut rejected) = (0, 0);
    for step in 0..300 {
        let target = ids[(0..ids.len()).fake::<usize>()];
        let result = if step % 10 == 9 {
            let current = f.node(target).await.category_id;
            let other = if current == ELECTRONICS_CATEGORY {
                HOME_CATEGORY
            } else {
                ELECTRONICS_CATEGORY
            };
            f.services
                .mutator
                .move_to_category(target, other, Some(1))
                .await
        } else {
            let new_parent = if (0..8).fake::<u8>() == 0 {
                None
            } else {
                Some(ids[(0..ids.len()).fake::<usize>()])
            };
            f.services.mutator.reparent(target, new_parent, Some(1)).await
        };

        match result {
            Ok(_) => applied += 1,
            Err(e) => {
                assert!(e.is_business_error(), "unexpected error: {e}");
                rejected += 1;
            }
        }
        assert_tree_invariants(&f, &ids).await;
    }

    assert_eq!(applied + rejected, 300);
    assert!(applied > 0);
    let electronics = f
        .services
        .navigator
        .get_nested_tree(ELECTRONICS_CATEGORY)
        .await
        .unwrap();
    let home = f.services.navigator.get_nested_tree(HOME_CATEGORY).await.unwrap();
    let total: usize = electronics.iter().chain(home.iter()).map(|t| t.size()).sum();
    assert_eq!(total, ids.len());
}

#[tokio::test]
async fn test_reparent_into_other_category_follows_parent() {
    let f = setup();
    let (electronics, phones, smartphones) = f.electronics_chain().await;
    let kitchen = f.create(HOME_CATEGORY, None, "Kitchen").await;

    f.services
        .mutator
        .reparent(phones.id, Some(kitchen.id), None)
        .await
        .unwrap();

    let phones = f.node(phones.id).await;
    let smartphones = f.node(smartphones.id).await;
    assert_eq!(phones.category_id, HOME_CATEGORY);
    assert_eq!(smartphones.category_id, HOME_CATEGORY);
    assert_eq!(smartphones.level, 3);
    assert!(
        f.services
            .navigator
            .get_children(electronics.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_move_to_category_detects_name_collision() {
    let f = setup();
    let (electronics, _, _) = f.electronics_chain().await;
    f.create(HOME_CATEGORY, None, "smartphones").await;

    let err = f
        .services
        .mutator
        .move_to_category(electronics.id, HOME_CATEGORY, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Conflict(_)));
    assert_eq!(f.node(electronics.id).await.category_id, ELECTRONICS_CATEGORY);

    let err = f
        .services
        .mutator
        .move_to_category(electronics.id, 404, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::CategoryNotFound(404)));
}

#[tokio::test]
async fn test_move_subtree_to_category_becomes_root() {
    let f = setup();
    let (electronics, phones, smartphones) = f.electronics_chain().await;

    let moved = f
        .services
        .mutator
        .move_to_category(phones.id, HOME_CATEGORY, Some(3))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, None);
    assert_eq!(moved.level, 1);
    assert_eq!(moved.category_id, HOME_CATEGORY);

    let smartphones = f.node(smartphones.id).await;
    assert_eq!(smartphones.level, 2);
    assert_eq!(smartphones.category_id, HOME_CATEGORY);

    let roots = f.services.navigator.get_roots(HOME_CATEGORY).await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, phones.id);
    assert_eq!(f.node(electronics.id).await.category_id, ELECTRONICS_CATEGORY);
}

#[tokio::test]
async fn test_name_uniqueness_and_reuse_after_rename() {
    let f = setup();
    let phones = f.create(ELECTRONICS_CATEGORY, None, "Phones").await;

    let err = f
        .services
        .mutator
        .create_node(CreateSubcategory::new(ELECTRONICS_CATEGORY, " phones "), None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Conflict(_)));

    // 同名可以存在于其他分类
    f.create(HOME_CATEGORY, None, "Phones").await;

    f.services
        .mutator
        .update_fields(
            phones.id,
            UpdateSubcategory {
                name_en: Some("Mobiles".to_string()),
                ..Default::default()
            },
            Some(1),
        )
        .await
        .unwrap();
    f.create(ELECTRONICS_CATEGORY, None, "Phones").await;
}

#[tokio::test]
async fn test_update_replaces_image_and_cleans_old_file() {
    let f = setup();
    let mut input = CreateSubcategory::new(ELECTRONICS_CATEGORY, "Cameras");
    input.image = Some("sub/old.png".to_string());
    let node = f.services.mutator.create_node(input, None).await.unwrap();
    f.images.put("sub/old.png");

    let updated = f
        .services
        .mutator
        .update_fields(
            node.id,
            UpdateSubcategory {
                image: Some("sub/new.png".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.image.as_deref(), Some("sub/new.png"));
    assert!(f.images.was_deleted("sub/old.png"));
    assert!(!f.images.contains("sub/old.png"));

    // 图片存储故障不影响更新本身
    f.images.set_failing(true);
    let cleared = f
        .services
        .mutator
        .update_fields(
            node.id,
            UpdateSubcategory {
                remove_image: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(cleared.image, None);
}

#[tokio::test]
async fn test_descendants_and_product_counts() {
    let f = setup();
    let (electronics, phones, smartphones) = f.electronics_chain().await;
    f.catalog.assign_product(electronics.id);
    f.catalog.assign_product(phones.id);
    f.catalog.assign_product(smartphones.id);
    f.catalog.assign_product(smartphones.id);

    let descendants = f
        .services
        .navigator
        .get_descendants(electronics.id)
        .await
        .unwrap();
    let pairs: Vec<(i64, i32)> = descendants.iter().map(|d| (d.node.id, d.depth)).collect();
    assert_eq!(pairs, vec![(phones.id, 1), (smartphones.id, 2)]);

    let ids = f
        .services
        .navigator
        .get_descendant_ids(electronics.id)
        .await
        .unwrap();
    assert_eq!(ids, vec![electronics.id, phones.id, smartphones.id]);

    let bridge = &f.services.products;
    assert_eq!(bridge.get_product_count(electronics.id).await.unwrap(), 1);
    assert_eq!(
        bridge
            .get_product_count_including_descendants(electronics.id)
            .await
            .unwrap(),
        4
    );
    assert_eq!(
        bridge
            .get_product_count_including_descendants(phones.id)
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn test_reorder_siblings() {
    let f = setup();
    let root = f.create(ELECTRONICS_CATEGORY, None, "Root").await;
    let a = f.create(ELECTRONICS_CATEGORY, Some(root.id), "Alpha").await;
    let b = f.create(ELECTRONICS_CATEGORY, Some(root.id), "Beta").await;
    let other = f.create(ELECTRONICS_CATEGORY, None, "Other").await;

    let reordered = f
        .services
        .mutator
        .reorder(vec![(a.id, 2), (b.id, 1)], None)
        .await
        .unwrap();
    assert_eq!(reordered[0].id, b.id);

    let children = f.services.navigator.get_children(root.id).await.unwrap();
    let ids: Vec<i64> = children.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);

    let err = f
        .services
        .mutator
        .reorder(vec![(a.id, 1), (other.id, 2)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation(_)));

    let err = f
        .services
        .mutator
        .reorder(vec![(a.id, 1), (999, 2)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::SubcategoryNotFound(999)));
}

#[tokio::test]
async fn test_parent_chain_skips_missing_category() {
    let f = setup();
    let audio = f.create(ELECTRONICS_CATEGORY, None, "Audio").await;

    // 直接写入一个分类不存在的节点
    let mut stray = audio.clone();
    stray.id = 500;
    stray.category_id = 77;
    f.repo.insert_raw(stray);

    let chain = f.services.navigator.get_parent_chain(500).await.unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].kind, BreadcrumbKind::Subcategory);
}

#[tokio::test]
async fn test_set_status_toggles_flags() {
    let f = setup();
    let node = f.create(ELECTRONICS_CATEGORY, None, "Drones").await;

    let updated = f
        .services
        .mutator
        .set_status(node.id, Some(false), Some(true), None)
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert!(updated.is_featured);

    let err = f
        .services
        .mutator
        .set_status(node.id, None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation(_)));

    let err = f
        .services
        .mutator
        .set_status(12345, Some(true), None, None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
