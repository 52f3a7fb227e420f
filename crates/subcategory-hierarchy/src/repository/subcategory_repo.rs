//! 子分类 PostgreSQL 仓储
//!
//! 表结构见 migrations/0001_create_subcategories.sql。
//! 多语言字段按列存储（name_en / name_ar / description_en / description_ar）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::traits::SubcategoryRepositoryTrait;
use crate::error::{HierarchyError, Result};
use crate::models::{
    LocalizedText, NewSubcategory, SubcategoryFilter, SubcategoryNode, SubcategoryPatch,
    SubtreeMove,
};

const SUBCATEGORY_COLUMNS: &str = "id, category_id, parent_id, level, name_en, name_ar, \
     description_en, description_ar, display_order, is_active, is_featured, image, \
     created_at, updated_at";

const SIBLING_ORDER: &str = r#"ORDER BY display_order ASC, LOWER(name_en) COLLATE "C" ASC, id ASC"#;

#[derive(Debug, sqlx::FromRow)]
struct SubcategoryRow {
    id: i64,
    category_id: i64,
    parent_id: Option<i64>,
    level: i32,
    name_en: String,
    name_ar: Option<String>,
    description_en: Option<String>,
    description_ar: Option<String>,
    display_order: i32,
    is_active: bool,
    is_featured: bool,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubcategoryRow> for SubcategoryNode {
    fn from(row: SubcategoryRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            parent_id: row.parent_id,
            level: row.level,
            name: LocalizedText::new(row.name_en, row.name_ar),
            description: LocalizedText::from_columns(row.description_en, row.description_ar),
            display_order: row.display_order,
            is_active: row.is_active,
            is_featured: row.is_featured,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 子分类仓储
pub struct PgSubcategoryRepository {
    pool: PgPool,
}

impl PgSubcategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str, ids: &[i64]) -> Result<Vec<SubcategoryNode>> {
        let rows = sqlx::query_as::<_, SubcategoryRow>(sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(SubcategoryNode::from).collect())
    }
}

#[async_trait]
impl SubcategoryRepositoryTrait for PgSubcategoryRepository {
    async fn create(&self, node: &NewSubcategory) -> Result<SubcategoryNode> {
        let sql = format!(
            r#"
            INSERT INTO subcategories (
                category_id, parent_id, level, name_en, name_ar,
                description_en, description_ar, display_order, is_active, is_featured, image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SUBCATEGORY_COLUMNS}
            "#
        );
        let description = node.description.as_ref();
        let row = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(node.category_id)
            .bind(node.parent_id)
            .bind(node.level)
            .bind(&node.name.en)
            .bind(&node.name.ar)
            .bind(description.map(|d| d.en.as_str()))
            .bind(description.map(|d| d.ar.as_str()))
            .bind(node.display_order)
            .bind(node.is_active)
            .bind(node.is_featured)
            .bind(node.image.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SubcategoryNode>> {
        let sql = format!("SELECT {SUBCATEGORY_COLUMNS} FROM subcategories WHERE id = $1");
        let row = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<SubcategoryNode>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories WHERE id = ANY($1) ORDER BY id"
        );
        self.fetch_many(&sql, ids).await
    }

    async fn update(&self, id: i64, patch: &SubcategoryPatch) -> Result<SubcategoryNode> {
        // 可空字段用 (是否修改, 新值) 两个参数表达，以区分“不变”和“清空”
        let sql = format!(
            r#"
            UPDATE subcategories SET
                name_en = COALESCE($2, name_en),
                name_ar = COALESCE($3, name_ar),
                description_en = CASE WHEN $4 THEN $5 ELSE description_en END,
                description_ar = CASE WHEN $4 THEN $6 ELSE description_ar END,
                display_order = COALESCE($7, display_order),
                is_active = COALESCE($8, is_active),
                is_featured = COALESCE($9, is_featured),
                image = CASE WHEN $10 THEN $11 ELSE image END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUBCATEGORY_COLUMNS}
            "#
        );
        let description = patch.description.as_ref().map(|d| d.as_ref());
        let row = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(id)
            .bind(patch.name.as_ref().map(|n| n.en.as_str()))
            .bind(patch.name.as_ref().map(|n| n.ar.as_str()))
            .bind(description.is_some())
            .bind(description.flatten().map(|d| d.en.as_str()))
            .bind(description.flatten().map(|d| d.ar.as_str()))
            .bind(patch.display_order)
            .bind(patch.is_active)
            .bind(patch.is_featured)
            .bind(patch.image.is_some())
            .bind(patch.image.as_ref().and_then(|i| i.as_deref()))
            .fetch_optional(&self.pool)
            .await?;

        row.map(Into::into)
            .ok_or(HierarchyError::SubcategoryNotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(HierarchyError::SubcategoryNotFound(id));
        }
        Ok(())
    }

    async fn list_by_parent(&self, parent_id: i64) -> Result<Vec<SubcategoryNode>> {
        self.list_by_parents(&[parent_id]).await
    }

    async fn list_by_parents(&self, parent_ids: &[i64]) -> Result<Vec<SubcategoryNode>> {
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories WHERE parent_id = ANY($1) {SIBLING_ORDER}"
        );
        self.fetch_many(&sql, parent_ids).await
    }

    async fn list_roots_by_category(&self, category_id: i64) -> Result<Vec<SubcategoryNode>> {
        let sql = format!(
            "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories \
             WHERE category_id = $1 AND parent_id IS NULL {SIBLING_ORDER}"
        );
        let rows = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn name_exists(
        &self,
        name: &str,
        category_id: i64,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subcategories
                WHERE category_id = $1
                  AND LOWER(TRIM(name_en)) = LOWER(TRIM($2))
                  AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(category_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_children(&self, parent_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subcategories WHERE parent_id = $1")
                .bind(parent_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn apply_subtree_move(&self, mv: &SubtreeMove) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE subcategories SET parent_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(mv.node_id)
        .bind(mv.new_parent_id)
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            // tx 在 drop 时回滚
            return Err(HierarchyError::SubcategoryNotFound(mv.node_id));
        }

        let ids = mv.affected_ids();
        let levels: Vec<i32> = mv.levels.iter().map(|l| l.level).collect();

        let cascaded = sqlx::query(
            r#"
            UPDATE subcategories AS s
            SET level = v.level, category_id = $1, updated_at = NOW()
            FROM UNNEST($2::BIGINT[], $3::INT[]) AS v(id, level)
            WHERE s.id = v.id
            "#,
        )
        .bind(mv.category_id)
        .bind(&ids)
        .bind(&levels)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            node_id = mv.node_id,
            rows = cascaded.rows_affected(),
            "Subtree move applied"
        );
        Ok(())
    }

    async fn list(
        &self,
        filter: &SubcategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<SubcategoryNode>, i64)> {
        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(like_pattern);
        let parent_id = if filter.roots_only { None } else { filter.parent_id };

        let condition = r#"
            WHERE ($1::BIGINT IS NULL OR category_id = $1)
              AND ($2::BIGINT IS NULL OR parent_id = $2)
              AND (NOT $3 OR parent_id IS NULL)
              AND ($4::BOOLEAN IS NULL OR is_active = $4)
              AND ($5::BOOLEAN IS NULL OR is_featured = $5)
              AND ($6::TEXT IS NULL OR name_en ILIKE $6 ESCAPE '\' OR name_ar ILIKE $6 ESCAPE '\')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM subcategories {condition}"))
            .bind(filter.category_id)
            .bind(parent_id)
            .bind(filter.roots_only)
            .bind(filter.is_active)
            .bind(filter.is_featured)
            .bind(keyword.as_deref())
            .fetch_one(&self.pool)
            .await?;

        if total == 0 {
            return Ok((vec![], 0));
        }

        let sql = format!(
            "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories {condition} \
             ORDER BY category_id ASC, level ASC, display_order ASC, LOWER(name_en) COLLATE \"C\" ASC, id ASC \
             LIMIT $7 OFFSET $8"
        );
        let rows = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(filter.category_id)
            .bind(parent_id)
            .bind(filter.roots_only)
            .bind(filter.is_active)
            .bind(filter.is_featured)
            .bind(keyword.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}

/// 关键字转为 ILIKE 子串模式，转义 `\`、`%`、`_` 以按字面匹配
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
