//! 外部协作方的默认实现
//!
//! 分类与商品表由其他模块维护，这里只做只读查询和解绑更新；
//! 图片以相对路径形式存放在本地上传目录下。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::traits::{CategoryLookup, ImageStorage, ProductAssociation};
use crate::error::{HierarchyError, Result};
use crate::models::{CategorySummary, LocalizedText};

/// 基于 `categories` 表的分类查询
pub struct PgCategoryLookup {
    pool: PgPool,
}

impl PgCategoryLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryLookup for PgCategoryLookup {
    async fn get_category(&self, id: i64) -> Result<Option<CategorySummary>> {
        let row: Option<(i64, String, Option<String>)> =
            sqlx::query_as("SELECT id, name_en, name_ar FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, en, ar)| CategorySummary {
            id,
            name: LocalizedText::new(en, ar),
        }))
    }

    async fn category_exists(&self, id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

/// 基于 `products.subcategory_id` 的商品关联
pub struct PgProductAssociation {
    pool: PgPool,
}

impl PgProductAssociation {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductAssociation for PgProductAssociation {
    async fn count_by_subcategory(&self, subcategory_id: i64) -> Result<i64> {
        self.count_by_subcategories(&[subcategory_id]).await
    }

    async fn count_by_subcategories(&self, subcategory_ids: &[i64]) -> Result<i64> {
        if subcategory_ids.is_empty() {
            return Ok(0);
        }
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE subcategory_id = ANY($1)")
                .bind(subcategory_ids)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn reassign_subcategory(&self, subcategory_id: i64, to: Option<i64>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE products SET subcategory_id = $2, updated_at = NOW() WHERE subcategory_id = $1",
        )
        .bind(subcategory_id)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// 本地文件系统图片存储
///
/// 图片引用是上传目录下的相对路径，前导 `/` 会被忽略。
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 解析引用为上传目录内的路径，拒绝 `..` 等越界引用
    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let relative = Path::new(reference.trim().trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if reference.trim().is_empty() || escapes {
            return Err(HierarchyError::Storage(format!(
                "invalid image reference: {reference}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn delete_image(&self, reference: &str) -> Result<bool> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Image file removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Image file already absent");
                Ok(false)
            }
            Err(e) => Err(HierarchyError::Storage(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
