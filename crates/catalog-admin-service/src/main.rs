//! 商品目录管理后台服务
//!
//! 提供子分类层级管理的 REST API。

use std::sync::Arc;

use anyhow::Context;
use catalog_admin_service::{handlers::health::SERVICE_NAME, routes, state::AppState};
use catalog_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability,
};
use subcategory_hierarchy::{
    HierarchyServices, LocalImageStorage, Locale, MemoryCatalog, MemoryImageStorage,
    PgCategoryLookup, PgProductAssociation, PgSubcategoryRepository,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME).context("加载配置失败")?;

    let _guard = observability::init(&config.observability, &config.service_name).await?;

    info!("Starting {} on {}", config.service_name, config.server_addr());

    let default_locale: Locale = config
        .storage
        .default_locale
        .parse()
        .map_err(anyhow::Error::msg)
        .context("storage.default_locale 无效")?;

    let (state, database) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }
            let pool = db.pool().clone();
            let services = HierarchyServices::new(
                Arc::new(PgSubcategoryRepository::new(pool.clone())),
                Arc::new(PgCategoryLookup::new(pool.clone())),
                Arc::new(PgProductAssociation::new(pool)),
                Arc::new(LocalImageStorage::new(config.storage.upload_dir.clone())),
            );
            (
                AppState::new(services, Some(db.clone()), default_locale),
                Some(db),
            )
        }
        StorageBackend::Memory => {
            warn!("使用内存存储，重启后数据丢失，仅用于本地开发");
            let catalog = Arc::new(MemoryCatalog::new());
            seed_demo_categories(&catalog);
            let state =
                AppState::in_memory(catalog, Arc::new(MemoryImageStorage::new()), default_locale);
            (state, None)
        }
    };

    let app = routes::build_app(state, &config.server.cors_origins, config.is_production());

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("Server shutdown complete");

    Ok(())
}

/// 内存模式下预置的顶级分类
fn seed_demo_categories(catalog: &MemoryCatalog) {
    catalog.add_category(1, "Electronics", Some("إلكترونيات"));
    catalog.add_category(2, "Fashion", Some("أزياء"));
    catalog.add_category(3, "Home & Kitchen", None);
}

/// 监听关闭信号（Ctrl+C 或 SIGTERM），触发 axum 优雅关闭
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
