use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // A001 CATEGORIES
        // ========================================
        .route("/api/categories", get(handlers::a001_category::list))
        .route(
            "/api/categories/bulk-update",
            post(handlers::a001_category::bulk_update),
        )
        .route(
            "/api/categories/export.csv",
            get(handlers::a001_category::export_csv),
        )
        .route(
            "/api/categories/history",
            get(handlers::a001_category::history),
        )
        .route(
            "/api/categories/history/:id",
            get(handlers::a001_category::history_details),
        )
        .route(
            "/api/categories/history/:id/recover",
            post(handlers::a001_category::recover),
        )
        // ========================================
        // IMAGES
        // ========================================
        .route("/api/images", post(handlers::images::upload))
        .route("/api/images/urls", post(handlers::images::urls))
        .route("/api/images/file", get(handlers::images::file))
        // ========================================
        // A002 COMMISSION RULES
        // ========================================
        .route(
            "/api/commission-rules",
            get(handlers::a002_commission_rule::list).post(handlers::a002_commission_rule::create),
        )
        .route(
            "/api/commission-rules/validate-formula",
            post(handlers::a002_commission_rule::validate_formula),
        )
        .route(
            "/api/commission-rules/test-formula",
            post(handlers::a002_commission_rule::test_formula),
        )
        .route(
            "/api/commission-rules/conflicts",
            get(handlers::a002_commission_rule::conflicts),
        )
        .route(
            "/api/commission-rules/:id",
            get(handlers::a002_commission_rule::get_by_id)
                .put(handlers::a002_commission_rule::update)
                .delete(handlers::a002_commission_rule::delete),
        )
        .route(
            "/api/commission-rules/:id/state",
            post(handlers::a002_commission_rule::update_state),
        )
        // ========================================
        // SYSTEM LOG
        // ========================================
        .route(
            "/api/logs",
            get(handlers::logs::list_all)
                .post(handlers::logs::create)
                .delete(handlers::logs::clear_all),
        )
}
