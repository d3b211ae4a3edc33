use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    AppState,
    error::{handle_panic, not_found},
    middleware::log_errors,
    routes,
};

// 代理的三个只读接口
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/user/{id}", get(routes::user::get_user))
        .route("/user/{id}/tweets", get(routes::user::get_user_tweets))
        .route("/tweet/{id}", get(routes::tweet::get_tweet))
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .nest("/api", api_routes())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(log_errors))
                .layer(CatchPanicLayer::custom(handle_panic)),
        );

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
