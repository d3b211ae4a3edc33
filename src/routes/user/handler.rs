use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::AppState;
use crate::routes::{ProxyResponse, TimelineQuery};

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let req_id = Uuid::new_v4().to_string();
    tracing::debug!(req_id = %req_id, username = %username, "incoming request /user/:username");

    ProxyResponse(state.proxy.lookup_user(&username, &req_id).await)
}

#[axum::debug_handler]
pub async fn get_user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<TimelineQuery>,
) -> impl IntoResponse {
    let req_id = Uuid::new_v4().to_string();
    tracing::debug!(
        req_id = %req_id,
        user_id = %user_id,
        cursor = ?query.cursor,
        "incoming request /user/:userId/tweets"
    );

    let result = state
        .proxy
        .lookup_user_timeline(&user_id, query.cursor.as_deref(), &req_id)
        .await;
    ProxyResponse(result)
}
