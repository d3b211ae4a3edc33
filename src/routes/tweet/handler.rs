use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::AppState;
use crate::routes::ProxyResponse;

#[axum::debug_handler]
pub async fn get_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> impl IntoResponse {
    let req_id = Uuid::new_v4().to_string();
    tracing::debug!(req_id = %req_id, tweet_id = %tweet_id, "incoming request /tweet/:id");

    ProxyResponse(state.proxy.lookup_post(&tweet_id, &req_id).await)
}
