use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::services::ai::ChatUser;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    #[schema(example = "How many leave days do I have left?")]
    pub prompt: Option<String>,
    pub user: Option<ChatUser>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

/// Ask the HR assistant a question about your own records
#[utoipa::path(
    post,
    path = "/api/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Prompt or user missing"),
        (status = 500, description = "Generator failed"),
        (status = 503, description = "Assistant not configured")
    ),
    tag = "AI"
)]
pub async fn chat(
    body: web::Json<ChatRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let response = state
        .ai
        .answer(body.user.as_ref(), body.prompt.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ChatResponse { response }))
}
