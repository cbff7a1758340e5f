use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{role::Role, user::User};
use crate::services::account::Signup;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub pass: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "Sam Lee")]
    pub name: String,
    #[schema(example = "sam@example.com")]
    pub email: String,
    #[schema(example = "hunter22")]
    pub pass: String,
    pub role: Role,
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = User),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid email or password"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(state, body), fields(email = %body.email))]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let user = state.accounts.login(&body.email, &body.pass).await?;

    debug!(user_id = user.id, role = %user.role, "Login successful");
    Ok(HttpResponse::Ok().json(user))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Email already registered or fields missing", body = Object, example = json!({
            "message": "An account with this email already exists."
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_signup", skip(state, body), fields(email = %body.email))]
pub async fn signup(
    body: web::Json<SignupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Signup request received");

    let SignupRequest {
        name,
        email,
        pass,
        role,
    } = body.into_inner();
    let user = state
        .accounts
        .signup(Signup {
            name,
            email,
            password: pass,
            role,
        })
        .await?;

    Ok(HttpResponse::Created().json(user))
}
