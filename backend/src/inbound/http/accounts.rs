//! Account API handlers.
//!
//! ```text
//! POST /api/v1/register {"email":"budi@example.com","name":"Budi","password":"rahasia","role":"pendonor","bloodType":"O+"}
//! POST /api/v1/login {"email":"budi@example.com","password":"rahasia"}
//! POST /api/v1/logout
//! GET /api/v1/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::RegisterUserRequest;
use crate::domain::{
    BloodType, CredentialValidationError, EmailAddress, Error, LoginCredentials, Password,
    PersonName, PhoneNumber, User, UserRole,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_field, require,
};

const EMAIL: FieldName = FieldName::new("email");
const NAME: FieldName = FieldName::new("name");
const PASSWORD: FieldName = FieldName::new("password");
const ROLE: FieldName = FieldName::new("role");
const BLOOD_TYPE: FieldName = FieldName::new("bloodType");
const PHONE: FieldName = FieldName::new("phone");

/// Registration payload for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "budi@example.com")]
    pub email: Option<String>,
    #[schema(example = "Budi Santoso")]
    pub name: Option<String>,
    #[schema(example = "rahasia123")]
    pub password: Option<String>,
    /// `admin`, `pendonor`, or `pemohon`.
    #[schema(example = "pendonor")]
    pub role: Option<String>,
    /// Required for donors, rejected for other roles.
    #[schema(example = "O+")]
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "admin@hospital.com")]
    pub email: String,
    #[schema(example = "admin123")]
    pub password: String,
}

/// Public view of a user. The credential hash never leaves the domain.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub email: String,
    pub name: String,
    #[schema(example = "pendonor")]
    pub role: String,
    #[schema(example = "O+")]
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub registered_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            role: user.role().to_string(),
            blood_type: user.blood_type().map(|blood_type| blood_type.to_string()),
            phone: user.phone().map(|phone| phone.as_ref().to_owned()),
            address: user.address().map(str::to_owned),
            registered_at: user.registered_at().to_rfc3339(),
        }
    }
}

fn parse_register_request(payload: RegisterRequest) -> Result<RegisterUserRequest, Error> {
    let raw_email = require(payload.email, EMAIL)?;
    let email =
        EmailAddress::new(&raw_email).map_err(|err| invalid_value_error(EMAIL, &raw_email, err))?;
    let raw_name = require(payload.name, NAME)?;
    let name =
        PersonName::new(&raw_name).map_err(|err| invalid_value_error(NAME, &raw_name, err))?;
    let raw_password = require(payload.password, PASSWORD)?;
    let password = Password::new_for_registration(&raw_password)
        .map_err(|err| invalid_value_error(PASSWORD, "<redacted>", err))?;
    let role: UserRole = parse_field(payload.role, ROLE)?;
    let blood_type = payload
        .blood_type
        .map(|raw| parse_field::<BloodType>(Some(raw), BLOOD_TYPE))
        .transpose()?;
    let phone = payload
        .phone
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| PhoneNumber::new(&raw).map_err(|err| invalid_value_error(PHONE, &raw, err)))
        .transpose()?;
    let address = payload
        .address
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty());

    Ok(RegisterUserRequest {
        email,
        name,
        password,
        role,
        blood_type,
        phone,
        address,
    })
}

fn map_login_validation_error(err: CredentialValidationError) -> Error {
    let field = match err {
        CredentialValidationError::InvalidEmail => EMAIL,
        CredentialValidationError::EmptyPassword
        | CredentialValidationError::PasswordTooShort { .. } => PASSWORD,
    };
    invalid_value_error(field, "", err)
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = parse_register_request(payload.into_inner())?;
    let user = state.accounts.register(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (
            status = 200,
            description = "Login success",
            headers(("Set-Cookie" = String, description = "Session cookie")),
            body = UserResponse
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(map_login_validation_error)?;
    let user = state.accounts.authenticate(&credentials).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Return the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let user = state.accounts.current_user(&user_id).await?;
    Ok(web::Json(UserResponse::from(user)))
}
