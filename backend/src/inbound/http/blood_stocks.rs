//! Blood stock HTTP handlers.
//!
//! ```text
//! GET /api/v1/blood-stocks
//! PUT /api/v1/admin/blood-stocks/{bloodType} {"quantity":30}
//! ```

use actix_web::{get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::rules::MAX_STOCK_QUANTITY;
use crate::domain::{BloodStock, BloodType, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, parse_field, require};

const BLOOD_TYPE: FieldName = FieldName::new("bloodType");
const QUANTITY: FieldName = FieldName::new("quantity");

/// Stock level for one blood type.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BloodStockResponse {
    #[schema(example = "O-")]
    pub blood_type: String,
    #[schema(example = 25)]
    pub quantity: u32,
    /// `Aman`, `Menipis`, or `Kritis`; derived from the quantity.
    #[schema(example = "Aman")]
    pub status: String,
    pub updated_at: String,
}

impl From<BloodStock> for BloodStockResponse {
    fn from(stock: BloodStock) -> Self {
        Self {
            blood_type: stock.blood_type().to_string(),
            quantity: stock.quantity(),
            status: stock.status().to_string(),
            updated_at: stock.updated_at().to_rfc3339(),
        }
    }
}

/// Request payload for setting the units on hand.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
    #[schema(example = 30)]
    pub quantity: Option<i64>,
}

fn parse_quantity(value: Option<i64>) -> Result<u32, Error> {
    let raw = require(value, QUANTITY)?;
    u32::try_from(raw)
        .ok()
        .filter(|quantity| *quantity <= MAX_STOCK_QUANTITY)
        .ok_or_else(|| {
            invalid_value_error(
                QUANTITY,
                &raw.to_string(),
                format!("quantity must be a whole number between 0 and {MAX_STOCK_QUANTITY}"),
            )
        })
}

/// List every blood type with its current stock.
#[utoipa::path(
    get,
    path = "/api/v1/blood-stocks",
    description = "Missing blood types are initialised before listing.",
    responses(
        (status = 200, description = "Stock per blood type", body = [BloodStockResponse]),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["blood-stocks"],
    operation_id = "listBloodStocks",
    security([])
)]
#[get("/blood-stocks")]
pub async fn list_stocks(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<BloodStockResponse>>> {
    let stocks = state.stocks_query.list_stocks().await?;
    Ok(web::Json(
        stocks.into_iter().map(BloodStockResponse::from).collect(),
    ))
}

/// Set the units on hand for one blood type.
#[utoipa::path(
    put,
    path = "/api/v1/admin/blood-stocks/{bloodType}",
    params(("bloodType" = String, Path, description = "Blood type label, for example `O-`")),
    request_body = StockUpdateRequest,
    responses(
        (status = 200, description = "Updated stock", body = BloodStockResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["blood-stocks"],
    operation_id = "updateBloodStock"
)]
#[put("/admin/blood-stocks/{blood_type}")]
pub async fn update_stock(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<StockUpdateRequest>,
) -> ApiResult<web::Json<BloodStockResponse>> {
    let user_id = session.require_user_id()?;
    let blood_type: BloodType = parse_field(Some(path.into_inner()), BLOOD_TYPE)?;
    let quantity = parse_quantity(payload.into_inner().quantity)?;
    let stock = state
        .stocks
        .update_quantity(&user_id, blood_type, quantity)
        .await?;
    Ok(web::Json(BloodStockResponse::from(stock)))
}
