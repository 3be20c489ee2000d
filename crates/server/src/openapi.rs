use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarListingDoc {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub car_type: String,
    pub brand: String,
    pub gamme: String,
    pub price: String,
    pub seats: i32,
    pub doors: i32,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub air_conditioning: bool,
    pub quantity: i32,
    pub cover: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Multipart form for create and update. Every field is resent on update;
/// `cover` is required on create only.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarFormDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub car_type: String,
    pub brand: String,
    pub gamme: String,
    pub price: String,
    pub seats: String,
    pub doors: String,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    /// `"true"` enables it; anything else disables it
    pub air_conditioning: Option<String>,
    pub quantity: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub cover: Option<Vec<u8>>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedDoc { pub message: String, pub id: Uuid, pub cover: String }

#[derive(Serialize, ToSchema)]
pub struct UpdatedDoc { pub message: String, pub car: CarListingDoc }

#[derive(Serialize, ToSchema)]
pub struct FieldErrorDoc {
    pub field: String,
    /// Required | InvalidRange | InvalidEnum | InvalidFile
    pub kind: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDoc {
    pub error: String,
    pub message: String,
    pub fields: Option<Vec<FieldErrorDoc>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::cars::list,
        crate::routes::cars::get,
        crate::routes::cars::create,
        crate::routes::cars::update,
        crate::routes::cars::delete,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            CarListingDoc,
            CarFormDoc,
            CreatedDoc,
            UpdatedDoc,
            FieldErrorDoc,
            ErrorDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "cars")
    )
)]
pub struct ApiDoc;
