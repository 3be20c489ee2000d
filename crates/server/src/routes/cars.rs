use axum::{
    extract::{multipart::{Field, MultipartError, MultipartRejection}, Multipart, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use common::types::Message;
use models::car;
use service::catalog::validation::MAX_COVER_BYTES;
use service::catalog::{CoverChange, CoverFile, ListParams, RawCarFields};

use crate::{errors::JsonApiError, routes::ServerState};

/// `GET /cars` query; values are kept as text and filtered permissively.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CarListQuery {
    /// CarType member or `All`
    pub car_type: Option<String>,
    pub brand: Option<String>,
    /// PriceRange member or `All`
    pub gamme: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    /// Positive integer; anything else is ignored
    pub limit: Option<String>,
}

impl From<CarListQuery> for ListParams {
    fn from(q: CarListQuery) -> Self {
        ListParams {
            car_type: q.car_type,
            brand: q.brand,
            gamme: q.gamme,
            fuel_type: q.fuel_type,
            transmission: q.transmission,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedCar {
    pub message: String,
    pub id: Uuid,
    pub cover: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedCar {
    pub message: String,
    pub car: car::Model,
}

/// Bearer header wins over the cookie. A header that is not `Bearer <token>`
/// is passed through whole so verification rejects it as invalid.
pub fn credential(headers: &HeaderMap, jar: &CookieJar, cookie_name: &str) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
        return Some(match value.strip_prefix("Bearer ").map(str::trim) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => value,
        });
    }
    jar.get(cookie_name).map(|c| c.value().to_string())
}

/// Non-UUID ids cannot name a listing.
fn parse_id(raw: &str) -> Result<Uuid, JsonApiError> {
    Uuid::parse_str(raw).map_err(|_| JsonApiError::not_found())
}

fn multipart_error(e: MultipartError) -> JsonApiError {
    JsonApiError::new(e.status(), "Invalid Multipart", Some(e.body_text()))
}

/// First `cap + 1` bytes of a part plus the total that arrived.
struct CappedPart {
    head: Vec<u8>,
    received: usize,
    /// The body ended (transport cap) while the part was being drained.
    cut_short: bool,
}

/// Buffer at most `cap + 1` bytes and drain the rest, so an oversized cover
/// still reaches validation instead of failing the transport.
async fn read_capped(field: &mut Field<'_>, cap: usize) -> Result<CappedPart, JsonApiError> {
    let mut part = CappedPart { head: Vec::new(), received: 0, cut_short: false };
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                part.received += chunk.len();
                let room = (cap + 1).saturating_sub(part.head.len());
                part.head.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => return Ok(part),
            Err(e) if part.received > cap => {
                debug!(err = %e, received = part.received, "body ended inside an oversized cover");
                part.cut_short = true;
                return Ok(part);
            }
            Err(e) => return Err(multipart_error(e)),
        }
    }
}

/// Split a car form into text fields and the optional cover part.
async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> Result<(RawCarFields, Option<CoverFile>), JsonApiError> {
    let mut multipart = multipart.map_err(|rej| JsonApiError::new(rej.status(), "Invalid Multipart", Some(rej.body_text())))?;
    let mut fields = RawCarFields::default();
    let mut cover: Option<CoverFile> = None;
    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // nothing after an oversized cover can change the outcome
            Err(e) if cover.as_ref().is_some_and(CoverFile::is_truncated) => {
                debug!(err = %e, "stopped reading form after oversized cover");
                break;
            }
            Err(e) => return Err(multipart_error(e)),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "cover" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let part = read_capped(&mut field, MAX_COVER_BYTES).await?;
            // browsers send an empty part when no file was chosen
            if filename.is_empty() && part.received == 0 {
                continue;
            }
            let cut_short = part.cut_short;
            cover = Some(if part.received > part.head.len() {
                CoverFile::truncated(filename, content_type, part.head, part.received)
            } else {
                CoverFile::new(filename, content_type, part.head)
            });
            if cut_short {
                break;
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            if !fields.set(&name, value) {
                debug!(field = %name, "ignoring unknown form field");
            }
        }
    }
    Ok((fields, cover))
}

#[utoipa::path(
    get, path = "/cars", tag = "cars",
    params(CarListQuery),
    responses(
        (status = 200, description = "Listings, newest first", body = [crate::openapi::CarListingDoc]),
        (status = 500, description = "Store unavailable", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn list(State(state): State<ServerState>, Query(query): Query<CarListQuery>) -> Result<Json<Vec<car::Model>>, JsonApiError> {
    let rows = state.catalog.list(&ListParams::from(query).into_query()).await?;
    debug!(count = rows.len(), "list cars");
    Ok(Json(rows))
}

#[utoipa::path(
    get, path = "/cars/{id}", tag = "cars",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = crate::openapi::CarListingDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<car::Model>, JsonApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.catalog.get(id).await?))
}

#[utoipa::path(
    post, path = "/cars", tag = "cars",
    request_body(content = crate::openapi::CarFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = crate::openapi::CreatedDoc),
        (status = 400, description = "Validation Failed / Missing Image", body = crate::openapi::ErrorDoc),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc),
        (status = 500, description = "Upload / store failure or misconfiguration", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    jar: CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreatedCar>), JsonApiError> {
    let token = credential(&headers, &jar, &state.cookie_name);
    state.catalog.admit_write(token.as_deref())?;
    let (fields, cover) = read_form(multipart).await?;
    let row = state.catalog.create(token.as_deref(), &fields, cover).await?;
    info!(car_id = %row.id, "created car");
    Ok((StatusCode::CREATED, Json(CreatedCar { message: "Car created".into(), id: row.id, cover: row.cover })))
}

#[utoipa::path(
    patch, path = "/cars/{id}", tag = "cars",
    params(("id" = String, Path, description = "Listing id")),
    request_body(content = crate::openapi::CarFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = crate::openapi::UpdatedDoc),
        (status = 400, description = "Validation Failed", body = crate::openapi::ErrorDoc),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UpdatedCar>, JsonApiError> {
    let id = parse_id(&id)?;
    let token = credential(&headers, &jar, &state.cookie_name);
    state.catalog.admit_write(token.as_deref())?;
    let (fields, cover) = read_form(multipart).await?;
    let row = state.catalog.update(token.as_deref(), id, &fields, CoverChange::from(cover)).await?;
    Ok(Json(UpdatedCar { message: "Car updated".into(), car: row }))
}

#[utoipa::path(
    delete, path = "/cars/{id}", tag = "cars",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::MessageDoc),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Json<Message>, JsonApiError> {
    let id = parse_id(&id)?;
    let token = credential(&headers, &jar, &state.cookie_name);
    state.catalog.delete(token.as_deref(), id).await?;
    Ok(Json(Message::new("Car deleted")))
}
