//! Pure checks turning a raw form field bag into a `CarDraft`.
//!
//! Malformed input is a normal outcome: every violation is collected and
//! returned, nothing panics and nothing short-circuits.

use std::fmt;

use models::car::{CarDraft, DOORS, SEATS};
use models::enums::{member_names, parse_member, Brand, CarType, FuelType, PriceRange, Transmission};
use sea_orm::ActiveEnum;
use serde::Serialize;

use super::cover::CoverFile;

/// 10 MiB
pub const MAX_COVER_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Required,
    InvalidRange,
    InvalidEnum,
    InvalidFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { field, kind, message: message.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn errors(&self) -> &[FieldError] { &self.0 }

    pub fn has(&self, field: &str, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.field == field && e.kind == kind)
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    fn push(&mut self, e: FieldError) { self.0.push(e); }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Form fields exactly as received; every value is still text.
#[derive(Debug, Clone, Default)]
pub struct RawCarFields {
    pub name: Option<String>,
    pub car_type: Option<String>,
    pub brand: Option<String>,
    pub gamme: Option<String>,
    pub price: Option<String>,
    pub seats: Option<String>,
    pub doors: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub air_conditioning: Option<String>,
    pub quantity: Option<String>,
}

impl RawCarFields {
    /// Store a form field by its wire name. Unknown names are ignored and reported as `false`.
    pub fn set(&mut self, wire_name: &str, value: String) -> bool {
        let slot = match wire_name {
            "name" => &mut self.name,
            "type" => &mut self.car_type,
            "brand" => &mut self.brand,
            "gamme" => &mut self.gamme,
            "price" => &mut self.price,
            "seats" => &mut self.seats,
            // legacy spelling still sent by older admin forms
            "doors" | "dors" => &mut self.doors,
            "transmission" => &mut self.transmission,
            "fuelType" => &mut self.fuel_type,
            "airConditioning" => &mut self.air_conditioning,
            "quantity" => &mut self.quantity,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required_text(errors: &mut ValidationErrors, field: &'static str, v: &Option<String>) -> Option<String> {
    match present(v) {
        Some(s) => Some(s.to_string()),
        None => {
            errors.push(FieldError::new(field, ErrorKind::Required, format!("{field} is required")));
            None
        }
    }
}

fn required_enum<E>(errors: &mut ValidationErrors, field: &'static str, v: &Option<String>) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    let Some(raw) = present(v) else {
        errors.push(FieldError::new(field, ErrorKind::Required, format!("{field} is required")));
        return None;
    };
    optional_enum_value(errors, field, raw)
}

/// Blank means "not set"; anything else must be a member.
fn optional_enum<E>(errors: &mut ValidationErrors, field: &'static str, v: &Option<String>) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    present(v).and_then(|raw| optional_enum_value(errors, field, raw))
}

fn optional_enum_value<E>(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    let parsed = parse_member::<E>(raw);
    if parsed.is_none() {
        errors.push(FieldError::new(
            field,
            ErrorKind::InvalidEnum,
            format!("{field} must be one of: {}", member_names::<E>().join(", ")),
        ));
    }
    parsed
}

/// `max` is inclusive; an unbounded field passes `i32::MAX` so overflow reads as out of range.
fn int_in(errors: &mut ValidationErrors, field: &'static str, v: &Option<String>, min: i32, max: i32) -> Option<i32> {
    let parsed = present(v).and_then(|s| s.parse::<i32>().ok());
    match parsed {
        Some(n) if (min..=max).contains(&n) => Some(n),
        _ => {
            errors.push(FieldError::new(field, ErrorKind::InvalidRange, format!("{field} must be an integer between {min} and {max}")));
            None
        }
    }
}

fn price(errors: &mut ValidationErrors, v: &Option<String>) -> Option<String> {
    let raw = required_text(errors, "price", v)?;
    let positive = raw
        .replace(',', ".")
        .parse::<f64>()
        .map(|p| p.is_finite() && p > 0.0)
        .unwrap_or(false);
    if !positive {
        errors.push(FieldError::new("price", ErrorKind::InvalidRange, "price must be a number greater than 0"));
        return None;
    }
    Some(raw)
}

/// Check an uploaded cover: `image/*` and at most 10 MiB.
pub fn validate_cover(file: &CoverFile) -> Result<(), FieldError> {
    if !file.content_type.starts_with("image/") {
        return Err(FieldError::new("cover", ErrorKind::InvalidFile, "cover must be an image"));
    }
    if file.size() == 0 {
        return Err(FieldError::new("cover", ErrorKind::InvalidFile, "cover file is empty"));
    }
    if file.size() > MAX_COVER_BYTES {
        return Err(FieldError::new("cover", ErrorKind::InvalidFile, "cover must not exceed 10 MiB"));
    }
    Ok(())
}

/// Validate listing fields and, when given, the cover file.
///
/// # Examples
/// ```
/// use service::catalog::validation::{validate, RawCarFields};
/// let mut raw = RawCarFields::default();
/// for (k, v) in [("name", "Clio"), ("type", "Economy"), ("brand", "Renault"), ("gamme", "Budget"),
///                ("price", "250"), ("seats", "5"), ("doors", "4"), ("quantity", "3")] {
///     raw.set(k, v.to_string());
/// }
/// let draft = validate(&raw, None).unwrap();
/// assert_eq!(draft.seats, 5);
/// assert!(!draft.air_conditioning);
/// ```
pub fn validate(raw: &RawCarFields, cover: Option<&CoverFile>) -> Result<CarDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = required_text(&mut errors, "name", &raw.name);
    let price = price(&mut errors, &raw.price);
    let car_type = required_enum::<CarType>(&mut errors, "type", &raw.car_type);
    let brand = required_enum::<Brand>(&mut errors, "brand", &raw.brand);
    let gamme = required_enum::<PriceRange>(&mut errors, "gamme", &raw.gamme);
    let seats = int_in(&mut errors, "seats", &raw.seats, *SEATS.start(), *SEATS.end());
    let doors = int_in(&mut errors, "doors", &raw.doors, *DOORS.start(), *DOORS.end());
    let quantity = int_in(&mut errors, "quantity", &raw.quantity, 0, i32::MAX);
    let transmission = optional_enum::<Transmission>(&mut errors, "transmission", &raw.transmission);
    let fuel_type = optional_enum::<FuelType>(&mut errors, "fuelType", &raw.fuel_type);
    let air_conditioning = present(&raw.air_conditioning) == Some("true");

    if let Some(file) = cover {
        if let Err(e) = validate_cover(file) { errors.push(e); }
    }

    match (name, price, car_type, brand, gamme, seats, doors, quantity) {
        (Some(name), Some(price), Some(car_type), Some(brand), Some(gamme), Some(seats), Some(doors), Some(quantity))
            if errors.is_empty() =>
        {
            Ok(CarDraft { name, car_type, brand, gamme, price, seats, doors, transmission, fuel_type, air_conditioning, quantity })
        }
        _ => Err(errors),
    }
}
