//! Query-string filters for listing.
//!
//! Permissive policy: "All", empty and non-member values are ignored rather
//! than rejected. Non-members are logged at debug.

use models::car::CarFilter;
use models::enums::parse_member;
use sea_orm::ActiveEnum;
use serde::Deserialize;
use tracing::debug;

/// Sentinel meaning "do not restrict on this field".
pub const ALL: &str = "All";

/// Raw `GET /cars` query. Everything stays text until `into_query`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub car_type: Option<String>,
    pub brand: Option<String>,
    pub gamme: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: CarFilter,
    pub limit: Option<u64>,
}

fn member<E: ActiveEnum<Value = String>>(field: &str, raw: &Option<String>) -> Option<E> {
    let raw = raw.as_deref().map(str::trim).filter(|s| !s.is_empty() && *s != ALL)?;
    let parsed = parse_member::<E>(raw);
    if parsed.is_none() {
        debug!(field, value = raw, "ignoring unknown filter value");
    }
    parsed
}

impl ListParams {
    pub fn into_query(&self) -> ListQuery {
        let filter = CarFilter {
            car_type: member("carType", &self.car_type),
            brand: member("brand", &self.brand),
            gamme: member("gamme", &self.gamme),
            fuel_type: member("fuelType", &self.fuel_type),
            transmission: member("transmission", &self.transmission),
        };
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<u64>().ok())
            .filter(|l| *l > 0);
        ListQuery { filter, limit }
    }
}

impl From<CarFilter> for ListQuery {
    fn from(filter: CarFilter) -> Self { Self { filter, limit: None } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::enums::{Brand, FuelType, PriceRange};

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut p = ListParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "carType" => p.car_type = v,
                "brand" => p.brand = v,
                "gamme" => p.gamme = v,
                "fuelType" => p.fuel_type = v,
                "transmission" => p.transmission = v,
                "limit" => p.limit = v,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn all_sentinel_equals_absent() {
        assert_eq!(params(&[("brand", "All")]).into_query(), ListParams::default().into_query());
        assert!(params(&[("brand", "All"), ("gamme", "All")]).into_query().filter.is_empty());
    }

    #[test]
    fn members_become_filters() {
        let q = params(&[("brand", "Renault"), ("gamme", "Budget"), ("fuelType", "Diesel")]).into_query();
        assert_eq!(q.filter.brand, Some(Brand::Renault));
        assert_eq!(q.filter.gamme, Some(PriceRange::Budget));
        assert_eq!(q.filter.fuel_type, Some(FuelType::Diesel));
        assert_eq!(q.filter.car_type, None);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let q = params(&[("brand", "Tesla"), ("carType", "economy"), ("transmission", "")]).into_query();
        assert!(q.filter.is_empty());
    }

    #[test]
    fn limit_must_be_positive_integer() {
        assert_eq!(params(&[("limit", "3")]).into_query().limit, Some(3));
        for bad in ["0", "-1", "abc", ""] {
            assert_eq!(params(&[("limit", bad)]).into_query().limit, None, "{bad}");
        }
    }

    #[test]
    fn deserializes_camel_case_query() {
        let p: ListParams = serde_json::from_str(r#"{"carType":"Suv","fuelType":"Hybrid","limit":"2"}"#).unwrap();
        let q = p.into_query();
        assert!(q.filter.car_type.is_some());
        assert_eq!(q.limit, Some(2));
    }
}
