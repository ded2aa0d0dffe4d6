use chrono::{Datelike, Utc};

use crate::error::{ApiError, ApiResult};
use crate::schema::{BuildingFeatures, NumberLike, RawBuildingInput};

pub const MIN_YEAR_BUILT: i64 = 1800;

/// Validates a raw request body and normalizes it into [`BuildingFeatures`].
///
/// Strings are trimmed, integer fields accept whole floats and numeric strings,
/// and `YearBuilt` must fall in `[1800, current UTC year]`.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] naming the first offending field.
pub fn validate(raw: &RawBuildingInput) -> ApiResult<BuildingFeatures> {
    let primary_property_type = non_empty("PrimaryPropertyType", &raw.primary_property_type)?;
    let year_built = integer("YearBuilt", &raw.year_built)?;
    let number_of_buildings = integer("NumberofBuildings", &raw.number_of_buildings)?;
    let number_of_floors = integer("NumberofFloors", &raw.number_of_floors)?;
    let largest_property_use_type =
        non_empty("LargestPropertyUseType", &raw.largest_property_use_type)?;
    let largest_property_use_type_gfa =
        float("LargestPropertyUseTypeGFA", &raw.largest_property_use_type_gfa)?;

    let current_year = i64::from(Utc::now().year());
    if !(MIN_YEAR_BUILT..=current_year).contains(&year_built) {
        return Err(invalid(
            "YearBuilt",
            format!("must be between {MIN_YEAR_BUILT} and {current_year}, got {year_built}"),
        ));
    }
    if number_of_buildings < 0 {
        return Err(invalid("NumberofBuildings", "must be >= 0"));
    }
    if number_of_floors < 0 {
        return Err(invalid("NumberofFloors", "must be >= 0"));
    }
    if largest_property_use_type_gfa < 0.0 {
        return Err(invalid("LargestPropertyUseTypeGFA", "must be >= 0"));
    }

    Ok(BuildingFeatures {
        primary_property_type,
        year_built,
        number_of_buildings,
        number_of_floors,
        largest_property_use_type,
        largest_property_use_type_gfa,
    })
}

fn invalid(field: &str, reason: impl std::fmt::Display) -> ApiError {
    ApiError::Validation(format!("{field}: {reason}"))
}

fn non_empty(field: &str, value: &Option<String>) -> ApiResult<String> {
    let value = value.as_deref().ok_or_else(|| invalid(field, "field required"))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn integer(field: &str, value: &Option<NumberLike>) -> ApiResult<i64> {
    match value {
        None => Err(invalid(field, "field required")),
        Some(NumberLike::Int(n)) => Ok(*n),
        Some(NumberLike::Float(f)) => whole(field, *f),
        Some(NumberLike::Text(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => Ok(n),
                Err(_) => {
                    let f = s
                        .parse::<f64>()
                        .map_err(|_| invalid(field, "must be a valid integer"))?;
                    whole(field, f)
                }
            }
        }
    }
}

fn whole(field: &str, f: f64) -> ApiResult<i64> {
    // i64::MAX as f64 rounds up, hence the strict upper bound
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(invalid(field, "must be a valid integer"))
    }
}

fn float(field: &str, value: &Option<NumberLike>) -> ApiResult<f64> {
    let f = match value {
        None => return Err(invalid(field, "field required")),
        Some(NumberLike::Int(n)) => *n as f64,
        Some(NumberLike::Float(f)) => *f,
        Some(NumberLike::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(field, "must be a valid number"))?,
    };
    if !f.is_finite() {
        return Err(invalid(field, "must be a finite number"));
    }
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel() -> RawBuildingInput {
        RawBuildingInput {
            primary_property_type: Some("Hotel".into()),
            year_built: Some(NumberLike::Int(1995)),
            number_of_buildings: Some(NumberLike::Int(1)),
            number_of_floors: Some(NumberLike::Int(10)),
            largest_property_use_type: Some("Hotel".into()),
            largest_property_use_type_gfa: Some(NumberLike::Float(50000.0)),
        }
    }

    fn rejected_field(raw: &RawBuildingInput) -> String {
        match validate(raw) {
            Err(ApiError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_payload_passes_through() {
        let features = validate(&hotel()).unwrap();
        assert_eq!(
            features,
            BuildingFeatures {
                primary_property_type: "Hotel".into(),
                year_built: 1995,
                number_of_buildings: 1,
                number_of_floors: 10,
                largest_property_use_type: "Hotel".into(),
                largest_property_use_type_gfa: 50000.0,
            }
        );
    }

    #[test]
    fn strings_are_trimmed() {
        let mut raw = hotel();
        raw.primary_property_type = Some("  Small- and Mid-Sized Office \t".into());
        raw.largest_property_use_type = Some(" Office ".into());
        let features = validate(&raw).unwrap();
        assert_eq!(features.primary_property_type, "Small- and Mid-Sized Office");
        assert_eq!(features.largest_property_use_type, "Office");
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let current = i64::from(Utc::now().year());
        for year in [MIN_YEAR_BUILT, 1900, current] {
            let mut raw = hotel();
            raw.year_built = Some(NumberLike::Int(year));
            assert_eq!(validate(&raw).unwrap().year_built, year);
        }
        for year in [1700, MIN_YEAR_BUILT - 1, current + 1, -5] {
            let mut raw = hotel();
            raw.year_built = Some(NumberLike::Int(year));
            assert!(rejected_field(&raw).starts_with("YearBuilt"));
        }
    }

    #[test]
    fn negative_counts_are_rejected() {
        let mut raw = hotel();
        raw.number_of_buildings = Some(NumberLike::Int(-1));
        assert!(rejected_field(&raw).starts_with("NumberofBuildings"));

        let mut raw = hotel();
        raw.number_of_floors = Some(NumberLike::Int(-3));
        assert!(rejected_field(&raw).starts_with("NumberofFloors"));

        let mut raw = hotel();
        raw.largest_property_use_type_gfa = Some(NumberLike::Float(-0.5));
        assert!(rejected_field(&raw).starts_with("LargestPropertyUseTypeGFA"));
    }

    #[test]
    fn zero_counts_are_allowed() {
        let mut raw = hotel();
        raw.number_of_buildings = Some(NumberLike::Int(0));
        raw.number_of_floors = Some(NumberLike::Int(0));
        raw.largest_property_use_type_gfa = Some(NumberLike::Int(0));
        let features = validate(&raw).unwrap();
        assert_eq!(features.number_of_buildings, 0);
        assert_eq!(features.largest_property_use_type_gfa, 0.0);
    }

    #[test]
    fn blank_strings_are_rejected() {
        let mut raw = hotel();
        raw.primary_property_type = Some("   ".into());
        assert!(rejected_field(&raw).starts_with("PrimaryPropertyType"));

        let mut raw = hotel();
        raw.largest_property_use_type = Some(String::new());
        assert!(rejected_field(&raw).starts_with("LargestPropertyUseType"));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut raw = hotel();
        raw.number_of_floors = None;
        assert_eq!(rejected_field(&raw), "NumberofFloors: field required");
    }

    #[test]
    fn numeric_values_are_coerced() {
        let mut raw = hotel();
        raw.year_built = Some(NumberLike::Text(" 1995 ".into()));
        raw.number_of_buildings = Some(NumberLike::Float(2.0));
        raw.number_of_floors = Some(NumberLike::Text("4.0".into()));
        raw.largest_property_use_type_gfa = Some(NumberLike::Text("1234.5".into()));
        let features = validate(&raw).unwrap();
        assert_eq!(features.year_built, 1995);
        assert_eq!(features.number_of_buildings, 2);
        assert_eq!(features.number_of_floors, 4);
        assert_eq!(features.largest_property_use_type_gfa, 1234.5);
    }

    #[test]
    fn fractional_or_garbage_integers_are_rejected() {
        let mut raw = hotel();
        raw.number_of_floors = Some(NumberLike::Float(2.5));
        assert!(rejected_field(&raw).starts_with("NumberofFloors"));

        let mut raw = hotel();
        raw.year_built = Some(NumberLike::Text("nineteen".into()));
        assert!(rejected_field(&raw).starts_with("YearBuilt"));

        let mut raw = hotel();
        raw.largest_property_use_type_gfa = Some(NumberLike::Text("NaN".into()));
        assert!(rejected_field(&raw).starts_with("LargestPropertyUseTypeGFA"));
    }
}
