use crate::error::{ChartError, ChartResult, Condition, Diagnostics};
use crate::ir::{CategoricalPoint, GeoPoint, RatioScalar, Series, TemporalCountPoint};
use crate::record::{as_records, FieldPath};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Category given to records whose label field is absent.
pub const MISSING_LABEL: &str = "(missing)";

/// Which fields to read and how to fold them into a series.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    TemporalCount { date: FieldPath },
    CategoricalValue { label: FieldPath, value: FieldPath },
    Ratio { left: FieldPath, right: FieldPath },
    Geo { latitude: FieldPath, longitude: FieldPath },
}

/// A series plus the non-fatal conditions raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub series: Series,
    pub diagnostics: Diagnostics,
}

/// Main entry point: project a record array into a typed series
pub fn extract(records: &Value, spec: &FieldSpec) -> ChartResult<Extraction> {
    let records = as_records(records)?;
    let mut diagnostics = Diagnostics::new();

    let series = match spec {
        FieldSpec::TemporalCount { date } => {
            Series::TemporalCount(count_by_date(records, date, &mut diagnostics)?)
        }
        FieldSpec::CategoricalValue { label, value } => {
            Series::CategoricalValue(categorical_values(records, label, value, &mut diagnostics)?)
        }
        FieldSpec::Ratio { left, right } => {
            Series::Ratio(same_value_ratio(records, left, right, &mut diagnostics)?)
        }
        FieldSpec::Geo { latitude, longitude } => {
            Series::Geo(geo_points(records, latitude, longitude, &mut diagnostics)?)
        }
    };

    log::debug!("extracted {} point(s) from {} record(s)", series.len(), records.len());
    Ok(Extraction { series, diagnostics })
}

/// Group by the exact date string; one point per distinct key, first-seen order.
fn count_by_date(
    records: &[Value],
    date: &FieldPath,
    diagnostics: &mut Diagnostics,
) -> ChartResult<Vec<TemporalCountPoint>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut points: Vec<TemporalCountPoint> = Vec::new();
    let mut skipped = 0;

    for record in records {
        let key = match date.read_str(record)? {
            Some(s) if !s.is_empty() => s,
            _ => {
                skipped += 1;
                continue;
            }
        };

        match index.get(key) {
            Some(&i) => points[i].count += 1,
            None => {
                let instant = parse_instant(key)
                    .ok_or_else(|| ChartError::invalid_field(date, format!("'{}' is not a date", key)))?;
                index.insert(key.to_string(), points.len());
                points.push(TemporalCountPoint {
                    key: key.to_string(),
                    instant,
                    count: 1,
                });
            }
        }
    }

    if skipped > 0 {
        diagnostics.push(Condition::SkippedRecords {
            field: date.to_string(),
            count: skipped,
        });
    }
    Ok(points)
}

/// One point per record, unconditionally. Non-finite values are kept, and a
/// missing label files the record under [`MISSING_LABEL`].
fn categorical_values(
    records: &[Value],
    label: &FieldPath,
    value: &FieldPath,
    diagnostics: &mut Diagnostics,
) -> ChartResult<Vec<CategoricalPoint>> {
    let mut missing = 0;
    let points = records
        .iter()
        .map(|record| {
            let category = label.read_label(record)?.unwrap_or_else(|| {
                missing += 1;
                MISSING_LABEL.to_string()
            });
            let value = value.read_f64(record)?.unwrap_or(f64::NAN);
            Ok(CategoricalPoint { category, value })
        })
        .collect::<ChartResult<Vec<_>>>()?;

    if missing > 0 {
        diagnostics.push(Condition::MissingLabels {
            field: label.to_string(),
            count: missing,
        });
    }
    Ok(points)
}

/// Percentage of records whose two fields are equal. Two missing fields count as equal.
fn same_value_ratio(
    records: &[Value],
    left: &FieldPath,
    right: &FieldPath,
    diagnostics: &mut Diagnostics,
) -> ChartResult<RatioScalar> {
    if records.is_empty() {
        diagnostics.push(Condition::DivisionByZero);
        return Ok(RatioScalar::Undefined);
    }

    let mut matching = 0usize;
    for record in records {
        if left.lookup(record)? == right.lookup(record)? {
            matching += 1;
        }
    }
    Ok(RatioScalar::Percent(matching as f64 / records.len() as f64 * 100.0))
}

/// Coordinate pairs passed through; records missing either coordinate are left out.
fn geo_points(
    records: &[Value],
    latitude: &FieldPath,
    longitude: &FieldPath,
    diagnostics: &mut Diagnostics,
) -> ChartResult<Vec<GeoPoint>> {
    let mut points = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match (latitude.read_f64(record)?, longitude.read_f64(record)?) {
            (Some(latitude), Some(longitude)) => points.push(GeoPoint { latitude, longitude }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        diagnostics.push(Condition::SkippedRecords {
            field: format!("{}|{}", latitude, longitude),
            count: skipped,
        });
    }
    Ok(points)
}

/// Parse RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a date at UTC midnight.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date_spec() -> FieldSpec {
        FieldSpec::TemporalCount { date: "orderInformation.orderDate".into() }
    }

    fn order(date: Option<&str>) -> Value {
        match date {
            Some(d) => json!({"orderInformation": {"orderDate": d}}),
            None => json!({"orderInformation": {}}),
        }
    }

    #[test]
    fn test_count_by_exact_key() {
        let records = json!([
            order(Some("2024-01-01")),
            order(Some("2024-01-02")),
            order(Some("2024-01-01")),
            order(Some("2024-01-01T00:00:00Z")),
            order(Some("2024-01-01")),
        ]);
        let result = extract(&records, &date_spec()).unwrap();
        let Series::TemporalCount(points) = result.series else { panic!("Expected temporal series") };

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].key, "2024-01-01");
        assert_eq!(points[0].count, 3);
        assert_eq!(points[1].count, 1);
        // Same instant, different key: not merged.
        assert_eq!(points[2].key, "2024-01-01T00:00:00Z");
        assert_eq!(points[2].instant, points[0].instant);
    }

    #[test]
    fn test_missing_and_empty_dates_skipped() {
        let records = json!([order(None), order(Some("")), order(Some("2024-03-01")), {}]);
        let result = extract(&records, &date_spec()).unwrap();
        assert_eq!(result.series.len(), 1);
        assert_eq!(result.diagnostics.skipped_records(), 3);
    }

    #[test]
    fn test_not_an_array() {
        let err = extract(&json!({"orders": []}), &date_spec()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidInput(_)));
    }

    #[test]
    fn test_unparseable_date_is_invalid() {
        let err = extract(&json!([order(Some("yesterday"))]), &date_spec()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidField { .. }));
    }

    #[test]
    fn test_categorical_keeps_duplicates_and_non_finite() {
        let spec = FieldSpec::CategoricalValue { label: "id".into(), value: "cost".into() };
        let records = json!([
            {"id": "ORD-1", "cost": 10},
            {"id": "ORD-1", "cost": 20},
            {"id": "ORD-2", "cost": "NaN"},
            {"id": "ORD-3", "cost": null},
        ]);
        let Series::CategoricalValue(points) = extract(&records, &spec).unwrap().series else {
            panic!("Expected categorical series")
        };
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], CategoricalPoint { category: "ORD-1".to_string(), value: 10.0 });
        assert_eq!(points[1], CategoricalPoint { category: "ORD-1".to_string(), value: 20.0 });
        assert!(points[2].value.is_nan());
        assert!(points[3].value.is_nan());
    }

    #[test]
    fn test_categorical_missing_label_still_drawn() {
        let spec = FieldSpec::CategoricalValue {
            label: "orderInformation.orderNumber".into(),
            value: "cost".into(),
        };
        let records = json!([
            {"orderInformation": {"orderNumber": "ORD-1"}, "cost": 10},
            {"orderInformation": {}, "cost": 20},
        ]);
        let result = extract(&records, &spec).unwrap();
        let Series::CategoricalValue(points) = result.series else { panic!("Expected categorical series") };
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], CategoricalPoint { category: MISSING_LABEL.to_string(), value: 20.0 });
        assert_eq!(result.diagnostics.missing_labels(), 1);
    }

    #[test]
    fn test_ratio() {
        let spec = FieldSpec::Ratio { left: "a".into(), right: "b".into() };
        let records = json!([
            {"a": "2024-01-01", "b": "2024-01-01"},
            {"a": "2024-01-01", "b": "2024-01-02"},
            {"a": "2024-01-03", "b": "2024-01-04"},
            {"a": "2024-01-05", "b": "2024-01-06"},
        ]);
        let result = extract(&records, &spec).unwrap();
        assert_eq!(result.series, Series::Ratio(RatioScalar::Percent(25.0)));

        let empty = extract(&json!([]), &spec).unwrap();
        assert_eq!(empty.series, Series::Ratio(RatioScalar::Undefined));
        assert!(empty.diagnostics.has_division_by_zero());
    }

    #[test]
    fn test_geo_excludes_missing_coordinates() {
        let spec = FieldSpec::Geo { latitude: "c.lat".into(), longitude: "c.lon".into() };
        let records = json!([
            {"c": {"lat": 1.0, "lon": 2.0}},
            {"c": {"lat": 3.0}},
            {"c": {"lon": 4.0}},
        ]);
        let result = extract(&records, &spec).unwrap();
        assert_eq!(result.series, Series::Geo(vec![GeoPoint { latitude: 1.0, longitude: 2.0 }]));
        assert_eq!(result.diagnostics.skipped_records(), 2);
    }

    #[test]
    fn test_parse_instant_formats() {
        let midnight = parse_instant("2024-01-01").unwrap();
        assert_eq!(parse_instant("2024-01-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_instant("2024-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_instant("2024-01-01T02:00:00+02:00"), Some(midnight));
        assert!(parse_instant("01/02/2024").is_none());
    }
}
