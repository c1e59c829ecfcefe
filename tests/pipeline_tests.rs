use chartflow::config::{ChartConfig, ChartKind, MapConfig};
use chartflow::error::Diagnostics;
use chartflow::extract::{extract, FieldSpec, MISSING_LABEL};
use chartflow::ir::{CategoricalPoint, ChartGeometry, RatioScalar, Series};
use chartflow::pipeline::{field_spec, run, ChartPipeline};
use chartflow::scale::{BandScale, LinearScale};
use chartflow::transition::{Easing, Transition};
use chartflow::viewport::{ContainerBox, Margins, Viewport};
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;

fn fixture_records() -> Value {
    let text = fs::read_to_string("test/orders.json").expect("Failed to read test records");
    serde_json::from_str(&text).expect("Fixture is not valid JSON")
}

fn dated(date: &str) -> Value {
    json!({"orderInformation": {"orderDate": date}})
}

fn approval(buyer: &str, supplier: &str) -> Value {
    json!({"approval": {"buyerApprovalDate": buyer, "supplierApprovalDate": supplier}})
}

#[test]
fn test_extraction_is_deterministic() {
    let records = fixture_records();
    for kind in [ChartKind::Area, ChartKind::Bar, ChartKind::Gauge, ChartKind::Map] {
        let spec = field_spec(&ChartConfig::for_kind(kind));
        let first = extract(&records, &spec).unwrap();
        let second = extract(&records, &spec).unwrap();
        assert_eq!(first, second, "{:?}", kind);
    }
}

#[test]
fn test_temporal_grouping_is_exact_string() {
    let records = json!([
        dated("2024-01-01"),
        dated("2024-01-01"),
        dated("2024-01-01"),
        dated("2024-01-01T00:00:00Z"),
    ]);
    let spec = field_spec(&ChartConfig::for_kind(ChartKind::Area));
    match extract(&records, &spec).unwrap().series {
        Series::TemporalCount(points) => {
            assert_eq!(points.len(), 2);
            assert_eq!(points[0].key, "2024-01-01");
            assert_eq!(points[0].count, 3);
            assert_eq!(points[0].instant.to_rfc3339(), "2024-01-01T00:00:00+00:00");
            assert_eq!(points[1].count, 1);
        }
        other => panic!("Expected TemporalCount, got {:?}", other),
    }
}

#[test]
fn test_duplicate_categories_are_not_merged() {
    let records = json!([
        {"orderInformation": {"orderNumber": "ORD-1"}, "paymentInformation": {"totalOrderCost": 10}},
        {"orderInformation": {"orderNumber": "ORD-1"}, "paymentInformation": {"totalOrderCost": 20}},
    ]);
    let spec = field_spec(&ChartConfig::for_kind(ChartKind::Bar));
    match extract(&records, &spec).unwrap().series {
        Series::CategoricalValue(points) => {
            assert_eq!(
                points,
                vec![
                    CategoricalPoint { category: "ORD-1".to_string(), value: 10.0 },
                    CategoricalPoint { category: "ORD-1".to_string(), value: 20.0 },
                ]
            );
        }
        other => panic!("Expected CategoricalValue, got {:?}", other),
    }
}

#[test]
fn test_bar_without_label_is_still_drawn() {
    let records = json!([
        {"orderInformation": {"orderNumber": "ORD-1"}, "paymentInformation": {"totalOrderCost": 10}},
        {"orderInformation": {}, "paymentInformation": {"totalOrderCost": 20}},
    ]);
    let config = ChartConfig::for_kind(ChartKind::Bar);
    let viewport = Viewport::new(800.0, 400.0, config.margins());
    let (compiled, diagnostics) = run(&records, &config, &viewport, None).unwrap();
    match compiled.geometry {
        ChartGeometry::Bar(bars) => {
            assert_eq!(bars.bars.len(), 2);
            assert_eq!(bars.bars[1].category, MISSING_LABEL);
            assert_eq!(bars.bars[1].key, format!("{}#0", MISSING_LABEL));
            assert!(bars.bars[1].height > bars.bars[0].height);
        }
        other => panic!("Expected Bar, got {:?}", other),
    }
    assert_eq!(diagnostics.missing_labels(), 1);
}

#[test]
fn test_bandwidth_positive_and_shrinking() {
    let mut previous = f64::INFINITY;
    for n in 1..=40 {
        let categories: Vec<String> = (0..n).map(|i| format!("C{}", i)).collect();
        let mut d = Diagnostics::new();
        let scale = BandScale::resolve(&categories, |c| c.as_str(), (0.0, 710.0), 0.1, &mut d);
        let bandwidth = scale.bandwidth();
        assert!(bandwidth > 0.0);
        assert!(bandwidth < previous, "n={}", n);
        previous = bandwidth;
    }
}

#[test]
fn test_linear_upper_bound_never_truncates() {
    for max in [0.3, 1.0, 7.0, 9.99, 12.5, 99.0, 101.0, 845.25, 1250.5, 123_456.0] {
        let values = [max / 2.0, f64::NAN, max];
        let mut d = Diagnostics::new();
        let scale = LinearScale::resolve(&values, |v| *v, (400.0, 0.0), &mut d);
        assert!(scale.domain.1 >= max, "max={} domain={:?}", max, scale.domain);
        assert_eq!(scale.domain.0, 0.0);
    }
}

#[test]
fn test_ratio_is_exact_or_undefined() {
    let spec = field_spec(&ChartConfig::for_kind(ChartKind::Gauge));
    let records = json!([
        approval("2024-01-01", "2024-01-01"),
        approval("2024-01-01", "2024-01-02"),
        approval("2024-01-03", "2024-01-02"),
        approval("2024-01-05", "2024-01-06"),
    ]);
    let extraction = extract(&records, &spec).unwrap();
    assert_eq!(extraction.series, Series::Ratio(RatioScalar::Percent(25.0)));

    let extraction = extract(&json!([]), &spec).unwrap();
    assert_eq!(extraction.series, Series::Ratio(RatioScalar::Undefined));
    assert!(extraction.diagnostics.has_division_by_zero());
    assert_ne!(extraction.series, Series::Ratio(RatioScalar::Percent(0.0)));
}

#[test]
fn test_retarget_is_continuous() {
    let mut transition = Transition::new(0.0, Duration::from_millis(400), Easing::CubicInOut);
    transition.set_target(100.0);
    let before = transition.tick(Duration::from_millis(170));
    transition.set_target(30.0);
    assert_eq!(transition.value(), before);
    let after = transition.tick(Duration::from_micros(1));
    assert!((after - before).abs() < 1e-3);
}

#[test]
fn test_identical_resize_does_not_recompute() {
    let mut pipeline = ChartPipeline::new(ChartConfig::for_kind(ChartKind::Bar), ContainerBox::new(800.0, 400.0));
    pipeline.set_records(fixture_records()).unwrap();
    let before = pipeline.geometry().clone();
    assert!(pipeline.resize(ContainerBox::new(800.0, 400.0)).is_none());
    assert_eq!(pipeline.geometry(), &before);
}

#[test]
fn test_missing_longitude_excluded_from_markers() {
    let config = ChartConfig::for_kind(ChartKind::Map);
    let viewport = Viewport::new(960.0, 500.0, Margins::zero());
    let (compiled, diagnostics) = run(&fixture_records(), &config, &viewport, None).unwrap();
    match compiled.geometry {
        ChartGeometry::Map(map) => assert_eq!(map.markers.len(), 4),
        other => panic!("Expected Map, got {:?}", other),
    }
    assert_eq!(diagnostics.skipped_records(), 1);
    assert_eq!(diagnostics.projection_failures(), 0);
}

#[test]
fn test_unprojectable_points_are_counted() {
    let records = json!([
        {"buyerInformation": {"coordinates": {"latitude": 10.0, "longitude": 10.0}}},
        {"buyerInformation": {"coordinates": {"latitude": 90.0, "longitude": 10.0}}},
        {"buyerInformation": {"coordinates": {"latitude": 10.0, "longitude": 540.0}}},
    ]);
    let spec = FieldSpec::Geo {
        latitude: "buyerInformation.coordinates.latitude".into(),
        longitude: "buyerInformation.coordinates.longitude".into(),
    };
    let series = extract(&records, &spec).unwrap().series;
    let config = ChartConfig { map: MapConfig::default(), ..ChartConfig::for_kind(ChartKind::Map) };
    let viewport = Viewport::new(960.0, 500.0, Margins::zero());
    let mut d = Diagnostics::new();
    let compiled = chartflow::compiler::compile_geometry(&series, &viewport, &config, None, &mut d).unwrap();
    match compiled.geometry {
        ChartGeometry::Map(map) => assert_eq!(map.markers.len(), 1),
        other => panic!("Expected Map, got {:?}", other),
    }
    assert_eq!(d.projection_failures(), 2);
}

#[test]
fn test_empty_bar_series_degrades() {
    let config = ChartConfig::for_kind(ChartKind::Bar);
    let viewport = Viewport::new(800.0, 400.0, config.margins());
    let (compiled, diagnostics) = run(&json!([]), &config, &viewport, None).unwrap();
    match compiled.geometry {
        ChartGeometry::Bar(bars) => assert!(bars.bars.is_empty()),
        other => panic!("Expected Bar, got {:?}", other),
    }
    assert!(diagnostics.has_degenerate_domain("band"));
    assert!(diagnostics.has_degenerate_domain("linear"));
}
