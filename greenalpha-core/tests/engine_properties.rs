use greenalpha_core::{
    engine::{builder::FootprintEngineBuilder, engine::FootprintEngine, EngineConfig},
    error::EngineError,
    history::{HistoricalEmissionsRepository, RepositoryConfig, RepositoryStatus},
    reference::ReferenceDataStore,
};
use greenalpha_schemas::request::{Coordinates, FootprintRequest};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn engine() -> FootprintEngine {
    FootprintEngineBuilder::new().build().unwrap()
}

fn smartphone(mode: &str) -> FootprintRequest {
    FootprintRequest::new("smartphone", 1.0, "CHN", "USA", mode)
}

fn emissions_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Entity,Code,Year,Annual CO2 emissions (tonnes)").unwrap();
    for year in 2008..=2020 {
        writeln!(file, "Poland,POL,{},3.0e8", year).unwrap();
        writeln!(file, "China,CHN,{},1.0e10", year).unwrap();
        writeln!(file, "United States,USA,{},5.0e9", year).unwrap();
    }
    file
}

fn repository(path: PathBuf) -> Arc<HistoricalEmissionsRepository> {
    Arc::new(HistoricalEmissionsRepository::new(RepositoryConfig {
        data_path: path,
        ..RepositoryConfig::default()
    }))
}

#[tokio::test]
async fn test_uncached_calculation_is_deterministic() {
    let engine = engine();
    let request = FootprintRequest::new("laptop", 37.0, "IND", "GBR", "rail")
        .with_custom_factor("aluminum", 9.1);

    let first = engine.calculate_uncached(&request).await.unwrap();
    let second = engine.calculate_uncached(&request).await.unwrap();

    assert_eq!(first.total_emissions_kg_co2e, second.total_emissions_kg_co2e);
    assert_eq!(first.production_breakdown, second.production_breakdown);
    assert_eq!(first.transport_breakdown, second.transport_breakdown);
    assert_eq!(engine.computations(), 2);
}

#[tokio::test]
async fn test_doubling_quantity_never_decreases_total() {
    let engine = engine();
    let mut previous = 0.0;
    for quantity in [1.0, 2.0, 4.0, 8.0, 16.0] {
        let result = engine
            .calculate(&FootprintRequest::new("running_shoes", quantity, "BRA", "DEU", "sea"))
            .await
            .unwrap();
        assert!(result.total_emissions_kg_co2e > previous);
        previous = result.total_emissions_kg_co2e;
    }
}

#[tokio::test]
async fn test_transport_mode_ordering() {
    let engine = engine();
    let origin = Coordinates::new(48.85, 2.35);
    let destination = Coordinates::new(52.52, 13.40);

    let mut transport = std::collections::HashMap::new();
    for mode in ["air", "road", "rail", "sea"] {
        let request = FootprintRequest::new("generic_electronics", 10.0, "FRA", "DEU", mode)
            .with_weight_kg(500.0)
            .with_coordinates(origin, destination);
        let result = engine.calculate(&request).await.unwrap();
        transport.insert(mode, result.transport_emissions);
    }

    assert!(transport["air"] > transport["road"]);
    assert!(transport["road"] > transport["rail"]);
    assert!(transport["road"] > transport["sea"]);
}

#[tokio::test]
async fn test_unknown_product_falls_back_to_generic_profile() {
    let engine = engine();
    let unknown = engine
        .calculate(&FootprintRequest::new("quantum toaster", 3.0, "USA", "CAN", "road"))
        .await
        .unwrap();
    let generic = engine
        .calculate(&FootprintRequest::new("generic_electronics", 3.0, "USA", "CAN", "road"))
        .await
        .unwrap();

    assert_eq!(unknown.production_emissions, generic.production_emissions);
    assert!(unknown.confidence_percent < generic.confidence_percent);
    assert!((unknown.confidence_percent - (70.0 + 90.0 + 85.0) / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_identical_requests_hit_the_cache() {
    let engine = engine();
    let first = engine.calculate(&smartphone("sea")).await.unwrap();
    let second = engine
        .calculate(&FootprintRequest::new(" SMARTPHONE", 1.0, "chn", "usa", "sea_freight"))
        .await
        .unwrap();

    assert_eq!(engine.computations(), 1);
    assert_eq!(first.total_emissions_kg_co2e, second.total_emissions_kg_co2e);

    let stats = engine.performance_stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.total_calculations, 2);
    assert_eq!(stats.cache_size, 1);
}

#[tokio::test]
async fn test_expired_results_are_recomputed() {
    let engine = FootprintEngineBuilder::new()
        .with_config(EngineConfig {
            result_cache_ttl: Duration::from_millis(50),
            ..EngineConfig::default()
        })
        .build()
        .unwrap();

    engine.calculate(&smartphone("air")).await.unwrap();
    engine.calculate(&smartphone("air")).await.unwrap();
    assert_eq!(engine.computations(), 1);

    tokio::time::sleep(Duration::from_millis(120)).await;
    engine.calculate(&smartphone("air")).await.unwrap();
    assert_eq!(engine.computations(), 2);
}

#[tokio::test]
async fn test_custom_factor_changes_production_by_exact_delta() {
    let engine = engine();
    let quantity = 120.0;
    let baseline = engine
        .calculate(&FootprintRequest::new("laptop", quantity, "JPN", "USA", "sea"))
        .await
        .unwrap();
    let overridden = engine
        .calculate(
            &FootprintRequest::new("laptop", quantity, "JPN", "USA", "sea").with_custom_factor("steel", 4.0),
        )
        .await
        .unwrap();

    let expected_delta = quantity * 0.15 * (4.0 - 2.3);
    let delta = overridden.production_emissions - baseline.production_emissions;
    assert!((delta - expected_delta).abs() < 1e-9);

    let after = engine
        .calculate_uncached(&FootprintRequest::new("laptop", quantity, "JPN", "USA", "sea"))
        .await
        .unwrap();
    assert_eq!(after.production_emissions, baseline.production_emissions);
    assert_eq!(engine.reference().emission_factor("steel").unwrap().value, 2.3);
}

#[tokio::test]
async fn test_custom_factor_names_ignore_case_and_padding() {
    let engine = engine();
    let request = FootprintRequest::new("laptop", 50.0, "JPN", "USA", "sea");
    let canonical = engine
        .calculate(&request.clone().with_custom_factor("steel", 4.0))
        .await
        .unwrap();
    let spelled = engine
        .calculate(&request.clone().with_custom_factor(" Steel ", 4.0))
        .await
        .unwrap();
    let baseline = engine.calculate(&request).await.unwrap();

    assert_eq!(spelled.production_emissions, canonical.production_emissions);
    assert!(spelled.production_emissions > baseline.production_emissions);
    assert_eq!(engine.computations(), 2);
}

#[tokio::test]
async fn test_smartphone_china_to_usa_by_sea() {
    let engine = engine();
    let result = engine.calculate(&smartphone("sea")).await.unwrap();

    let energy = 85.0 * 0.644 * 1.2;
    let material = 0.025 * 2.3 + 0.015 * 11.5 + 0.08 * 2.2;
    let production = energy * 1.15 + material;
    assert!((result.production_emissions - production).abs() < 1e-9);

    let transport = &result.transport_breakdown;
    assert!((transport.distance_km - 11_281.57).abs() < 1.0);
    assert_eq!(transport.weight_kg, 0.2);
    let direct = transport.distance_km * 0.0002 * 0.014 * 0.8 * 0.6;
    assert!((transport.direct_emissions - direct).abs() < 1e-12);
    assert!((result.transport_emissions - direct * 1.25).abs() < 1e-12);

    assert!(result.total_emissions_kg_co2e > 0.0);
    assert!((result.carbon_cost_usd - 1.5).abs() < 1e-12);
    assert_eq!(result.uncertainty_analysis.transport_uncertainty, 25.0);
}

#[tokio::test]
async fn test_air_freight_exceeds_sea_freight() {
    let engine = engine();
    let sea = engine.calculate(&smartphone("sea")).await.unwrap();
    let air = engine.calculate(&smartphone("air")).await.unwrap();

    assert!(air.total_emissions_kg_co2e > sea.total_emissions_kg_co2e);
    assert_eq!(air.production_emissions, sea.production_emissions);
}

#[tokio::test]
async fn test_validation_errors_name_the_field() {
    let engine = engine();
    let err = engine
        .calculate(&FootprintRequest::new("smartphone", -5.0, "CHN", "USA", "sea"))
        .await
        .unwrap_err();

    match err {
        EngineError::Validation { field, .. } => assert_eq!(field, "quantity"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.computations(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_callers_share_one_load() {
    let file = emissions_csv();
    let repo = repository(file.path().to_path_buf());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move { repo.profile("POL").await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_some());
    }

    assert_eq!(repo.stats().load_attempts, 1);
    assert_eq!(repo.health().status, RepositoryStatus::Healthy);
}

#[tokio::test]
async fn test_historical_estimate_feeds_unmeasured_countries() {
    let file = emissions_csv();
    let engine = FootprintEngineBuilder::new()
        .with_repository(repository(file.path().to_path_buf()))
        .build()
        .unwrap();

    let result = engine
        .calculate(&FootprintRequest::new("smartphone", 1.0, "POL", "DEU", "road"))
        .await
        .unwrap();

    let estimated = 0.2 + 3.0e8 / 1e9 * 0.1;
    assert!((result.production_breakdown.energy_emissions - 85.0 * estimated).abs() < 1e-9);
}

#[tokio::test]
async fn test_refresh_drops_results_computed_from_old_data() {
    let file = emissions_csv();
    let engine = FootprintEngineBuilder::new()
        .with_repository(repository(file.path().to_path_buf()))
        .build()
        .unwrap();
    let request = FootprintRequest::new("smartphone", 1.0, "POL", "DEU", "road");

    let before = engine.calculate(&request).await.unwrap();
    assert!((before.production_breakdown.energy_emissions - 85.0 * 0.23).abs() < 1e-9);

    let mut rows = String::from("Entity,Code,Year,Annual CO2 emissions (tonnes)\n");
    for year in 2008..=2020 {
        rows.push_str(&format!("Poland,POL,{},5.0e9\n", year));
    }
    std::fs::write(file.path(), rows).unwrap();
    engine.refresh().await.unwrap();
    assert_eq!(engine.performance_stats().cache_size, 0);

    let after = engine.calculate(&request).await.unwrap();
    assert!((after.production_breakdown.energy_emissions - 85.0 * 0.7).abs() < 1e-9);
    assert_eq!(engine.computations(), 2);
}

#[tokio::test]
async fn test_missing_dataset_makes_engine_unavailable() {
    let engine = FootprintEngineBuilder::new()
        .with_repository(repository(PathBuf::from("/missing/emissions.csv")))
        .build()
        .unwrap();

    let err = engine.calculate(&smartphone("sea")).await.unwrap_err();
    assert!(matches!(err, EngineError::DataUnavailable(_)));
    assert_eq!(
        engine.health().status,
        greenalpha_core::engine::engine::EngineStatus::Unavailable
    );
}

#[tokio::test]
async fn test_batch_collects_per_item_errors() {
    let engine = engine();
    let requests = vec![
        FootprintRequest::new("smartphone", 100.0, "CHN", "USA", "sea"),
        FootprintRequest::new("smartphone", 100.0, "CHINA", "USA", "sea"),
        FootprintRequest::new("laptop", 10.0, "DEU", "FRA", "road"),
    ];

    let outcome = engine.calculate_batch(&requests).await.unwrap();

    assert_eq!(outcome.total_calculations, 3);
    assert_eq!(outcome.successful_calculations, 2);
    assert_eq!(outcome.failed_calculations, 1);
    assert_eq!(outcome.errors[0].index, 1);
    assert!(outcome.errors[0].error.contains("origin_country"));

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.calculation_count, 2);
    let total: f64 = outcome.results.iter().map(|r| r.result.total_emissions_kg_co2e).sum();
    assert!((summary.total_emissions_kg_co2e - total).abs() < 1e-9);
    assert!(summary.min_emissions_kg_co2e <= summary.max_emissions_kg_co2e);
}

#[tokio::test]
async fn test_batch_size_is_limited() {
    let engine = engine();
    let requests = vec![smartphone("sea"); 101];
    assert!(matches!(
        engine.calculate_batch(&requests).await,
        Err(EngineError::Validation { .. })
    ));
    assert!(matches!(
        engine.calculate_batch(&[]).await,
        Err(EngineError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_reference_overlay_changes_results() {
    let dir = tempfile::tempdir().unwrap();
    let grid_dir = dir.path().join("grid_factors");
    std::fs::create_dir_all(&grid_dir).unwrap();
    std::fs::write(
        grid_dir.join("grid.yaml"),
        "schema_version: \"1.0\"\ngrid_factors:\n  - country_code: CHN\n    electricity: 0.5\n    energy_mix_factor: 1.0\n",
    )
    .unwrap();

    let store = ReferenceDataStore::load_dir(dir.path()).unwrap();
    let engine = FootprintEngineBuilder::new()
        .with_reference_data(Arc::new(store))
        .build()
        .unwrap();

    let result = engine.calculate(&smartphone("sea")).await.unwrap();
    assert!((result.production_breakdown.energy_emissions - 85.0 * 0.5).abs() < 1e-9);
}
