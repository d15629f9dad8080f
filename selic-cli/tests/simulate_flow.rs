//! End-to-end runs of the `simulate` and `history` flows against an on-disk
//! SQLite history and the shipped config fixture.

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use selic_cli::app::{self, Context, SimulationRequest};
use selic_cli::config::{Config, Overrides};
use selic_cli::report;
use selic_core::db::DbConfig;
use selic_core::{ProjectionEngine, ProjectionInput};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("selic.toml")
}

fn temp_path(name: &str, ext: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "selic-cli-{}-{}.{}",
        std::process::id(),
        name,
        ext
    ));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn fixture_config_loads() {
    let config = Config::load(&fixture_path()).expect("fixture config should load");

    assert_eq!(config.database.backend, "sqlite");
    assert_eq!(config.database.connection_string, "fixture-history.db");
    assert_eq!(config.simulation.max_term_months, 240);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file, Some(PathBuf::from("selic.log")));
}

#[tokio::test]
async fn saved_simulations_appear_in_history() {
    let db_path = temp_path("history", "db");
    let config = Config::load(&fixture_path())
        .unwrap()
        .with_overrides(Overrides {
            connection_string: Some(db_path.display().to_string()),
            ..Overrides::default()
        })
        .unwrap();
    let db: DbConfig = config.db_config();
    let registry = app::build_registry();
    let engine = ProjectionEngine::default();
    let ctx = Context {
        engine: &engine,
        registry: &registry,
        db: &db,
        max_term_months: config.simulation.max_term_months,
    };
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    for months in [12, 24] {
        let request = SimulationRequest {
            input: ProjectionInput::new(dec!(1000), dec!(100), dec!(12.75), months),
            comparison_rates: None,
            save: true,
            export_path: None,
        };
        let outcome = app::run_simulation(&ctx, &request, now).await.unwrap();
        assert!(outcome.notices.is_empty(), "{:?}", outcome.notices);
        assert!(outcome.saved_id.is_some());
    }

    let records = app::list_history(&registry, &db).await.unwrap();
    let terms: Vec<u32> = records.iter().map(|r| r.term_months).collect();
    assert_eq!(terms, vec![12, 24]);

    let rendered = report::render_history(&records);
    assert_eq!(rendered.lines().count(), 3);
    assert!(rendered.contains("R$2,396.11"));

    let _ = std::fs::remove_file(&db_path);
}

#[cfg(feature = "export")]
#[tokio::test]
async fn export_writes_sheet_with_scenarios() {
    let sheet_path = temp_path("sheet", "csv");
    let db = DbConfig {
        backend: "sqlite".to_string(),
        connection_string: ":memory:".to_string(),
    };
    let registry = app::build_registry();
    let engine = ProjectionEngine::default();
    let ctx = Context {
        engine: &engine,
        registry: &registry,
        db: &db,
        max_term_months: 360,
    };
    let request = SimulationRequest {
        input: ProjectionInput::new(dec!(1000), dec!(0), dec!(10), 24),
        comparison_rates: Some(vec![dec!(5)]),
        save: false,
        export_path: Some(sheet_path.clone()),
    };

    let outcome = app::run_simulation(&ctx, &request, Utc::now()).await.unwrap();

    assert_eq!(outcome.exported_to, Some(sheet_path.clone()));
    let contents = std::fs::read_to_string(&sheet_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 25);
    assert_eq!(
        lines[0],
        "Month,Gross Balance,Gross Balance (R$),Scenario 1 (5%)"
    );
    assert_eq!(lines[24], "24,1210.00,\"R$1,210.00\",1102.50");

    let _ = std::fs::remove_file(&sheet_path);
}

#[cfg(feature = "export")]
#[tokio::test]
async fn export_defaults_to_a_workbook() {
    let sheet_path = temp_path("sheet", "xlsx");
    let db = DbConfig {
        backend: "sqlite".to_string(),
        connection_string: ":memory:".to_string(),
    };
    let registry = app::build_registry();
    let engine = ProjectionEngine::default();
    let ctx = Context {
        engine: &engine,
        registry: &registry,
        db: &db,
        max_term_months: 360,
    };
    let request = SimulationRequest {
        input: ProjectionInput::new(dec!(1000), dec!(0), dec!(10), 24),
        comparison_rates: None,
        save: false,
        export_path: Some(sheet_path.clone()),
    };

    let outcome = app::run_simulation(&ctx, &request, Utc::now()).await.unwrap();

    assert_eq!(outcome.exported_to, Some(sheet_path.clone()));
    assert!(outcome.notices.is_empty());
    let bytes = std::fs::read(&sheet_path).unwrap();
    assert!(bytes.starts_with(b"PK"));

    let _ = std::fs::remove_file(&sheet_path);
}
