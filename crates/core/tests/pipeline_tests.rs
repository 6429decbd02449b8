//! Integration tests for full pipeline runs against the in-memory backend
//!
//! Tests the complete workflow: copy → schema script → resolve → sanitize →
//! load → verify → cleanup

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use menuload_core::ingest::{MemoryBackend, MemoryTable};
use menuload_core::{
    FileState, HeaderCheck, PipelineConfig, PipelineError, PipelineExecutor, RowCountMode,
    TableSource,
};

const SCHEMA: &str = "NYPLMenu";

/// Write the four menu CSVs; one page and one item reference missing parents
fn write_menu_files(dir: &Path) {
    fs::write(
        dir.join("Menu.csv"),
        "id,name,sponsor\n1,Lunch,Astor House\n2,\"Dinner, formal\",\n",
    )
    .unwrap();
    fs::write(
        dir.join("Dish.csv"),
        "id,name,description\n10,Consomme,\n11,\"Oysters, raw\",Blue `Point`\n12,1984,\"two\nlines\"\n",
    )
    .unwrap();
    fs::write(
        dir.join("MenuPage.csv"),
        "id,menu_id,page_number\n100,1,1\n101,2,1\n102,3,1\n",
    )
    .unwrap();
    fs::write(
        dir.join("MenuItem.csv"),
        "id,menu_page_id,dish_id,price\n1000,100,10,0.35\n1001,101,11,1.5\n1002,102,12,2\n",
    )
    .unwrap();
}

fn menu_backend(ingest: &Path) -> MemoryBackend {
    MemoryBackend::new()
        .with_secure_dir(ingest)
        .with_table(SCHEMA, MemoryTable::new("Menu", &["id", "name", "sponsor"]))
        .with_table(SCHEMA, MemoryTable::new("Dish", &["id", "name", "description"]))
        .with_table(
            SCHEMA,
            MemoryTable::new("MenuPage", &["id", "menu_id", "page_number"])
                .with_foreign_key("menu_id", "Menu", "id"),
        )
        .with_table(
            SCHEMA,
            MemoryTable::new("MenuItem", &["id", "menu_page_id", "dish_id", "price"])
                .with_foreign_key("menu_page_id", "MenuPage", "id")
                .with_foreign_key("dish_id", "Dish", "id"),
        )
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_run_loads_in_dependency_order() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());

    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_row_count_mode(RowCountMode::Exact);
    let mut executor = PipelineExecutor::new(config, menu_backend(ingest.path())).unwrap();
    let report = executor.run().await.unwrap();

    assert_eq!(report.files_processed(), 4);
    assert_eq!(report.summary_line(), "completed with 4 files processed, 0 skipped");

    let counts: Vec<(u64, u64, i64)> = report
        .files
        .iter()
        .map(|f| {
            let r = f.result.as_ref().unwrap();
            (r.expected_rows, r.actual_rows, r.skipped_rows)
        })
        .collect();
    assert_eq!(counts, vec![(2, 2, 0), (3, 3, 0), (3, 2, 1), (3, 2, 1)]);

    let backend = executor.into_backend();
    let loads: Vec<&str> = backend.loads().iter().map(|l| l.table.as_str()).collect();
    assert_eq!(loads, vec!["Menu", "Dish", "MenuPage", "MenuItem"]);

    let menu = backend.table(SCHEMA, "Menu").unwrap();
    assert_eq!(
        menu.column_values("name"),
        vec![Some("Lunch".to_string()), Some("Dinner, formal".to_string())]
    );
    assert_eq!(menu.column_values("sponsor")[1], None);

    let dish = backend.table(SCHEMA, "Dish").unwrap();
    assert_eq!(
        dish.column_values("description"),
        vec![
            None,
            Some("Blue `Point`".to_string()),
            Some("two\nlines".to_string())
        ]
    );
    assert_eq!(dish.column_values("name")[2].as_deref(), Some("1984"));
}

#[tokio::test]
async fn test_expected_rows_match_source_records() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());

    let config = PipelineConfig::new().with_source(source.path());
    let report = PipelineExecutor::new(config, menu_backend(ingest.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    for file in &report.files {
        let mut reader = csv::Reader::from_path(source.path().join(&file.file)).unwrap();
        let source_records = reader.records().count() as u64;
        assert_eq!(
            file.result.as_ref().unwrap().expected_rows,
            source_records,
            "{}",
            file.file
        );
    }
}

#[tokio::test]
async fn test_constraint_drop_reports_half_loaded() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    fs::write(source.path().join("Person.csv"), "id,name\n1,Alice\n2,\"O'Brien\"\n").unwrap();

    let backend = MemoryBackend::new().with_secure_dir(ingest.path()).with_table(
        SCHEMA,
        MemoryTable::new("Person", &["id", "name"])
            .with_check("name", |v| v.is_none_or(|name| !name.contains('\''))),
    );
    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_tables(TableSource::parse_list("Person.csv"))
        .with_row_count_mode(RowCountMode::Exact);

    let mut executor = PipelineExecutor::new(config, backend).unwrap();
    let report = executor.run().await.unwrap();
    let file = &report.files[0];
    let result = file.result.as_ref().unwrap();

    assert_eq!(file.state, FileState::Verified);
    assert_eq!(file.inserted_rows, Some(1));
    assert_eq!(result.expected_rows, 2);
    assert_eq!(result.actual_rows, 1);
    assert_eq!(result.skipped_rows, 1);
    assert_eq!(format!("{:.2}", result.skipped_percentage), "50.00");
    assert_eq!(format!("{:.2}", result.loaded_percentage), "50.00");
}

#[tokio::test]
async fn test_unknown_table_does_not_stop_the_run() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());
    fs::copy(source.path().join("Menu.csv"), source.path().join("Menus.csv")).unwrap();

    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_tables(TableSource::parse_list("Menus.csv,Menu.csv"));
    let mut executor = PipelineExecutor::new(config, menu_backend(ingest.path())).unwrap();
    let report = executor.run().await.unwrap();

    assert_eq!(report.files[0].state, FileState::ResolveFailed);
    assert!(report.files[0].error.as_ref().unwrap().contains("Menus"));
    assert_eq!(report.files[1].state, FileState::Verified);
    assert_eq!(report.summary_line(), "completed with 1 files processed, 1 skipped");
}

#[tokio::test]
async fn test_load_failure_continues_and_removes_staged_file() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());

    let backend = menu_backend(ingest.path()).fail_statements_containing("`Dish`");
    let config = PipelineConfig::new().with_source(source.path());
    let report = PipelineExecutor::new(config, backend)
        .unwrap()
        .run()
        .await
        .unwrap();

    let states: Vec<FileState> = report.files.iter().map(|f| f.state).collect();
    assert_eq!(
        states,
        vec![
            FileState::Verified,
            FileState::LoadFailed,
            FileState::Verified,
            FileState::Verified
        ]
    );
    assert!(report.files[1].error.as_ref().unwrap().contains("Dish"));

    // staged files and copied sources are gone, originals untouched
    assert!(files_in(ingest.path()).is_empty());
    assert_eq!(files_in(source.path()).len(), 4);
}

#[tokio::test]
async fn test_keep_sources_leaves_copies() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());

    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_cleanup_sources(false);
    PipelineExecutor::new(config, menu_backend(ingest.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        files_in(ingest.path()),
        vec!["Dish.csv", "Menu.csv", "MenuItem.csv", "MenuPage.csv"]
    );
}

#[tokio::test]
async fn test_without_copy_reads_sources_in_place() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());

    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_copy_sources(false)
        .with_tables(TableSource::parse_list("Menu.csv"));
    let report = PipelineExecutor::new(config, menu_backend(ingest.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.files[0].state, FileState::Verified);
    assert!(files_in(ingest.path()).is_empty());
}

#[tokio::test]
async fn test_schema_script_failures_are_counted() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    let scripts = TempDir::new().unwrap();
    write_menu_files(source.path());

    let script = scripts.path().join("regenerate-database.sql");
    fs::write(
        &script,
        "DROP DATABASE IF EXISTS NYPLMenu;\nCREATE DATABASE NYPLMenu;\nCREATE TABLE Broken (;\n",
    )
    .unwrap();

    let backend = menu_backend(ingest.path()).fail_statements_containing("Broken");
    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_schema_script(&script);
    let report = PipelineExecutor::new(config, backend)
        .unwrap()
        .run()
        .await
        .unwrap();

    let schema = report.schema.as_ref().unwrap();
    assert_eq!(schema.executed, 2);
    assert_eq!(schema.failed, 1);
    assert_eq!(report.files_processed(), 4);
}

#[tokio::test]
async fn test_missing_schema_script_is_fatal() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());

    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_schema_script(source.path().join("missing.sql"));
    let result = PipelineExecutor::new(config, menu_backend(ingest.path()))
        .unwrap()
        .run()
        .await;

    assert!(matches!(result, Err(PipelineError::SchemaScript { .. })));
}

#[tokio::test]
async fn test_reordered_header_is_rejected_before_loading() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    fs::write(source.path().join("Menu.csv"), "name,id,sponsor\nLunch,1,\n").unwrap();

    let config = PipelineConfig::new()
        .with_source(source.path())
        .with_tables(TableSource::parse_list("Menu.csv"))
        .with_header_check(HeaderCheck::Strict);
    let mut executor = PipelineExecutor::new(config, menu_backend(ingest.path())).unwrap();
    let report = executor.run().await.unwrap();

    assert_eq!(report.files[0].state, FileState::ResolveFailed);
    assert!(executor.backend().loads().is_empty());
    assert!(
        executor
            .backend()
            .table(SCHEMA, "Menu")
            .unwrap()
            .rows()
            .is_empty()
    );
}

#[tokio::test]
async fn test_report_serializes_states() {
    let source = TempDir::new().unwrap();
    let ingest = TempDir::new().unwrap();
    write_menu_files(source.path());
    fs::remove_file(source.path().join("MenuItem.csv")).unwrap();

    let config = PipelineConfig::new().with_source(source.path());
    let report = PipelineExecutor::new(config, menu_backend(ingest.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["files"][0]["state"], "VERIFIED");
    assert_eq!(json["files"][3]["state"], "SOURCE_MISSING");
    assert_eq!(json["files"][0]["result"]["count_mode"], "estimated");
}
