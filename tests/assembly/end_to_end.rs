//! End-to-end assembly: plan a generated book directory, merge it, and check
//! the written outputs page by page.

use crate::common::{page_count, write_blank_pdf, write_reading_45_book};
use std::path::PathBuf;
use tempfile::TempDir;

use unitbind::cli::Cli;
use unitbind::config::CategoryLayout;
use unitbind::error::AssembleError;
use unitbind::merge::UnitMergeEngine;
use unitbind::output::OutputFormatter;
use unitbind::pipeline::{PlanBuilder, PlanOptions};
use unitbind::report::RunLog;

fn quiet_cli(book_dir: PathBuf) -> Cli {
    Cli {
        book_dir,
        output: None,
        combine: false,
        units: None,
        book_type: None,
        level: None,
        book_number: None,
        restart_at: None,
        allow_missing: false,
        plan: None,
        emit_plan: None,
        dry_run: false,
        force: false,
        verbose: false,
        quiet: true,
    }
}

#[tokio::test]
async fn test_plan_then_merge_two_unit_book() {
    let tmp = TempDir::new().unwrap();
    let book_dir = tmp.path().join("Springboard_Reading_45");
    std::fs::create_dir(&book_dir).unwrap();
    write_reading_45_book(&book_dir);

    let outcome = PlanBuilder::new()
        .build(&book_dir, &PlanOptions::default())
        .await
        .unwrap();
    let config = outcome.config;

    assert_eq!(config.total_units, 2);
    // The monolithic unit test file was segmented by its page text.
    let unit_test = config
        .merge_order
        .iter()
        .find(|c| c.name == "Unit Test")
        .expect("unit test category");
    match &unit_test.layout {
        CategoryLayout::Segmented { unit_lengths, .. } => {
            assert_eq!(unit_lengths, &vec![2, 2]);
        }
        other => panic!("unexpected layout {other:?}"),
    }

    let engine = UnitMergeEngine::new(false);
    let mut log = RunLog::new();
    let result = engine
        .run(&config, true, &mut log, &OutputFormatter::quiet())
        .await
        .unwrap();

    assert!(result.succeeded());
    // Word list 2 + translation 3 + unscramble 2 + unit test 2 + word test 2.
    assert_eq!(page_count(&config.unit_output_path(1)), 11);
    assert_eq!(page_count(&config.unit_output_path(2)), 11);
    assert_eq!(page_count(&result.combined.unwrap()), 22);
    assert!(result.report_path.exists());
}

#[tokio::test]
async fn test_run_from_cli_arguments() {
    let tmp = TempDir::new().unwrap();
    let book_dir = tmp.path().join("Springboard_Reading_45");
    std::fs::create_dir(&book_dir).unwrap();
    write_reading_45_book(&book_dir);

    let mut cli = quiet_cli(book_dir.clone());
    cli.combine = true;
    unitbind::run(cli).await.unwrap();

    let merged = book_dir.join("merged");
    assert_eq!(page_count(&merged.join("Unit01.pdf")), 11);
    assert_eq!(page_count(&merged.join("Unit02.pdf")), 11);
    assert_eq!(page_count(&merged.join("AllUnits.pdf")), 22);

    let report_written = std::fs::read_dir(&merged).unwrap().any(|e| {
        e.unwrap()
            .file_name()
            .to_string_lossy()
            .starts_with("merge_report_")
    });
    assert!(report_written, "merge report missing");
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let book_dir = tmp.path().join("Springboard_Reading_45");
    std::fs::create_dir(&book_dir).unwrap();
    write_reading_45_book(&book_dir);

    let mut cli = quiet_cli(book_dir.clone());
    cli.dry_run = true;
    unitbind::run(cli).await.unwrap();

    assert!(!book_dir.join("merged").join("Unit01.pdf").exists());
}

#[tokio::test]
async fn test_missing_required_category_blocks_the_run() {
    let tmp = TempDir::new().unwrap();
    let book_dir = tmp.path().join("Springboard_Reading_45");
    std::fs::create_dir(&book_dir).unwrap();
    // No unit test material at all.
    for unit in 1..=2 {
        write_blank_pdf(&book_dir, &format!("Word_List_Unit_{unit:02}.pdf"), 2);
        write_blank_pdf(&book_dir, &format!("Word_Test_Unit_{unit:02}.pdf"), 2);
        write_blank_pdf(&book_dir, &format!("Translation_Sheet_Unit_{unit:02}.pdf"), 3);
        write_blank_pdf(&book_dir, &format!("Unscramble_Sheet_Unit_{unit:02}.pdf"), 2);
    }

    let cli = quiet_cli(book_dir.clone());
    let err = unitbind::run(cli).await.unwrap_err();
    assert!(matches!(err, AssembleError::MissingCategories { .. }));
    assert_eq!(err.exit_code(), 2);

    // --allow-missing downgrades it and the merge goes through.
    let mut cli = quiet_cli(book_dir.clone());
    cli.allow_missing = true;
    unitbind::run(cli).await.unwrap();
    assert_eq!(page_count(&book_dir.join("merged").join("Unit01.pdf")), 9);
}

#[tokio::test]
async fn test_rerun_without_force_fails_then_force_overwrites() {
    let tmp = TempDir::new().unwrap();
    let book_dir = tmp.path().join("Springboard_Reading_45");
    std::fs::create_dir(&book_dir).unwrap();
    write_reading_45_book(&book_dir);

    unitbind::run(quiet_cli(book_dir.clone())).await.unwrap();

    let err = unitbind::run(quiet_cli(book_dir.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AssembleError::OutputExists { .. }));
    assert_eq!(err.exit_code(), 4);

    let mut cli = quiet_cli(book_dir.clone());
    cli.force = true;
    unitbind::run(cli).await.unwrap();
}
