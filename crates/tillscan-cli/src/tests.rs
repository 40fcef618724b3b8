//! CLI command tests

use std::fs;

use tempfile::TempDir;
use tillscan_core::{
    AIClient, AppContext, Category, CategoryResolver, Config, ExpenseLedger, MockBackend,
    OcrEngine, ReceiptPipeline,
};

use crate::commands::{self, truncate};

fn test_context(dir: &TempDir, ocr_text: &str, mock: MockBackend) -> AppContext {
    let mut config = Config::default();
    config.ledger.path = dir.path().join("expenses.csv");

    let resolver = CategoryResolver::embedded(Some(AIClient::Mock(mock))).unwrap();
    let pipeline = ReceiptPipeline::new(OcrEngine::fixed(ocr_text), resolver);
    let ledger = ExpenseLedger::new(config.ledger.path.clone());
    AppContext::new(config, pipeline, ledger)
}

// ========== Helpers ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long merchant name", 10), "a very ...");
    assert_eq!(truncate("café crème", 10), "café crème");
}

#[test]
fn test_load_config_ledger_override() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tillscan.toml");
    fs::write(&config_path, "[server]\nport = 8123\n").unwrap();
    let ledger = dir.path().join("override.csv");

    let config = commands::load_config(Some(&config_path), Some(&ledger)).unwrap();
    assert_eq!(config.ledger.path, ledger);
    assert_eq!(config.server.port, 8123);
}

#[test]
fn test_load_config_missing_explicit_file() {
    let dir = TempDir::new().unwrap();
    let result = commands::load_config(Some(&dir.path().join("nope.toml")), None);
    assert!(result.is_err());
}

// ========== Receipt Commands ==========

#[test]
fn test_read_text_input_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("receipt.txt");
    fs::write(&path, "Total $9.99\nBook Nook").unwrap();

    let text = commands::read_text_input(path.to_str().unwrap()).unwrap();
    assert_eq!(text, "Total $9.99\nBook Nook");
}

#[test]
fn test_cmd_extract() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("receipt.txt");
    fs::write(&path, "Total $45.50\nCoffee Shop\nLatte").unwrap();

    assert!(commands::cmd_extract(path.to_str().unwrap(), false).is_ok());
    assert!(commands::cmd_extract(path.to_str().unwrap(), true).is_ok());
}

#[test]
fn test_cmd_extract_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");
    assert!(commands::cmd_extract(missing.to_str().unwrap(), false).is_err());
}

#[tokio::test]
async fn test_cmd_scan_and_save() {
    let dir = TempDir::new().unwrap();
    let ctx = test_context(
        &dir,
        "Total $45.50\nCoffee Shop\nLatte and muffin",
        MockBackend::new(),
    );
    let image = dir.path().join("receipt.png");
    fs::write(&image, b"fake image").unwrap();

    commands::cmd_scan(&ctx, &image, true, false).await.unwrap();

    let rows = ctx.ledger.read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].merchant, "Coffee Shop");
    assert_eq!(rows[0].category, Category::Food);
}

#[tokio::test]
async fn test_cmd_scan_without_save_leaves_ledger_alone() {
    let dir = TempDir::new().unwrap();
    let ctx = test_context(&dir, "Total 5\nBus Depot\nticket", MockBackend::new());
    let image = dir.path().join("receipt.png");
    fs::write(&image, b"img").unwrap();

    commands::cmd_scan(&ctx, &image, false, true).await.unwrap();
    assert!(!ctx.ledger.path().exists());
}

#[tokio::test]
async fn test_cmd_scan_missing_image() {
    let dir = TempDir::new().unwrap();
    let ctx = test_context(&dir, "", MockBackend::new());
    let result = commands::cmd_scan(&ctx, &dir.path().join("nope.png"), false, false).await;
    assert!(result.is_err());
}

// ========== Categorize ==========

#[tokio::test]
async fn test_cmd_categorize() {
    let dir = TempDir::new().unwrap();
    let mock = MockBackend::new();
    let ctx = test_context(&dir, "", mock.clone());

    commands::cmd_categorize(&ctx, "coffee and pastry", "Downtown Cafe")
        .await
        .unwrap();
    assert_eq!(mock.call_count(), 0);
}

// ========== Ledger Commands ==========

#[tokio::test]
async fn test_cmd_expenses_add_with_category() {
    let dir = TempDir::new().unwrap();
    let ctx = test_context(&dir, "", MockBackend::new());

    commands::cmd_expenses_add(&ctx, 20.0, "Shell", "fuel", Some("transport"))
        .await
        .unwrap();

    let rows = ctx.ledger.read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, Category::Transport);
    assert!((rows[0].amount - 20.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_cmd_expenses_add_categorizes_when_omitted() {
    let dir = TempDir::new().unwrap();
    let mock = MockBackend::replying("technology");
    let ctx = test_context(&dir, "", mock.clone());

    commands::cmd_expenses_add(&ctx, 12.5, "Downtown Cafe", "coffee", None)
        .await
        .unwrap();
    commands::cmd_expenses_add(&ctx, 99.0, "store", "gadget and gift", None)
        .await
        .unwrap();

    let rows = ctx.ledger.read_all().unwrap();
    assert_eq!(rows[0].category, Category::Food);
    assert_eq!(rows[1].category, Category::Technology);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_cmd_expenses_add_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let ctx = test_context(&dir, "", MockBackend::new());

    assert!(
        commands::cmd_expenses_add(&ctx, 5.0, "Store", "thing", Some("groceries"))
            .await
            .is_err()
    );
    assert!(commands::cmd_expenses_add(&ctx, -1.0, "Store", "thing", Some("shopping"))
        .await
        .is_err());
    assert!(ctx.ledger.read_all().unwrap().is_empty());
}

#[test]
fn test_cmd_expenses_list_and_summary() {
    let dir = TempDir::new().unwrap();
    let ledger = ExpenseLedger::new(dir.path().join("expenses.csv"));

    // Empty ledger
    assert!(commands::cmd_expenses_list(&ledger).is_ok());
    assert!(commands::cmd_summary(&ledger).is_ok());

    ledger
        .append(&tillscan_core::ClassifiedExpense {
            amount: 15.0,
            merchant: "A merchant with a name longer than the column".into(),
            description: "lunch".into(),
            category: Category::Food,
        })
        .unwrap();

    assert!(commands::cmd_expenses_list(&ledger).is_ok());
    assert!(commands::cmd_summary(&ledger).is_ok());
}

// ========== AI Status ==========

#[tokio::test]
async fn test_cmd_ai_status_unconfigured_and_mock() {
    let mut config = Config::default();
    config.ai.backend = "none".into();
    assert!(commands::cmd_ai_status(&config).await.is_ok());

    config.ai.backend = "mock".into();
    assert!(commands::cmd_ai_status(&config).await.is_ok());
}
