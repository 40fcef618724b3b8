//! CSV-backed expense ledger
//!
//! Columns: `amount,merchant,description,category`, one row per confirmed
//! expense in insertion order. Appends take no lock; concurrent writers may
//! interleave rows.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Category, ClassifiedExpense};

/// Column names, in file order
pub const LEDGER_HEADER: [&str; 4] = ["amount", "merchant", "description", "category"];

/// Append-only CSV ledger of classified expenses
#[derive(Debug, Clone)]
pub struct ExpenseLedger {
    path: PathBuf,
}

impl ExpenseLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and a header-only file if missing
    pub fn ensure_exists(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if needs_header {
            let mut writer = WriterBuilder::new().from_path(&self.path)?;
            writer.write_record(LEDGER_HEADER)?;
            writer.flush()?;
            debug!(path = %self.path.display(), "Created expense ledger");
        }
        Ok(())
    }

    /// Append one expense
    pub fn append(&self, expense: &ClassifiedExpense) -> Result<()> {
        self.ensure_exists()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        let amount = expense.amount.to_string();
        writer.write_record([
            amount.as_str(),
            expense.merchant.as_str(),
            expense.description.as_str(),
            expense.category.as_str(),
        ])?;
        writer.flush()?;

        debug!(
            amount = expense.amount,
            merchant = %expense.merchant,
            category = %expense.category,
            "Saved expense"
        );
        Ok(())
    }

    /// Read every expense in insertion order
    ///
    /// A missing file is an empty ledger. Rows that cannot be read (bad amount,
    /// wrong column count) are skipped with a warning; unrecognized category
    /// values read back as `unknown`.
    pub fn read_all(&self) -> Result<Vec<ClassifiedExpense>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let mut expenses = Vec::new();
        for (index, result) in rdr.records().enumerate() {
            // Header is line 1
            let line = index + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(line, error = %e, "Skipping unreadable ledger row");
                    continue;
                }
            };

            let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

            let Some(amount) = field(0).parse::<f64>().ok().filter(|a| a.is_finite()) else {
                warn!(line, amount = %field(0), "Skipping ledger row with invalid amount");
                continue;
            };

            let raw_category = field(3);
            let category = raw_category.parse::<Category>().unwrap_or_else(|_| {
                warn!(line, category = %raw_category, "Unrecognized category in ledger");
                Category::Unknown
            });

            expenses.push(ClassifiedExpense {
                amount,
                merchant: field(1),
                description: field(2),
                category,
            });
        }

        debug!(count = expenses.len(), "Read expense ledger");
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: f64, merchant: &str, category: Category) -> ClassifiedExpense {
        ClassifiedExpense {
            amount,
            merchant: merchant.to_string(),
            description: "item".to_string(),
            category,
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::new(dir.path().join("expenses.csv"));
        assert!(ledger.read_all().unwrap().is_empty());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_append_creates_dirs_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("expenses.csv");
        let ledger = ExpenseLedger::new(&path);

        ledger
            .append(&expense(12.5, "Downtown Cafe", Category::Food))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("amount,merchant,description,category"));
        assert_eq!(lines.next(), Some("12.5,Downtown Cafe,item,food"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_rows_read_back_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::new(dir.path().join("expenses.csv"));

        let first = expense(3.0, "Shell", Category::Transport);
        let second = expense(999.99, "Best Buy", Category::Technology);
        let third = expense(0.0, "Unrecognized Merchant", Category::Unknown);
        ledger.append(&first).unwrap();
        ledger.append(&second).unwrap();
        ledger.append(&third).unwrap();

        assert_eq!(ledger.read_all().unwrap(), vec![first, second, third]);
    }

    #[test]
    fn test_embedded_commas_and_quotes_survive() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::new(dir.path().join("expenses.csv"));
        let tricky = ClassifiedExpense {
            amount: 7.25,
            merchant: "Joe's \"Best\" Diner, Main St".to_string(),
            description: "eggs, toast".to_string(),
            category: Category::Food,
        };

        ledger.append(&tricky).unwrap();
        assert_eq!(ledger.read_all().unwrap(), vec![tricky]);
    }

    #[test]
    fn test_bad_rows_skipped_and_unknown_category_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        fs::write(
            &path,
            "amount,merchant,description,category\n\
             10,Cafe,Latte,food\n\
             abc,Broken,Row,food\n\
             4,Kiosk,Gum,misc\n\
             5,Short\n",
        )
        .unwrap();

        let rows = ExpenseLedger::new(&path).read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, Category::Food);
        assert_eq!(rows[1].merchant, "Kiosk");
        assert_eq!(rows[1].category, Category::Unknown);
    }

    #[test]
    fn test_existing_header_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExpenseLedger::new(dir.path().join("expenses.csv"));
        ledger.ensure_exists().unwrap();
        ledger.ensure_exists().unwrap();
        ledger.append(&expense(1.0, "A", Category::Shopping)).unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.matches("amount,merchant").count(), 1);
    }
}
