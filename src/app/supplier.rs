use crate::domain::model::{SupplierInvoice, SupplierLookup, SupplierStatement};
use crate::domain::ports::SheetSource;
use crate::utils::error::Result;
use crate::utils::money::parse_eur;
use std::sync::Arc;

const STATEMENT_RANGE: &str = "A1:O60";
const HEADER_MARKER: &str = "Invoice Date";
const DEFAULT_HEADER_ROW: usize = 7;
const DUE_COLUMN: usize = 6;
const BALANCE_COLUMN: usize = 9;
const LINE_WIDTH: usize = 15;
const LINE_BALANCE_COLUMN: usize = 14;

/// Supplier accounts payable, one spreadsheet tab per supplier.
pub struct SupplierLedger {
    sheets: Arc<dyn SheetSource>,
    spreadsheet_id: String,
}

/// 先完全相符，再前綴，最後子字串（兩個方向都比）
pub fn match_tab<'a>(tabs: &'a [String], query: &str) -> Option<&'a String> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    let lowered: Vec<(String, &String)> = tabs.iter().map(|t| (t.to_lowercase(), t)).collect();

    lowered
        .iter()
        .find(|(tab, _)| *tab == q)
        .or_else(|| {
            lowered
                .iter()
                .find(|(tab, _)| tab.starts_with(&q) || q.starts_with(tab.as_str()))
        })
        .or_else(|| {
            lowered
                .iter()
                .find(|(tab, _)| tab.contains(&q) || q.contains(tab.as_str()))
        })
        .map(|(_, original)| *original)
}

fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn amount(row: &[String], index: usize) -> f64 {
    parse_eur(cell(row, index)).unwrap_or(0.0)
}

/// Totals from row 2, then every non-zero invoice line under the header row.
pub fn parse_statement(supplier: &str, rows: &[Vec<String>]) -> SupplierStatement {
    let summary: &[String] = rows.get(1).map(Vec::as_slice).unwrap_or(&[]);
    let header_idx = rows
        .iter()
        .position(|row| row.iter().any(|c| c.contains(HEADER_MARKER)))
        .unwrap_or(DEFAULT_HEADER_ROW);

    let invoices = rows
        .iter()
        .skip(header_idx + 1)
        .filter(|row| row.len() >= LINE_WIDTH)
        .filter_map(|row| {
            let balance = amount(row, LINE_BALANCE_COLUMN);
            if balance == 0.0 {
                return None;
            }
            Some(SupplierInvoice {
                date: cell(row, 1).to_string(),
                invoice: cell(row, 2).to_string(),
                amount: amount(row, 4),
                due: cell(row, 5).to_string(),
                balance,
            })
        })
        .collect();

    SupplierStatement {
        supplier: supplier.to_string(),
        total_balance: amount(summary, BALANCE_COLUMN),
        total_due: amount(summary, DUE_COLUMN),
        invoices,
    }
}

impl SupplierLedger {
    pub fn new(sheets: Arc<dyn SheetSource>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            sheets,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    pub async fn outstanding(&self, supplier_query: &str) -> Result<SupplierLookup> {
        let tabs = self.sheets.tab_titles(&self.spreadsheet_id).await?;
        let Some(tab) = match_tab(&tabs, supplier_query) else {
            tracing::info!("No supplier tab matches '{}'", supplier_query);
            return Ok(SupplierLookup::NotFound {
                query: supplier_query.to_string(),
            });
        };

        let rows = self
            .sheets
            .values(&self.spreadsheet_id, &format!("'{}'!{}", tab, STATEMENT_RANGE))
            .await?;
        let statement = parse_statement(tab, &rows);

        tracing::info!(
            "Supplier '{}': balance={:.2} due={:.2} invoices={}",
            statement.supplier,
            statement.total_balance,
            statement.total_due,
            statement.invoices.len()
        );
        Ok(SupplierLookup::Found(statement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::restaurant::tests::{row, CannedSheets};

    fn tabs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_match_tab_precedence() {
        let names = tabs(&["Smart Elite", "Transfood", "Om Food", "Sona Food", "Food"]);

        assert_eq!(match_tab(&names, "transfood").map(String::as_str), Some("Transfood"));
        assert_eq!(match_tab(&names, "food").map(String::as_str), Some("Food"));
        // 前綴優先於子字串
        assert_eq!(match_tab(&names, "smart").map(String::as_str), Some("Smart Elite"));
        assert_eq!(
            match_tab(&names, "Transfood GmbH").map(String::as_str),
            Some("Transfood")
        );
        assert_eq!(match_tab(&names, "sona").map(String::as_str), Some("Sona Food"));
        assert_eq!(match_tab(&names, "elite").map(String::as_str), Some("Smart Elite"));
        assert_eq!(match_tab(&names, "Crown"), None);
        assert_eq!(match_tab(&names, "  "), None);
    }

    fn statement_rows() -> Vec<Vec<String>> {
        let mut rows = vec![
            row(&["Transfood"]),
            row(&["", "", "", "", "", "", "€700.00", "", "", "€1,450.00"]),
        ];
        rows.extend((2..7).map(|_| row(&[])));
        rows.push(row(&["#", "Invoice Date", "Invoice No", "", "Amount", "Due Date"]));
        let line = |date: &str, inv: &str, amount: &str, due: &str, balance: &str| {
            row(&[
                "", date, inv, "", amount, due, "", "", "", "", "", "", "", "", balance,
            ])
        };
        rows.push(line("01/09/2026", "TF-1001", "€800.00", "01/10/2026", "€800.00"));
        rows.push(line("03/09/2026", "TF-1002", "€350.00", "03/10/2026", "€0.00"));
        rows.push(line("05/09/2026", "CN-77", "-€100.00", "", "-€100.00"));
        rows.push(row(&["", "short row"]));
        rows.push(line("10/09/2026", "TF-1003", "€750.00", "10/10/2026", "€750.00"));
        rows
    }

    #[test]
    fn test_parse_statement() {
        let statement = parse_statement("Transfood", &statement_rows());

        assert_eq!(statement.total_due, 700.0);
        assert_eq!(statement.total_balance, 1450.0);
        let numbers: Vec<&str> = statement.invoices.iter().map(|i| i.invoice.as_str()).collect();
        assert_eq!(numbers, vec!["TF-1001", "CN-77", "TF-1003"]);
        assert_eq!(statement.unpaid().count(), 2);
        assert_eq!(statement.credit_notes().count(), 1);
        assert_eq!(statement.invoices[0].due, "01/10/2026");
        assert_eq!(statement.invoices[1].amount, -100.0);
    }

    #[tokio::test]
    async fn test_outstanding_reads_matched_tab() {
        let mut sheets = CannedSheets::default().with_range("'Transfood'!A1:O60", statement_rows());
        sheets.tabs = tabs(&["Smart Elite", "Transfood"]);
        let sheets = Arc::new(sheets);
        let ledger = SupplierLedger::new(sheets.clone(), "suppliers");

        match ledger.outstanding("transfood").await.unwrap() {
            SupplierLookup::Found(statement) => {
                assert_eq!(statement.supplier, "Transfood");
                assert_eq!(statement.invoices.len(), 3);
            }
            other => panic!("unexpected lookup {:?}", other),
        }

        assert_eq!(
            ledger.outstanding("Crown").await.unwrap(),
            SupplierLookup::NotFound {
                query: "Crown".to_string()
            }
        );
    }
}
