//! Plain-text rendering of records and summary tables.

use pocketbook_core::{Record, TabConfig};
use pocketbook_finance::{BalanceTable, CategoryTable, TreeNode};
use rust_decimal::Decimal;

pub fn print_records(records: &[Record]) {
    for (i, r) in records.iter().enumerate() {
        match r {
            Record::Transaction(t) => println!(
                "{i:>3}  {}  {:<48} {:>12}  {}",
                t.date,
                t.description,
                t.amount,
                t.category.as_ref().map(|c| c.as_str()).unwrap_or("-")
            ),
            Record::Balance(b) => println!("{i:>3}  {}  {:<48} {:>12}", b.date, b.source, b.balance),
        }
    }
}

pub fn print_category_table(table: &CategoryTable, tab: &TabConfig, base_total: Option<Decimal>) {
    println!("## Spend by category ({})\n", table.label);
    for (name, spend) in &table.columns {
        println!("  {name:<20} {spend:>12.2} {}", tab.currency);
    }
    println!("  {:<20} {:>12.2} {}", "Total", table.total(), tab.currency);
    if let Some(base) = base_total {
        println!("  {:<20} {:>12.2}", "Total (base)", base);
    }
}

/// Months without a fresh report show the previous balance.
pub fn print_balance_table(table: &BalanceTable) {
    println!("## Month-end balances\n");
    if table.is_empty() {
        println!("  (no balances in range)");
        return;
    }
    let mut grid = table.grid();
    grid.forward_fill();

    let header: Vec<String> = grid.sources.iter().map(|s| format!("{s:>12}")).collect();
    println!("  {:<10} {}", "Month", header.join(" "));
    for (month, cells) in &grid.rows {
        let cells: Vec<String> = cells
            .iter()
            .map(|c| match c {
                Some(v) => format!("{v:>12.2}"),
                None => format!("{:>12}", "-"),
            })
            .collect();
        println!("  {:<10} {}", month.format("%Y-%m-%d").to_string(), cells.join(" "));
    }
}

pub fn print_tree(nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        println!("{}{}/", "  ".repeat(depth), node.label);
        print_tree(&node.children, depth + 1);
    }
}
