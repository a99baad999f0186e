//! This module provides a thin wrapper around prettytable.

use prettytable::{Row as RawRow, Cell as RawCell};
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};

use crate::types::Decimal;

pub use prettytable::{Table, format::Alignment};

#[derive(Clone)]
pub struct Cell {
    text: String,
    align: Alignment,
}

impl Cell {
    pub fn new(text: &str) -> Cell {
        Cell::new_align(text, Alignment::LEFT)
    }

    pub fn new_empty() -> Cell {
        Cell::new("")
    }

    pub fn new_align(text: &str, align: Alignment) -> Cell {
        Cell {
            text: text.to_owned(),
            align: align,
        }
    }

    pub fn new_won(amount: Decimal) -> Cell {
        Cell::new_align(&super::format_won(amount), Alignment::RIGHT)
    }

    pub fn new_rate(rate: Decimal) -> Cell {
        Cell::new_align(&super::format_rate(rate), Alignment::RIGHT)
    }
}

pub struct Row {
}

impl Row {
    pub fn new(row: &[Cell]) -> RawRow {
        let mut cells = Vec::with_capacity(row.len());

        for cell in row {
            cells.push(RawCell::new_align(&cell.text, cell.align));
        }

        RawRow::new(cells)
    }
}

pub fn render_table(name: &str, titles: &[&str], mut table: Table) -> String {
    table.set_format(FormatBuilder::new().padding(1, 1).build());
    table.set_titles(RawRow::new(
        titles.iter().map(|name| RawCell::new_align(name, Alignment::CENTER)).collect()));

    let mut wrapping_table = Table::new();

    wrapping_table.set_format(FormatBuilder::new()
        .separator(LinePosition::Title, LineSeparator::new(' ', ' ', ' ', ' '))
        .build());

    wrapping_table.set_titles(RawRow::new(vec![
        RawCell::new_align(&("\n".to_owned() + name), Alignment::CENTER),
    ]));

    wrapping_table.add_row(RawRow::new(vec![RawCell::new(&table.to_string())]));
    wrapping_table.to_string()
}

pub fn print_table(name: &str, titles: &[&str], table: Table) {
    print!("{}", render_table(name, titles, table));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering() {
        let mut table = Table::new();
        table.add_row(Row::new(&[Cell::new("National tax"), Cell::new_won(dec!(1_940_000)), Cell::new_empty()]));
        table.add_row(Row::new(&[Cell::new("Rate"), Cell::new_rate(dec!(0.2)), Cell::new_empty()]));

        let rendered = render_table("Other income tax", &["Step", "Amount", "Description"], table);
        assert!(rendered.contains("Other income tax"));
        assert!(rendered.contains("1,940,000"));
        assert!(rendered.contains("20%"));
        assert!(rendered.contains("Description"));
    }
}
