use strum::{Display, EnumIter, EnumString, VariantNames};

use crate::formatting::{self, table::{Cell, Row, Table}};
use crate::types::Decimal;
use crate::taxes::{BracketTable, CalculationResult, TaxTableRegistry, TaxYearTables};

/// Progressive schedules which can be inspected from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum Schedule {
    IncomeTax,
    Gift,
    Inheritance,
    LargeShareholder,
    EarnedIncomeDeduction,
    EarnedIncomeCredit,
}

impl Schedule {
    pub fn table(self, tables: &TaxYearTables) -> &BracketTable {
        match self {
            Schedule::IncomeTax => &tables.income_tax,
            Schedule::Gift => &tables.gift.brackets,
            Schedule::Inheritance => &tables.inheritance.brackets,
            Schedule::LargeShareholder => &tables.stock.large_shareholder_brackets,
            Schedule::EarnedIncomeDeduction => &tables.payroll.earned_income_deduction,
            Schedule::EarnedIncomeCredit => &tables.payroll.earned_income_credit,
        }
    }
}

pub fn render_result(result: &CalculationResult) -> String {
    let mut table = Table::new();

    for step in &result.breakdown {
        table.add_row(Row::new(&[
            Cell::new(step.label),
            if step.amount.is_zero() && step.description.is_some() {
                Cell::new_empty()
            } else {
                Cell::new_won(step.amount)
            },
            Cell::new(step.description.as_deref().unwrap_or_default()),
        ]));
    }

    table.add_empty_row();
    table.add_row(Row::new(&[Cell::new("Taxable base"), Cell::new_won(result.taxable_base), Cell::new_empty()]));
    table.add_row(Row::new(&[Cell::new("Applied rate"), Cell::new_rate(result.applied_rate), Cell::new_empty()]));
    table.add_row(Row::new(&[Cell::new("Effective rate"), Cell::new_rate(result.effective_rate), Cell::new_empty()]));
    table.add_row(Row::new(&[Cell::new("Net proceeds"), Cell::new_won(result.net_proceeds), Cell::new_empty()]));

    let name = format!("{} tax ({} tax year)", result.category, result.year);
    let mut rendered = formatting::table::render_table(&name, &["Step", "Amount", "Description"], table);

    if !result.warnings.is_empty() {
        rendered.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            rendered.push_str(&format!("* {warning}.\n"));
        }
    }

    rendered
}

pub fn print_result(result: &CalculationResult) {
    print!("{}", render_result(result));
}

pub fn print_schedule(schedule: Schedule, tables: &TaxYearTables, base: Option<Decimal>) {
    let brackets = schedule.table(tables);
    let mut table = Table::new();
    let mut lower_bound = dec!(0);

    for tier in brackets.tiers() {
        table.add_row(Row::new(&[
            Cell::new_won(lower_bound),
            match tier.upper_bound {
                Some(upper_bound) => Cell::new_won(upper_bound),
                None => Cell::new_empty(),
            },
            Cell::new_rate(tier.rate),
            Cell::new_won(tier.cumulative_base_tax),
        ]));

        if let Some(upper_bound) = tier.upper_bound {
            lower_bound = upper_bound;
        }
    }

    formatting::table::print_table(
        &format!("{schedule} schedule ({} tax year)", tables.year),
        &["From", "To", "Rate", "Base tax"], table);

    if let Some(base) = base {
        println!("\n{}", describe_evaluation(brackets, base));
    }
}

fn describe_evaluation(brackets: &BracketTable, base: Decimal) -> String {
    format!("{} → {} (marginal rate {})",
            formatting::format_won(base), formatting::format_won(brackets.tax(base)),
            formatting::format_rate(brackets.marginal_rate(base)))
}

pub fn print_years(registry: &TaxTableRegistry) {
    let mut table = Table::new();

    for year in registry.years() {
        let Ok(tables) = registry.get(year) else {
            continue;
        };

        table.add_row(Row::new(&[
            Cell::new(&year.to_string()),
            Cell::new_rate(tables.local_surtax_rate),
            Cell::new(&tables.income_tax.to_string()),
        ]));
    }

    formatting::table::print_table("Tax years", &["Year", "Local income tax", "Income tax schedule"], table);
}
