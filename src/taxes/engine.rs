use log::debug;

use super::calculators::{gift, inheritance, other_income, payroll, real_estate, stock};
use super::errors::TaxResult;
use super::input::{CalculationInput, TransferAsset};
use super::result::CalculationResult;
use super::tables::{TaxTableRegistry, TaxYearTables};

/// Tax calculator bound to the tables of a single tax year.
///
/// The engine holds no state except a reference to immutable tables, so it may be freely shared
/// between threads and every calculation is independent from the others.
#[derive(Clone, Copy, Debug)]
pub struct TaxEngine<'a> {
    tables: &'a TaxYearTables,
}

impl<'a> TaxEngine<'a> {
    pub fn new(registry: &'a TaxTableRegistry, year: i32) -> TaxResult<TaxEngine<'a>> {
        let tables = registry.get(year)?;
        debug!("Using {year} tax year tables.");
        Ok(TaxEngine::with_tables(tables))
    }

    pub fn with_tables(tables: &'a TaxYearTables) -> TaxEngine<'a> {
        TaxEngine {tables}
    }

    pub fn calculate(&self, input: &CalculationInput) -> TaxResult<CalculationResult> {
        input.validate()?;
        debug!("Calculating {} tax for {} tax year...", input.category(), self.tables.year);

        let result = match input {
            CalculationInput::Transfer(transfer) => match transfer.asset {
                TransferAsset::RealEstate(ref asset) => real_estate::calculate(self.tables, transfer, asset),
                TransferAsset::Stock(ref asset) => stock::calculate(self.tables, transfer, asset),
            },
            CalculationInput::Gift(gift) => gift::calculate(self.tables, gift),
            CalculationInput::Inheritance(inheritance) => inheritance::calculate(self.tables, inheritance),
            CalculationInput::Payroll(payroll) => payroll::calculate(self.tables, payroll),
            CalculationInput::OtherIncome(income) => other_income::calculate(self.tables, income),
        }?;

        debug!("{} tax: {} national + {} local = {} total ({} warnings).",
               result.category, result.national_tax, result.local_surtax, result.total_tax,
               result.warnings.len());

        Ok(result)
    }
}
