pub mod brackets;
pub mod calculators;
pub mod deductions;
pub mod engine;
pub mod errors;
pub mod input;
pub mod result;
pub mod shareholder;
pub mod tables;
pub mod treatment;

pub use self::brackets::{BracketTable, RateAdjustment, TaxBracket, evaluate_bracket};
pub use self::deductions::DeductionSet;
pub use self::engine::TaxEngine;
pub use self::errors::{TaxError, TaxResult, Warning};
pub use self::input::{CalculationInput, TaxCategory};
pub use self::result::{BreakdownStep, CalculationResult};
pub use self::shareholder::{Listing, ShareholderClass, classify_shareholder};
pub use self::tables::{TaxTableRegistry, TaxYearTables};
pub use self::treatment::Treatment;

/// A shortcut for one-off calculations.
pub fn calculate(registry: &TaxTableRegistry, year: i32, input: &CalculationInput) -> TaxResult<CalculationResult> {
    TaxEngine::new(registry, year)?.calculate(input)
}
