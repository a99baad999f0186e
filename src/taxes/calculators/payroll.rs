use std::cmp;

use log::{debug, trace};

use crate::types::Decimal;
use crate::util;

use crate::taxes::brackets::RateAdjustment;
use crate::taxes::deductions::DeductionSet;
use crate::taxes::errors::{TaxResult, Warning};
use crate::taxes::input::{PayrollInput, TaxCategory};
use crate::taxes::result::{CalculationResult, ResultBuilder, Totals};
use crate::taxes::tables::{PayrollTables, TaxYearTables};

/// Calculates annual earned income tax as it's settled at the end of the year.
pub fn calculate(tables: &TaxYearTables, input: &PayrollInput) -> TaxResult<CalculationResult> {
    let rules = &tables.payroll;
    let mut result = ResultBuilder::new(TaxCategory::Payroll, tables.year);

    result.step("Salary", input.annual_salary);

    let mut non_taxable = input.non_taxable;
    if non_taxable > input.annual_salary {
        result.warn(Warning::NonTaxableExceedsSalary {salary: input.annual_salary, non_taxable});
        non_taxable = input.annual_salary;
    }
    if !non_taxable.is_zero() {
        result.step("Non-taxable allowances", -non_taxable);
    }

    let salary = input.annual_salary - non_taxable;
    result.step("Total salary", salary);

    let earned_income_deduction = cmp::min(
        rules.earned_income_deduction.tax(salary), rules.earned_income_deduction_limit);

    let persons = 1 + u64::from(input.spouse) + u64::from(input.dependents);
    trace!("Personal deduction for {persons} persons.");

    let mut deductions = DeductionSet::new();
    deductions.add("Earned income deduction", earned_income_deduction);
    deductions.add("Personal deduction", Decimal::from(persons) * rules.personal_deduction);
    deductions.add("Social insurance", input.social_insurance);

    let base = result.deduct(&deductions, salary);
    let (tax, rate) = super::progressive_tax(&tables.income_tax, RateAdjustment::None, base)?;
    debug!("Payroll: {salary} total salary, {base} taxable base, {rate} marginal rate.");

    let tax = util::round_to(tax, 0);
    result.step("Calculated tax", tax);

    let earned_income_credit = cmp::min(
        rules.earned_income_credit.tax(tax), earned_income_credit_limit(rules, salary));

    let standard_credit = if input.standard_credit {
        rules.standard_credit
    } else {
        dec!(0)
    };

    let national_tax = result.credit(tax, &[
        ("Earned income credit", earned_income_credit),
        ("Child credit", child_credit(rules, input.children)),
        ("Rent credit", rent_credit(rules, salary, input.monthly_rent)),
        ("Standard credit", standard_credit),
    ]);

    Ok(result.build(deductions, Totals {
        gross: input.annual_salary,
        taxable_base: base,
        national_tax,
        local_surtax_rate: tables.local_surtax_rate,
        applied_rate: rate,
        proceeds: input.annual_salary,
    }))
}

fn earned_income_credit_limit(rules: &PayrollTables, salary: Decimal) -> Decimal {
    let mut previous_limit = dec!(0);

    for tier in &rules.earned_income_credit_limits {
        match tier.salary_limit {
            Some(limit) if salary > limit => {
                previous_limit = limit;
            },
            _ => {
                let reduction = (salary - previous_limit) * tier.reduction_rate;
                return cmp::max(tier.base - reduction, tier.floor);
            },
        }
    }

    // All tiers are bounded: the salary is above all of them
    rules.earned_income_credit_limits.last().map(|tier| tier.floor).unwrap_or_default()
}

fn child_credit(rules: &PayrollTables, children: u32) -> Decimal {
    let credit = &rules.child_credit;
    match children {
        0 => dec!(0),
        1 => credit.first,
        _ => credit.first + credit.second + Decimal::from(children - 2) * credit.additional,
    }
}

fn rent_credit(rules: &PayrollTables, salary: Decimal, monthly_rent: Decimal) -> Decimal {
    let rules = &rules.rent_credit;

    let Some(rate) = rules.rates.iter().find(|rate| salary <= rate.salary_limit) else {
        return dec!(0);
    };

    cmp::min(monthly_rent * dec!(12), rules.max_rent) * rate.rate
}
