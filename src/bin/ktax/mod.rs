mod action;
mod parser;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use log::{error, warn};

use ktax::config::Config;
use ktax::core::{EmptyResult, GenericResult};
use ktax::report;
use ktax::taxes::{CalculationInput, TaxEngine};

use self::action::Action;
use self::parser::{Parser, GlobalOptions};

fn main() -> ExitCode {
    let mut parser = Parser::new();

    let global = match parser.parse_global() {
        Ok(global) => global,
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err}.");
            return ExitCode::FAILURE;
        },
    };

    if let Err(err) = easy_logging::init(module_path!(), global.log_level) {
        let _ = writeln!(io::stderr(), "Failed to initialize the logging: {err}.");
        return ExitCode::FAILURE;
    }

    if let Err(err) = run(global, parser) {
        let message = err.to_string();

        if message.contains('\n') {
            error!("{err}");
        } else {
            error!("{err}.");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(global: GlobalOptions, parser: Parser) -> EmptyResult {
    let config = Config::new(&global.config_dir)?;
    let action = parser.parse()?;
    let registry = config.load_tables()?;

    match action {
        Action::Calculate {year, input, json} => {
            let year = config.tax_year(&registry, year)?;
            let input = read_input(&input)?;

            let result = TaxEngine::new(&registry, year)?.calculate(&input)?;

            if json {
                for warning in &result.warnings {
                    warn!("{warning}.");
                }
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                report::print_result(&result);
            }
        },

        Action::Brackets {year, schedule, base} => {
            let year = config.tax_year(&registry, year)?;
            report::print_schedule(schedule, registry.get(year)?, base);
        },

        Action::Years => report::print_years(&registry),
    }

    Ok(())
}

fn read_input(path: &Path) -> GenericResult<CalculationInput> {
    let data = fs::read_to_string(path).map_err(|e| format!(
        "Unable to read {path:?}: {e}"))?;

    let is_json = path.extension().and_then(|extension| extension.to_str()) == Some("json");

    let input = if is_json {
        CalculationInput::from_json(&data)
    } else {
        CalculationInput::from_yaml(&data)
    };

    Ok(input.map_err(|e| format!("Invalid {path:?} input: {e}"))?)
}
