use std::str::FromStr;

use clap::{Arg, ArgAction, ArgMatches, builder::PossibleValuesParser};
use strum::VariantNames;

use ktax::cli;
use ktax::core::GenericResult;
use ktax::report::Schedule;
use ktax::util::{self, DecimalRestrictions};

use super::action::Action;

pub struct Parser {
    matches: Option<ArgMatches>,
}

pub struct GlobalOptions {
    pub log_level: log::Level,
    pub config_dir: String,
}

impl Parser {
    pub fn new() -> Parser {
        Parser {matches: None}
    }

    pub fn parse_global(&mut self) -> GenericResult<GlobalOptions> {
        const DEFAULT_CONFIG_DIR_PATH: &str = "~/.ktax";

        let app = cli::new_app("ktax", "Calculates Korean taxes")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .args([
                cli::new_arg("config", "Configuration directory path [default: ~/.ktax]")
                    .short('c').long("config")
                    .value_name("PATH"),

                cli::new_arg("verbose", "Set verbosity level")
                    .short('v').long("verbose")
                    .action(ArgAction::Count),
            ])

            .subcommand(cli::new_subcommand(
                "calc", "Calculate tax for the specified input")
                .long_about("\
                    Reads calculation input from the specified YAML or JSON file and prints the \
                    calculated tax with its step-by-step breakdown.")
                .args([
                    year_arg(),

                    cli::new_arg("json", "Print the result as JSON")
                        .long("json")
                        .action(ArgAction::SetTrue),

                    cli::new_arg("INPUT", "Path to the input file (*.json or *.yaml)")
                        .required(true),
                ]))

            .subcommand(cli::new_subcommand(
                "brackets", "Show progressive tax schedule")
                .args([
                    year_arg(),

                    cli::new_arg("SCHEDULE", "Schedule name")
                        .value_parser(PossibleValuesParser::new(Schedule::VARIANTS.iter().copied()))
                        .required(true),

                    cli::new_arg("BASE", "Taxable base to evaluate the schedule for"),
                ]))

            .subcommand(cli::new_subcommand(
                "years", "List tax years with known tax tables"));

        let matches = app.get_matches();

        let log_level = match matches.get_count("verbose") {
            0 => log::Level::Info,
            1 => log::Level::Debug,
            2 => log::Level::Trace,
            _ => return Err("Invalid verbosity level".into()),
        };

        let config_dir = matches.get_one::<String>("config").map(ToString::to_string).unwrap_or_else(||
            shellexpand::tilde(DEFAULT_CONFIG_DIR_PATH).to_string());

        self.matches = Some(matches);

        Ok(GlobalOptions {log_level, config_dir})
    }

    pub fn parse(mut self) -> GenericResult<Action> {
        let matches = self.matches.take().ok_or("Command line arguments are not parsed yet")?;

        let Some((command, matches)) = matches.subcommand() else {
            return Err("No command is specified".into());
        };

        Ok(match command {
            "calc" => Action::Calculate {
                year: get_year(matches)?,
                input: get_required(matches, "INPUT")?.into(),
                json: matches.get_flag("json"),
            },

            "brackets" => {
                let schedule = get_required(matches, "SCHEDULE")?;

                Action::Brackets {
                    year: get_year(matches)?,
                    schedule: Schedule::from_str(schedule).map_err(|_| format!(
                        "Invalid schedule: {schedule:?}"))?,
                    base: matches.get_one::<String>("BASE").map(|base| {
                        util::parse_decimal(base, DecimalRestrictions::PositiveOrZero).map_err(|_| format!(
                            "Invalid taxable base: {base:?}"))
                    }).transpose()?,
                }
            },

            "years" => Action::Years,

            _ => return Err(format!("Unsupported command: {command:?}").into()),
        })
    }
}

fn year_arg() -> Arg {
    cli::new_arg("year", "Tax year [default: the configured or the latest known one]")
        .short('y').long("year")
        .value_name("YEAR")
}

fn get_year(matches: &ArgMatches) -> GenericResult<Option<i32>> {
    matches.get_one::<String>("year").map(|year| {
        Ok(year.parse::<i32>().ok()
            .filter(|year| (2000..=2100).contains(year))
            .ok_or_else(|| format!("Invalid year: {year}"))?)
    }).transpose()
}

fn get_required<'a>(matches: &'a ArgMatches, name: &str) -> GenericResult<&'a str> {
    Ok(matches.get_one::<String>(name).ok_or_else(|| format!("{name} is not specified"))?)
}
