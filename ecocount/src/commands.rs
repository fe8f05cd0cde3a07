use crate::handlers::{parse_date_arg, parse_frequency};
use clap::{arg, command};
use ecocount_scanner::EcoDisplayMap;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn site_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-s --"site" <SITE_ID>)
            .required(true)
            .help("Eco-Counter site identifier, e.g. 300037212"),
    )
    .arg(
        arg!(--"base-url" <URL>)
            .required(false)
            .help("Base URL of the counter display map")
            .default_value(EcoDisplayMap::DEFAULT_BASE_URL),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("30"),
    )
    .arg(
        arg!(-v --"verbose" "Log extraction details to stderr")
            .required(false)
            .action(clap::ArgAction::SetTrue),
    )
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("ecocount")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("ecocount")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            site_args(command!("fetch"))
                .about("Fetch bicycle counts for a site as a time-indexed table")
                .arg(
                    arg!(--"start" <DATE>)
                        .required(false)
                        .help("First day of the period, YYYY-MM-DD (default: one period before end)")
                        .value_parser(parse_date_arg),
                )
                .arg(
                    arg!(--"end" <DATE>)
                        .required(false)
                        .help("Last day of the period, YYYY-MM-DD (default: now)")
                        .value_parser(parse_date_arg),
                )
                .arg(
                    arg!(--"freq" <FREQ>)
                        .required(false)
                        .help("Granularity: D, W, M or Y")
                        .value_parser(parse_frequency)
                        .default_value("D"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: table, csv, json")
                        .value_parser(["table", "csv", "json"])
                        .default_value("table"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the table to a file (default: display to screen)"),
                )
                .arg(
                    arg!(--"strict")
                        .required(false)
                        .help("Fail when the page carries no counter data instead of printing an empty table")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"dump-html" <PATH>)
                        .required(false)
                        .help("Write the fetched page to a file for inspection"),
                ),
        )
        .subcommand(
            site_args(command!("info"))
                .about("Show the name, location and directions of a counting site"),
        )
}
