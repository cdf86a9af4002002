use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("logoscope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("logoscope")
        .about("Finds the brand logo on a web page")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log pipeline progress (RUST_LOG overrides)")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("extract")
                .about("Extract the logo from a site or a list of sites")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The page to inspect")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .group(
                    clap::ArgGroup::new("target")
                        .args(["url", "hosts-file"])
                        .required(true),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("How many sites to process at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Write one JSON report per site into this directory"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Console output format")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"candidates")
                        .required(false)
                        .help("Include every ranked candidate in the output")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"colors")
                        .required(false)
                        .help("Also extract brand colors from the site icon")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"save-inline" <DIR>)
                        .required(false)
                        .help("Save inline SVG and data-URI images into this directory"),
                )
                .arg(
                    arg!(--"user-agent" <AGENT>)
                        .required(false)
                        .help("User-Agent header sent when fetching pages"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("15"),
                ),
        )
        .subcommand(
            command!("site-name")
                .about("Print the brand token derived from a hostname or URL")
                .arg(arg!(<HOST>).help("Hostname or URL, e.g. www.acme.co.uk")),
        )
}
