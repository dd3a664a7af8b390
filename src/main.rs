use anyhow::Result;
use clap::{Arg, Command};

use devex::commands;
use devex::ui;

fn main() {
    devex::init_logging();

    if let Err(e) = run() {
        ui::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = Command::new("devex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Host telemetry: metric history, processes and ports")
        .subcommand(
            Command::new("run")
                .about("Collect metrics and track processes until Ctrl+C")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Seconds between metric samples (overrides config)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Show recorded metrics")
                .arg(
                    Arg::new("kind")
                        .help("Metric kind")
                        .value_parser(["cpu", "ram", "disk", "docker", "network"])
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("minutes")
                        .short('m')
                        .long("minutes")
                        .value_name("N")
                        .help("Size of the window, in minutes")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("ps")
                .about("List the top processes with their ports")
                .arg(
                    Arg::new("sort")
                        .short('s')
                        .long("sort")
                        .help("Rank by CPU or memory")
                        .value_parser(["cpu", "mem"])
                        .default_value("mem"),
                )
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_name("N")
                        .help("Number of processes to show")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("30"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("port")
                .about("Find the processes using a port")
                .arg(
                    Arg::new("port")
                        .help("Port number")
                        .value_parser(clap::value_parser!(u16))
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("kill")
                .about("Force-terminate a process")
                .arg(
                    Arg::new("pid")
                        .help("Process ID")
                        .value_parser(clap::value_parser!(u32))
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Do not ask for confirmation")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("prune").about("Delete records older than the retention window"))
        .subcommand(
            Command::new("config")
                .about("Show or change configuration (use 'devex config --help' for subcommands)")
                .subcommand(Command::new("show").about("Show the current configuration"))
                .subcommand(
                    Command::new("set")
                        .about("Set a configuration value")
                        .arg(Arg::new("key").help("Config key").required(true).index(1))
                        .arg(Arg::new("value").help("New value").required(true).index(2)),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run::execute(sub_matches),
        Some(("history", sub_matches)) => commands::history::execute(sub_matches),
        Some(("ps", sub_matches)) => commands::ps::execute(sub_matches),
        Some(("port", sub_matches)) => commands::port::execute(sub_matches),
        Some(("kill", sub_matches)) => commands::kill::execute(sub_matches),
        Some(("prune", sub_matches)) => commands::prune::execute(sub_matches),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        _ => {
            println!("Welcome to devex!");
            println!("Use 'devex --help' for more information.");
            Ok(())
        }
    }
}
