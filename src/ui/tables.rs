use colored::*;

use super::formatters::{format_clock, format_percent, format_size, truncate, usage_bar};
use crate::core::history::{HistorySeries, MetricKind};
use crate::core::process::ProcessWithPorts;

const NAME_WIDTH: usize = 24;
const BAR_WIDTH: usize = 20;

/// Colour a usage percentage by severity
fn colored_percent(value: f64) -> ColoredString {
    let text = format_percent(value);
    if value >= 90.0 {
        text.red().bold()
    } else if value >= 70.0 {
        text.yellow()
    } else {
        text.green()
    }
}

fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}

pub fn print_history(kind: MetricKind, series: &HistorySeries) {
    println!(
        "\n{} {}",
        kind.as_str().to_uppercase().bold().bright_cyan(),
        format!("({} samples)", series.len()).dimmed()
    );
    println!("{}", "=".repeat(60));

    if series.is_empty() {
        println!("{}", "No data in the selected window".dimmed());
        return;
    }

    match series {
        HistorySeries::Points(points) => {
            for point in points {
                println!(
                    "{}  {:>7}  {}",
                    format_clock(point.timestamp).dimmed(),
                    colored_percent(point.value),
                    usage_bar(point.value, BAR_WIDTH)
                );
            }
        }
        HistorySeries::Docker(rows) => {
            println!(
                "{:<10} {:>7} {:>11} {:>7}",
                "TIME".bold(),
                "DAEMON".bold(),
                "CONTAINERS".bold(),
                "IMAGES".bold()
            );
            for row in rows {
                println!(
                    "{:<10} {:>7} {:>11} {:>7}",
                    format_clock(row.timestamp),
                    yes_no(row.daemon_running),
                    format!("{}/{}", row.containers_running, row.containers_total),
                    row.images_count
                );
            }
        }
        HistorySeries::Network(rows) => {
            println!(
                "{:<10} {:>7} {:>10} {:>5}",
                "TIME".bold(),
                "ONLINE".bold(),
                "LATENCY".bold(),
                "DNS".bold()
            );
            for row in rows {
                println!(
                    "{:<10} {:>7} {:>10} {:>5}",
                    format_clock(row.timestamp),
                    yes_no(row.internet_connected),
                    format!("{:.1} ms", row.ping_latency_ms),
                    yes_no(row.dns_working)
                );
            }
        }
    }
}

/// Comma-separated `PORT/PROTO` list
fn port_list(entry: &ProcessWithPorts) -> String {
    entry
        .ports
        .iter()
        .map(|p| format!("{}/{}", p.port, p.protocol))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn print_processes(processes: &[ProcessWithPorts]) {
    if processes.is_empty() {
        println!("{}", "No processes".dimmed());
        return;
    }

    println!(
        "{:>7}  {:<width$}  {:>7}  {:>10}  {:<12}  {}",
        "PID".bold(),
        "NAME".bold(),
        "CPU".bold(),
        "MEMORY".bold(),
        "USER".bold(),
        "PORTS".bold(),
        width = NAME_WIDTH
    );

    for entry in processes {
        let p = &entry.process;
        println!(
            "{:>7}  {:<width$}  {:>7}  {:>10}  {:<12}  {}",
            p.pid,
            truncate(&p.name, NAME_WIDTH),
            format_percent(p.cpu_percent as f64),
            format_size(p.memory_bytes),
            truncate(&p.username, 12),
            port_list(entry).cyan(),
            width = NAME_WIDTH
        );
    }
}

/// Processes found on one port, with the matching sockets spelled out
pub fn print_port_owners(port: u16, owners: &[ProcessWithPorts]) {
    if owners.is_empty() {
        println!("{}", format!("No process is using port {}", port).yellow());
        return;
    }

    for entry in owners {
        let p = &entry.process;
        println!(
            "{} {} {}",
            p.pid.to_string().bold(),
            p.name.bright_white(),
            format!("({})", p.username).dimmed()
        );
        for socket in entry.ports.iter().filter(|s| s.port == port) {
            println!(
                "    {} {}:{} {}",
                socket.protocol.to_string().cyan(),
                socket.local_address,
                socket.port,
                socket.state.dimmed()
            );
        }
        if !p.command_line.is_empty() {
            println!("    {}", truncate(&p.command_line, 100).dimmed());
        }
    }
}
