// UI and formatting module

pub mod formatters;
pub mod prompts;
pub mod tables;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_clock, format_percent, format_size, truncate};
pub use prompts::{confirm, dimmed, error, success};
pub use tables::{print_history, print_port_owners, print_processes};
