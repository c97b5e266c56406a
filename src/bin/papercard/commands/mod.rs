//! CLI subcommands

mod generate;

pub use generate::GenerateCommand;
