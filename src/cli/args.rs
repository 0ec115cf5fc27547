//! CLI argument parsing.
//!
//! This module provides the argument parser for the photon-geodesic CLI.
//! Extracted to enable comprehensive testing of argument parsing logic.

use std::path::PathBuf;

/// Ticks simulated when `--ticks` is not given.
pub const DEFAULT_TICKS: u64 = 600;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a simulation from a YAML file
    Run {
        /// Path to the simulation YAML file.
        config_path: PathBuf,
        /// Number of ticks.
        ticks: u64,
        /// Print the final snapshot as JSON.
        json: bool,
    },
    /// Check the metamorphic relations for a YAML file
    Verify {
        /// Path to the simulation YAML file.
        config_path: PathBuf,
        /// Number of ticks per run.
        ticks: u64,
    },
    /// Run the built-in Sagittarius A* beam
    Demo {
        /// Number of ticks.
        ticks: u64,
        /// Print the final snapshot as JSON.
        json: bool,
    },
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// This method is testable as it accepts any iterator of strings,
    /// not just `std::env::args()`.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    /// Internal parsing from a vector of strings.
    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "run" => Self::parse_run_command(args),
            "verify" => Self::parse_verify_command(args),
            "demo" => Self::parse_demo_command(args),
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    /// Scan trailing options shared by every command.
    ///
    /// Unknown options are skipped; a malformed `--ticks` value keeps the default.
    fn parse_options(options: &[String]) -> (u64, bool) {
        let mut ticks = DEFAULT_TICKS;
        let mut json = false;

        let mut i = 0;
        while i < options.len() {
            match options[i].as_str() {
                "--ticks" | "-n" => {
                    if let Some(value) = options.get(i + 1) {
                        match value.parse() {
                            Ok(n) => ticks = n,
                            Err(_) => eprintln!("Ignoring invalid tick count: {value}"),
                        }
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--json" => {
                    json = true;
                    i += 1;
                }
                _ => i += 1,
            }
        }

        (ticks, json)
    }

    /// Parse the 'run' command arguments.
    fn parse_run_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'run' command requires a config path");
            return Command::Help;
        }

        let (ticks, json) = Self::parse_options(&args[3..]);
        Command::Run {
            config_path: PathBuf::from(&args[2]),
            ticks,
            json,
        }
    }

    /// Parse the 'verify' command arguments.
    fn parse_verify_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'verify' command requires a config path");
            return Command::Help;
        }

        let (ticks, _) = Self::parse_options(&args[3..]);
        Command::Verify {
            config_path: PathBuf::from(&args[2]),
            ticks,
        }
    }

    /// Parse the 'demo' command arguments.
    fn parse_demo_command(args: &[String]) -> Command {
        let (ticks, json) = Self::parse_options(&args[2..]);
        Command::Demo { ticks, json }
    }
}
