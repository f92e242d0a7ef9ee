//! NWScript Bridge - CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nwscript_bridge::bridge::ObjectId;
use nwscript_bridge::demo::{demo_action_table, run_demo, DemoOptions};
use nwscript_bridge::util::config::{load_config, render_config, resolve_config_path};
use nwscript_bridge::util::logger::{self, LogLevel};
use nwscript_bridge::{NAME, VERSION};

/// Runtime bridge for ahead-of-time translated NWScript programs
#[derive(Parser, Debug)]
#[command(name = "nwscript-bridge")]
#[command(author = "NWScript Bridge Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging and per-operand tracing
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the demo script and its delayed situations
    Demo {
        /// Object id the script runs on behalf of
        #[arg(long, default_value_t = 1)]
        actor: u32,

        /// Entry point parameter (nBonus)
        #[arg(long, default_value = "0")]
        bonus: String,

        /// Cancel the script after this many actions
        #[arg(long, value_name = "ACTIONS")]
        cancel_after: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the demo action table
    Actions {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if args.verbose {
        config.log.level = LogLevel::Trace;
        config.runtime.verbose = true;
    }
    logger::init_with_level(config.log.level);

    match args.command {
        Commands::Demo {
            actor,
            bonus,
            cancel_after,
            json,
        } => {
            let options = DemoOptions {
                actor: ObjectId(actor),
                params: vec![bonus],
                cancel_after,
            };
            let report = run_demo(&config, &options).context("Demo failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in &report.output {
                    println!("{}", line);
                }
                match (&report.aborted, report.return_code) {
                    (Some(reason), _) => eprintln!("aborted: {}", reason),
                    (None, Some(code)) => eprintln!("return code: {}", code),
                    (None, None) => {}
                }
            }
        }
        Commands::Actions { json } => {
            let table = demo_action_table();
            if json {
                println!("{}", serde_json::to_string_pretty(&table.sorted())?);
            } else {
                for definition in table.sorted() {
                    println!("{:>4}  {}", definition.id.0, definition);
                }
            }
        }
        Commands::Config => {
            if let Some(path) = resolve_config_path(args.config.as_deref()) {
                eprintln!("# {}", path.display());
            }
            print!("{}", render_config(&config).context("Failed to render configuration")?);
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
