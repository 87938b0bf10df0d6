//! Gamepad teleoperation, teach, and replay for a UFACTORY xArm.
//!
//! ```sh
//! xarm-teleop
//! xarm-teleop --address 192.168.1.210 --waypoints bench_positions.csv
//! xarm-teleop -v              # debug logging (per-tick moves)
//! xarm-teleop --write-config  # emit a starter teleop.json and exit
//! ```
//!
//! Connects to the arm, opens the first gamepad, then drives the
//! mode-selection prompt until the operator quits.

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use xarm_teleop::arm::protocol::XArmClient;
use xarm_teleop::console::ConsolePrompt;
use xarm_teleop::gamepad::GamepadSession;
use xarm_teleop::workflow::Workflow;
use xarm_teleop::{ArmSession, Config, TeleopError};

#[derive(Parser)]
#[command(name = "xarm-teleop", version, about = "Gamepad teleop, teach and replay for an xArm")]
struct Cli {
    /// Config file (JSON); defaults are used when absent.
    #[arg(long, default_value = "teleop.json")]
    config: PathBuf,

    /// Override the controller address from the config.
    #[arg(long)]
    address: Option<String>,

    /// Override the waypoint file from the config.
    #[arg(long)]
    waypoints: Option<PathBuf>,

    /// Write the effective config to the config file and exit. Handy
    /// for producing a starter file to edit.
    #[arg(long)]
    write_config: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("logger init");

    if let Err(e) = run(cli) {
        if let Some(TeleopError::NoGamepad) = e.downcast_ref::<TeleopError>() {
            error!("{e}");
        } else {
            error!("{e:#}");
            eprintln!("Check: controller reachable? gamepad plugged in? waypoint file readable?");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&cli.config)?;
    if let Some(address) = cli.address {
        config.arm_address = address;
    }
    if let Some(waypoints) = cli.waypoints {
        config.waypoint_file = waypoints;
    }

    if cli.write_config {
        config.save(&cli.config)?;
        info!("wrote config to {}", cli.config.display());
        return Ok(());
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, finishing the current operation");
        flag.store(true, Ordering::Relaxed);
    })
    .context("installing interrupt handler")?;

    let client = XArmClient::connect(&config.arm_address)
        .with_context(|| format!("connecting to arm at {}", config.arm_address))?;
    let arm = ArmSession::connect(Box::new(client), &config).context("bringing up the arm")?;
    let pad = GamepadSession::connect()?;
    let prompt = ConsolePrompt::new(&config);

    Workflow::new(arm, pad, prompt, config, interrupt).run()?;
    Ok(())
}
