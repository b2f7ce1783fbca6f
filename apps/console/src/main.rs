use anyhow::Result;
use clap::Parser;
use client_core::ConsoleCommand;
use control::controller::{MotorAxes, OrientationController, DEFAULT_SMOOTH_TIME};
use shared::domain::{ControlMode, Orientation};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::debug;

#[derive(Parser, Debug)]
struct Args {
    /// Hub websocket endpoint.
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    server_url: String,
    /// Smoothing time constant in seconds.
    #[arg(long, default_value_t = DEFAULT_SMOOTH_TIME)]
    smooth_time: f64,
}

/// Stand-in motor driver: logs the per-axis deltas the controller
/// would hand to the physical axes.
struct LoggingMotors;

impl MotorAxes for LoggingMotors {
    fn rotate(&mut self, delta: Orientation) {
        if delta.azimuth != 0.0 || delta.inclination != 0.0 {
            debug!(
                azimuth = delta.azimuth,
                inclination = delta.inclination,
                "motor delta"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let (commands, command_rx) = mpsc::unbounded_channel();
    tokio::spawn(read_operator_commands(commands));

    let controller = OrientationController::new(args.smooth_time);
    let mut motors = LoggingMotors;
    client_core::run(&args.server_url, controller, &mut motors, command_rx).await
}

async fn read_operator_commands(commands: mpsc::UnboundedSender<ConsoleCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(command) = parse_command(&line) else {
            eprintln!("commands: mode <automatic|manual> | azimuth <deg> | inclination <deg>");
            continue;
        };
        if commands.send(command).is_err() {
            return;
        }
    }
}

fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "mode" => match parts.next()? {
            "automatic" => Some(ConsoleCommand::SetMode(ControlMode::Automatic)),
            "manual" => Some(ConsoleCommand::SetMode(ControlMode::Manual)),
            _ => None,
        },
        "azimuth" => Some(ConsoleCommand::EditAzimuth(parts.next()?.to_string())),
        "inclination" => Some(ConsoleCommand::EditInclination(parts.next()?.to_string())),
        _ => None,
    }
}
