//! Console-side runtime: keeps one orientation controller in sync
//! with the hub, runs the fixed-cadence control tick, and forwards
//! operator edits upstream as partial configuration updates.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use control::controller::{MotorAxes, OrientationController};
use futures::{SinkExt, StreamExt};
use shared::{
    domain::{ControlMode, SystemState},
    protocol::{ClientEvent, ConfigPatch, ServerEvent},
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use url::Url;

/// Control tick cadence, matching the device's motor timer.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Operator actions accepted while the console runs.
#[derive(Debug)]
pub enum ConsoleCommand {
    SetMode(ControlMode),
    EditAzimuth(String),
    EditInclination(String),
}

/// Connect to the hub and run the event loop until the hub closes the
/// connection or the command source is exhausted.
pub async fn run(
    server_url: &str,
    mut controller: OrientationController,
    motors: &mut dyn MotorAxes,
    mut commands: UnboundedReceiver<ConsoleCommand>,
) -> Result<()> {
    let url = Url::parse(server_url).context("invalid server url")?;
    let (socket, _) = connect_async(url.as_str())
        .await
        .context("websocket connect failed")?;
    info!(%url, "connected to hub");
    let (mut sink, mut stream) = socket.split();

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    let dt = TICK_INTERVAL.as_secs_f64();

    loop {
        tokio::select! {
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => handle_event(&mut controller, &text),
                    Some(Ok(Message::Close(_))) | None => {
                        info!("hub closed the connection");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!(%error, "transport error, shutting down");
                        return Ok(());
                    }
                }
            }
            _ = ticker.tick() => {
                controller.tick(dt, motors);
            }
            command = commands.recv() => {
                let Some(command) = command else { return Ok(()) };
                if let Some(patch) = apply_command(&mut controller, command) {
                    let text = serde_json::to_string(&ClientEvent::UpdateConfig(patch))?;
                    if let Err(error) = sink.send(Message::Text(text)).await {
                        warn!(%error, "failed to send config update");
                    }
                }
            }
        }
    }
}

fn handle_event(controller: &mut OrientationController, text: &str) {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(ServerEvent::UpdateConfig(config)) => {
            controller.apply_config(config);
            info!(mode = ?config.control_mode, "configuration updated");
        }
        Ok(ServerEvent::UpdateState(state)) => {
            log_statistics(&state);
            controller.apply_state(state);
        }
        Err(error) => warn!(%error, "dropping malformed hub message"),
    }
}

/// Translate an operator command into the partial update to send
/// upstream, or `None` when the command is rejected. Manual edits are
/// only accepted while the stored mode is Manual.
fn apply_command(
    controller: &mut OrientationController,
    command: ConsoleCommand,
) -> Option<ConfigPatch> {
    match command {
        ConsoleCommand::SetMode(mode) => Some(controller.set_mode(mode)),
        ConsoleCommand::EditAzimuth(input) => {
            if !controller.manual_inputs_enabled() {
                warn!("azimuth input is disabled outside manual mode");
                return None;
            }
            match controller.edit_manual_azimuth(&input) {
                Ok(patch) => Some(patch),
                Err(error) => {
                    warn!(%error, "rejected azimuth edit");
                    None
                }
            }
        }
        ConsoleCommand::EditInclination(input) => {
            if !controller.manual_inputs_enabled() {
                warn!("inclination input is disabled outside manual mode");
                return None;
            }
            match controller.edit_manual_inclination(&input) {
                Ok(patch) => Some(patch),
                Err(error) => {
                    warn!(%error, "rejected inclination edit");
                    None
                }
            }
        }
    }
}

fn log_statistics(state: &SystemState) {
    let at = DateTime::from_timestamp_millis(state.timestamp)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| state.timestamp.to_string());
    info!(
        %at,
        voltage = state.solar_panel_voltage,
        azimuth = state.panel_orientation.azimuth,
        inclination = state.panel_orientation.inclination,
        "panel telemetry"
    );
}
