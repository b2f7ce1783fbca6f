//! Synchronization hub. One actor owns the authoritative control
//! configuration and the registry of connected peers, and processes
//! connect/message/disconnect events strictly in arrival order, so no
//! two configuration mutations ever race.

use std::collections::HashMap;

use control::circular::normalize;
use shared::{
    domain::{ControlConfig, Orientation, PeerId},
    protocol::{ClientEvent, ConfigPatch, ServerEvent},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Outbound lane for one peer. Unbounded so a slow consumer never
/// blocks the hub; the per-connection writer task drains it and a
/// dropped receiver just makes sends fail for that peer.
pub type PeerSender = UnboundedSender<String>;

#[derive(Debug)]
pub enum HubCommand {
    Connect { peer: PeerId, sender: PeerSender },
    Message { peer: PeerId, text: String },
    Disconnect { peer: PeerId },
}

#[derive(Clone)]
pub struct HubHandle {
    commands: UnboundedSender<HubCommand>,
}

impl HubHandle {
    pub fn connect(&self, peer: PeerId, sender: PeerSender) {
        let _ = self.commands.send(HubCommand::Connect { peer, sender });
    }

    pub fn message(&self, peer: PeerId, text: String) {
        let _ = self.commands.send(HubCommand::Message { peer, text });
    }

    pub fn disconnect(&self, peer: PeerId) {
        let _ = self.commands.send(HubCommand::Disconnect { peer });
    }
}

/// Spawn the hub actor with the given initial configuration.
pub fn spawn(initial: ControlConfig) -> HubHandle {
    let (commands, inbox) = mpsc::unbounded_channel();
    tokio::spawn(Hub::new(initial).run(inbox));
    HubHandle { commands }
}

struct Hub {
    config: ControlConfig,
    peers: HashMap<PeerId, PeerSender>,
}

impl Hub {
    fn new(config: ControlConfig) -> Self {
        Self {
            config,
            peers: HashMap::new(),
        }
    }

    async fn run(mut self, mut inbox: UnboundedReceiver<HubCommand>) {
        while let Some(command) = inbox.recv().await {
            self.handle(command);
        }
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { peer, sender } => self.on_connect(peer, sender),
            HubCommand::Message { peer, text } => self.on_message(peer, &text),
            HubCommand::Disconnect { peer } => self.on_disconnect(peer),
        }
    }

    /// Register the peer and unicast the current configuration to it.
    /// Nobody else hears about the join.
    fn on_connect(&mut self, peer: PeerId, sender: PeerSender) {
        info!(%peer, "peer connected");
        self.unicast(&sender, &ServerEvent::UpdateConfig(self.config));
        self.peers.insert(peer, sender);
    }

    fn on_message(&mut self, peer: PeerId, text: &str) {
        let event = match ClientEvent::parse(text) {
            Ok(event) => event,
            Err(error) => {
                // Non-fatal and peer-local: the connection stays open.
                warn!(%peer, %error, "dropping malformed message");
                return;
            }
        };

        match event {
            ClientEvent::UpdateConfig(patch) => {
                self.merge(patch);
                self.broadcast_except(peer, &ServerEvent::UpdateConfig(self.config));
            }
            ClientEvent::UpdateState(state) => {
                self.broadcast_except(peer, &ServerEvent::UpdateState(state));
            }
        }
    }

    fn on_disconnect(&mut self, peer: PeerId) {
        info!(%peer, "peer disconnected");
        self.peers.remove(&peer);
    }

    /// Per-field merge: a field absent from the patch is left
    /// unchanged. The stored manual orientation is wrapped back into
    /// `[0, 360)` regardless of what the sender put on the wire.
    fn merge(&mut self, mut patch: ConfigPatch) {
        if let Some(orientation) = patch.manual_orientation {
            patch.manual_orientation = Some(Orientation::new(
                normalize(orientation.azimuth),
                normalize(orientation.inclination),
            ));
        }
        patch.apply_to(&mut self.config);
    }

    fn unicast(&self, sender: &PeerSender, event: &ServerEvent) {
        let Ok(text) = serde_json::to_string(event) else {
            return;
        };
        let _ = sender.send(text);
    }

    fn broadcast_except(&self, excluded: PeerId, event: &ServerEvent) {
        let Ok(text) = serde_json::to_string(event) else {
            return;
        };
        for (peer, sender) in &self.peers {
            if *peer == excluded {
                continue;
            }
            // A closed peer is skipped; delivery to the rest goes on.
            let _ = sender.send(text.clone());
        }
    }
}
