use std::net::SocketAddr;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use shared::domain::{ControlConfig, PeerId};
use tokio::sync::mpsc;
use tracing::info;

mod config;
mod hub;

use config::load_settings;
use hub::HubHandle;

#[derive(Clone)]
struct AppState {
    hub: HubHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let hub = hub::spawn(ControlConfig::default());
    let app = build_router(AppState { hub });

    let addr: SocketAddr = settings.bind_addr.parse()?;
    // Failing to bind is the one fatal error; everything past this
    // point is peer-local.
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "hub listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    // `/ws` is the only route; any other path is refused before an
    // upgrade can happen.
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state.hub, socket))
}

async fn ws_connection(hub: HubHandle, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;

    let peer = PeerId::new();
    let (mut sink, mut stream) = socket.split();
    let (sender, mut outbox) = mpsc::unbounded_channel::<String>();
    hub.connect(peer, sender);

    let writer = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        if let Message::Text(text) = message {
            hub.message(peer, text);
        }
    }

    hub.disconnect(peer);
    writer.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use shared::{
        domain::{ControlMode, Orientation},
        protocol::ServerEvent,
    };
    use tokio::net::TcpStream;
    use tokio_tungstenite::{
        connect_async, tungstenite, MaybeTlsStream, WebSocketStream,
    };

    type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn serve() -> SocketAddr {
        let hub = hub::spawn(ControlConfig::default());
        let app = build_router(AppState { hub });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        addr
    }

    async fn connect(addr: SocketAddr) -> Socket {
        let (socket, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("connect");
        socket
    }

    async fn next_event(socket: &mut Socket) -> ServerEvent {
        loop {
            match socket.next().await.expect("stream open").expect("frame") {
                tungstenite::Message::Text(text) => {
                    return serde_json::from_str(&text).expect("server event")
                }
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn connecting_peer_receives_the_config_snapshot() {
        let addr = serve().await;
        let mut socket = connect(addr).await;
        match next_event(&mut socket).await {
            ServerEvent::UpdateConfig(config) => assert_eq!(config, ControlConfig::default()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn config_update_reaches_the_other_peer_with_the_full_payload() {
        let addr = serve().await;
        let mut x = connect(addr).await;
        let mut y = connect(addr).await;
        next_event(&mut x).await;
        next_event(&mut y).await;

        x.send(tungstenite::Message::Text(
            r#"{"event":"UPDATE_CONFIG","payload":{"controlMode":"MANUAL"}}"#.into(),
        ))
        .await
        .expect("send");

        match next_event(&mut y).await {
            ServerEvent::UpdateConfig(config) => {
                assert_eq!(config.control_mode, ControlMode::Manual);
                assert_eq!(config.manual_orientation, Orientation::new(0.0, 0.0));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        // The sender hears nothing back for its own update.
        let echo = tokio::time::timeout(Duration::from_millis(200), x.next()).await;
        assert!(echo.is_err(), "sender received its own update: {echo:?}");
    }

    #[tokio::test]
    async fn telemetry_is_relayed_verbatim_to_everyone_else() {
        let addr = serve().await;
        let mut device = connect(addr).await;
        let mut console = connect(addr).await;
        next_event(&mut device).await;
        next_event(&mut console).await;

        device
            .send(tungstenite::Message::Text(
                r#"{"event":"UPDATE_STATE","payload":{"timestamp":1622518400000,"solarPanelVoltage":4.2,"panelOrientation":{"azimuth":100.0,"inclination":40.0},"motorsRotation":{"azimuth":99.0,"inclination":41.0},"platformRotation":{"w":1.0,"x":0.0,"y":0.0,"z":0.0}}}"#
                    .into(),
            ))
            .await
            .expect("send");

        match next_event(&mut console).await {
            ServerEvent::UpdateState(state) => {
                assert_eq!(state.timestamp, 1_622_518_400_000);
                assert_eq!(state.solar_panel_voltage, 4.2);
                assert_eq!(state.motors_rotation, Orientation::new(99.0, 41.0));
                assert!(state.platform_rotation.is_some());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_ws_paths_refuse_the_upgrade() {
        let addr = serve().await;
        let error = connect_async(format!("ws://{addr}/other"))
            .await
            .expect_err("upgrade should be refused");
        match error {
            tungstenite::Error::Http(response) => {
                assert_eq!(response.status(), tungstenite::http::StatusCode::NOT_FOUND)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
