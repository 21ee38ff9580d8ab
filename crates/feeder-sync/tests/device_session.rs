//! End-to-end sessions against a simulated feeder.
//!
//! The simulator is a small axum WebSocket server that answers the client's
//! commands the way the firmware does.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use feeder_core::{DeviceState, HistoryRecord, Readouts, ScheduleEntry};
use feeder_sync::{Command, FeederAgent, FeederConfig, FeederEventEmitter, FeederHandle};
use serde_json::json;

// =============================================================================
// Simulated Device
// =============================================================================

#[derive(Default)]
struct Device {
    /// Every command received, across connections.
    received: Mutex<Vec<Command>>,
    /// Connections accepted so far.
    connections: AtomicUsize,
    /// Drop the first connection right after answering get_status.
    drop_first: bool,
}

impl Device {
    fn received(&self) -> Vec<Command> {
        self.received.lock().unwrap().clone()
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(device): State<Arc<Device>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, device))
}

async fn send(socket: &mut WebSocket, value: serde_json::Value) -> bool {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .is_ok()
}

async fn handle_socket(mut socket: WebSocket, device: Arc<Device>) {
    let connection = device.connections.fetch_add(1, Ordering::SeqCst) + 1;

    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else { continue };
        let Ok(command) = Command::from_json(text.as_str()) else { continue };
        device.received.lock().unwrap().push(command.clone());

        let ok = match command {
            Command::GetStatus => {
                send(
                    &mut socket,
                    json!({"type": "status_update", "currentWeight": 3, "todayFed": 100,
                           "feeding": false, "targetWeight": 0}),
                )
                .await
                    && send(
                        &mut socket,
                        json!({"type": "schedule_config", "schedules": [
                            {"id": "a", "time": "08:00", "amount": 50, "enabled": true},
                            {"time": "18:00", "amount": 40, "enabled": false}
                        ]}),
                    )
                    .await
            }
            Command::FeedNow { amount } => {
                let amount = f64::from(amount);
                send(&mut socket, json!({"type": "feeding_started", "targetWeight": amount})).await
                    && send(&mut socket, json!({"type": "battery_low", "level": 20})).await
                    && send(
                        &mut socket,
                        json!({"type": "feeding_progress", "currentWeight": amount / 2.0}),
                    )
                    .await
                    && send(
                        &mut socket,
                        json!({"type": "feeding_completed", "currentWeight": amount,
                               "amountFed": amount - 2.0}),
                    )
                    .await
            }
            Command::SetSchedule { schedules } => {
                send(
                    &mut socket,
                    json!({"type": "schedule_config", "schedules": schedules}),
                )
                .await
            }
        };

        if !ok || (device.drop_first && connection == 1) {
            // Dropping the socket without a close frame.
            return;
        }
    }
}

async fn spawn_device(device: Arc<Device>) -> SocketAddr {
    let app = Router::new().route("/", get(ws_handler)).with_state(device);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Client Helpers
// =============================================================================

#[derive(Default)]
struct ConnectionLog {
    transitions: Mutex<Vec<bool>>,
}

impl FeederEventEmitter for ConnectionLog {
    fn emit_connection(&self, connected: bool) {
        self.transitions.lock().unwrap().push(connected);
    }
    fn emit_readouts(&self, _readouts: &Readouts) {}
    fn emit_history(&self, _history: &[HistoryRecord]) {}
    fn emit_schedules(&self, _schedules: &[ScheduleEntry]) {}
}

fn config_for(addr: SocketAddr) -> FeederConfig {
    let mut config = FeederConfig::default();
    config.device.url = Some(format!("ws://{}/", addr));
    config.connection.connect_timeout_secs = 2;
    config.connection.reconnect_delay_secs = 1;
    config
}

async fn wait_for<F>(handle: &FeederHandle, pred: F) -> DeviceState
where
    F: Fn(&DeviceState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let state = handle.state().await;
            if pred(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("device state never reached the expected condition")
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_feed_and_save_schedule() {
    let device = Arc::new(Device::default());
    let addr = spawn_device(device.clone()).await;

    let handle = FeederAgent::start(&config_for(addr), Arc::new(ConnectionLog::default())).unwrap();

    // Opening the socket triggers get_status; the answers land in state.
    let state = wait_for(&handle, |s| s.connected && s.today_fed == 100.0 && s.schedules.len() == 2).await;
    assert_eq!(state.current_weight, 3.0);
    assert_eq!(state.schedules[0].id, "a");
    assert_eq!(state.schedules[1].id, "");
    assert_eq!(device.received(), vec![Command::GetStatus]);

    // Manual feeding: started → progress → completed, one finalized record.
    handle.feed_now(50).await.unwrap();
    let state = wait_for(&handle, |s| !s.feeding && s.today_fed == 148.0).await;
    assert_eq!(state.history.len(), 1);
    assert!(state.history[0].completed);
    assert_eq!(state.history[0].amount, 48.0);
    assert_eq!(state.history[0].target_amount, Some(50.0));
    assert_eq!(state.current_weight, 50.0);

    // Out-of-range feed never reaches the device.
    assert!(handle.feed_now(500).await.is_err());

    let schedules = vec![ScheduleEntry {
        id: "1790000000000".into(),
        time: "07:00".into(),
        amount: 60,
        enabled: true,
    }];
    handle.save_schedule(schedules.clone()).await.unwrap();
    let state = wait_for(&handle, |s| s.schedules == schedules).await;
    assert_eq!(state.schedules, schedules);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        device.received(),
        vec![
            Command::GetStatus,
            Command::FeedNow { amount: 50 },
            Command::SetSchedule { schedules },
        ]
    );

    handle.shutdown().await.unwrap();
    assert!(!handle.state().await.connected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconnects_after_device_drops_connection() {
    let device = Arc::new(Device {
        drop_first: true,
        ..Default::default()
    });
    let addr = spawn_device(device.clone()).await;
    let log = Arc::new(ConnectionLog::default());

    let handle = FeederAgent::start(&config_for(addr), log.clone()).unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        while device.connections.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("client never reconnected");

    wait_for(&handle, |s| s.connected).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while device.received().len() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("second get_status never arrived");

    tokio::time::timeout(Duration::from_secs(5), async {
        while log.transitions.lock().unwrap().len() < 3 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("indicator never went back online");

    assert_eq!(device.received(), vec![Command::GetStatus, Command::GetStatus]);
    assert_eq!(*log.transitions.lock().unwrap(), vec![true, false, true]);

    handle.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_manual_reconnect_skips_delay() {
    let device = Arc::new(Device {
        drop_first: true,
        ..Default::default()
    });
    let addr = spawn_device(device.clone()).await;
    let log = Arc::new(ConnectionLog::default());

    let mut config = config_for(addr);
    config.connection.reconnect_delay_secs = 30;
    let handle = FeederAgent::start(&config, log.clone()).unwrap();

    // Online, then dropped by the device: the transport is now waiting 30 s.
    tokio::time::timeout(Duration::from_secs(5), async {
        while log.transitions.lock().unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("first connection never dropped");
    assert_eq!(device.connections.load(Ordering::SeqCst), 1);

    handle.reconnect().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while device.connections.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("manual reconnect waited out the delay");
    wait_for(&handle, |s| s.connected).await;

    // No leftover timer opens a third connection.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(device.connections.load(Ordering::SeqCst), 2);
    assert_eq!(*log.transitions.lock().unwrap(), vec![true, false, true]);

    // Already online: ignored.
    handle.reconnect().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(device.connections.load(Ordering::SeqCst), 2);
    assert!(handle.state().await.connected);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_device_stays_offline() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handle = FeederAgent::start(&config_for(addr), Arc::new(ConnectionLog::default())).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!handle.state().await.connected);
    assert!(matches!(
        handle.feed_now(50).await,
        Err(feeder_sync::SyncError::NotConnected)
    ));

    handle.shutdown().await.unwrap();
}
