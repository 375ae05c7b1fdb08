//! Round-trip tests against a local WebSocket relay stand-in.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use relay_client::{ClientEvent, Identity, RelayClient, RelayConfig, RelayHandle, ServerEvent};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

/// Accept one connection and bridge frames to/from the test body.
async fn spawn_relay_stub() -> (
    String,
    mpsc::Receiver<serde_json::Value>,
    mpsc::Sender<String>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (received_tx, received_rx) = mpsc::channel::<serde_json::Value>(16);
    let (inject_tx, mut inject_rx) = mpsc::channel::<String>(16);

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = accept_async(socket).await.unwrap();
        let (mut tx, mut rx) = ws.split();

        loop {
            tokio::select! {
                message = rx.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            let value: serde_json::Value =
                                serde_json::from_str(&text).unwrap();
                            if received_tx.send(value).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    }
                }
                frame = inject_rx.recv() => {
                    match frame {
                        Some(frame) => {
                            if tx.send(Message::Text(frame)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    });

    (format!("ws://{addr}"), received_rx, inject_tx)
}

#[tokio::test]
async fn test_register_reaches_relay() {
    let (url, mut received, _inject) = spawn_relay_stub().await;

    let client = RelayClient::connect(RelayConfig::new(url));
    client
        .register(Identity::patient("patient-1"))
        .await
        .unwrap();

    let frame = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(frame["event"], "register");
    assert_eq!(frame["data"]["userId"], "patient-1");
    assert_eq!(frame["data"]["role"], "patient");

    client.close().await;
}

#[tokio::test]
async fn test_incoming_events_fan_out_to_subscribers() {
    let (url, mut received, inject) = spawn_relay_stub().await;

    let client = RelayClient::connect(RelayConfig::new(url));
    let mut events = client.subscribe();

    client.register(Identity::doctor("doc-1")).await.unwrap();
    // Wait until the stub saw the registration: the connection is up.
    timeout(WAIT, received.recv()).await.unwrap().unwrap();

    inject
        .send(
            serde_json::json!({
                "event": "incoming-call",
                "data": {
                    "offer": {"sdpType": "offer", "sdp": "v=0"},
                    "from": "sock-7",
                    "targetPatientId": "patient-1"
                }
            })
            .to_string(),
        )
        .await
        .unwrap();

    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    match event {
        ServerEvent::IncomingCall { from, .. } => assert_eq!(from, "sock-7"),
        other => panic!("unexpected event: {other:?}"),
    }

    client.close().await;
}

#[tokio::test]
async fn test_outbound_events_are_delivered_in_order() {
    let (url, mut received, _inject) = spawn_relay_stub().await;

    let client = RelayClient::connect(RelayConfig::new(url));
    client
        .register(Identity::patient("patient-1"))
        .await
        .unwrap();

    client
        .send(ClientEvent::IceCandidate {
            target_socket_id: "sock-7".to_string(),
            candidate: relay_client::IceCandidate::new("candidate:1"),
        })
        .await
        .unwrap();
    client
        .send(ClientEvent::EndCall {
            target_socket_id: "sock-7".to_string(),
        })
        .await
        .unwrap();

    // Registration may appear twice when the queued register races the
    // on-connect re-registration; both are idempotent. Skip past them.
    let mut ice = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    while ice["event"] == "register" {
        ice = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    }
    assert_eq!(ice["event"], "ice-candidate");
    assert_eq!(ice["data"]["targetSocketId"], "sock-7");
    assert_eq!(ice["data"]["candidate"]["candidate"], "candidate:1");

    let end = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(end["event"], "end-call");

    client.close().await;
}

#[tokio::test]
async fn test_unknown_events_do_not_kill_the_stream() {
    let (url, mut received, inject) = spawn_relay_stub().await;

    let client = RelayClient::connect(RelayConfig::new(url));
    let mut events = client.subscribe();

    client.register(Identity::patient("patient-1")).await.unwrap();
    timeout(WAIT, received.recv()).await.unwrap().unwrap();

    inject
        .send(serde_json::json!({"event": "stats", "data": {}}).to_string())
        .await
        .unwrap();
    inject
        .send(serde_json::json!({"event": "end-call"}).to_string())
        .await
        .unwrap();

    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event, ServerEvent::EndCall);

    client.close().await;
}
