// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use fieldsync_core::protocol::{ClientMessage, ServerMessage};
use fieldsync_core::{Category, Payload};

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Probe host that never resolves, so the device reads as offline.
pub const OFFLINE_HOST: &str = "not a host";

pub fn fieldsync() -> Command {
    let mut cmd = cargo_bin_cmd!("fieldsync");
    cmd.env_remove("FIELDSYNC_DIR")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Helper to create an initialized temp directory
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    fieldsync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Point the client at `remote_url`, deciding connectivity by dialling `probe_host`.
pub fn configure(temp: &TempDir, remote_url: &str, probe_host: &str) {
    let config = format!(
        "[remote]\nurl = \"{remote_url}\"\nconnect_timeout_ms = 1000\nprobe_timeout_ms = 1000\nupsert_timeout_ms = 1000\nretry_base_ms = 50\n\n\
         [network]\nprobe_host = \"{probe_host}\"\nprobe_timeout_ms = 500\n"
    );
    std::fs::write(temp.path().join(".fieldsync/config.toml"), config).unwrap();
}

/// Run a command in `temp` and assert it succeeds.
pub fn run_ok(temp: &TempDir, args: &[&str]) -> String {
    let output = fieldsync()
        .args(args)
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Queue a record and return its local id.
pub fn enqueue(temp: &TempDir, category: &str, payload: &str) -> String {
    run_ok(temp, &["enqueue", category, payload]).trim().to_string()
}

pub fn pending_json(temp: &TempDir) -> Vec<serde_json::Value> {
    serde_json::from_str(&run_ok(temp, &["pending", "-o", "json"])).unwrap()
}

/// In-process remote store speaking the client protocol.
pub struct Store {
    pub url: String,
    /// Address of the listener, usable as a reachable probe host.
    pub addr: String,
    records: Arc<Mutex<Vec<(Category, Payload)>>>,
}

impl Store {
    pub fn records(&self) -> Vec<(Category, Payload)> {
        self.records.lock().unwrap().clone()
    }
}

/// Start a store on a background thread where each `(token, org)` is a session.
pub fn spawn_store(sessions: &[(&str, &str)]) -> Store {
    let sessions: HashMap<String, String> = sessions
        .iter()
        .map(|(t, o)| (t.to_string(), o.to_string()))
        .collect();
    let sessions = Arc::new(sessions);
    let records = Arc::new(Mutex::new(Vec::new()));

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let stored = records.clone();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            while let Ok((stream, _)) = listener.accept().await {
                let sessions = sessions.clone();
                let stored = stored.clone();
                tokio::spawn(async move {
                    // Network probes connect without a handshake
                    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let (mut sink, mut stream) = ws.split();
                    while let Some(Ok(msg)) = stream.next().await {
                        let Message::Text(text) = msg else { continue };
                        let Ok(request) = ClientMessage::from_json(&text) else {
                            continue;
                        };
                        let reply = answer(request, &sessions, &stored);
                        let json = reply.to_json().unwrap();
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
    });

    Store {
        url: format!("ws://{}", addr),
        addr,
        records,
    }
}

fn answer(
    request: ClientMessage,
    sessions: &HashMap<String, String>,
    stored: &Mutex<Vec<(Category, Payload)>>,
) -> ServerMessage {
    match request {
        ClientMessage::Probe { id } => ServerMessage::probe_ok(id),
        ClientMessage::Whoami { id, token } => ServerMessage::tenant(id, sessions.get(&token).cloned()),
        ClientMessage::Upsert {
            id,
            category,
            record,
        } => {
            if !record.contains_key("organization_id") {
                return ServerMessage::rejected(id, "missing organization_id");
            }
            stored.lock().unwrap().push((category, record));
            ServerMessage::upserted(id, chrono::Utc::now())
        }
    }
}

/// Address of a port with nothing listening.
pub fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}
