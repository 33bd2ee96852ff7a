// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use crate::display::format_status_line;
use crate::error::Result;

/// Run the monitor, auto-sync and periodic refresh until Ctrl-C.
///
/// Prints a line whenever the published status changes.
pub async fn run() -> Result<()> {
    let engine = super::open_engine()?;
    let cancel = CancellationToken::new();
    let mut rx = engine.status.watch();
    let refresh = engine.start(cancel.clone());

    let initial = engine.status.refresh().await;
    println!("{}", format_status_line(&initial));
    rx.mark_unchanged();
    tracing::info!(data_dir = %engine.data_dir.display(), "watching");

    let mut last = initial;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = rx.borrow_and_update().clone();
                if status != last {
                    println!("{}", format_status_line(&status));
                    last = status;
                }
            }
        }
    }

    cancel.cancel();
    let _ = refresh.await;
    engine.stop().await;
    tracing::info!("stopped watching");
    Ok(())
}
