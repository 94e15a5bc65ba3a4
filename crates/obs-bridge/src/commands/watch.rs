//! Watch command implementation

use anyhow::Result;

use obs_core::SessionState;

use crate::bridge::ObsBridge;
use crate::output::{print_info, print_warning};

/// Print program-scene changes until Ctrl+C or the session closes
pub async fn watch_command(bridge: &ObsBridge) -> Result<()> {
    let mut scenes = bridge.cache().subscribe();
    let mut state = bridge.supervisor().watch_state();
    let mut last: Option<String> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    print_info("Watching for scene changes (Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = scenes.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = scenes.borrow_and_update().current_scene.clone();
                if current != last {
                    if let Some(name) = &current {
                        println!("{}", name);
                    }
                    last = current;
                }
            }
            changed = state.changed() => {
                let closed = changed.is_err() || *state.borrow_and_update() == SessionState::Closed;
                if closed {
                    print_warning("Connection to OBS closed");
                    anyhow::bail!("connection closed");
                }
            }
        }
    }

    Ok(())
}
