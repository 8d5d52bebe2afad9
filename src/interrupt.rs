//! Ctrl+C handling.
//!
//! The pipeline is blocking, so the signal is awaited on a helper thread with
//! its own single-threaded runtime. On the first interrupt the process reports
//! it and exits with status 1; nothing is cleaned up or resumed.

use std::thread;

use tokio::signal;
use tracing::{info, warn};

use crate::error::SraError;

pub const INTERRUPT_EXIT_CODE: i32 = 1;

pub fn install_handler() -> Result<(), SraError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| SraError::Terminal(err.to_string()))?;

    thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Ctrl+C signal received");
                        eprintln!("\n{}", SraError::Interrupted);
                        std::process::exit(INTERRUPT_EXIT_CODE);
                    }
                    Err(err) => warn!(error = %err, "failed to listen for Ctrl+C"),
                }
            });
        })
        .map_err(|err| SraError::Terminal(err.to_string()))?;
    Ok(())
}
