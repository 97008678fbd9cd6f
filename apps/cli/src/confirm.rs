//! Terminal confirmation for dangerous operations: a countdown must elapse
//! AND the operator must retype the target's exact display name.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use bookport_guard::{ConfirmationPrompt, ConfirmationRequest};

pub struct TerminalPrompt;

impl ConfirmationPrompt for TerminalPrompt {
    fn confirm(&self, request: &ConfirmationRequest) -> bool {
        println!();
        println!("⚠  dangerous operation: {}", request.operation);
        println!("   target: {}", request.target_name);
        if !request.reversible {
            println!("   this operation CANNOT be undone");
        }

        let seconds = request.countdown.as_secs();
        for remaining in (1..=seconds).rev() {
            print!("\r   confirmation unlocks in {remaining}s ");
            let _ = io::stdout().flush();
            std::thread::sleep(Duration::from_secs(1));
        }
        println!();

        print!(
            "   type \"{}\" to confirm (anything else aborts): ",
            request.target_name
        );
        let _ = io::stdout().flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        line.trim() == request.target_name
    }
}

/// Wait up to `window` for the operator to press Enter.
///
/// Used for the post-archive undo offer. Returns true if Enter arrived in
/// time.
pub async fn enter_within(window: Duration) -> bool {
    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).is_ok()
    });

    matches!(tokio::time::timeout(window, read).await, Ok(Ok(true)))
}
