//! Terminal confirmation for actions the policy does not already grant.

use dialoguer::Confirm;
use tracing::warn;
use xmv::{Approver, PendingAction};

/// Asks on the terminal; answers "no" when stdin is not interactive.
pub struct TerminalApprover {
    interactive: bool,
}

impl TerminalApprover {
    pub fn new() -> Self {
        Self {
            interactive: atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stderr),
        }
    }
}

impl Default for TerminalApprover {
    fn default() -> Self {
        Self::new()
    }
}

impl Approver for TerminalApprover {
    fn approve(&mut self, action: &PendingAction) -> bool {
        if !self.interactive {
            return false;
        }
        match Confirm::new()
            .with_prompt(format!("xmv needs to {action}. Proceed?"))
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "confirmation prompt failed; treating as no");
                false
            }
        }
    }
}
