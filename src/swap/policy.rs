//! Confirmation policy and the approval seam.
//!
//! Preflight turns every missing directory and every file in the way into a
//! [`PendingAction`]. The policy can grant it up front; otherwise the caller's
//! [`Approver`] decides (the binary asks on a terminal).

use std::fmt;
use std::path::PathBuf;

/// Pre-approved capabilities. Grants from several sources combine with OR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub create_dirs: bool,
    pub overwrite: bool,
    pub assume_yes: bool,
}

impl ConfirmationPolicy {
    pub fn merge(self, other: ConfirmationPolicy) -> ConfirmationPolicy {
        ConfirmationPolicy {
            create_dirs: self.create_dirs || other.create_dirs,
            overwrite: self.overwrite || other.overwrite,
            assume_yes: self.assume_yes || other.assume_yes,
        }
    }

    pub fn allows(&self, action: &PendingAction) -> bool {
        if self.assume_yes {
            return true;
        }
        match action {
            PendingAction::CreateDirectory(_) => self.create_dirs,
            PendingAction::Overwrite(_) => self.overwrite,
        }
    }
}

/// Something preflight needs permission for before Execute may start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// A landing directory does not exist.
    CreateDirectory(PathBuf),
    /// A file that is not one of the inputs sits where output must go.
    Overwrite(PathBuf),
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingAction::CreateDirectory(p) => write!(f, "create directory '{}'", p.display()),
            PendingAction::Overwrite(p) => write!(f, "overwrite existing file '{}'", p.display()),
        }
    }
}

/// Asked about anything the policy does not already grant.
pub trait Approver {
    fn approve(&mut self, action: &PendingAction) -> bool;
}

/// Non-interactive approver: whatever the policy does not grant is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Approver for NoPrompt {
    fn approve(&mut self, _action: &PendingAction) -> bool {
        false
    }
}

impl<F> Approver for F
where
    F: FnMut(&PendingAction) -> bool,
{
    fn approve(&mut self, action: &PendingAction) -> bool {
        self(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_or_per_capability() {
        let file = ConfirmationPolicy { create_dirs: true, ..Default::default() };
        let cli = ConfirmationPolicy { overwrite: true, ..Default::default() };
        let merged = file.merge(cli);
        assert!(merged.create_dirs && merged.overwrite && !merged.assume_yes);
        assert_eq!(merged, cli.merge(file));
    }

    #[test]
    fn assume_yes_grants_everything() {
        let p = ConfirmationPolicy { assume_yes: true, ..Default::default() };
        assert!(p.allows(&PendingAction::CreateDirectory(PathBuf::from("/d"))));
        assert!(p.allows(&PendingAction::Overwrite(PathBuf::from("/f"))));
    }

    #[test]
    fn capabilities_are_independent() {
        let p = ConfirmationPolicy { create_dirs: true, ..Default::default() };
        assert!(p.allows(&PendingAction::CreateDirectory(PathBuf::from("/d"))));
        assert!(!p.allows(&PendingAction::Overwrite(PathBuf::from("/f"))));
    }
}
