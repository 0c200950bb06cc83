//! CLI definition and parsing.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug, --verbose for info.
//! - Quotes left around paths by Windows shells are trimmed.

use clap::{ArgAction, Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::destination::DestinationSpec;
use crate::exchange::ChunkMode;
use crate::swap::{ConfirmationPolicy, SwapRequest};

const DEST_HELP: &str = "SAME | REL | SAME-AS-1 | SAME-AS-2 | a directory or file path";

/// Swap the contents of two files, optionally relocating each.
/// CLI flags override config values (loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Swap the contents of two files, optionally relocating them")]
pub struct Args {
    /// First file.
    #[arg(
        value_name = "FILE1",
        value_hint = ValueHint::FilePath,
        required_unless_present_any = ["print_config", "init_config"]
    )]
    pub file1: Option<PathBuf>,

    /// Second file.
    #[arg(
        value_name = "FILE2",
        value_hint = ValueHint::FilePath,
        required_unless_present_any = ["print_config", "init_config"]
    )]
    pub file2: Option<PathBuf>,

    /// Destination for the first file's content.
    #[arg(long, value_name = "SPEC", help = DEST_HELP)]
    pub dest1: Option<String>,

    /// Destination for the second file's content.
    #[arg(long, value_name = "SPEC", help = DEST_HELP)]
    pub dest2: Option<String>,

    /// Exchange in 1 MiB chunks.
    #[arg(long, conflicts_with = "fast", help = "Use large (1 MiB) exchange chunks")]
    pub secure: bool,

    /// Exchange in 4 KiB chunks (default).
    #[arg(long, help = "Use small (4 KiB) exchange chunks (default)")]
    pub fast: bool,

    #[arg(long, help = "Check both outputs with SHA-256 before committing")]
    pub verify: bool,

    #[arg(long, help = "Show what would be done, but do not modify anything")]
    pub dry_run: bool,

    #[arg(long, help = "Create missing destination directories without asking")]
    pub create_dirs: bool,

    #[arg(long, help = "Replace existing files at destinations without asking")]
    pub overwrite: bool,

    #[arg(short = 'y', long = "yes", help = "Answer yes to every confirmation")]
    pub assume_yes: bool,

    #[arg(long, help = "Copy permissions and timestamps onto exchanged files")]
    pub preserve_metadata: bool,

    #[arg(long, help = "Show a progress bar during byte exchange")]
    pub progress: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    #[arg(short = 'v', long, action = ArgAction::SetTrue, help = "Verbose logging (shorthand for --log-level info)")]
    pub verbose: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    #[arg(long, value_hint = ValueHint::FilePath, help = "Also append logs to this file")]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,

    #[arg(long, help = "Print the config file location used by xmv and exit")]
    pub print_config: bool,

    #[arg(long, help = "Write a template config file and exit")]
    pub init_config: bool,
}

impl Args {
    fn sanitize_str(s: &str) -> PathBuf {
        // Surrounding quotes survive some PowerShell/CMD invocations. Only one
        // matching pair is stripped; quotes inside a name are part of it.
        let trimmed = s.trim();
        let inner = if trimmed.len() >= 2
            && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
                || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
        {
            &trimmed[1..trimmed.len() - 1]
        } else {
            trimmed
        };
        PathBuf::from(inner)
    }

    fn sanitize_path(p: &std::path::Path) -> PathBuf {
        match p.to_str() {
            Some(s) => Self::sanitize_str(s),
            None => p.to_path_buf(),
        }
    }

    /// Both input paths, sanitized, when given.
    pub fn files(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.file1, &self.file2) {
            (Some(a), Some(b)) => Some((Self::sanitize_path(a), Self::sanitize_path(b))),
            _ => None,
        }
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --verbose > --log-level > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        if self.verbose {
            return Some(LogLevel::Info);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            create_dirs: self.create_dirs,
            overwrite: self.overwrite,
            assume_yes: self.assume_yes,
        }
    }

    /// Apply CLI overrides to a loaded Config (in-place). Unset flags leave the
    /// config alone; confirmation grants are combined.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if self.secure {
            cfg.chunk_mode = ChunkMode::Secure;
        } else if self.fast {
            cfg.chunk_mode = ChunkMode::Fast;
        }
        cfg.verify |= self.verify;
        cfg.preserve_metadata |= self.preserve_metadata;
        cfg.dry_run |= self.dry_run;
        cfg.policy = cfg.policy.merge(self.policy());
    }

    /// Build the swap request, or None when FILE1/FILE2 are absent.
    pub fn swap_request(&self, cfg: &Config) -> Option<SwapRequest> {
        let (first, second) = self.files()?;
        Some(SwapRequest {
            first,
            second,
            destinations: DestinationSpec::from_flags(self.dest1.as_deref(), self.dest2.as_deref()),
            chunk_mode: cfg.chunk_mode,
            verify: cfg.verify,
            preserve_metadata: cfg.preserve_metadata,
            policy: cfg.policy,
            dry_run: cfg.dry_run,
        })
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::PathStrategy;

    #[test]
    fn quotes_are_trimmed() {
        assert_eq!(Args::sanitize_str("\"C:\\data\\a.bin\""), PathBuf::from("C:\\data\\a.bin"));
        assert_eq!(Args::sanitize_str("'/tmp/a b.txt'"), PathBuf::from("/tmp/a b.txt"));
        assert_eq!(Args::sanitize_str("  /tmp/x  "), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn quotes_inside_a_name_are_kept() {
        assert_eq!(Args::sanitize_str("bob's notes.txt"), PathBuf::from("bob's notes.txt"));
        assert_eq!(Args::sanitize_str("'bob's notes.txt'"), PathBuf::from("bob's notes.txt"));
        assert_eq!(Args::sanitize_str("say \"hi\".txt"), PathBuf::from("say \"hi\".txt"));
        assert_eq!(Args::sanitize_str("'half.txt"), PathBuf::from("'half.txt"));
    }

    #[test]
    fn flags_override_config_and_grants_merge() {
        let args = Args::parse_from(["xmv", "a", "b", "--secure", "--overwrite", "-v", "--dest1", "same-as-2"]);
        let mut cfg = Config::default();
        cfg.policy.create_dirs = true;
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.chunk_mode, ChunkMode::Secure);
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert!(cfg.policy.create_dirs && cfg.policy.overwrite);

        let req = args.swap_request(&cfg).unwrap();
        assert_eq!(req.destinations.first, PathStrategy::MirrorOther(crate::destination::FileSlot::Second));
        assert_eq!(req.destinations.second, PathStrategy::PreserveRelative);
    }

    #[test]
    fn secure_and_fast_conflict() {
        assert!(Args::try_parse_from(["xmv", "a", "b", "--secure", "--fast"]).is_err());
    }

    #[test]
    fn files_optional_only_for_config_commands() {
        assert!(Args::try_parse_from(["xmv", "a"]).is_err());
        let args = Args::try_parse_from(["xmv", "--print-config"]).unwrap();
        assert!(args.files().is_none());
    }
}
