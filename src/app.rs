//! Application orchestrator.
//! Handles the config commands, merges config with CLI flags, initializes
//! logging, installs the signal handler and runs the swap.

use anyhow::{Context, Result};
use tracing::{debug, error};

use xmv::cli::Args;
use xmv::config::{create_template_config, default_config_path, load_config};
use xmv::output as out;
use xmv::{SwapReport, XmvError, run_swap, shutdown};

use crate::logging::init_tracing;
use crate::progress::ExchangeProgress;
use crate::prompt::TerminalApprover;

fn print_config_location() -> Result<()> {
    let path = default_config_path()?;
    if std::env::var_os(xmv::config::CONFIG_ENV).is_some() {
        out::print_info(&format!("Using {} (explicit):\n  {}", xmv::config::CONFIG_ENV, path.display()));
    } else {
        out::print_info(&format!("Default xmv config path:\n  {}", path.display()));
    }
    if path.exists() {
        out::print_info("A config file exists at that location.");
    } else {
        out::print_info("No config file exists there yet. Run with --init-config to create a template.");
    }
    Ok(())
}

fn init_config() -> Result<()> {
    let path = default_config_path()?;
    create_template_config(&path)
        .with_context(|| format!("write template config to {}", path.display()))?;
    out::print_success(&format!("Template config written to: {}", path.display()));
    Ok(())
}

fn report(rep: &SwapReport) {
    if rep.dry_run {
        out::print_info(&format!("Dry-run ({}), nothing was changed. Planned steps:", rep.strategy));
        for (i, step) in rep.actions.iter().enumerate() {
            out::print_user(&format!("  {}. {step}", i + 1));
        }
        for pending in &rep.unapproved {
            out::print_warn(&format!("needs approval: {pending} (use --create-dirs, --overwrite or -y)"));
        }
        return;
    }
    out::print_user(&format!("'{}' -> '{}'", rep.first.source.display(), rep.first.landing.display()));
    out::print_user(&format!("'{}' -> '{}'", rep.second.source.display(), rep.second.landing.display()));
    if let Some(v) = &rep.verification {
        out::print_info(&format!("sha256 {}  {}", v.hash_b, rep.first.landing.display()));
        out::print_info(&format!("sha256 {}  {}", v.hash_a, rep.second.landing.display()));
    }
    out::print_success(&format!("swapped via {} ({} bytes written)", rep.strategy, rep.bytes_transferred));
}

fn log_failure(e: &XmvError) {
    let code = e.code();
    let kind = e.kind();
    match e {
        XmvError::RenameFailure { parked, .. } if !parked.is_empty() => {
            for p in parked {
                error!(code, kind, parked = %p.display(), "file left under temporary name; recover it manually");
            }
            error!(code, kind, error = %e, "Swap failed");
        }
        XmvError::InsufficientSpace { required, available, dest } => {
            error!(code, kind, required = *required as u64, available = *available as u64, dest = %dest.display(), "Swap failed")
        }
        _ => error!(code, kind, error = %e, side_effect_free = e.is_side_effect_free(), "Swap failed"),
    }
    out::print_error(&e.to_string());
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Config commands run before logging init.
    if args.print_config {
        return print_config_location();
    }
    if args.init_config {
        return init_config();
    }

    let mut cfg = load_config()?.unwrap_or_default();
    args.apply_overrides(&mut cfg);

    let _guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json)
        .context("initialize logging")?;

    // The handler only raises the flag. A swap already executing runs to its
    // end and its log lines still reach the file through `_guard`.
    ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("Received interrupt; a swap that has started will finish first.");
    })
    .context("install signal handler")?;

    let req = args
        .swap_request(&cfg)
        .context("FILE1 and FILE2 are required")?;
    debug!(?req, "starting xmv");

    let mut approver = TerminalApprover::new();
    let mut bar = ExchangeProgress::new(args.progress && !cfg.dry_run);
    let outcome = run_swap(&req, &mut approver, &mut |p| bar.observe(p));
    bar.finish();

    match outcome {
        Ok(rep) => {
            report(&rep);
            Ok(())
        }
        Err(e) => {
            log_failure(&e);
            Err(e.into())
        }
    }
}
