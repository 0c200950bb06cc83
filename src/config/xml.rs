//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request (`--init-config`).
//!
//! Unknown elements are rejected so typos surface instead of being ignored.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::exchange::ChunkMode;
use crate::fs_ops::io_error_with_help;
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    chunk_mode: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    verify: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    preserve_metadata: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    create_dirs: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    overwrite: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    assume_yes: Option<bool>,
}

// Element text arrives with surrounding whitespace when the file is indented.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("invalid boolean '{other}'"))),
        },
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.chunk_mode.as_deref()) {
        cfg.chunk_mode = s.parse::<ChunkMode>().map_err(anyhow::Error::msg)?;
    }

    cfg.verify = parsed.verify.unwrap_or(false);
    cfg.preserve_metadata = parsed.preserve_metadata.unwrap_or(false);
    cfg.policy.create_dirs = parsed.create_dirs.unwrap_or(false);
    cfg.policy.overwrite = parsed.overwrite.unwrap_or(false);
    cfg.policy.assume_yes = parsed.assume_yes.unwrap_or(false);
    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in '{}'", path.display()))
}

/// Load the config file if there is one.
///
/// Ok(None) when the default location has no file. A missing file named by
/// `$XMV_CONFIG` is an error, since the user asked for it explicitly.
pub fn load_config() -> Result<Option<Config>> {
    let path = default_config_path()?;
    if !path.exists() {
        if std::env::var_os(super::CONFIG_ENV).is_some_and(|v| !v.is_empty()) {
            bail!("config file named by {} does not exist: {}", super::CONFIG_ENV, path.display());
        }
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(None);
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "loaded config");
    Ok(Some(cfg))
}

/// Write a commented template config at `path` (0600, parent 0700 on Unix).
/// Refuses to overwrite an existing file or to write below a symlinked directory.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!("Refusing to create config: ancestor of {} is a symlink", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(io_error_with_help("create config dir", parent))?;
            let _ = set_dir_mode_0700(parent);
        }
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/xmv.log".into());

    let content = format!(
        "<!--\n  xmv configuration (XML). Command-line flags override these values;\n  confirmation grants (create_dirs, overwrite, assume_yes) are combined with the flags.\n\n    log_level          -> quiet | normal | info | debug\n    log_file           -> append logs here as well (leave empty to disable)\n    chunk_mode         -> fast (4 KiB) | secure (1 MiB)\n    verify             -> SHA-256 check both outputs before committing\n    preserve_metadata  -> copy permissions and timestamps onto exchanged files\n    create_dirs        -> create missing destination directories without asking\n    overwrite          -> replace existing files at destinations without asking\n    assume_yes         -> answer yes to every confirmation\n-->\n<config>\n  <log_level>normal</log_level>\n  <log_file></log_file>\n  <!-- e.g. {suggested_log} -->\n  <chunk_mode>fast</chunk_mode>\n  <verify>false</verify>\n  <preserve_metadata>false</preserve_metadata>\n  <create_dirs>false</create_dirs>\n  <overwrite>false</overwrite>\n  <assume_yes>false</assume_yes>\n</config>\n"
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    info!(path = %path.display(), "created template config");
    Ok(())
}
