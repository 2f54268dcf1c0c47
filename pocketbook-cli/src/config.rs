use anyhow::{Context, Result};
use pocketbook_core::Config;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_pocketbook_home, pocketbook_home};

/// `--config` / `POCKETBOOK_CONFIG` wins, else `~/.pocketbook/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(pocketbook_home()?.join("config.toml")),
    }
}

/// Load and validate. Any failure here stops the program before work starts.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "no config at {}. Run: pocketbook init-config",
            path.display()
        );
    }
    Config::load(path).with_context(|| format!("load {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = cfg.to_toml_string().context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write a starter config plus its data directories. Never overwrites.
pub fn init_config(explicit: Option<&Path>) -> Result<PathBuf> {
    let p = config_path(explicit)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(p);
    }
    let cfg = Config::example(ensure_pocketbook_home()?.join("data"));
    for tab in &cfg.tabs {
        let dir = cfg.tab_dir(tab);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    }
    save_config(&p, &cfg)?;
    println!("Wrote {}", p.display());
    Ok(p)
}
