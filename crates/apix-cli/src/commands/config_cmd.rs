//! `apix config` -- display or check the resolved configuration.
//!
//! ```text
//! apix config show
//! apix config check --config gateway.toml
//! ```

use apix_types::config::{Config, ConfigIssue};

/// Display the resolved configuration as formatted JSON.
pub fn config_show(config: &Config) {
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to serialize config: {e}"),
    }
}

/// Print every configuration issue; fail when any is an error.
pub fn config_check(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        println!("{issue}");
    }
    summarize(&issues)
}

fn summarize(issues: &[ConfigIssue]) -> anyhow::Result<()> {
    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s) and {warnings} warning(s)");
    }
    if warnings > 0 {
        println!("configuration ok ({warnings} warning(s))");
    } else {
        println!("configuration ok");
    }
    Ok(())
}
