use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connection::{ConnectionConfig, DEFAULT_TIMEOUT, Distribution};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    distrib: Option<bool>,
    shards: Option<Vec<String>>,
    verify: Option<bool>,
    timeout: Option<Duration>,
}

pub(crate) fn load_config(
    url: Option<String>,
    distrib: Option<bool>,
    shards: Option<Vec<String>>,
) -> Result<ConnectionConfig> {
    resolve_config(
        url,
        distrib,
        shards,
        |name| std::env::var(name).ok(),
        &rc_candidates(),
    )
}

fn resolve_config<F>(
    url: Option<String>,
    distrib: Option<bool>,
    shards: Option<Vec<String>>,
    env: F,
    rc_candidates: &[PathBuf],
) -> Result<ConnectionConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut url = url.or_else(|| env("ESGF_SEARCH_URL"));
    let mut distrib = match distrib {
        Some(v) => Some(v),
        None => env("ESGF_SEARCH_DISTRIB")
            .map(|v| parse_bool("ESGF_SEARCH_DISTRIB", &v))
            .transpose()?,
    };
    let mut shards = shards.or_else(|| env("ESGF_SEARCH_SHARDS").map(|v| split_shards(&v)));
    let mut timeout = env("ESGF_SEARCH_TIMEOUT")
        .map(|v| parse_timeout("ESGF_SEARCH_TIMEOUT", &v))
        .transpose()?;
    let mut verify: Option<bool> = None;

    for rc_path in rc_candidates {
        if rc_path.exists() {
            let cfg = read_rc(rc_path)?;

            if url.is_none() {
                url = cfg.url;
            }
            if distrib.is_none() {
                distrib = cfg.distrib;
            }
            if shards.is_none() {
                shards = cfg.shards;
            }
            if timeout.is_none() {
                timeout = cfg.timeout;
            }
            verify = cfg.verify;
            break;
        }
    }

    let url = match url {
        Some(v) => v,
        None => {
            if !rc_candidates.is_empty() {
                return Err(Error::Config(format!(
                    "missing url (set ESGF_SEARCH_URL or put `url:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            return Err(Error::Config(
                "missing url (set ESGF_SEARCH_URL or create .esgfsearchrc)".to_string(),
            ));
        }
    };

    let distribution = match shards {
        Some(shards) => Distribution::from_shards(shards),
        None => Distribution::from_distrib(distrib.unwrap_or(true)),
    };

    Ok(ConnectionConfig {
        url,
        distribution,
        verify: verify.unwrap_or(true),
        timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_rc(&text).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // `url:` may be followed by the value on the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            let value = strip_quotes(line);
            if !value.contains(':') || looks_like_url(value) {
                apply_rc_value(&mut cfg, pk, value)?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                apply_rc_value(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn apply_rc_value(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "distrib" => cfg.distrib = Some(parse_bool(key, value)?),
        "shards" => cfg.shards = Some(split_shards(value)),
        "verify" => cfg.verify = Some(parse_bool(key, value)?),
        "timeout" => cfg.timeout = Some(parse_timeout(key, value)?),
        _ => {}
    }
    Ok(())
}

fn looks_like_url(line: &str) -> bool {
    line.starts_with("http://") || line.starts_with("https://")
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "invalid boolean for {}: {:?}",
            key, other
        ))),
    }
}

fn parse_timeout(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| Error::Config(format!("invalid timeout for {}: {:?}", key, value)))
}

fn split_shards(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) ESGF_SEARCH_RC (explicit)
    // 2) ./.esgfsearchrc
    // 3) ~/.esgfsearchrc
    if let Ok(p) = std::env::var("ESGF_SEARCH_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".esgfsearchrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".esgfsearchrc"));
    }
    v
}
