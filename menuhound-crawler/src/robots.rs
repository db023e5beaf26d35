//! robots.txt fetching, parsing and the per-session policy cache.

use crate::limiter::RateLimiter;
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A single `Allow`/`Disallow` prefix rule taken from a `User-agent: *`
/// group.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RobotsRule {
    allow: bool,
    prefix: String,
}

/// Parsed robots.txt policy for one domain. Only `User-agent: *` groups
/// apply; rules for named agents are ignored. An empty policy allows
/// everything.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    rules: Vec<RobotsRule>,
}

impl RobotsPolicy {
    /// Policy used when robots.txt is missing or unreadable (fail-open).
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(body: &str) -> Self {
        let mut rules = Vec::new();
        let mut applies = false;
        // Consecutive User-agent lines introduce one shared group.
        let mut in_group_header = false;

        for raw in body.lines() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if in_group_header {
                        applies |= value == "*";
                    } else {
                        applies = value == "*";
                        in_group_header = true;
                    }
                }
                "allow" | "disallow" => {
                    in_group_header = false;
                    // An empty Disallow value allows everything; no rule needed.
                    if applies && !value.is_empty() {
                        rules.push(RobotsRule {
                            allow: field == "allow",
                            prefix: value.to_string(),
                        });
                    }
                }
                _ => {
                    in_group_header = false;
                }
            }
        }

        Self { rules }
    }

    /// Longest matching prefix wins; on a length tie Allow wins; no match
    /// means allowed.
    pub fn is_allowed(&self, path: &str) -> bool {
        let mut best: Option<(usize, bool)> = None;
        for rule in &self.rules {
            if !path.starts_with(rule.prefix.as_str()) {
                continue;
            }
            let len = rule.prefix.len();
            best = match best {
                Some((best_len, best_allow)) if len < best_len => Some((best_len, best_allow)),
                Some((best_len, best_allow)) if len == best_len => {
                    Some((best_len, best_allow || rule.allow))
                }
                _ => Some((len, rule.allow)),
            };
        }
        best.map(|(_, allow)| allow).unwrap_or(true)
    }
}

/// Per-session robots cache: one fetch per domain, fail-open on any fetch
/// or parse problem, and the outcome (including failure) is memoized so it
/// is never retried within the session.
#[derive(Debug, Default)]
pub struct RobotsCache {
    policies: HashMap<String, RobotsPolicy>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn policy_for(
        &mut self,
        client: &Client,
        limiter: &mut RateLimiter,
        scheme: &str,
        domain: &str,
    ) -> &RobotsPolicy {
        if !self.policies.contains_key(domain) {
            let policy = fetch_policy(client, limiter, scheme, domain).await;
            self.policies.insert(domain.to_string(), policy);
        }
        &self.policies[domain]
    }
}

async fn fetch_policy(
    client: &Client,
    limiter: &mut RateLimiter,
    scheme: &str,
    domain: &str,
) -> RobotsPolicy {
    let robots_url = format!("{scheme}://{domain}/robots.txt");
    limiter.wait().await;
    debug!("Fetching {}", robots_url);

    match client.get(&robots_url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => RobotsPolicy::parse(&body),
            Err(e) => {
                warn!("Unreadable robots.txt body for {}: {}", domain, e);
                RobotsPolicy::allow_all()
            }
        },
        Ok(resp) => {
            debug!(
                "robots.txt for {} returned {}, treating as allow-all",
                domain,
                resp.status()
            );
            RobotsPolicy::allow_all()
        }
        Err(e) => {
            warn!("Failed to fetch robots.txt for {}: {}", domain, e);
            RobotsPolicy::allow_all()
        }
    }
}
