//! Robots policy parsing and evaluation.
//!
//! Evaluation is agent-specific: a group applies when its `User-agent`
//! token is a prefix of the fetcher identity (case-insensitive) or is
//! `*`; the most specific applicable group wins. Within a group the
//! longest matching pattern decides, allow winning ties. Patterns
//! support `*` wildcards and a `$` end anchor.

use std::time::Duration;

/// One allow/disallow rule.
#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

/// A `User-agent` group with its rules and optional crawl delay.
#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<f64>,
}

/// Parsed robots policy for one host.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    groups: Vec<Group>,
}

impl RobotsPolicy {
    /// A policy that allows everything (used when robots.txt is absent).
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse robots.txt text. Unknown directives are ignored.
    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current = Group::default();
        // A User-agent line after rules starts a new group.
        let mut in_rules = false;

        for raw_line in text.lines() {
            let line = match raw_line.split_once('#') {
                Some((before, _)) => before,
                None => raw_line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_rules {
                        if !current.agents.is_empty() {
                            groups.push(std::mem::take(&mut current));
                        }
                        in_rules = false;
                    }
                    current.agents.push(value.to_ascii_lowercase());
                }
                "allow" | "disallow" => {
                    in_rules = true;
                    // An empty Disallow means "allow everything"; it adds
                    // no rule but still closes the agent list.
                    if !value.is_empty() {
                        current.rules.push(Rule {
                            allow: key == "allow",
                            pattern: value.to_string(),
                        });
                    }
                }
                "crawl-delay" => {
                    in_rules = true;
                    if let Ok(secs) = value.parse::<f64>() {
                        current.crawl_delay = Some(secs);
                    }
                }
                _ => {
                    in_rules = true;
                }
            }
        }

        if !current.agents.is_empty() {
            groups.push(current);
        }

        Self { groups }
    }

    /// Whether `user_agent` may fetch `path` under this policy.
    pub fn allows(&self, user_agent: &str, path: &str) -> bool {
        let Some(group) = self.group_for(user_agent) else {
            return true;
        };

        let path = if path.is_empty() { "/" } else { path };
        let mut best: Option<&Rule> = None;
        for rule in &group.rules {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => {
                    rule.pattern.len() > b.pattern.len()
                        || (rule.pattern.len() == b.pattern.len() && rule.allow && !b.allow)
                }
            };
            if better {
                best = Some(rule);
            }
        }

        best.map(|r| r.allow).unwrap_or(true)
    }

    /// Crawl delay for `user_agent`, if the applicable group declares one.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        self.group_for(user_agent)
            .and_then(|g| g.crawl_delay)
            .map(Duration::from_secs_f64)
    }

    /// Most specific group applicable to `user_agent` (longest agent token;
    /// `*` matches anything with specificity zero).
    fn group_for(&self, user_agent: &str) -> Option<&Group> {
        let ua = user_agent.to_ascii_lowercase();
        let mut best: Option<(usize, &Group)> = None;

        for group in &self.groups {
            for agent in &group.agents {
                let specificity = if agent == "*" {
                    0
                } else if ua.starts_with(agent.as_str()) || ua.contains(agent.as_str()) {
                    agent.len()
                } else {
                    continue;
                };
                if best.map(|(s, _)| specificity > s).unwrap_or(true) {
                    best = Some((specificity, group));
                }
            }
        }

        best.map(|(_, g)| g)
    }
}

/// Match a robots pattern against a path. `*` matches any run of
/// characters; a trailing `$` anchors the end; otherwise prefix semantics.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let parts: Vec<&str> = pattern.split('*').collect();
    let last = parts.len() - 1;
    let mut pos = 0usize;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !path.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if anchored && i == last {
            // The final literal must sit at the end of the path; its
            // first occurrence after `pos` is not necessarily the one
            // that satisfies the anchor.
            return path.len() >= pos + part.len() && path.ends_with(part);
        } else {
            match path[pos..].find(part) {
                Some(found) => pos = pos + found + part.len(),
                None => return false,
            }
        }
    }

    if anchored {
        // With a trailing `*` any suffix satisfies the anchor.
        if parts[last].is_empty() {
            return true;
        }
        pos == path.len()
    } else {
        true
    }
}
