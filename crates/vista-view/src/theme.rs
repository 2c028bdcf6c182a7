//! Theme selection

use crate::agent::UserAgent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maps a theme to the user-agent identifiers that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRule {
    /// Theme folder name
    pub name: String,
    /// Classified agent strings (e.g. `"Apple iPhone"`, `"Firefox 3.6"`)
    #[serde(default)]
    pub agents: Vec<String>,
}

impl ThemeRule {
    /// Create a rule
    pub fn new<I, S>(name: impl Into<String>, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            agents: agents.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this rule lists the classified agent
    pub fn matches(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a == agent)
    }
}

/// The active theme for a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Theme(String);

impl Theme {
    /// Create a theme from its folder name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(name.trim_end_matches('/').to_string())
    }

    /// Folder name without separator
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Folder name with a trailing separator
    pub fn dir(&self) -> String {
        format!("{}/", self.0)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decide the theme for a request.
///
/// An explicit theme wins. Otherwise, with agent sniffing enabled, the first
/// rule (in declaration order) listing the classified agent is used, so
/// specific rules must precede general ones. Everything else falls back to
/// `default_theme`.
pub fn resolve_theme(
    explicit_theme: Option<&str>,
    default_theme: &str,
    agent_sniff_enabled: bool,
    theme_rules: &[ThemeRule],
    user_agent: Option<&str>,
) -> Theme {
    if let Some(explicit) = explicit_theme.filter(|t| !t.is_empty()) {
        return Theme::new(explicit);
    }

    if agent_sniff_enabled {
        let classified = user_agent
            .map(UserAgent::parse)
            .and_then(|agent| agent.classified());

        if let Some(agent) = classified {
            if let Some(rule) = theme_rules.iter().find(|rule| rule.matches(&agent)) {
                tracing::debug!(theme = %rule.name, agent = %agent, "Theme selected by user agent");
                return Theme::new(rule.name.as_str());
            }
        }
    }

    Theme::new(default_theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X)";

    fn rules() -> Vec<ThemeRule> {
        vec![
            ThemeRule::new("iphone", ["Apple iPhone", "Apple iPod Touch"]),
            ThemeRule::new("mobile", ["Apple iPhone", "Android", "BlackBerry"]),
        ]
    }

    #[test]
    fn test_explicit_theme_wins() {
        let theme = resolve_theme(Some("print"), "default", true, &rules(), Some(IPHONE));
        assert_eq!(theme.name(), "print");
        assert_eq!(theme.dir(), "print/");
    }

    #[test]
    fn test_first_rule_wins() {
        let theme = resolve_theme(None, "default", true, &rules(), Some(IPHONE));
        assert_eq!(theme.name(), "iphone");
    }

    #[test]
    fn test_sniffing_disabled_uses_default() {
        let theme = resolve_theme(None, "default", false, &rules(), Some(IPHONE));
        assert_eq!(theme.name(), "default");
    }

    #[test]
    fn test_no_match_uses_default() {
        let theme = resolve_theme(None, "default", true, &rules(), Some("curl/8.0"));
        assert_eq!(theme.name(), "default");

        let theme = resolve_theme(None, "default", true, &rules(), None);
        assert_eq!(theme.dir(), "default/");
    }

    #[test]
    fn test_trailing_separator_normalized() {
        assert_eq!(Theme::new("mobile/").dir(), "mobile/");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_declaration_order_decides(
            names in prop::collection::vec("[a-z]{3,8}", 1..6),
            matching in prop::collection::vec(any::<bool>(), 6),
        ) {
            let rules: Vec<ThemeRule> = names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let agents: Vec<&str> = if matching[i] {
                        vec!["Apple iPhone"]
                    } else {
                        vec!["Android"]
                    };
                    ThemeRule::new(name.as_str(), agents)
                })
                .collect();

            let expected = rules
                .iter()
                .find(|r| r.matches("Apple iPhone"))
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "fallback".to_string());

            let theme = resolve_theme(None, "fallback", true, &rules, Some(IPHONE));
            prop_assert_eq!(theme.name(), expected.as_str());
        }
    }
}
