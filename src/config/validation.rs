//! Unknown-key detection for config files, with "did you mean?" suggestions.
//!
//! The raw TOML is parsed into `toml::Value` first, its dotted key paths are
//! compared against the fields `AppConfig` understands, and every unknown
//! path becomes a warning. Serde deserialization then runs as usual, so
//! warnings never reject a file.

use std::collections::HashSet;

/// A non-fatal config warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown config key '{}'", self.field)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path in `AppConfig`.
///
/// New fields on the config sections must be listed here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        // [server]
        "server",
        "server.addr",
        "server.cors_origins",
        // [storage]
        "storage",
        "storage.backend",
        "storage.path",
        "storage.seed_demo_data",
        // [relay]
        "relay",
        "relay.simulation_interval_ms",
        "relay.outbound_buffer",
        "relay.parameter_history",
        "relay.well_history",
        // [api]
        "api",
        "api.default_page_size",
        "api.max_page_size",
        "api.enforce_form_rules",
        // [auth]
        "auth",
        "auth.username",
        "auth.password",
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Collect dotted key paths from a TOML table tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3. Ties go to the
/// lexicographically smaller key.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Entry Point
// ============================================================================

/// Warnings for every unknown key in `raw_toml`, sorted by key.
///
/// Unparseable input yields no warnings; the serde pass reports it.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            field: key,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("relay", "relay"), 0);
        assert_eq!(levenshtein("relay", "relya"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let value: toml::Value = "[server]\naddr = \"x\"\n[relay]\nwell_history = 5"
            .parse()
            .unwrap();
        let mut keys = walk_toml_keys(&value, "");
        keys.sort();
        assert_eq!(
            keys,
            vec!["relay", "relay.well_history", "server", "server.addr"]
        );
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[relay]\nsimulation_interval = 500\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "relay.simulation_interval");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("relay.simulation_interval_ms")
        );
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_default_config_produces_zero_warnings() {
        let toml = crate::config::AppConfig::default().to_toml().unwrap();
        assert!(validate_unknown_keys(&toml).is_empty(), "{toml}");
    }

    #[test]
    fn test_unknown_section_without_close_match() {
        let warnings = validate_unknown_keys("[thresholds]\nmud_weight = 9.5\n");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }

    #[test]
    fn test_unparseable_input_is_left_to_serde() {
        assert!(validate_unknown_keys("[server\naddr =").is_empty());
    }
}
