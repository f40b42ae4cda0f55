//! Declarative extraction rules for state residency counters.
//!
//! A [`StateResidencyTemplate`] describes which fields a family of counter
//! blocks carries and how to convert their units. The rule generator expands
//! one template over a list of `(state name, prefix fragment)` pairs into
//! concrete [`StateResidencyConfig`]s, which are grouped per power entity in a
//! [`PowerEntityConfig`].
//!
//! ```
//! use powerstats_core::residency::{
//!     NS_TO_MS, PowerEntityConfig, StateResidencyTemplate, Transform,
//!     generate_state_residency_configs,
//! };
//!
//! let template = StateResidencyTemplate::new()
//!     .entry_count("success_count:")
//!     .total_time("total_time_ns:", Transform::DivideBy(NS_TO_MS));
//! let states = generate_state_residency_configs(&template, &[("SICD", "SICD"), ("STOP", "STOP")]);
//! let lpm = PowerEntityConfig::new("LPM", "LPM:", states);
//! assert_eq!(lpm.states[1].total_time_prefix(), Some("total_time_ns:STOP"));
//! ```

/// Nanoseconds in one millisecond.
pub const NS_TO_MS: u64 = 1_000_000;

/// Microseconds in one millisecond.
pub const US_TO_MS: u64 = 1_000;

/// Unit conversion applied to a parsed counter before it is stored.
#[derive(Debug, Clone, Copy, Default)]
pub enum Transform {
    #[default]
    Identity,
    /// Integer floor division, e.g. `DivideBy(NS_TO_MS)`.
    DivideBy(u64),
    /// Arbitrary pure conversion.
    Map(fn(u64) -> u64),
}

impl Transform {
    /// Applies the conversion. Returns `None` for a zero divisor.
    pub fn apply(self, value: u64) -> Option<u64> {
        match self {
            Transform::Identity => Some(value),
            Transform::DivideBy(divisor) => value.checked_div(divisor),
            Transform::Map(f) => Some(f(value)),
        }
    }
}

/// How to locate and convert one numeric field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Text that precedes the value on its line.
    pub prefix: String,
    pub transform: Transform,
}

impl FieldRule {
    pub fn new(prefix: impl Into<String>, transform: Transform) -> Self {
        Self {
            prefix: prefix.into(),
            transform,
        }
    }

    fn with_fragment(&self, fragment: &str) -> Self {
        Self {
            prefix: format!("{}{}", self.prefix, fragment),
            transform: self.transform,
        }
    }
}

/// Shared rule shape for a family of states, without a concrete label.
///
/// A field left as `None` is not collected for any generated state.
#[derive(Debug, Clone, Default)]
pub struct StateResidencyTemplate {
    pub entry_count: Option<FieldRule>,
    pub total_time: Option<FieldRule>,
    pub last_entry: Option<FieldRule>,
}

impl StateResidencyTemplate {
    /// Creates a template that collects nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the entry count after `prefix`.
    pub fn entry_count(mut self, prefix: impl Into<String>) -> Self {
        self.entry_count = Some(FieldRule::new(prefix, Transform::Identity));
        self
    }

    /// Collects the cumulative time after `prefix`, converted to milliseconds by `transform`.
    pub fn total_time(mut self, prefix: impl Into<String>, transform: Transform) -> Self {
        self.total_time = Some(FieldRule::new(prefix, transform));
        self
    }

    /// Collects the last entry timestamp after `prefix`, converted to milliseconds by `transform`.
    pub fn last_entry(mut self, prefix: impl Into<String>, transform: Transform) -> Self {
        self.last_entry = Some(FieldRule::new(prefix, transform));
        self
    }
}

/// Extraction rule for one state of one power entity.
#[derive(Debug, Clone)]
pub struct StateResidencyConfig {
    pub name: String,
    pub entry_count: Option<FieldRule>,
    pub total_time: Option<FieldRule>,
    pub last_entry: Option<FieldRule>,
}

impl StateResidencyConfig {
    /// Builds a concrete rule by appending `fragment` to every configured prefix of `template`.
    pub fn from_template(
        template: &StateResidencyTemplate,
        name: impl Into<String>,
        fragment: &str,
    ) -> Self {
        Self {
            name: name.into(),
            entry_count: template.entry_count.as_ref().map(|f| f.with_fragment(fragment)),
            total_time: template.total_time.as_ref().map(|f| f.with_fragment(fragment)),
            last_entry: template.last_entry.as_ref().map(|f| f.with_fragment(fragment)),
        }
    }

    pub fn entry_count_prefix(&self) -> Option<&str> {
        self.entry_count.as_ref().map(|f| f.prefix.as_str())
    }

    pub fn total_time_prefix(&self) -> Option<&str> {
        self.total_time.as_ref().map(|f| f.prefix.as_str())
    }

    pub fn last_entry_prefix(&self) -> Option<&str> {
        self.last_entry.as_ref().map(|f| f.prefix.as_str())
    }
}

/// Expands `template` into one rule per `(state name, prefix fragment)` pair.
///
/// Output order matches `states`. Nothing is validated: the tables are static
/// and a template without fields simply produces rules that yield empty records.
pub fn generate_state_residency_configs(
    template: &StateResidencyTemplate,
    states: &[(&str, &str)],
) -> Vec<StateResidencyConfig> {
    states
        .iter()
        .map(|(name, fragment)| StateResidencyConfig::from_template(template, *name, fragment))
        .collect()
}

/// A power entity and the rules for its states.
#[derive(Debug, Clone)]
pub struct PowerEntityConfig {
    pub name: String,
    /// Marker that starts the entity's block in a shared file. Empty means the
    /// entity owns the whole file.
    pub header: String,
    pub states: Vec<StateResidencyConfig>,
}

impl PowerEntityConfig {
    pub fn new(
        name: impl Into<String>,
        header: impl Into<String>,
        states: Vec<StateResidencyConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            header: header.into(),
            states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modem_template() -> StateResidencyTemplate {
        StateResidencyTemplate::new()
            .entry_count("count:")
            .total_time("duration_usec:", Transform::DivideBy(US_TO_MS))
            .last_entry("last_entry_timestamp_usec:", Transform::DivideBy(US_TO_MS))
    }

    #[test]
    fn test_generate_concatenates_prefixes() {
        let pairs = [("ON", "GPS_ON:"), ("OFF", "GPS_OFF:"), ("SLEEP", "")];
        let rules = generate_state_residency_configs(&modem_template(), &pairs);

        assert_eq!(rules.len(), pairs.len());
        for (rule, (label, fragment)) in rules.iter().zip(pairs.iter()) {
            assert_eq!(rule.name, *label);
            assert_eq!(rule.entry_count_prefix().unwrap(), format!("count:{}", fragment));
            assert_eq!(
                rule.total_time_prefix().unwrap(),
                format!("duration_usec:{}", fragment)
            );
            assert_eq!(
                rule.last_entry_prefix().unwrap(),
                format!("last_entry_timestamp_usec:{}", fragment)
            );
        }
    }

    #[test]
    fn test_generate_copies_transforms() {
        let rules = generate_state_residency_configs(&modem_template(), &[("ON", "GPS_ON:")]);
        let total = rules[0].total_time.as_ref().unwrap();
        assert_eq!(total.transform.apply(24_999), Some(24));
        let count = rules[0].entry_count.as_ref().unwrap();
        assert_eq!(count.transform.apply(24_999), Some(24_999));
    }

    #[test]
    fn test_generate_keeps_unconfigured_fields_absent() {
        let template = StateResidencyTemplate::new().entry_count("");
        let rules = generate_state_residency_configs(&template, &[("RESTART", "")]);

        assert_eq!(rules[0].entry_count_prefix(), Some(""));
        assert!(rules[0].total_time.is_none());
        assert!(rules[0].last_entry.is_none());
    }

    #[test]
    fn test_generate_empty_pairs() {
        assert!(generate_state_residency_configs(&modem_template(), &[]).is_empty());
    }

    #[test]
    fn test_transform_apply() {
        assert_eq!(Transform::Identity.apply(7), Some(7));
        assert_eq!(Transform::DivideBy(NS_TO_MS).apply(24_576_000), Some(24));
        assert_eq!(Transform::DivideBy(0).apply(10), None);
        assert_eq!(Transform::Map(|x| x * 2).apply(21), Some(42));
    }
}
