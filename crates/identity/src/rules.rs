// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Display-name rewriting
//!
//! Framework-generated task names (Kokkos kernels, CUDA launches) are long
//! and repetitive. `tree_name` collapses them with an ordered list of
//! regex rewrites; `short_name` truncates argument lists and templates.
//! Both are plain string functions here so they can be tested without any
//! identity or resolver in play.

use regex::Regex;

use crate::config::RuleSpec;
use crate::error::NamingError;

/// Appended to names cut by [`shorten`]
pub const TRUNCATION_MARKER: &str = "...";

/// Built-in tree-name rewrites, applied in order
const FRAMEWORK_RULES: &[(&str, &str)] = &[
    ("Kokkos::Experimental::Impl::", "kok::"),
    ("Kokkos::Experimental::", "kok::"),
    ("Kokkos::Impl::", "kok::"),
    ("Kokkos::RangePolicy", "kok::range"),
    ("Kokkos::MDRangePolicy", "kok::md"),
    ("Kokkos::TeamPolicy", "kok::team"),
    ("ParallelFor", "p_for"),
    ("ParallelReduce", "p_red"),
    ("ParallelScan", "p_scan"),
    ("_parallel_launch_local_memory", "_local"),
    ("_parallel_launch_constant_memory", "_const"),
];

/// A single `(pattern, replacement)` rewrite
#[derive(Debug, Clone)]
pub struct NameRule {
    pattern: Regex,
    replacement: String,
}

impl NameRule {
    /// Compile a rule from a regex pattern
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, NamingError> {
        let compiled = Regex::new(pattern).map_err(|source| NamingError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    /// Replace every match in `name`
    pub fn apply(&self, name: &str) -> String {
        self.pattern
            .replace_all(name, self.replacement.as_str())
            .into_owned()
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Ordered list of rewrites
#[derive(Debug, Clone, Default)]
pub struct NameRuleSet {
    rules: Vec<NameRule>,
}

impl NameRuleSet {
    /// An empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in framework rules
    pub fn framework_defaults() -> Self {
        let rules = FRAMEWORK_RULES
            .iter()
            .map(|(pattern, replacement)| {
                NameRule::new(&regex::escape(pattern), *replacement)
                    .expect("built-in name rules are escaped literals")
            })
            .collect();

        Self { rules }
    }

    /// Built-in rules followed by the given extra rules
    pub fn with_extra(specs: &[RuleSpec]) -> Result<Self, NamingError> {
        let mut set = Self::framework_defaults();
        for spec in specs {
            set.push(NameRule::new(&spec.pattern, spec.replacement.clone())?);
        }
        Ok(set)
    }

    pub fn push(&mut self, rule: NameRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `name`, each on the previous rule's output
    pub fn apply(&self, name: &str) -> String {
        self.rules
            .iter()
            .fold(name.to_string(), |current, rule| rule.apply(&current))
    }
}

/// Short display form of a resolved name
///
/// Cuts at the first `(`, then at the first `<` unless the name carries an
/// address marker, then caps the length at `max_len` characters with a
/// trailing [`TRUNCATION_MARKER`].
pub fn shorten(name: &str, max_len: usize) -> String {
    let mut shorter = match name.find('(') {
        Some(idx) => &name[..idx],
        None => name,
    };

    if !shorter.contains("addr") {
        if let Some(idx) = shorter.find('<') {
            shorter = &shorter[..idx];
        }
    }

    if shorter.chars().count() <= max_len {
        return shorter.to_string();
    }

    let keep = max_len.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = shorter.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_rules_collapse_kokkos() {
        let rules = NameRuleSet::framework_defaults();
        let name = "Kokkos::Impl::ParallelFor<Kokkos::RangePolicy<>>";
        assert_eq!(rules.apply(name), "kok::p_for<kok::range<>>");
    }

    #[test]
    fn test_rules_apply_in_order() {
        // The longer Experimental::Impl prefix must win over Experimental::
        let rules = NameRuleSet::framework_defaults();
        assert_eq!(
            rules.apply("Kokkos::Experimental::Impl::ParallelScan"),
            "kok::p_scan"
        );
    }

    #[test]
    fn test_cuda_launch_suffixes() {
        let rules = NameRuleSet::framework_defaults();
        assert_eq!(
            rules.apply("cuda_parallel_launch_local_memory<F>"),
            "cuda_local<F>"
        );
        assert_eq!(
            rules.apply("cuda_parallel_launch_constant_memory<F>"),
            "cuda_const<F>"
        );
    }

    #[test]
    fn test_extra_rules_follow_defaults() {
        let specs = vec![RuleSpec::new(r"kok::p_for", "loop")];
        let rules = NameRuleSet::with_extra(&specs).unwrap();
        assert_eq!(rules.len(), FRAMEWORK_RULES.len() + 1);
        assert_eq!(rules.apply("Kokkos::Impl::ParallelFor"), "loop");
    }

    #[test]
    fn test_every_builtin_rule_compiles() {
        let rules = NameRuleSet::framework_defaults();
        assert_eq!(rules.len(), FRAMEWORK_RULES.len());
        assert_eq!(rules.apply("Kokkos::RangePolicy"), "kok::range");
        assert_eq!(rules.apply("_parallel_launch_constant_memory"), "_const");
    }

    #[test]
    fn test_invalid_rule() {
        assert!(NameRule::new("[", "x").is_err());
    }

    #[test]
    fn test_shorten_strips_arguments_and_templates() {
        assert_eq!(shorten("solve(int, double)", 50), "solve");
        assert_eq!(shorten("std::vector<int>::push_back", 50), "std::vector");
    }

    #[test]
    fn test_shorten_keeps_templates_with_address() {
        assert_eq!(shorten("region<addr=0x10>", 50), "region<addr=0x10>");
    }

    #[test]
    fn test_shorten_caps_length() {
        let long = "a".repeat(60);
        let short = shorten(&long, 50);
        assert_eq!(short.len(), 50);
        assert!(short.ends_with("..."));
        assert_eq!(&short[..47], &long[..47]);
    }

    #[test]
    fn test_shorten_exact_threshold_untouched() {
        let name = "b".repeat(50);
        assert_eq!(shorten(&name, 50), name);
    }
}
