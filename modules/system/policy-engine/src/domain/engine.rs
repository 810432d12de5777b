use parking_lot::RwLock;
use regex::Regex;
use tracing::{debug, info};

use crate::domain::error::PolicyError;
use crate::domain::pattern::{compile_action, compile_object};
use crate::domain::rule::PolicyRule;

struct CompiledRule {
    rule: PolicyRule,
    object: Regex,
    action: Regex,
}

impl CompiledRule {
    fn compile(rule: PolicyRule) -> Result<Self, PolicyError> {
        let object = compile_object(&rule.object)?;
        let action = compile_action(&rule.action)?;
        Ok(Self {
            rule,
            object,
            action,
        })
    }

    fn matches(&self, subject: &str, object: &str, action: &str) -> bool {
        self.rule.subject == subject && self.object.is_match(object) && self.action.is_match(action)
    }
}

/// Live rule set shared by every request.
///
/// `enforce` takes a read lock, so concurrent checks never block one another.
/// `add_policy` and `remove_policy` take the write lock. Patterns are
/// compiled before the lock is taken, so a bad pattern is reported to the
/// caller and the enforcement path never sees it.
#[derive(Default)]
pub struct PolicyEngine {
    rules: RwLock<Vec<CompiledRule>>,
}

impl PolicyEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from an initial rule set, dropping duplicates.
    ///
    /// # Errors
    /// `InvalidPattern` for the first rule whose patterns do not compile.
    pub fn with_rules(rules: impl IntoIterator<Item = PolicyRule>) -> Result<Self, PolicyError> {
        let engine = Self::new();
        for rule in rules {
            engine.add_policy(rule)?;
        }
        info!(rules = engine.len(), "policy engine initialised");
        Ok(engine)
    }

    /// Check that `rule`'s patterns compile without touching the rule set.
    ///
    /// # Errors
    /// `InvalidPattern` if the path or method pattern does not compile.
    pub fn validate(rule: &PolicyRule) -> Result<(), PolicyError> {
        compile_object(&rule.object)?;
        compile_action(&rule.action)?;
        Ok(())
    }

    /// Insert `rule` unless an identical one exists.
    ///
    /// Returns `Ok(false)` for a duplicate.
    ///
    /// # Errors
    /// `InvalidPattern` if the path or method pattern does not compile.
    pub fn add_policy(&self, rule: PolicyRule) -> Result<bool, PolicyError> {
        let compiled = CompiledRule::compile(rule)?;
        let mut rules = self.rules.write();
        if rules.iter().any(|r| r.rule == compiled.rule) {
            return Ok(false);
        }
        debug!(rule = %compiled.rule, "policy added");
        rules.push(compiled);
        Ok(true)
    }

    /// Remove the rule identical to `rule`. Returns `false` if there was none.
    pub fn remove_policy(&self, rule: &PolicyRule) -> bool {
        let mut rules = self.rules.write();
        let before = rules.len();
        rules.retain(|r| &r.rule != rule);
        let removed = rules.len() != before;
        if removed {
            debug!(rule = %rule, "policy removed");
        }
        removed
    }

    /// `true` if any rule allows `subject` to perform `action` on `object`.
    #[must_use]
    pub fn enforce(&self, subject: &str, object: &str, action: &str) -> bool {
        self.rules
            .read()
            .iter()
            .any(|r| r.matches(subject, object, action))
    }

    /// Copy of the current rules in insertion order.
    #[must_use]
    pub fn list_policies(&self) -> Vec<PolicyRule> {
        self.rules.read().iter().map(|r| r.rule.clone()).collect()
    }

    #[must_use]
    pub fn has_policy(&self, rule: &PolicyRule) -> bool {
        self.rules.read().iter().any(|r| &r.rule == rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
