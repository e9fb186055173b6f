//! Condition matching logic.
//!
//! # Responsibilities
//! - Resolve a condition key to a subject value from a URL + invocation
//! - Compare subjects against single-wildcard patterns
//! - Combine clauses with AND, values with OR, exclusions winning
//!
//! # Design Decisions
//! - One resolver with a fixed set of reserved keys; everything else is a
//!   query parameter (with a `default.` fallback)
//! - No regex: prefix/suffix comparison only, case-sensitive
//! - Absent values resolve to the empty string, which only an explicit
//!   empty pattern matches
//! - Placeholders resolve against the request context, never the candidate

use crate::endpoint::{Invocation, ServiceUrl};
use crate::routing::rule::{Clause, Condition, MatchValue, Pattern};

/// Per-call view over a URL and, optionally, the invocation.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    url: &'a ServiceUrl,
    invocation: Option<&'a dyn Invocation>,
}

/// What a key resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject<'a> {
    Value(&'a str),
    /// Declared method list, used when no invocation method is known.
    Methods(Vec<&'a str>),
}

impl<'a> MatchContext<'a> {
    pub fn new(url: &'a ServiceUrl, invocation: Option<&'a dyn Invocation>) -> Self {
        Self { url, invocation }
    }

    pub fn url(&self) -> &'a ServiceUrl {
        self.url
    }

    fn method_name(&self) -> Option<&'a str> {
        self.invocation
            .map(|inv| inv.method_name())
            .filter(|m| !m.is_empty())
    }

    /// Resolve `key` against this context.
    pub fn resolve(&self, key: &str) -> Subject<'a> {
        let url = self.url;
        match key {
            "host" => Subject::Value(url.host()),
            "port" => Subject::Value(url.port()),
            "protocol" => Subject::Value(url.protocol()),
            "path" => Subject::Value(url.path()),
            "interface" | "service" => Subject::Value(url.interface()),
            "application" => Subject::Value(url.application()),
            "method" => Subject::Value(
                self.method_name()
                    .unwrap_or_else(|| url.param_or("method", "")),
            ),
            "methods" => match self.method_name() {
                Some(m) => Subject::Value(m),
                None => {
                    let declared = url.method_list();
                    if declared.is_empty() {
                        Subject::Value("")
                    } else {
                        Subject::Methods(declared)
                    }
                }
            },
            _ => Subject::Value(
                url.param(key)
                    .or_else(|| url.param(&format!("default.{}", key)))
                    .unwrap_or(""),
            ),
        }
    }
}

/// Evaluate `condition` against `subject`, resolving placeholders from `request`.
///
/// For the when side both contexts are the consumer; for the then side the
/// subject is a candidate provider and the request stays the consumer.
pub fn matches(condition: &Condition, subject: &MatchContext<'_>, request: &MatchContext<'_>) -> bool {
    match condition {
        Condition::True => true,
        Condition::False | Condition::Empty => false,
        Condition::Clauses(clauses) => clauses
            .iter()
            .all(|clause| clause_matches(clause, subject, request)),
    }
}

fn clause_matches(clause: &Clause, subject: &MatchContext<'_>, request: &MatchContext<'_>) -> bool {
    match subject.resolve(clause.key()) {
        Subject::Value(value) => value_matches(clause, value, request),
        Subject::Methods(methods) => methods
            .iter()
            .any(|method| value_matches(clause, method, request)),
    }
}

fn value_matches(clause: &Clause, value: &str, request: &MatchContext<'_>) -> bool {
    let included = clause.included().is_empty()
        || clause
            .included()
            .iter()
            .any(|pattern| pattern_matches(pattern, value, request));
    included
        && !clause
            .excluded()
            .iter()
            .any(|pattern| pattern_matches(pattern, value, request))
}

/// Compare one value against one pattern.
pub fn pattern_matches(pattern: &MatchValue, value: &str, request: &MatchContext<'_>) -> bool {
    match pattern.pattern() {
        Pattern::Literal(literal) => literal == value,
        Pattern::Any => !value.is_empty(),
        Pattern::Wildcard { prefix, suffix } => {
            !value.is_empty()
                && value.len() >= prefix.len() + suffix.len()
                && value.starts_with(prefix.as_str())
                && value.ends_with(suffix.as_str())
        }
        // An unresolved placeholder never matches, not even an empty value.
        Pattern::Placeholder(key) => match request.resolve(key) {
            Subject::Value(resolved) => !resolved.is_empty() && resolved == value,
            Subject::Methods(methods) => methods.contains(&value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::RpcInvocation;
    use crate::routing::rule::Rule;

    fn url(text: &str) -> ServiceUrl {
        ServiceUrl::parse(text).unwrap()
    }

    fn when_matches(rule: &str, consumer: &ServiceUrl, inv: &RpcInvocation) -> bool {
        let rule = Rule::parse(rule).unwrap();
        let ctx = MatchContext::new(consumer, Some(inv));
        matches(rule.when(), &ctx, &ctx)
    }

    #[test]
    fn test_wildcard_patterns() {
        let consumer = url("consumer://1.1.1.1/com.foo.BarService");
        let ctx = MatchContext::new(&consumer, None);
        let prefix = MatchValue::parse("4.4.4.*").unwrap();
        assert!(pattern_matches(&prefix, "4.4.4.1", &ctx));
        assert!(pattern_matches(&prefix, "4.4.4.255", &ctx));
        assert!(!pattern_matches(&prefix, "4.4.5.1", &ctx));

        let suffix = MatchValue::parse("*.4").unwrap();
        assert!(pattern_matches(&suffix, "4.4.4.4", &ctx));
        assert!(!pattern_matches(&suffix, "4.4.4.5", &ctx));

        let infix = MatchValue::parse("10.*.1").unwrap();
        assert!(pattern_matches(&infix, "10.20.3.1", &ctx));
        assert!(!pattern_matches(&infix, "10.1", &ctx));

        let any = MatchValue::parse("*").unwrap();
        assert!(pattern_matches(&any, "anything", &ctx));
        assert!(!pattern_matches(&any, "", &ctx));
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let consumer = url("consumer://1.1.1.1/com.foo.BarService");
        let ctx = MatchContext::new(&consumer, None);
        let pattern = MatchValue::parse("getFoo").unwrap();
        assert!(pattern_matches(&pattern, "getFoo", &ctx));
        assert!(!pattern_matches(&pattern, "getfoo", &ctx));
    }

    #[test]
    fn test_match_when_host_sets() {
        let consumer = url("consumer://1.1.1.1/com.foo.BarService");
        let inv = RpcInvocation::new();

        assert!(when_matches("=> host = 1.2.3.4", &consumer, &inv));
        assert!(when_matches("host = 2.2.2.2,1.1.1.1,3.3.3.3 => host = 1.2.3.4", &consumer, &inv));
        assert!(!when_matches(
            "host = 2.2.2.2,1.1.1.1,3.3.3.3 & host !=1.1.1.1 => host = 1.2.3.4",
            &consumer,
            &inv
        ));
        assert!(when_matches(
            "host !=4.4.4.4 & host = 2.2.2.2,1.1.1.1,3.3.3.3 => host = 1.2.3.4",
            &consumer,
            &inv
        ));
        assert!(when_matches(
            "host !=4.4.4.* & host = 2.2.2.2,1.1.1.1,3.3.3.3 => host = 1.2.3.4",
            &consumer,
            &inv
        ));
        assert!(!when_matches(
            "host = 2.2.2.2,1.1.1.*,3.3.3.3 & host != 1.1.1.1 => host = 1.2.3.4",
            &consumer,
            &inv
        ));
        assert!(when_matches(
            "host = 2.2.2.2,1.1.1.*,3.3.3.3 & host != 1.1.1.2 => host = 1.2.3.4",
            &consumer,
            &inv
        ));
    }

    #[test]
    fn test_and_across_keys() {
        let inv = RpcInvocation::new();
        let rule = "host = 2.2.2.2,1.1.1.1,3.3.3.3 & host != 1.1.1.1 => true";
        assert!(!when_matches(rule, &url("consumer://1.1.1.1/s"), &inv));
        assert!(when_matches(rule, &url("consumer://2.2.2.2/s"), &inv));
    }

    #[test]
    fn test_methods_key_uses_invocation() {
        let inv = RpcInvocation::new().with_method_name("getFoo");
        let declared = url("consumer://1.1.1.1/com.foo.BarService?methods=setFoo,getFoo,findFoo");

        assert!(when_matches("methods = getFoo & host = 1.1.1.1 => true", &declared, &inv));
        assert!(!when_matches("methods = getFoo & host != 1.1.1.1 => true", &declared, &inv));
        assert!(!when_matches("methods = setFoo => true", &declared, &inv));

        // The invoked method wins over the declared list.
        let other = url("consumer://1.1.1.1/com.foo.BarService?methods=setFoo");
        assert!(when_matches("methods = getFoo => true", &other, &inv));
        assert!(!when_matches("methods = setFoo => true", &other, &inv));
    }

    #[test]
    fn test_methods_exclusion_rejects_invoked_method() {
        let inv = RpcInvocation::new().with_method_name("getFoo");
        let undeclared = url("consumer://1.1.1.1/com.foo.BarService?methods=setFoo");
        assert!(!when_matches("methods != getFoo => true", &undeclared, &inv));

        let bare = url("consumer://1.1.1.1/com.foo.BarService");
        assert!(!when_matches("methods != getFoo => true", &bare, &inv));
        assert!(when_matches("methods != setFoo => true", &bare, &inv));
    }

    #[test]
    fn test_port_key() {
        let rule = Rule::parse("true => port = 20880").unwrap();
        let served = url("dubbo://10.20.3.3:20880/com.foo.BarService");
        let ctx = MatchContext::new(&served, None);
        assert!(matches(rule.then(), &ctx, &ctx));

        let other = url("dubbo://10.20.3.3:20881/com.foo.BarService");
        let ctx = MatchContext::new(&other, None);
        assert!(!matches(rule.then(), &ctx, &ctx));
    }

    #[test]
    fn test_methods_key_without_invocation_uses_declared_list() {
        let provider = url("dubbo://1.1.1.1/com.foo.BarService?methods=setFoo,getFoo");
        let rule = Rule::parse("true => methods = getFoo").unwrap();
        let ctx = MatchContext::new(&provider, None);
        assert!(matches(rule.then(), &ctx, &ctx));

        let rule = Rule::parse("true => methods = findFoo").unwrap();
        assert!(!matches(rule.then(), &ctx, &ctx));
    }

    #[test]
    fn test_default_param_fallback() {
        let provider = url("dubbo://10.20.3.3:20880/com.foo.BarService?default.serialization=fastjson");
        let ctx = MatchContext::new(&provider, None);
        let rule = Rule::parse("true => serialization = fastjson").unwrap();
        assert!(matches(rule.then(), &ctx, &ctx));
    }

    #[test]
    fn test_absent_param_only_matches_empty_pattern() {
        let provider = url("dubbo://10.20.3.3:20880/com.foo.BarService");
        let ctx = MatchContext::new(&provider, None);

        let rule = Rule::parse("true => zone = *").unwrap();
        assert!(!matches(rule.then(), &ctx, &ctx));

        let rule = Rule::parse("true => zone = ").unwrap();
        assert!(matches(rule.then(), &ctx, &ctx));

        let rule = Rule::parse("true => zone != east").unwrap();
        assert!(matches(rule.then(), &ctx, &ctx));
    }

    #[test]
    fn test_placeholder_resolves_from_request() {
        let consumer = url("consumer://9.9.9.9/com.foo.BarService");
        let request = MatchContext::new(&consumer, None);
        let rule = Rule::parse("true => host = $host").unwrap();

        let same = url("dubbo://9.9.9.9:20880/com.foo.BarService");
        let other = url("dubbo://8.8.8.8:20880/com.foo.BarService");
        assert!(matches(rule.then(), &MatchContext::new(&same, None), &request));
        assert!(!matches(rule.then(), &MatchContext::new(&other, None), &request));
    }

    #[test]
    fn test_unresolved_placeholder_does_not_match() {
        let consumer = url("consumer://9.9.9.9/com.foo.BarService");
        let request = MatchContext::new(&consumer, None);
        let rule = Rule::parse("true => zone = $zone").unwrap();

        let provider = url("dubbo://9.9.9.9:20880/com.foo.BarService");
        assert!(!matches(rule.then(), &MatchContext::new(&provider, None), &request));
    }

    #[test]
    fn test_literal_conditions() {
        let consumer = url("consumer://1.1.1.1/s");
        let ctx = MatchContext::new(&consumer, None);
        assert!(matches(&Condition::True, &ctx, &ctx));
        assert!(!matches(&Condition::False, &ctx, &ctx));
        assert!(!matches(&Condition::Empty, &ctx, &ctx));
    }
}
