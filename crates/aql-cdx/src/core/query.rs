use chrono::{DateTime, Utc};

use crate::data::{MatchScope, format_timestamp};
use crate::error::{Error, Result};

/// A discovery request as the caller phrased it.
///
/// The pattern may carry wildcard shorthand: a leading `*.` implies
/// [`MatchScope::Domain`] and a trailing `*` implies [`MatchScope::Prefix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureQuery {
    pub pattern: String,
    pub scope:   Option<MatchScope>,
    pub from:    Option<DateTime<Utc>>,
    pub to:      Option<DateTime<Utc>>,
}

impl CaptureQuery {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            scope:   None,
            from:    None,
            to:      None,
        }
    }

    #[must_use]
    pub fn scope(mut self, scope: MatchScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Strip wildcard shorthand and settle on one explicit scope.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyPattern`] when nothing is left after stripping
    /// - [`Error::AmbiguousPattern`] for `*.host/path*`
    /// - [`Error::ScopeConflict`] when the shorthand and the explicit scope disagree
    pub fn resolve(&self) -> Result<ResolvedQuery> {
        let pattern = self.pattern.trim();
        let (url, implied) = match (pattern.strip_prefix("*."), pattern.strip_suffix('*')) {
            (Some(_), Some(_)) => {
                return Err(Error::AmbiguousPattern {
                    pattern: pattern.to_string(),
                });
            }
            (Some(rest), None) => (rest, Some(MatchScope::Domain)),
            (None, Some(rest)) => (rest, Some(MatchScope::Prefix)),
            (None, None) => (pattern, None),
        };
        if url.is_empty() {
            return Err(Error::EmptyPattern);
        }

        let scope = match (self.scope, implied) {
            (Some(explicit), Some(implied)) if explicit != implied => {
                return Err(Error::ScopeConflict {
                    pattern: pattern.to_string(),
                    explicit,
                    implied,
                });
            }
            (Some(scope), _) | (None, Some(scope)) => scope,
            (None, None) => MatchScope::Exact,
        };

        Ok(ResolvedQuery {
            url: url.to_string(),
            scope,
            from: self.from,
            to: self.to,
        })
    }
}

/// A query with no shorthand left, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub url:   String,
    pub scope: MatchScope,
    pub from:  Option<DateTime<Utc>>,
    pub to:    Option<DateTime<Utc>>,
}

impl ResolvedQuery {
    /// Query parameters shared by the probe and every page request.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("url", self.url.clone()),
            ("matchType", self.scope.as_str().to_string()),
            ("output", "json".to_string()),
        ];
        if let Some(from) = &self.from {
            params.push(("from", format_timestamp(from)));
        }
        if let Some(to) = &self.to {
            params.push(("to", format_timestamp(to)));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn plain_pattern_defaults_to_exact() {
        let resolved = CaptureQuery::new("example.com/page").resolve().unwrap();
        assert_eq!(resolved.url, "example.com/page");
        assert_eq!(resolved.scope, MatchScope::Exact);
    }

    #[test]
    fn wildcards_imply_scope() {
        let domain = CaptureQuery::new("*.example.com").resolve().unwrap();
        assert_eq!((domain.url.as_str(), domain.scope), ("example.com", MatchScope::Domain));

        let prefix = CaptureQuery::new("example.com/docs/*").resolve().unwrap();
        assert_eq!((prefix.url.as_str(), prefix.scope), ("example.com/docs/", MatchScope::Prefix));
    }

    #[test]
    fn matching_explicit_scope_is_accepted() {
        let resolved = CaptureQuery::new("*.example.com")
            .scope(MatchScope::Domain)
            .resolve()
            .unwrap();
        assert_eq!(resolved.scope, MatchScope::Domain);
    }

    #[test]
    fn conflicting_scope_is_rejected() {
        let err = CaptureQuery::new("example.com/*")
            .scope(MatchScope::Host)
            .resolve()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ScopeConflict {
                explicit: MatchScope::Host,
                implied: MatchScope::Prefix,
                ..
            }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn doubly_wildcarded_pattern_is_ambiguous() {
        assert!(matches!(
            CaptureQuery::new("*.example.com/*").resolve(),
            Err(Error::AmbiguousPattern { .. })
        ));
        assert!(matches!(CaptureQuery::new("*").resolve(), Err(Error::EmptyPattern)));
    }

    #[test]
    fn params_include_time_bounds() {
        let resolved = CaptureQuery::new("example.com")
            .scope(MatchScope::Host)
            .from(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap())
            .to(Utc.with_ymd_and_hms(2020, 6, 30, 23, 59, 59).unwrap())
            .resolve()
            .unwrap();

        assert_eq!(
            resolved.params(),
            vec![
                ("url", "example.com".to_string()),
                ("matchType", "host".to_string()),
                ("output", "json".to_string()),
                ("from", "20190101000000".to_string()),
                ("to", "20200630235959".to_string()),
            ]
        );
    }
}
