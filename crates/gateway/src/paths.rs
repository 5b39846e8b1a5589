//! Paths exempt from token verification at the edge.
//!
//! Three pattern shapes are supported:
//! - `/health` matches only `/health`
//! - `/static/*` matches exactly one non-empty segment below `/static`
//! - `/public/**` matches `/public` itself and everything below it

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// One segment below the prefix.
    Children(String),
    /// The prefix and any depth below it.
    Subtree(String),
}

impl PathPattern {
    /// Parse a configured pattern. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let pattern = if let Some(prefix) = raw.strip_suffix("/**") {
            PathPattern::Subtree(prefix.to_string())
        } else if let Some(prefix) = raw.strip_suffix("/*") {
            PathPattern::Children(prefix.to_string())
        } else {
            PathPattern::Exact(raw.to_string())
        };
        Some(pattern)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Children(prefix) => path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|segment| !segment.is_empty() && !segment.contains('/')),
            PathPattern::Subtree(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

impl core::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PathPattern::Exact(p) => f.write_str(p),
            PathPattern::Children(p) => write!(f, "{p}/*"),
            PathPattern::Subtree(p) => write!(f, "{p}/**"),
        }
    }
}

/// Whether `path` contains a `.` or `..` segment, raw or percent-encoded.
///
/// The upstream URL parser resolves these, so such a path could match an
/// excluded pattern here and land on a protected route upstream.
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

/// The configured set of excluded path patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedPathSet {
    patterns: Vec<PathPattern>,
}

impl ExcludedPathSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .filter_map(|p| PathPattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathPattern> {
        self.patterns.iter()
    }
}
