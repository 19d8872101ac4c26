//! npm version specifiers and version selection.
//!
//! npm ranges are close to, but not the same as, the `semver` crate's
//! requirement syntax:
//! - bare versions are exact (`1.2.3`) or x-ranges (`1.2`, `1.x`), where
//!   `semver` would read them as caret requirements
//! - comparators are separated by whitespace rather than commas
//! - `a - b` hyphen ranges and `||` unions exist
//! - anything that is not a range may name a dist-tag (`next`, `beta`)
//!
//! [`VersionSpec::parse`] translates a specifier into a list of
//! [`VersionReq`] alternatives; [`select_version`] then picks the version the
//! npm client would install.

use semver::{Version, VersionReq};

use npmgraph_util::errors::GraphError;

use crate::packument::Packument;

/// A parsed dependency version specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// No constraint: whatever the `latest` dist-tag names.
    Latest,
    /// A dist-tag other than `latest`.
    Tag(String),
    /// One or more alternatives joined by `||`.
    Range(Vec<VersionReq>),
}

const OPERATORS: &[&str] = &[">=", "<=", ">", "<", "=", "^", "~"];

impl VersionSpec {
    /// Parse an npm specifier. `None`, empty, `*` and `latest` all mean
    /// [`VersionSpec::Latest`].
    pub fn parse(spec: Option<&str>) -> miette::Result<Self> {
        let spec = spec.map(str::trim).unwrap_or("");
        if spec.is_empty() || spec == "*" || spec == "latest" {
            return Ok(Self::Latest);
        }
        if is_non_registry(spec) {
            return Err(GraphError::Registry {
                message: format!("Unsupported dependency specifier '{spec}'"),
            }
            .into());
        }

        let mut alternatives = Vec::new();
        for alt in spec.split("||") {
            match translate(alt.trim()) {
                Some(req) => alternatives.push(req),
                None if is_tag_name(spec) => return Ok(Self::Tag(spec.to_string())),
                None => {
                    return Err(GraphError::Registry {
                        message: format!("Invalid version range '{spec}'"),
                    }
                    .into())
                }
            }
        }
        Ok(Self::Range(alternatives))
    }

    fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Latest => version.pre.is_empty(),
            Self::Tag(_) => false,
            Self::Range(reqs) => reqs.iter().any(|r| r.matches(version)),
        }
    }
}

/// Pick the version of `packument` that satisfies `spec`.
///
/// A specifier naming a published version verbatim wins outright. Otherwise,
/// like the npm client, the `latest` dist-tag is preferred when it
/// satisfies the range, then the highest satisfying version.
pub fn select_version(packument: &Packument, spec: Option<&str>) -> miette::Result<String> {
    if let Some(exact) = spec.map(str::trim).filter(|s| packument.versions.contains_key(*s)) {
        return Ok(exact.to_string());
    }

    let parsed = VersionSpec::parse(spec)?;
    let no_match = || -> miette::Report {
        GraphError::Registry {
            message: format!(
                "No version of {} matches '{}'",
                packument.name,
                spec.unwrap_or("latest")
            ),
        }
        .into()
    };

    if let VersionSpec::Tag(ref tag) = parsed {
        return packument
            .dist_tags
            .get(tag)
            .filter(|v| packument.versions.contains_key(v.as_str()))
            .cloned()
            .ok_or_else(no_match);
    }

    if let Some(latest) = packument.latest_tag() {
        let latest_ok = match parsed {
            VersionSpec::Latest => true,
            _ => Version::parse(latest).is_ok_and(|v| parsed.matches(&v)),
        };
        if latest_ok {
            return Ok(latest.to_string());
        }
    }

    let best = packument
        .versions
        .keys()
        .filter_map(|raw| Version::parse(raw).ok().map(|v| (v, raw)))
        .filter(|(v, _)| parsed.matches(v))
        .max_by(|a, b| a.0.cmp(&b.0));
    if let Some((_, raw)) = best {
        return Ok(raw.clone());
    }

    // Packages that only ever published prereleases have no stable latest.
    if parsed == VersionSpec::Latest {
        if let Some((_, raw)) = packument
            .versions
            .keys()
            .filter_map(|raw| Version::parse(raw).ok().map(|v| (v, raw)))
            .max_by(|a, b| a.0.cmp(&b.0))
        {
            return Ok(raw.clone());
        }
    }

    Err(no_match())
}

/// Specifiers that point outside the registry: local paths, git, tarball
/// URLs, workspace protocol, GitHub shorthand.
fn is_non_registry(spec: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "file:",
        "link:",
        "workspace:",
        "git:",
        "git+",
        "github:",
        "http:",
        "https:",
        "./",
        "../",
        "/",
        "~/",
    ];
    PREFIXES.iter().any(|p| spec.starts_with(p)) || (spec.contains('/') && !spec.contains(' '))
}

fn is_tag_name(spec: &str) -> bool {
    let mut chars = spec.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Translate one `||` alternative into a `semver` requirement.
fn translate(alt: &str) -> Option<VersionReq> {
    if alt.is_empty() {
        return Some(VersionReq::STAR);
    }

    if let Some((low, high)) = alt.split_once(" - ") {
        let low = normalize_partial(low.trim())?;
        let high = normalize_partial(high.trim())?;
        let mut comparators = Vec::new();
        if !low.is_empty() {
            comparators.push(format!(">={low}"));
        }
        if !high.is_empty() {
            comparators.push(format!("<={high}"));
        }
        return parse_req(&comparators);
    }

    // Glue detached operators onto their version: `>= 1.2` -> `>=1.2`.
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in alt.split_whitespace() {
        if OPERATORS.contains(&token) {
            pending_op = Some(token);
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{op}{token}")),
            None => tokens.push(token.to_string()),
        }
    }
    if pending_op.is_some() {
        return None;
    }

    let mut comparators = Vec::new();
    for token in &tokens {
        let (op, version) = split_operator(token);
        let version = normalize_partial(version)?;
        if version.is_empty() {
            // `*`, `x`, `>=*`: no constraint from this comparator.
            continue;
        }
        let op = if op.is_empty() { "=" } else { op };
        comparators.push(format!("{op}{version}"));
    }
    parse_req(&comparators)
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

/// Strip a leading `v`/`=` and drop wildcard components, leaving a partial
/// version `semver` understands (`1.x.x` -> `1`, `*` -> ``).
fn normalize_partial(version: &str) -> Option<String> {
    let version = version.trim_start_matches('=').trim_start_matches(['v', 'V']);
    if version.is_empty() {
        return Some(String::new());
    }
    // Prerelease and build suffixes only follow a complete version.
    if version.contains(['-', '+']) {
        return Some(version.to_string());
    }
    let mut parts = Vec::new();
    for part in version.split('.') {
        if matches!(part, "x" | "X" | "*") {
            break;
        }
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        parts.push(part);
    }
    if parts.len() > 3 {
        return None;
    }
    Some(parts.join("."))
}

fn parse_req(comparators: &[String]) -> Option<VersionReq> {
    if comparators.is_empty() {
        return Some(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}
