//! Package manifest metadata as published in an npm packument's `versions`
//! map.
//!
//! Registry data is loosely typed: dependency maps may be missing, `null`, or
//! hold non-string ranges; `license` may be a string, an object or a legacy
//! `licenses` array; maintainers may be objects or `"Name <email>"` strings.
//! Every field deserializes leniently so a malformed value degrades to
//! "absent" instead of failing the whole document.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The subset of a published `package.json` that npmgraph cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_deps")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_deps")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_deps")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_license")]
    pub license: Option<String>,
    /// Legacy `licenses: [{ "type": "MIT" }]` form.
    #[serde(default, deserialize_with = "lenient_licenses")]
    pub licenses: Vec<String>,
    #[serde(default, deserialize_with = "lenient_people")]
    pub maintainers: Vec<Person>,
    /// Set when the registry could not supply real metadata for this package.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stub: bool,
}

/// A maintainer or author entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Person {
    /// Parse the npm shorthand `"Name <email> (url)"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (name, rest) = match s.find(['<', '(']) {
            Some(idx) => (&s[..idx], &s[idx..]),
            None => (s, ""),
        };
        let email = rest
            .strip_prefix('<')
            .and_then(|r| r.split_once('>'))
            .map(|(email, _)| email.trim().to_string())
            .filter(|e| !e.is_empty());
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            email,
        })
    }
}

impl PackageManifest {
    /// Union of runtime, dev and peer dependencies, keyed by dependency name.
    ///
    /// Later maps win for a name declared in several: peer over dev over
    /// runtime.
    pub fn all_dependencies(&self) -> BTreeMap<String, String> {
        let mut all = self.dependencies.clone();
        all.extend(
            self.dev_dependencies
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        all.extend(
            self.peer_dependencies
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        all
    }

    /// The declared license expression, falling back to the legacy array
    /// joined with `OR`.
    pub fn license_string(&self) -> Option<String> {
        if let Some(ref license) = self.license {
            return Some(license.clone());
        }
        if self.licenses.is_empty() {
            None
        } else {
            Some(self.licenses.join(" OR "))
        }
    }

    /// Maintainer display names in declaration order.
    pub fn maintainer_names(&self) -> Vec<&str> {
        self.maintainers.iter().map(|p| p.name.as_str()).collect()
    }
}

fn lenient_deps<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(name, range)| match range {
                Value::String(range) => Some((name, range)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    })
}

fn license_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => obj.get("type").and_then(license_name),
        _ => None,
    }
}

fn lenient_license<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Array(items) => items.iter().find_map(license_name),
        other => license_name(&other),
    })
}

fn lenient_licenses<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.iter().filter_map(license_name).collect(),
        other => license_name(&other).into_iter().collect(),
    })
}

fn lenient_people<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Person>, D::Error> {
    let Value::Array(items) = Value::deserialize(d)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Person::parse(&s),
            Value::Object(obj) => {
                let name = obj.get("name")?.as_str()?.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let email = obj
                    .get("email")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(Person { name, email })
            }
            _ => None,
        })
        .collect())
}
