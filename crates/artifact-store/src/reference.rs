use std::fmt;
use std::str::FromStr;

use crate::errors::StoreError;

/// Which version of a named artifact a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    Latest,
    Version(u32),
    Alias(String),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str("latest"),
            VersionSelector::Version(version) => write!(f, "v{version}"),
            VersionSelector::Alias(alias) => f.write_str(alias),
        }
    }
}

/// `name[:selector]`, where the selector is `latest`, `vN`, or a custom alias. A bare name means `latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    pub name: String,
    pub selector: VersionSelector,
}

impl ArtifactRef {
    pub fn latest(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            selector: VersionSelector::Latest,
        })
    }

    pub fn parse(input: &str) -> Result<Self, StoreError> {
        let trimmed = input.trim();
        let invalid = |reason: &str| StoreError::InvalidReference {
            reference: input.to_string(),
            reason: reason.to_string(),
        };

        let (name, selector) = match trimmed.split_once(':') {
            Some((name, selector)) => (name, Some(selector)),
            None => (trimmed, None),
        };

        validate_name(name).map_err(|err| match err {
            StoreError::InvalidName { reason, .. } => invalid(&reason),
            other => other,
        })?;

        let selector = match selector {
            None | Some("latest") => VersionSelector::Latest,
            Some(raw) if looks_like_version(raw) => {
                let version = raw[1..]
                    .parse::<u32>()
                    .map_err(|_| invalid("version number out of range"))?;
                VersionSelector::Version(version)
            }
            Some(raw) => {
                validate_alias(raw).map_err(|err| match err {
                    StoreError::InvalidName { reason, .. } => invalid(&reason),
                    other => other,
                })?;
                VersionSelector::Alias(raw.to_string())
            }
        };

        Ok(Self {
            name: name.to_string(),
            selector,
        })
    }
}

impl FromStr for ArtifactRef {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactRef::parse(s)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.selector)
    }
}

fn looks_like_version(raw: &str) -> bool {
    raw.strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Aliases share the name character set, and cannot shadow `latest` or a `vN` selector.
pub fn validate_alias(alias: &str) -> Result<(), StoreError> {
    validate_name(alias)?;
    let reserved = alias == "latest" || looks_like_version(alias);
    if reserved {
        return Err(StoreError::InvalidName {
            name: alias.to_string(),
            reason: "alias cannot be 'latest' or look like a version".to_string(),
        });
    }
    Ok(())
}

/// Artifact names double as directory names, so only a conservative character set is allowed.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name cannot be a relative path component"));
    }
    if name.starts_with('.') {
        return Err(invalid("name cannot start with '.'"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(invalid(&format!("unsupported character '{bad}'")));
    }
    Ok(())
}
