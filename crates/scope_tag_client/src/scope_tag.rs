//! Identifier types and the list rules applied to an app's scope tags.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::error::ValidationError;

lazy_static! {
    static ref SCOPE_TAG_ID: Regex = Regex::new(r"^[0-9]+$").expect("scope tag pattern");
}

/// Hyphenated UUID naming a mobile app record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppId(String);

impl AppId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource_path(&self) -> String {
        format!("deviceAppManagement/mobileApps/{}", self.0)
    }
}

impl FromStr for AppId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Uuid::try_parse also accepts the simple and braced forms.
        if trimmed.len() != 36 || Uuid::try_parse(trimmed).is_err() {
            return Err(ValidationError::InvalidAppId(s.to_string()));
        }
        Ok(AppId(trimmed.to_string()))
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric role scope tag identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeTagId(String);

impl ScopeTagId {
    pub const DEFAULT: &'static str = "0";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl FromStr for ScopeTagId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !SCOPE_TAG_ID.is_match(trimmed) {
            return Err(ValidationError::InvalidScopeTagId(s.to_string()));
        }
        Ok(ScopeTagId(trimmed.to_string()))
    }
}

impl fmt::Display for ScopeTagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do with an app's tag list after applying a requested change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTagPlan {
    /// Submit this list.
    Update(Vec<String>),
    /// Requested tag already assigned and nothing else to change.
    AlreadyPresent,
    /// Requested tag to remove is not assigned.
    NotPresent,
    /// The change would leave the app with no tags at all.
    WouldEmptyList,
}

/// Adds `tag` once and, when asked, drops every default tag provided the
/// list holds more than one entry after the addition.
pub fn plan_add(current: &[String], tag: &ScopeTagId, remove_default: bool) -> ScopeTagPlan {
    let mut working = current.to_vec();
    let mut update_required = false;
    let mut duplicate = false;

    if working.iter().any(|t| t == tag.as_str()) {
        duplicate = true;
    } else {
        working.push(tag.as_str().to_string());
        update_required = true;
    }

    if remove_default && working.len() > 1 {
        if working.iter().any(|t| t == ScopeTagId::DEFAULT) {
            working.retain(|t| t != ScopeTagId::DEFAULT);
            update_required = true;
        } else {
            log::debug!("Default scope tag not assigned, nothing to remove");
        }
    }

    if !working.is_empty() && update_required {
        ScopeTagPlan::Update(working)
    } else if duplicate && !update_required {
        ScopeTagPlan::AlreadyPresent
    } else {
        ScopeTagPlan::WouldEmptyList
    }
}

/// Removes every occurrence of `tag` unless nothing would be left.
pub fn plan_remove(current: &[String], tag: &ScopeTagId) -> ScopeTagPlan {
    if !current.iter().any(|t| t == tag.as_str()) {
        return ScopeTagPlan::NotPresent;
    }
    let remaining: Vec<String> = current
        .iter()
        .filter(|t| *t != tag.as_str())
        .cloned()
        .collect();
    if remaining.is_empty() {
        ScopeTagPlan::WouldEmptyList
    } else {
        ScopeTagPlan::Update(remaining)
    }
}
