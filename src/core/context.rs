//! Release context - values available to notification templates

use crate::core::step::StageKind;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;

/// Placeholder text for values that are not known yet
pub const UNKNOWN: &str = "unknown";

/// What is known about the release being deployed
///
/// Filled in as stages run; whatever is still missing when a message is
/// rendered shows up as `unknown`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseContext {
    /// Version being deployed (`git describe` of the deploy target)
    pub version: Option<String>,

    /// Version the checkout was at before the update
    pub old_version: Option<String>,

    /// Author of the deployed commit
    pub author: Option<String>,

    /// Measured coverage percentage
    pub coverage: Option<f64>,

    /// Required coverage percentage
    pub min_coverage: Option<f64>,

    /// Stage that failed, if any
    pub stage: Option<StageKind>,

    /// Error of the failed stage, if any
    pub error: Option<String>,
}

impl ReleaseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// All template variables, unknown values included
    pub fn variables(&self) -> HashMap<&'static str, String> {
        let known = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());

        HashMap::from([
            ("version", known(self.version.clone())),
            ("old_version", known(self.old_version.clone())),
            ("author", known(self.author.clone())),
            ("coverage", known(self.coverage.map(|c| c.to_string()))),
            ("min_coverage", known(self.min_coverage.map(|c| c.to_string()))),
            ("stage", known(self.stage.map(|s| s.name().to_string()))),
            ("error", known(self.error.clone())),
        ])
    }

    /// Render a template, replacing `{{ name }}` placeholders
    ///
    /// Spaces inside the braces are optional. Names that are not template
    /// variables render as `unknown`.
    pub fn render(&self, template: &str) -> String {
        let Ok(placeholder) = Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}") else {
            return template.to_string();
        };
        let variables = self.variables();

        placeholder
            .replace_all(template, |caps: &Captures| {
                variables
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN.to_string())
            })
            .into_owned()
    }
}
