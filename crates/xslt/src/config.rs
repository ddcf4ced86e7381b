use crate::error::XsltError;
use serde::{Deserialize, Serialize};

/// The namespace of XSLT instructions.
pub const XSLT_NAMESPACE: &str = "http://www.w3.org/1999/XSL/Transform";

/// Name given to the element synthesized for a bare `/` match.
pub const DEFAULT_SKELETON_ROOT: &str = "any-given-root";

/// Configuration for reversing a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverterConfig {
    /// Elements in this namespace are structural wrappers (template
    /// instructions); upstairs predicates stop at the first one.
    pub wrapper_namespace: String,
    pub skeleton_root_name: String,
    /// Also reverse `xsl:apply-templates`, not only `xsl:value-of`.
    pub reverse_apply_templates: bool,
    /// Spaces per indentation level of the output. `None` writes compact XML.
    pub indent: Option<usize>,
}

impl Default for ReverterConfig {
    fn default() -> Self {
        Self {
            wrapper_namespace: XSLT_NAMESPACE.to_string(),
            skeleton_root_name: DEFAULT_SKELETON_ROOT.to_string(),
            reverse_apply_templates: false,
            indent: Some(2),
        }
    }
}

impl ReverterConfig {
    /// Reads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, XsltError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, XsltError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
