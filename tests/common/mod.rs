#![allow(dead_code)]

use roxmltree::{Document, Node};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A report stylesheet with a nested table and a title block.
pub fn report_stylesheet() -> &'static str {
    r#"<?xml version="1.0"?>
<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="html"/>
  <xsl:template match="/report/title">
    <h1 class="title"><xsl:value-of select="."/></h1>
  </xsl:template>
  <xsl:template match="/report/summary">
    <div id="summary">
      <b>Total:</b>
      <span><xsl:value-of select="total"/></span>
    </div>
  </xsl:template>
  <xsl:template match="row[@kind='detail']">
    <td><xsl:value-of select="@name"/></td>
  </xsl:template>
</xsl:stylesheet>"#
}

/// One generated rule: its match pattern and the element names along the
/// skeleton chain, down to the `value-of` it ends in.
#[derive(Debug, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub skeleton: Vec<String>,
}

fn chain(node: Node) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        names.push(n.tag_name().name().to_string());
        current = n.children().find(|c| c.is_element());
    }
    names
}

pub fn rules(xml: &str) -> Result<Vec<Rule>, roxmltree::Error> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|rule| Rule {
            pattern: rule.attribute("match").unwrap_or_default().to_string(),
            skeleton: rule
                .children()
                .find(|c| c.is_element())
                .map(chain)
                .unwrap_or_default(),
        })
        .collect())
}
