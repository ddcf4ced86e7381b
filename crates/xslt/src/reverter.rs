//! Reverses a stylesheet: for every value an XSLT template writes into its
//! output, produces a template that matches that value in the output and
//! writes it back into the shape of the original template's input.

use crate::config::{ReverterConfig, XSLT_NAMESPACE};
use crate::datasources::{DataSourceNode, XmlDocument, XmlNode};
use crate::error::XsltError;
use crate::output::{ElementId, OutputDocument};
use crate::synthesis::PathSynthesizer;
use crate::upstairs::{NamespaceUri, UpstairsBuilder};
use tronsfarmer_xpath1::parse_expression;

/// Outcome counts of one reversal, one entry per generated rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReverterReport {
    /// Rules with a synthesized skeleton.
    pub reversed: usize,
    /// Rules emitted without a skeleton because the match pattern is not a
    /// plain element path.
    pub declined: usize,
    /// Instructions dropped because the template's match pattern is missing
    /// or malformed.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Reverter {
    config: ReverterConfig,
    synthesizer: PathSynthesizer,
}

impl Reverter {
    pub fn new(config: ReverterConfig) -> Self {
        let synthesizer = PathSynthesizer::new(config.skeleton_root_name.as_str());
        Self {
            config,
            synthesizer,
        }
    }

    pub fn config(&self) -> &ReverterConfig {
        &self.config
    }

    pub fn revert(&self, stylesheet: &str) -> Result<String, XsltError> {
        self.revert_with_report(stylesheet).map(|(xml, _)| xml)
    }

    pub fn revert_with_report(&self, stylesheet: &str) -> Result<(String, ReverterReport), XsltError> {
        let doc = XmlDocument::parse(stylesheet)?;
        let (output, report) = self.revert_document(&doc)?;
        let xml = output.to_xml_string(self.config.indent)?;
        Ok((xml, report))
    }

    pub fn revert_document(&self, doc: &XmlDocument<'_>) -> Result<(OutputDocument, ReverterReport), XsltError> {
        let root = doc.root_element();
        if !root.is_element_named(XSLT_NAMESPACE, "stylesheet")
            && !root.is_element_named(XSLT_NAMESPACE, "transform")
        {
            let found = root.name().map(|q| q.to_string()).unwrap_or_default();
            return Err(XsltError::TemplateStructure {
                message: format!("expected an xsl:stylesheet document element, found '{found}'"),
                location: doc.location(root),
            });
        }

        let mut output = OutputDocument::new();
        let stylesheet = output.create_element("xsl:stylesheet");
        output.declare_namespace("xsl", XSLT_NAMESPACE);
        output.set_attribute(stylesheet, "version", "1.0");
        output.set_root(stylesheet);

        let mut report = ReverterReport::default();
        let templates: Vec<XmlNode<'_, '_>> = root
            .children()
            .filter(|n| n.is_element_named(XSLT_NAMESPACE, "template"))
            .collect();

        // Later templates take priority in XSLT conflict resolution; emitting
        // them first keeps that order in the reversed stylesheet.
        for template in templates.into_iter().rev() {
            self.revert_template(doc, template, &mut output, stylesheet, &mut report);
        }

        log::debug!(
            "Reversed stylesheet: {} rules with skeletons, {} without, {} skipped",
            report.reversed,
            report.declined,
            report.skipped
        );
        Ok((output, report))
    }

    fn revert_template<'a>(
        &self,
        doc: &XmlDocument<'_>,
        template: XmlNode<'a, 'a>,
        output: &mut OutputDocument,
        stylesheet: ElementId,
        report: &mut ReverterReport,
    ) {
        let location = doc.location(template);
        let mut instructions: Vec<XmlNode<'a, 'a>> = template
            .descendant_elements()
            .filter(|n| n.is_element_named(XSLT_NAMESPACE, "value-of"))
            .collect();
        if self.config.reverse_apply_templates {
            instructions.extend(
                template
                    .descendant_elements()
                    .filter(|n| n.is_element_named(XSLT_NAMESPACE, "apply-templates")),
            );
        }
        if instructions.is_empty() {
            return;
        }

        let Some(pattern) = template.attribute("match") else {
            log::warn!("Skipping template at {location}: it has no match pattern");
            report.skipped += instructions.len();
            return;
        };
        let path = match parse_expression(pattern) {
            Ok(path) => path,
            Err(e) => {
                log::warn!(
                    "Skipping template at {location}: {}",
                    e.detailed_message()
                );
                report.skipped += instructions.len();
                return;
            }
        };

        let upstairs = UpstairsBuilder::new(NamespaceUri(&self.config.wrapper_namespace));
        for instruction in instructions {
            let predicate = upstairs.build(instruction, template);
            let text_match = if predicate.is_empty() {
                "//text()".to_string()
            } else {
                format!("//text()[{predicate}]")
            };

            let rule = output.create_element("xsl:template");
            output.set_attribute(rule, "match", &text_match);
            output.append_child(stylesheet, rule);

            match self.synthesizer.synthesize(&path, output) {
                Some(skeleton) => {
                    output.append_child(rule, skeleton.root);
                    for attachment in skeleton.attachments {
                        let value_of = output.create_element("xsl:value-of");
                        output.set_attribute(value_of, "select", ".");
                        output.append_child(attachment, value_of);
                    }
                    report.reversed += 1;
                }
                None => {
                    log::info!(
                        "Template at {location} matches '{pattern}', which has no element skeleton; \
                         emitting rule '{text_match}' without one"
                    );
                    report.declined += 1;
                }
            }
        }
    }
}
