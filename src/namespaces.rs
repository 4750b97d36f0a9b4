//! # Namespace Index
//!
//! Distinct target namespaces of a template set, in first-seen order.
//! One list call is made per entry.

use crate::model::SecretTemplate;

#[must_use]
pub fn template_namespaces(templates: &[SecretTemplate]) -> Vec<String> {
    let mut namespaces: Vec<String> = Vec::new();
    for template in templates {
        if !namespaces.contains(&template.namespace) {
            namespaces.push(template.namespace.clone());
        }
    }
    namespaces
}
