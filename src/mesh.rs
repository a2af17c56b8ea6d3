//! Major-topic classification of MeSH headings.

use crate::article::{MeshHeading, MeshTerm};
use serde::{Deserialize, Serialize};

/// Literal flag value marking a major topic
const MAJOR_TOPIC_FLAG: &str = "Y";

/// A major subject of an article: the heading's descriptor name and UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub id: String,
}

impl From<&MeshTerm> for Subject {
    fn from(term: &MeshTerm) -> Self {
        Self {
            name: term.name.clone(),
            id: term.ui.clone(),
        }
    }
}

fn is_flagged(term: &MeshTerm) -> bool {
    term.major_topic_yn == MAJOR_TOPIC_FLAG
}

/// A heading is major if its descriptor or any of its qualifiers is
/// flagged as a major topic.
pub fn is_major(heading: &MeshHeading) -> bool {
    is_flagged(&heading.descriptor) || heading.qualifiers.iter().any(is_flagged)
}

/// Descriptors of the major headings, in input order.
pub fn major_subjects(headings: &[MeshHeading]) -> Vec<Subject> {
    headings
        .iter()
        .filter(|h| is_major(h))
        .map(|h| Subject::from(&h.descriptor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(descriptor: (&str, &str, &str), qualifier_flags: &[&str]) -> MeshHeading {
        MeshHeading {
            descriptor: MeshTerm::new(descriptor.0, descriptor.1, descriptor.2),
            qualifiers: qualifier_flags
                .iter()
                .map(|flag| MeshTerm::new("genetics", "Q000235", flag))
                .collect(),
        }
    }

    #[test]
    fn test_descriptor_flag() {
        assert!(is_major(&heading(("Rett Syndrome", "D015518", "Y"), &[])));
        assert!(!is_major(&heading(("Humans", "D006801", "N"), &[])));
    }

    #[test]
    fn test_qualifier_flag_makes_heading_major() {
        assert!(is_major(&heading(("Humans", "D006801", "N"), &["N", "Y"])));
        assert!(!is_major(&heading(("Humans", "D006801", "N"), &["N", "N"])));
    }

    #[test]
    fn test_flag_is_literal() {
        assert!(!is_major(&heading(("Humans", "D006801", "y"), &["yes"])));
        assert!(!is_major(&heading(("Humans", "D006801", ""), &[])));
    }

    #[test]
    fn test_major_subjects_keeps_order() {
        let headings = vec![
            heading(("Rett Syndrome", "D015518", "Y"), &[]),
            heading(("Humans", "D006801", "N"), &[]),
            heading(("Methyl-CpG-Binding Protein 2", "D051179", "N"), &["Y"]),
        ];

        let subjects = major_subjects(&headings);
        assert_eq!(
            subjects,
            vec![
                Subject {
                    name: "Rett Syndrome".to_string(),
                    id: "D015518".to_string()
                },
                Subject {
                    name: "Methyl-CpG-Binding Protein 2".to_string(),
                    id: "D051179".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_no_headings() {
        assert!(major_subjects(&[]).is_empty());
    }
}
