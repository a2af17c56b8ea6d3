//! Article metadata as handed over by the fetch collaborator.
//!
//! These types mirror the parts of a PubMed citation the report consumes.
//! They are plain data: decoding lives in [`crate::pubmed_xml`] and all
//! decisions about them live in [`crate::normalize`].

use serde::{Deserialize, Serialize};

/// One fetched citation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    /// Primary article identifier (PMID)
    pub pmid: String,
    /// Every `Article` element of the citation, in document order
    pub bodies: Vec<ArticleBody>,
    pub mesh_headings: Vec<MeshHeading>,
    /// External ids from the `ArticleIdList` (doi, pmc, pii, ...)
    pub article_ids: Vec<ArticleId>,
}

/// The bibliographic body of a citation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleBody {
    pub title: String,
    pub publication_types: Vec<String>,
    pub journal: Journal,
    /// Electronic publication date, used when the issue date is incomplete
    pub article_date: ArticleDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub title: String,
    pub issn: String,
    pub volume: String,
    pub issue: String,
    pub pub_date: PubDate,
}

/// Journal issue date. The month is kept as the textual label PubMed
/// gives ("Oct", "Spring", or sometimes a number).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PubDate {
    pub year: i32,
    pub month: String,
    pub day: i32,
}

/// Article date with a numeric month code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// A MeSH heading: one descriptor refined by zero or more qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshHeading {
    pub descriptor: MeshTerm,
    pub qualifiers: Vec<MeshTerm>,
}

/// Descriptor or qualifier name with its MeSH UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshTerm {
    pub name: String,
    pub ui: String,
    /// Literal `MajorTopicYN` attribute value
    pub major_topic_yn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleId {
    pub id: String,
    pub id_type: String,
}

impl MeshTerm {
    pub fn new(name: &str, ui: &str, major_topic_yn: &str) -> Self {
        Self {
            name: name.to_string(),
            ui: ui.to_string(),
            major_topic_yn: major_topic_yn.to_string(),
        }
    }
}

impl ArticleId {
    pub fn new(id: &str, id_type: &str) -> Self {
        Self {
            id: id.to_string(),
            id_type: id_type.to_string(),
        }
    }
}
