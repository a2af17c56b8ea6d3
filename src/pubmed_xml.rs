//! EFetch XML decoder.
//!
//! Streams a `PubmedArticleSet` document with quick-xml and keeps only the
//! fields of [`RawArticle`]. Unknown elements are skipped; numeric date
//! parts that do not parse become 0 so an incomplete date falls through to
//! the next date source instead of failing the whole fetch.

use crate::article::{ArticleBody, ArticleId, MeshHeading, MeshTerm, RawArticle};
use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

/// Parse every `PubmedArticle` in an EFetch response body.
pub fn parse_article_set(xml: &str) -> Result<Vec<RawArticle>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PubmedArticle" => {
                articles.push(parse_article(&mut reader)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(count = articles.len(), "Decoded EFetch payload");
    Ok(articles)
}

fn parse_article(reader: &mut Reader<&[u8]>) -> Result<RawArticle> {
    let mut article = RawArticle::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(reader, &mut article)?,
                b"PubmedData" => parse_pubmed_data(reader, &mut article)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(article)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>, article: &mut RawArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"PMID" => article.pmid = read_text(reader)?,
                b"Article" => article.bodies.push(parse_article_body(reader)?),
                b"MeshHeadingList" => article.mesh_headings = parse_mesh_list(reader)?,
                // Cited articles carry their own PMID elements
                b"CommentsCorrectionsList" => skip_element(reader, b"CommentsCorrectionsList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_body(reader: &mut Reader<&[u8]>) -> Result<ArticleBody> {
    let mut body = ArticleBody::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ArticleTitle" => body.title = read_text_content(reader, b"ArticleTitle")?,
                b"Journal" => parse_journal(reader, &mut body)?,
                b"PublicationTypeList" => body.publication_types = parse_pub_type_list(reader)?,
                b"ArticleDate" => parse_article_date(reader, &mut body)?,
                b"Abstract" => skip_element(reader, b"Abstract")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}

fn parse_journal(reader: &mut Reader<&[u8]>, body: &mut ArticleBody) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ISSN" => body.journal.issn = read_text(reader)?,
                b"Title" => body.journal.title = read_text(reader)?,
                b"Volume" => body.journal.volume = read_text(reader)?,
                b"Issue" => body.journal.issue = read_text(reader)?,
                b"PubDate" => parse_pub_date(reader, body)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pub_date(reader: &mut Reader<&[u8]>, body: &mut ArticleBody) -> Result<()> {
    let date = &mut body.journal.pub_date;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = parse_number(&read_text(reader)?),
                b"Month" => date.month = read_text(reader)?,
                b"Day" => date.day = parse_number(&read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubDate" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_date(reader: &mut Reader<&[u8]>, body: &mut ArticleBody) -> Result<()> {
    let date = &mut body.article_date;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = parse_number(&read_text(reader)?),
                b"Month" => date.month = parse_number(&read_text(reader)?),
                b"Day" => date.day = parse_number(&read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"ArticleDate" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pub_type_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut types = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PublicationType" => {
                types.push(read_text(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"PublicationTypeList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(types)
}

fn parse_mesh_list(reader: &mut Reader<&[u8]>) -> Result<Vec<MeshHeading>> {
    let mut headings = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"MeshHeading" => {
                headings.push(parse_mesh_heading(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"MeshHeadingList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(headings)
}

fn parse_mesh_heading(reader: &mut Reader<&[u8]>) -> Result<MeshHeading> {
    let mut heading = MeshHeading::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"DescriptorName" => {
                    let mut term = mesh_term_attributes(&e);
                    term.name = read_text(reader)?;
                    heading.descriptor = term;
                }
                b"QualifierName" => {
                    let mut term = mesh_term_attributes(&e);
                    term.name = read_text(reader)?;
                    heading.qualifiers.push(term);
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MeshHeading" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(heading)
}

fn mesh_term_attributes(e: &BytesStart) -> MeshTerm {
    let mut term = MeshTerm::default();
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"UI" => term.ui = String::from_utf8_lossy(&attr.value).to_string(),
            b"MajorTopicYN" => {
                term.major_topic_yn = String::from_utf8_lossy(&attr.value).to_string()
            }
            _ => {}
        }
    }
    term
}

fn parse_pubmed_data(reader: &mut Reader<&[u8]>, article: &mut RawArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ArticleIdList" => article.article_ids = parse_article_id_list(reader)?,
                // References repeat ArticleIdList for every cited work
                b"ReferenceList" => skip_element(reader, b"ReferenceList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_id_list(reader: &mut Reader<&[u8]>) -> Result<Vec<ArticleId>> {
    let mut ids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"ArticleId" => {
                let mut id_type = String::new();
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"IdType" {
                        id_type = String::from_utf8_lossy(&attr.value).to_string();
                    }
                }
                let id = read_text(reader)?;
                ids.push(ArticleId { id, id_type });
            }
            Event::End(e) if e.name().as_ref() == b"ArticleIdList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

fn skip_element(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read text content until the next end tag
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => break,
            Event::Start(_) => text.push_str(&read_text(reader)?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Read the flattened text of an element that may contain inline markup
/// such as `<i>` or `<sub>`. Fragments are joined as they appear in the
/// source, so text trimming is off while the element is read.
fn read_text_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    reader.config_mut().trim_text(false);
    let text = collect_text_content(reader, end_tag);
    reader.config_mut().trim_text(true);
    Ok(text?.trim().to_string())
}

fn collect_text_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

fn parse_number(s: &str) -> i32 {
    s.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2019//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_190101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">11056661</PMID>
      <Article PubModel="Print">
        <Journal>
          <ISSN IssnType="Print">1465-9905</ISSN>
          <JournalIssue CitedMedium="Print">
            <Volume>1</Volume>
            <Issue>1</Issue>
            <PubDate>
              <Year>1999</Year>
              <Month>Oct</Month>
            </PubDate>
          </JournalIssue>
          <Title>Arthritis research</Title>
        </Journal>
        <ArticleTitle>Rett syndrome &amp; <i>MECP2</i> mutations.</ArticleTitle>
        <Abstract><AbstractText>Ignored.</AbstractText></Abstract>
        <PublicationTypeList>
          <PublicationType UI="D016454">Review</PublicationType>
          <PublicationType UI="D016428">Journal Article</PublicationType>
        </PublicationTypeList>
        <ArticleDate DateType="Electronic">
          <Year>2000</Year>
          <Month>02</Month>
          <Day>17</Day>
        </ArticleDate>
      </Article>
      <MeshHeadingList>
        <MeshHeading>
          <DescriptorName UI="D015518" MajorTopicYN="Y">Rett Syndrome</DescriptorName>
        </MeshHeading>
        <MeshHeading>
          <DescriptorName UI="D006801" MajorTopicYN="N">Humans</DescriptorName>
          <QualifierName UI="Q000235" MajorTopicYN="Y">genetics</QualifierName>
          <QualifierName UI="Q000473" MajorTopicYN="N">pathology</QualifierName>
        </MeshHeading>
      </MeshHeadingList>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="Cites"><PMID Version="1">999</PMID></CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">11056661</ArticleId>
        <ArticleId IdType="pmc">PMC17774</ArticleId>
      </ArticleIdList>
      <ReferenceList>
        <Reference>
          <ArticleIdList><ArticleId IdType="pmc">PMC1</ArticleId></ArticleIdList>
        </Reference>
      </ReferenceList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_parse_article_set() {
        let articles = parse_article_set(SAMPLE).expect("Parse failed");
        assert_eq!(articles.len(), 1);

        let article = &articles[0];
        assert_eq!(article.pmid, "11056661");
        assert_eq!(article.bodies.len(), 1);

        let body = &article.bodies[0];
        assert_eq!(body.title, "Rett syndrome & MECP2 mutations.");
        assert_eq!(body.publication_types, vec!["Review", "Journal Article"]);
        assert_eq!(body.journal.title, "Arthritis research");
        assert_eq!(body.journal.issn, "1465-9905");
        assert_eq!(body.journal.volume, "1");
        assert_eq!(body.journal.pub_date.year, 1999);
        assert_eq!(body.journal.pub_date.month, "Oct");
        assert_eq!(body.journal.pub_date.day, 0);
        assert_eq!(body.article_date.year, 2000);
        assert_eq!(body.article_date.month, 2);
        assert_eq!(body.article_date.day, 17);
    }

    #[test]
    fn test_parse_mesh_and_ids() {
        let articles = parse_article_set(SAMPLE).expect("Parse failed");
        let article = &articles[0];

        assert_eq!(article.mesh_headings.len(), 2);
        let humans = &article.mesh_headings[1];
        assert_eq!(humans.descriptor, MeshTerm::new("Humans", "D006801", "N"));
        assert_eq!(humans.qualifiers.len(), 2);
        assert_eq!(humans.qualifiers[0].major_topic_yn, "Y");

        // Reference-list ids must not leak into the citation's own ids
        assert_eq!(
            article.article_ids,
            vec![
                ArticleId::new("11056661", "pubmed"),
                ArticleId::new("PMC17774", "pmc"),
            ]
        );
    }

    #[test]
    fn test_medline_date_without_year() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>1</PMID>
            <Article><Journal><JournalIssue><PubDate>
              <MedlineDate>1998 Dec-1999 Jan</MedlineDate>
            </PubDate></JournalIssue></Journal></Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;

        let articles = parse_article_set(xml).expect("Parse failed");
        let date = &articles[0].bodies[0].journal.pub_date;
        assert_eq!(date.year, 0);
        assert!(date.month.is_empty());
    }

    #[test]
    fn test_title_inline_markup_keeps_source_spacing() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>2</PMID>
            <Article>
              <ArticleTitle>H<sub>2</sub>O in <i>Mecp2</i>-null mice.</ArticleTitle>
              <PublicationTypeList>
                <PublicationType>Review</PublicationType>
              </PublicationTypeList>
            </Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;

        let articles = parse_article_set(xml).expect("Parse failed");
        let body = &articles[0].bodies[0];
        assert_eq!(body.title, "H2O in Mecp2-null mice.");
        assert_eq!(body.publication_types, vec!["Review"]);
    }

    #[test]
    fn test_parse_empty_set() {
        let articles =
            parse_article_set("<PubmedArticleSet></PubmedArticleSet>").expect("Parse failed");
        assert!(articles.is_empty());
    }
}
