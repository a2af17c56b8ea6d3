//! Display date for an article.
//!
//! The journal issue date is preferred. When its year is 0 or its month
//! label is empty, the article date is used instead. The month is printed
//! as the chosen source has it, so issue dates read "Oct-1999" while
//! article dates read "10-1999".

use crate::article::ArticleBody;
use std::fmt;

/// Which date field a display date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    JournalIssue,
    ArticleDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDate {
    pub source: DateSource,
    pub text: String,
}

impl fmt::Display for DisplayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Pick the date source for an article body and render `<month>-<year>`.
pub fn resolve(body: &ArticleBody) -> DisplayDate {
    let issue = &body.journal.pub_date;
    if issue.year != 0 && !issue.month.is_empty() {
        return DisplayDate {
            source: DateSource::JournalIssue,
            text: format!("{}-{}", issue.month, issue.year),
        };
    }

    let alternate = &body.article_date;
    DisplayDate {
        source: DateSource::ArticleDate,
        text: format!("{}-{}", alternate.month, alternate.year),
    }
}
