//! Mail-merge templates.
//!
//! A template is plain text with `{{column}}` placeholders. The text is
//! tokenized once with a logos lexer into literal and placeholder segments;
//! rendering walks the segments and never re-scans substituted values, so a
//! value that happens to contain `{{Other}}` is emitted as-is.
//!
//! # Rules
//!
//! - A placeholder is `{{`, then any run of characters without `{` or `}`,
//!   then `}}`. The name is matched against record columns exactly (no
//!   trimming, case-sensitive).
//! - A placeholder naming a column the record does not have is emitted
//!   verbatim.
//! - Anything else, including stray or unbalanced braces, is literal text.

use std::ops::Range;

use logos::Logos;

use goatpad_types::Record;

/// Raw pieces of template text.
///
/// Braces are always single-character tokens and `Text` never contains a
/// brace, so every token is unambiguous and the lexer cannot fail.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Piece {
    #[token("{")]
    Open,

    #[token("}")]
    Close,

    #[regex(r"[^{}]+")]
    Text,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// Byte range of literal text.
    Literal(Range<usize>),
    /// Byte range of the whole `{{name}}` token.
    Placeholder(Range<usize>),
}

/// A parsed template, immutable once built.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Tokenize template text.
    ///
    /// Placeholders are found leftmost first: `{{{Name}}` is a literal `{`
    /// followed by `{{Name}}`.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let tokens: Vec<(Piece, Range<usize>)> = Piece::lexer(&source)
            .spanned()
            .map(|(piece, span)| (piece.unwrap_or(Piece::Text), span))
            .collect();

        let mut segments: Vec<Segment> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if let Some(end) = placeholder_at(&tokens, i) {
                let span = tokens[i].1.start..tokens[end - 1].1.end;
                segments.push(Segment::Placeholder(span));
                i = end;
                continue;
            }

            let span = tokens[i].1.clone();
            match segments.last_mut() {
                Some(Segment::Literal(prev)) if prev.end == span.start => prev.end = span.end,
                _ => segments.push(Segment::Literal(span)),
            }
            i += 1;
        }

        Self { source, segments }
    }

    /// The original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names in order of first use.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(span) = segment {
                let name = self.name_of(span);
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder the record can satisfy.
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(span) => out.push_str(&self.source[span.clone()]),
                Segment::Placeholder(span) => match record.get(self.name_of(span)) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&self.source[span.clone()]),
                },
            }
        }
        out
    }

    /// Column name inside a `{{name}}` span.
    fn name_of(&self, span: &Range<usize>) -> &str {
        &self.source[span.start + 2..span.end - 2]
    }
}

/// If `{{`, optional text, `}}` starts at token `i`, the index just past it.
fn placeholder_at(tokens: &[(Piece, Range<usize>)], i: usize) -> Option<usize> {
    let kind = |k: usize| tokens.get(i + k).map(|(piece, _)| *piece);
    if kind(0) != Some(Piece::Open) || kind(1) != Some(Piece::Open) {
        return None;
    }
    let close = if kind(2) == Some(Piece::Text) { 3 } else { 2 };
    (kind(close) == Some(Piece::Close) && kind(close + 1) == Some(Piece::Close))
        .then_some(i + close + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Record {
        Record::new().with("Name", "Ada").with("ID", "7")
    }

    #[test]
    fn test_letter_scenario() {
        let template = Template::parse("Dear {{Name}},\nYour ID is {{ID}}.");
        assert_eq!(template.render(&ada()), "Dear Ada,\nYour ID is 7.");
    }

    #[test]
    fn test_unknown_placeholder_kept_verbatim() {
        let template = Template::parse("Hi {{Name}} from {{City}}");
        assert_eq!(template.render(&ada()), "Hi Ada from {{City}}");
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = Template::parse("{{Name}}{{Name}} {{Name}}");
        assert_eq!(template.render(&ada()), "AdaAda Ada");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let record = Record::new().with("A", "{{B}}").with("B", "oops");
        let template = Template::parse("{{A}} {{B}}");
        assert_eq!(template.render(&record), "{{B}} oops");
    }

    #[test]
    fn test_placeholders_in_first_use_order() {
        let template = Template::parse("{{ID}} {{Name}} {{ID}} {{}}");
        assert_eq!(template.placeholders(), vec!["ID", "Name", ""]);
    }

    #[test]
    fn test_odd_brace_run_before_placeholder() {
        let template = Template::parse("{{{Name}}");
        assert_eq!(template.render(&ada()), "{Ada");
        assert_eq!(template.placeholders(), vec!["Name"]);

        let record = Record::new().with("Na", "X");
        assert_eq!(Template::parse("{{{Na}}").render(&record), "{X");
        assert_eq!(Template::parse("{{{{Na}}").render(&record), "{{X");
        assert_eq!(Template::parse("{{{{{Na}}}}").render(&record), "{{{X}}");
    }

    #[test]
    fn test_empty_template() {
        let template = Template::parse("");
        assert_eq!(template.render(&ada()), "");
        assert!(template.placeholders().is_empty());
    }

    #[test]
    fn test_source_round_trips_without_placeholders() {
        let text = "no {placeholders} here }} {{ nor { here";
        let template = Template::parse(text);
        assert_eq!(template.source(), text);
        assert_eq!(template.render(&ada()), text);
    }
}
