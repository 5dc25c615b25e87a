use logos::Logos;
use std::fmt;

/// Token type for definition documents.
///
/// Tag interiors are tokenized by logos. Element content between tags is
/// taken verbatim as `Text` runs, so quotes and whitespace in it survive.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<` opening a start tag.
    Open,
    /// `</` opening an end tag.
    OpenClose,
    /// `>` closing a tag.
    Close,
    /// `/>` closing an empty element.
    SelfClose,
    /// `=` between an attribute name and value.
    Eq,
    /// Single- or double-quoted attribute value, entities decoded.
    Str(String),
    /// Element content: a raw text run with entities decoded, or a CDATA
    /// section verbatim.
    Text(String),
    /// Bare name inside a tag: a tag name, attribute name or unquoted value.
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => write!(f, "<"),
            Token::OpenClose => write!(f, "</"),
            Token::Close => write!(f, ">"),
            Token::SelfClose => write!(f, "/>"),
            Token::Eq => write!(f, "="),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Text(_) => write!(f, "text"),
            Token::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Internal logos token for tag interiors, converted to owned `Token`
/// after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[token("<!--")]
    CommentStart,

    #[token("<?")]
    PrologStart,

    #[token("<![CDATA[")]
    CdataStart,

    #[token("<!")]
    DeclarationStart,

    #[token("</")]
    OpenClose,

    #[token("<")]
    Open,

    #[token("/>")]
    SelfClose,

    #[token(">")]
    Close,

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Str,

    #[regex(r#"[^<>=\s"'/][^<>=\s/]*(/[^<>=\s/]+)*"#)]
    Word,
}

/// A lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    /// Byte range of the erroneous input in the source.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Lex a definition document into `(Token, Span)` pairs.
///
/// Comments, `<?...?>` prologs and `<!...>` declarations are dropped.
/// Lexing continues past errors so every problem in a file is reported.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);
    let mut in_tag = false;

    loop {
        if !in_tag {
            lex_text(&mut lexer, &mut tokens);
        }
        let Some(result) = lexer.next() else {
            break;
        };
        let span = lexer.span();
        let token = match result {
            Ok(RawToken::CommentStart) => {
                skip_until(&mut lexer, "-->", "comment", &mut errors);
                continue;
            }
            Ok(RawToken::PrologStart) => {
                skip_until(&mut lexer, "?>", "processing instruction", &mut errors);
                continue;
            }
            Ok(RawToken::DeclarationStart) => {
                skip_until(&mut lexer, ">", "declaration", &mut errors);
                continue;
            }
            Ok(RawToken::CdataStart) => {
                if let Some(content) = skip_until(&mut lexer, "]]>", "CDATA section", &mut errors) {
                    let end = lexer.span().end;
                    tokens.push((Token::Text(content.to_string()), span.start..end));
                }
                continue;
            }
            Ok(RawToken::OpenClose) => {
                in_tag = true;
                Token::OpenClose
            }
            Ok(RawToken::Open) => {
                in_tag = true;
                Token::Open
            }
            Ok(RawToken::SelfClose) => {
                in_tag = false;
                Token::SelfClose
            }
            Ok(RawToken::Close) => {
                in_tag = false;
                Token::Close
            }
            Ok(RawToken::Eq) => Token::Eq,
            Ok(RawToken::Str) => {
                let slice = lexer.slice();
                Token::Str(decode_entities(&slice[1..slice.len() - 1]))
            }
            Ok(RawToken::Word) => Token::Word(decode_entities(lexer.slice())),
            Err(()) => {
                let text = &source[span.clone()];
                let message = if text.starts_with('"') || text.starts_with('\'') {
                    "unterminated string".to_string()
                } else {
                    format!("unexpected character: {text:?}")
                };
                errors.push(LexError { span, message });
                continue;
            }
        };
        tokens.push((token, span));
    }

    (tokens, errors)
}

/// Consume element content up to the next `<` as one `Text` token.
/// Whitespace-only runs between tags are dropped.
fn lex_text(lexer: &mut logos::Lexer<'_, RawToken>, tokens: &mut Vec<(Token, std::ops::Range<usize>)>) {
    let remainder = lexer.remainder();
    let len = remainder.find('<').unwrap_or(remainder.len());
    if len == 0 {
        return;
    }
    let start = lexer.span().end;
    lexer.bump(len);
    let raw = &remainder[..len];
    if !raw.trim().is_empty() {
        tokens.push((Token::Text(decode_entities(raw)), start..start + len));
    }
}

/// Consume input up to and including `terminator`, returning what was
/// skipped. An unterminated construct swallows the rest of the input.
fn skip_until<'s>(
    lexer: &mut logos::Lexer<'s, RawToken>,
    terminator: &str,
    what: &str,
    errors: &mut Vec<LexError>,
) -> Option<&'s str> {
    let start = lexer.span().start;
    let remainder = lexer.remainder();
    match remainder.find(terminator) {
        Some(end) => {
            lexer.bump(end + terminator.len());
            Some(&remainder[..end])
        }
        None => {
            lexer.bump(remainder.len());
            errors.push(LexError {
                span: start..lexer.span().end,
                message: format!("unterminated {what} (missing {terminator})"),
            });
            None
        }
    }
}

/// Decode the predefined XML entities and numeric character references.
/// Unknown or malformed references are kept as written.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(source: &str) -> Vec<String> {
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "errors: {errors:?}");
        tokens.iter().map(|(t, _)| t.to_string()).collect()
    }

    #[test]
    fn lex_element_with_attributes() {
        assert_eq!(
            rendered(r#"<entity name="Cam" base='Base'>"#),
            vec!["<", "entity", "name", "=", "\"Cam\"", "base", "=", "\"Base\"", ">"]
        );
    }

    #[test]
    fn lex_self_closing_and_end_tags() {
        assert_eq!(
            rendered("<bark file=\"a.wav\"/></component>"),
            vec!["<", "bark", "file", "=", "\"a.wav\"", "/>", "</", "component", ">"]
        );
    }

    #[test]
    fn lex_text_content_is_one_run() {
        let (tokens, errors) = lex("<property>0 0 0</property>");
        assert!(errors.is_empty());
        assert_eq!(tokens[3], (Token::Text("0 0 0".to_string()), 10..15));
    }

    #[test]
    fn lex_path_is_one_run() {
        let (tokens, _) = lex("<file>sounds/bark.wav</file>");
        assert_eq!(tokens[3].0, Token::Text("sounds/bark.wav".to_string()));
    }

    #[test]
    fn lex_quotes_in_content_are_text() {
        let (tokens, errors) = lex("<says>'tis the \"dog\" = x > y</says>");
        assert!(errors.is_empty(), "errors: {errors:?}");
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[3].0, Token::Text("'tis the \"dog\" = x > y".to_string()));
    }

    #[test]
    fn lex_content_entities_decoded() {
        let (tokens, _) = lex("<p>a &lt; b</p>");
        assert_eq!(tokens[3].0, Token::Text("a < b".to_string()));
    }

    #[test]
    fn lex_whitespace_between_tags_dropped() {
        assert_eq!(
            rendered("<a>\n  <b/>\n</a>"),
            vec!["<", "a", ">", "<", "b", "/>", "</", "a", ">"]
        );
    }

    #[test]
    fn lex_word_before_self_close() {
        assert_eq!(rendered("<a b=c/>"), vec!["<", "a", "b", "=", "c", "/>"]);
    }

    #[test]
    fn lex_skips_comments_and_prolog() {
        let source = "<?xml version=\"1.0\"?>\n<!-- a <comment> -->\n<!DOCTYPE project>\n<project/>";
        assert_eq!(rendered(source), vec!["<", "project", "/>"]);
    }

    #[test]
    fn lex_cdata_is_verbatim() {
        let (tokens, errors) = lex("<![CDATA[a < b & c]]>");
        assert!(errors.is_empty());
        assert_eq!(tokens, vec![(Token::Text("a < b & c".to_string()), 0..21)]);
    }

    #[test]
    fn lex_unterminated_comment_is_error() {
        let (tokens, errors) = lex("<a/><!-- never closed");
        assert_eq!(tokens.len(), 3);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated comment"));
    }

    #[test]
    fn lex_preserves_spans() {
        let (tokens, _) = lex("<entity name=\"Cam\"/>");
        assert_eq!(tokens[0].1, 0..1);
        assert_eq!(tokens[1].1, 1..7);
        assert_eq!(tokens[4].1, 13..18);
    }

    #[test]
    fn decode_predefined_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &amp; &quot;c&quot; &apos;"), "a <b> & \"c\" '");
    }

    #[test]
    fn decode_numeric_references() {
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
    }

    #[test]
    fn decode_unknown_kept() {
        assert_eq!(decode_entities("&nbsp; & x"), "&nbsp; & x");
    }

    #[test]
    fn lex_string_entities_decoded() {
        let (tokens, _) = lex("<a b=\"a&amp;b\"/>");
        assert_eq!(tokens[4].0, Token::Str("a&b".to_string()));
    }

    #[test]
    fn lex_unterminated_string_in_tag() {
        let (_, errors) = lex("<a b=\"x/>");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unterminated string");
    }
}
