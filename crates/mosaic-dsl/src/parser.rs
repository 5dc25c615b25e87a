use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use mosaic_core::Node;

use crate::lexer::Token;

type Span = SimpleSpan;

/// Parse error with source span.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Byte range of the offending tokens.
    pub span: std::ops::Range<usize>,
    /// What the parser expected or found.
    pub message: String,
}

/// A piece of element content, in document order.
#[derive(Debug, Clone)]
enum Content {
    Child(Node),
    Text(String),
}

/// Assemble a node. Text runs are concatenated as written and only the
/// ends are trimmed; children keep their order.
fn build_element(
    tag: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
    span: Span,
) -> Node {
    let mut node = Node::new(tag).with_span(span.into_range());
    for (key, value) in attributes {
        node.set_attr(key, value);
    }
    let mut text = String::new();
    for item in content {
        match item {
            Content::Child(child) => node.push_child(child),
            Content::Text(piece) => text.push_str(&piece),
        }
    }
    let text = text.trim();
    if !text.is_empty() {
        node.set_text(Some(text.to_string()));
    }
    node
}

/// Build the document parser: a sequence of root elements.
fn document_parser<'a, I>() -> impl Parser<'a, I, Vec<Node>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let word = select! { Token::Word(w) => w }.labelled("name");
    let string_lit = select! { Token::Str(s) => s }.labelled("quoted value");

    let attribute = word
        .then_ignore(just(Token::Eq))
        .then(choice((string_lit, word)))
        .labelled("attribute");

    let text_piece = select! { Token::Text(t) => t }.labelled("text");

    let element = recursive(|element| {
        let content = choice((element.map(Content::Child), text_piece.clone().map(Content::Text)))
            .repeated()
            .collect::<Vec<Content>>();

        let empty = just(Token::SelfClose).to((Vec::<Content>::new(), None::<String>));
        let body = just(Token::Close)
            .ignore_then(content)
            .then_ignore(just(Token::OpenClose))
            .then(word)
            .then_ignore(just(Token::Close))
            .map(|(content, close)| (content, Some(close)));

        just(Token::Open)
            .ignore_then(word)
            .then(attribute.clone().repeated().collect::<Vec<(String, String)>>())
            .then(choice((empty, body)))
            .try_map(|((tag, attributes), (content, close)), span: Span| {
                match close {
                    Some(close) if close != tag => Err(Rich::custom(
                        span,
                        format!("closing tag </{close}> does not match <{tag}>"),
                    )),
                    _ => Ok(build_element(tag, attributes, content, span)),
                }
            })
            .labelled("element")
    });

    element.repeated().collect::<Vec<Node>>().then_ignore(end())
}

/// Parse a token stream into the document's root elements.
pub fn parse(tokens: &[(Token, std::ops::Range<usize>)]) -> Result<Vec<Node>, Vec<ParseError>> {
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = tokens.last().map_or(0, |(_, s)| s.end);
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = document_parser().parse(stream).into_output_errors();

    match (output, errors.is_empty()) {
        (Some(nodes), true) => Ok(nodes),
        _ => Err(errors
            .into_iter()
            .map(|e| ParseError {
                span: e.span().into_range(),
                message: e.to_string(),
            })
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_source(source: &str) -> Result<Vec<Node>, Vec<ParseError>> {
        let (tokens, lex_errors) = lexer::lex(source);
        assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");
        parse(&tokens)
    }

    fn parse_one(source: &str) -> Node {
        let mut nodes = parse_source(source).unwrap_or_else(|e| panic!("parse errors: {e:?}"));
        assert_eq!(nodes.len(), 1);
        nodes.remove(0)
    }

    #[test]
    fn parse_empty_element() {
        let node = parse_one(r#"<component type="Camera"/>"#);
        assert_eq!(node.tag(), "component");
        assert_eq!(node.attr("type"), Some("Camera"));
        assert!(node.children().is_empty());
        assert_eq!(node.text(), None);
    }

    #[test]
    fn parse_nested_elements() {
        let node = parse_one(
            r#"<entity name="Cam">
                <property name="Position" type="Vector3">0 0 0</property>
                <component type="Camera"/>
            </entity>"#,
        );
        assert_eq!(node.name(), Some("Cam"));
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[0].text(), Some("0 0 0"));
        assert_eq!(node.children()[1].attr("type"), Some("Camera"));
    }

    #[test]
    fn parse_text_trims_only_the_ends() {
        let node = parse_one("<p>\n  (1,   2)\n</p>");
        assert_eq!(node.text(), Some("(1,   2)"));
    }

    #[test]
    fn parse_text_keeps_quotes_verbatim() {
        let node = parse_one("<name>Rex's  'good'   boy</name>");
        assert_eq!(node.text(), Some("Rex's  'good'   boy"));

        let node = parse_one(r#"<says>"quoted" = a/b</says>"#);
        assert_eq!(node.text(), Some(r#""quoted" = a/b"#));
    }

    #[test]
    fn parse_text_around_children_and_cdata() {
        let node = parse_one("<p> a <b/>c<![CDATA[ <d> ]]></p>");
        assert_eq!(node.text(), Some("a c <d>"));
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn parse_whitespace_only_content_has_no_text() {
        let node = parse_one("<entity>\n  <component type=\"Camera\"/>\n</entity>");
        assert_eq!(node.text(), None);
    }

    #[test]
    fn parse_unquoted_attribute_value() {
        let node = parse_one("<bark file=a.wav/>");
        assert_eq!(node.attr("file"), Some("a.wav"));
    }

    #[test]
    fn parse_duplicate_attribute_keeps_last_value() {
        let node = parse_one(r#"<e name="a" name="b"/>"#);
        assert_eq!(node.attributes().collect::<Vec<_>>(), vec![("name", "b")]);
    }

    #[test]
    fn parse_multiple_roots() {
        let nodes = parse_source("<entity name=\"A\"/><set name=\"S\"/>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[1].is("set"));
    }

    #[test]
    fn parse_records_spans() {
        let source = "<project>\n  <entity name=\"A\"/>\n</project>";
        let node = parse_one(source);
        assert_eq!(node.span(), 0..source.len());
        let child = &node.children()[0];
        assert_eq!(&source[child.span()], "<entity name=\"A\"/>");
    }

    #[test]
    fn parse_mismatched_close_tag() {
        let errors = parse_source("<entity></component>").unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn parse_unclosed_element_is_error() {
        assert!(parse_source("<entity name=\"A\">").is_err());
    }

    #[test]
    fn parse_missing_tag_name_is_error() {
        let errors = parse_source("<=\"x\"/>").unwrap_err();
        assert!(!errors.is_empty());
    }
}
