//! Turtle codec for provenance graphs.
//!
//! [`serialize`] writes the canonical, byte-stable form: one block per
//! subject, subjects in canonical order, `rdf:type` first (written `a`), the
//! remaining predicates in IRI order, and full IRIs throughout (no prefixes).
//! The layout matches the Jena pretty writer the registry fixtures were made
//! with:
//!
//! ```text
//! <http://portal.example/secure/getJobObject.do?jobId=1>
//!       a       <http://www.w3.org/ns/prov#Activity> ;
//!       <http://www.w3.org/2000/01/rdf-schema#label>
//!               "Cool Job"^^<http://www.w3.org/2001/XMLSchema#string> .
//! ```
//!
//! [`parse`] reads the subset of Turtle needed to rehydrate stored
//! activities, including files written by other tools: prefix and base
//! directives, prefixed names, `;`/`,` lists, all four string forms, bare
//! numbers and booleans, and labelled blank nodes. Collections and anonymous
//! blank nodes are rejected.

use std::collections::{BTreeMap, HashMap};

use url::Url;

use crate::error::CodecError;
use crate::graph::{Graph, GraphBuilder, Literal, Statement, Term};
use crate::vocab::{rdf, xsd};

const PREDICATE_INDENT: usize = 6;
const OBJECT_COLUMN: usize = 14;

/// Serialize a graph to canonical Turtle.
pub fn serialize(graph: &Graph) -> String {
    let mut out = String::new();
    for (i, (subject, statements)) in graph.grouped().into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_block(&mut out, subject, &statements);
    }
    out
}

fn write_block(out: &mut String, subject: &Term, statements: &[&Statement]) {
    // rdf:type sorts ahead of every other predicate.
    let mut by_predicate: BTreeMap<(bool, &str), Vec<&Term>> = BTreeMap::new();
    for statement in statements {
        let key = (statement.predicate != rdf::TYPE, statement.predicate.as_str());
        by_predicate.entry(key).or_default().push(&statement.object);
    }

    out.push_str(&render_term(subject));
    out.push('\n');

    let count = by_predicate.len();
    for (i, ((is_plain, predicate), objects)) in by_predicate.into_iter().enumerate() {
        out.push_str(&" ".repeat(PREDICATE_INDENT));
        if is_plain {
            out.push_str(&render_iri(predicate));
            out.push('\n');
            out.push_str(&" ".repeat(OBJECT_COLUMN));
        } else {
            out.push('a');
            out.push_str(&" ".repeat(OBJECT_COLUMN - PREDICATE_INDENT - 1));
        }
        let rendered: Vec<String> = objects.into_iter().map(render_term).collect();
        out.push_str(&rendered.join(" , "));
        out.push_str(if i + 1 == count { " .\n" } else { " ;\n" });
    }
}

fn render_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => render_iri(iri),
        Term::Blank(label) => format!("_:{label}"),
        Term::Literal(lit) => render_literal(lit),
    }
}

fn render_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len() + 2);
    out.push('<');
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('>');
    out
}

fn render_literal(lit: &Literal) -> String {
    let mut out = String::with_capacity(lit.lexical().len() + 2);
    out.push('"');
    for c in lit.lexical().chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    if let Some(lang) = lit.language() {
        out.push('@');
        out.push_str(lang);
    } else if let Some(datatype) = lit.datatype() {
        out.push_str("^^");
        out.push_str(&render_iri(datatype));
    }
    out
}

/// Parse Turtle text into a graph. Relative IRIs resolve against `base`.
///
/// Either the whole document parses or an error is returned; no partial
/// graph escapes.
pub fn parse(text: &str, base: Option<&str>) -> Result<Graph, CodecError> {
    let base = match base {
        Some(b) => Some(Url::parse(b).map_err(|e| CodecError::BadIri {
            iri: b.to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };
    let mut parser = Parser {
        chars: text.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
        base,
        prefixes: HashMap::new(),
        builder: GraphBuilder::new(),
    };
    parser.document()?;
    Ok(parser.builder.build())
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    base: Option<Url>,
    prefixes: HashMap<String, String>,
    builder: GraphBuilder,
}

impl Parser {
    fn document(&mut self) -> Result<(), CodecError> {
        loop {
            self.skip_ws();
            let Some(c) = self.peek() else {
                return Ok(());
            };
            if c == '@' {
                self.at_directive()?;
            } else if self.keyword("PREFIX") {
                self.advance(6);
                self.prefix_decl()?;
            } else if self.keyword("BASE") {
                self.advance(4);
                self.base_decl()?;
            } else {
                self.triples()?;
                self.skip_ws();
                self.expect('.')?;
            }
        }
    }

    fn at_directive(&mut self) -> Result<(), CodecError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let name = self.take_while(|c| c.is_ascii_alphabetic());
        match name.as_str() {
            "prefix" => self.prefix_decl()?,
            "base" => self.base_decl()?,
            other => {
                return Err(CodecError::Syntax {
                    line,
                    column,
                    message: format!("unknown directive '@{other}'"),
                });
            }
        }
        self.skip_ws();
        self.expect('.')
    }

    fn prefix_decl(&mut self) -> Result<(), CodecError> {
        self.skip_ws();
        let prefix = self.take_while(is_name_char);
        self.expect(':')?;
        self.skip_ws();
        let iri = self.iri_ref()?;
        self.prefixes.insert(prefix, iri);
        Ok(())
    }

    fn base_decl(&mut self) -> Result<(), CodecError> {
        self.skip_ws();
        let iri = self.iri_ref()?;
        let url = Url::parse(&iri).map_err(|e| CodecError::BadIri {
            iri: iri.clone(),
            reason: e.to_string(),
        })?;
        self.base = Some(url);
        Ok(())
    }

    fn triples(&mut self) -> Result<(), CodecError> {
        let subject = self.subject()?;
        loop {
            self.skip_ws();
            let predicate = self.verb()?;
            loop {
                self.skip_ws();
                let object = self.object()?;
                self.builder
                    .insert(Statement::new(subject.clone(), predicate.clone(), object));
                self.skip_ws();
                if self.peek() == Some(',') {
                    self.bump();
                } else {
                    break;
                }
            }
            // Repeated and trailing semicolons are legal.
            let mut saw_semicolon = false;
            while self.peek() == Some(';') {
                self.bump();
                self.skip_ws();
                saw_semicolon = true;
            }
            if !saw_semicolon || self.peek() == Some('.') {
                return Ok(());
            }
        }
    }

    fn subject(&mut self) -> Result<Term, CodecError> {
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri_ref()?)),
            Some('_') if self.peek_at(1) == Some(':') => self.blank(),
            Some(c @ ('[' | '(')) => Err(self.unsupported(c)),
            Some('"' | '\'') => Err(self.syntax("a literal cannot be a subject")),
            Some(_) => Ok(Term::Iri(self.prefixed_name()?)),
            None => Err(self.syntax("unexpected end of input, expected subject")),
        }
    }

    fn verb(&mut self) -> Result<String, CodecError> {
        if self.peek() == Some('a') && self.peek_at(1).is_none_or(is_delimiter) {
            self.bump();
            return Ok(rdf::TYPE.to_string());
        }
        match self.peek() {
            Some('<') => self.iri_ref(),
            Some(_) => self.prefixed_name(),
            None => Err(self.syntax("unexpected end of input, expected predicate")),
        }
    }

    fn object(&mut self) -> Result<Term, CodecError> {
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri_ref()?)),
            Some('_') if self.peek_at(1) == Some(':') => self.blank(),
            Some('"' | '\'') => Ok(Term::Literal(self.literal()?)),
            Some(c @ ('[' | '(')) => Err(self.unsupported(c)),
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' => {
                Ok(Term::Literal(self.number()?))
            }
            Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                Ok(Term::Literal(self.number()?))
            }
            Some(_) if self.keyword("true") => {
                self.advance(4);
                Ok(Term::Literal(Literal::typed("true", xsd::BOOLEAN)))
            }
            Some(_) if self.keyword("false") => {
                self.advance(5);
                Ok(Term::Literal(Literal::typed("false", xsd::BOOLEAN)))
            }
            Some(_) => Ok(Term::Iri(self.prefixed_name()?)),
            None => Err(self.syntax("unexpected end of input, expected object")),
        }
    }

    fn iri_ref(&mut self) -> Result<String, CodecError> {
        self.expect('<')?;
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some('\\') => raw.push(self.unicode_escape()?),
                Some(c) if c == '\n' || c == ' ' || c == '<' => {
                    return Err(self.syntax(&format!("illegal character {c:?} in IRI")));
                }
                Some(c) => raw.push(c),
                None => return Err(self.syntax("unterminated IRI")),
            }
        }
        self.resolve(raw)
    }

    fn resolve(&self, raw: String) -> Result<String, CodecError> {
        if has_scheme(&raw) {
            return Ok(raw);
        }
        match &self.base {
            Some(base) => base
                .join(&raw)
                .map(String::from)
                .map_err(|e| CodecError::BadIri {
                    iri: raw,
                    reason: e.to_string(),
                }),
            None => Err(CodecError::BadIri {
                iri: raw,
                reason: "relative IRI without a base".into(),
            }),
        }
    }

    fn prefixed_name(&mut self) -> Result<String, CodecError> {
        let (line, column) = (self.line, self.column);
        let prefix = self.take_while(is_name_char);
        if self.peek() != Some(':') {
            return Err(CodecError::Syntax {
                line,
                column,
                message: format!("expected IRI or prefixed name, found '{prefix}'"),
            });
        }
        self.bump();

        let mut local = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(c) => local.push(c),
                        None => return Err(self.syntax("unterminated escape in local name")),
                    }
                }
                Some(c) if is_name_char(c) || c == '.' || c == '%' || c == ':' => {
                    // A trailing '.' ends the statement rather than the name.
                    if c == '.' && !self.peek_at(1).is_some_and(|n| is_name_char(n) || n == ':') {
                        break;
                    }
                    self.bump();
                    local.push(c);
                }
                _ => break,
            }
        }

        let namespace =
            self.prefixes
                .get(&prefix)
                .ok_or_else(|| CodecError::UndeclaredPrefix {
                    prefix: prefix.clone(),
                    line,
                    column,
                })?;
        Ok(format!("{namespace}{local}"))
    }

    fn blank(&mut self) -> Result<Term, CodecError> {
        self.advance(2);
        let mut label = String::new();
        while let Some(c) = self.peek() {
            // A '.' belongs to the label only when more name characters follow.
            let inner_dot = c == '.' && self.peek_at(1).is_some_and(is_name_char);
            if !is_name_char(c) && !inner_dot {
                break;
            }
            self.bump();
            label.push(c);
        }
        if label.is_empty() {
            return Err(self.syntax("empty blank node label"));
        }
        Ok(Term::Blank(label))
    }

    fn literal(&mut self) -> Result<Literal, CodecError> {
        let quote = self.bump().unwrap_or('"');
        let long = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        let lexical = if long {
            self.advance(2);
            self.long_string(quote)?
        } else {
            self.short_string(quote)?
        };

        if self.peek() == Some('@') {
            self.bump();
            let tag = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
            if tag.is_empty() {
                return Err(self.syntax("empty language tag"));
            }
            return Ok(Literal::tagged(lexical, tag));
        }
        if self.peek() == Some('^') && self.peek_at(1) == Some('^') {
            self.advance(2);
            let datatype = match self.peek() {
                Some('<') => self.iri_ref()?,
                _ => self.prefixed_name()?,
            };
            return Ok(Literal::typed(lexical, datatype));
        }
        Ok(Literal::plain(lexical))
    }

    fn short_string(&mut self, quote: char) -> Result<String, CodecError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => value.push(self.string_escape()?),
                Some('\n') | None => return Err(self.syntax("unterminated string literal")),
                Some(c) => value.push(c),
            }
        }
    }

    fn long_string(&mut self, quote: char) -> Result<String, CodecError> {
        let mut value = String::new();
        loop {
            if self.peek() == Some(quote)
                && self.peek_at(1) == Some(quote)
                && self.peek_at(2) == Some(quote)
            {
                self.advance(3);
                return Ok(value);
            }
            match self.bump() {
                Some('\\') => value.push(self.string_escape()?),
                Some(c) => value.push(c),
                None => return Err(self.syntax("unterminated long string literal")),
            }
        }
    }

    fn string_escape(&mut self) -> Result<char, CodecError> {
        match self.peek() {
            Some('u' | 'U') => self.unicode_escape(),
            Some(c) => {
                self.bump();
                match c {
                    't' => Ok('\t'),
                    'b' => Ok('\u{8}'),
                    'n' => Ok('\n'),
                    'r' => Ok('\r'),
                    'f' => Ok('\u{c}'),
                    '"' | '\'' | '\\' => Ok(c),
                    other => Err(self.syntax(&format!("invalid escape '\\{other}'"))),
                }
            }
            None => Err(self.syntax("unterminated escape")),
        }
    }

    /// Reads `uXXXX` or `UXXXXXXXX` after a consumed backslash.
    fn unicode_escape(&mut self) -> Result<char, CodecError> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(self.syntax("expected unicode escape")),
        };
        let mut hex = String::with_capacity(width);
        for _ in 0..width {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.syntax("malformed unicode escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.syntax(&format!("invalid code point U+{hex}")))
    }

    fn number(&mut self) -> Result<Literal, CodecError> {
        let mut lexical = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            self.bump();
            lexical.push(sign);
        }
        lexical.push_str(&self.take_while(|c| c.is_ascii_digit()));
        let mut datatype = xsd::INTEGER;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            lexical.push('.');
            lexical.push_str(&self.take_while(|c| c.is_ascii_digit()));
            datatype = xsd::DECIMAL;
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            self.bump();
            lexical.push(e);
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.bump();
                lexical.push(sign);
            }
            let exponent = self.take_while(|c| c.is_ascii_digit());
            if exponent.is_empty() {
                return Err(self.syntax("missing exponent digits"));
            }
            lexical.push_str(&exponent);
            datatype = xsd::DOUBLE;
        }
        if !lexical.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.syntax("malformed number"));
        }
        Ok(Literal::typed(lexical, datatype))
    }

    // --- character-level helpers ---

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            taken.push(c);
            self.bump();
        }
        taken
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// True when the input continues with `word` (ASCII case-insensitive)
    /// followed by a delimiter. Does not consume.
    ///
    /// `PREFIX` and `BASE` must be followed by whitespace so that subjects
    /// such as `base:thing` are not mistaken for directives.
    fn keyword(&self, word: &str) -> bool {
        let len = word.chars().count();
        let matches = word
            .chars()
            .enumerate()
            .all(|(i, w)| self.peek_at(i).is_some_and(|c| c.eq_ignore_ascii_case(&w)));
        if !matches {
            return false;
        }
        match word {
            "PREFIX" | "BASE" => self.peek_at(len).is_some_and(char::is_whitespace),
            _ => self.peek_at(len).is_none_or(is_delimiter),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), CodecError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.syntax(&format!("expected '{expected}', found '{c}'"))),
            None => Err(self.syntax(&format!("expected '{expected}', found end of input"))),
        }
    }

    fn syntax(&self, message: &str) -> CodecError {
        CodecError::Syntax {
            line: self.line,
            column: self.column,
            message: message.to_string(),
        }
    }

    fn unsupported(&self, c: char) -> CodecError {
        let construct = if c == '[' {
            "anonymous blank node"
        } else {
            "collection"
        };
        CodecError::Unsupported {
            line: self.line,
            column: self.column,
            construct: construct.to_string(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '"' | '\'' | ';' | ',' | '.' | '#' | '[' | '(')
}

/// `scheme ":"` per RFC 3986: a letter followed by letters, digits, `+`, `-`
/// or `.`.
fn has_scheme(iri: &str) -> bool {
    let Some((scheme, _)) = iri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{dcat, prov, rdfs};
    use pretty_assertions::assert_eq;

    const JOB: &str = "http://portal-fake.vhirl.org/secure/getJobObject.do?jobId=1";

    fn activity_graph() -> Graph {
        let activity = Term::iri(JOB);
        let mut builder = GraphBuilder::new();
        builder
            .add_type(&activity, prov::ACTIVITY)
            .add(&activity, rdfs::LABEL, Literal::string("Cool Job"));
        builder.build()
    }

    #[test]
    fn test_serialize_single_block_layout() {
        let text = serialize(&activity_graph());
        let expected = format!(
            "<{JOB}>\n      a       <http://www.w3.org/ns/prov#Activity> ;\n      \
             <http://www.w3.org/2000/01/rdf-schema#label>\n              \
             \"Cool Job\"^^<http://www.w3.org/2001/XMLSchema#string> .\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_serialize_separates_blocks_with_blank_line() {
        let mut builder = activity_graph().to_builder();
        builder.add_type(&Term::iri("http://example.org/e"), prov::ENTITY);
        let text = serialize(&builder.build());
        assert!(text.contains(" .\n\n<http://portal-fake"));
        assert!(text.starts_with("<http://example.org/e>\n      a       "));
    }

    #[test]
    fn test_serialize_multiple_types_on_one_line() {
        let s = Term::iri("http://example.org/svc");
        let mut builder = GraphBuilder::new();
        builder
            .add_type(&s, prov::ENTITY)
            .add_type(&s, "http://promsns.org/def/proms#ServiceEntity");
        let text = serialize(&builder.build());
        assert_eq!(
            text,
            "<http://example.org/svc>\n      a       \
             <http://promsns.org/def/proms#ServiceEntity> , <http://www.w3.org/ns/prov#Entity> .\n"
        );
    }

    #[test]
    fn test_serialize_escapes_literals() {
        let s = Term::iri("http://example.org/s");
        let mut builder = GraphBuilder::new();
        builder.add(&s, rdfs::LABEL, Literal::string("say \"hi\"\n\\"));
        let text = serialize(&builder.build());
        assert!(text.contains(r#""say \"hi\"\n\\"^^"#));
    }

    #[test]
    fn test_round_trip_canonical_text() {
        let graph = activity_graph();
        let text = serialize(&graph);
        let parsed = parse(&text, None).unwrap();
        assert_eq!(parsed, graph);
        assert_eq!(serialize(&parsed), text);
    }

    #[test]
    fn test_parse_prefixes_and_lists() {
        let text = r#"
            @prefix prov: <http://www.w3.org/ns/prov#> .
            PREFIX dcat: <http://www.w3.org/ns/dcat#>
            # activity record
            <http://example.org/job> a prov:Activity ;
                prov:used <http://example.org/in1> , <http://example.org/in2> ;
                .
            <http://example.org/in1> a prov:Entity ;
                dcat:downloadURL "http://example.org/in1"^^<http://www.w3.org/2001/XMLSchema#anyURI> .
        "#;
        let graph = parse(text, None).unwrap();
        assert_eq!(graph.len(), 5);
        let job = Term::iri("http://example.org/job");
        assert!(graph.has_type(&job, prov::ACTIVITY));
        assert_eq!(graph.objects(&job, prov::USED).count(), 2);
        let in1 = Term::iri("http://example.org/in1");
        let url = graph.objects(&in1, dcat::DOWNLOAD_URL).next().unwrap();
        assert_eq!(url.as_literal().unwrap().datatype(), Some(xsd::ANY_URI));
    }

    #[test]
    fn test_parse_resolves_relative_iris_against_base() {
        let text = "<secure/getJobObject.do?jobId=7> a <http://www.w3.org/ns/prov#Activity> .";
        let graph = parse(text, Some("http://portal-fake.vhirl.org/")).unwrap();
        let subject = graph.subjects().next().unwrap();
        assert_eq!(
            subject.as_iri(),
            Some("http://portal-fake.vhirl.org/secure/getJobObject.do?jobId=7")
        );
    }

    #[test]
    fn test_parse_relative_iri_without_base_fails() {
        let err = parse("<job> a <http://x/T> .", None).unwrap_err();
        assert!(matches!(err, CodecError::BadIri { .. }));
    }

    #[test]
    fn test_parse_literal_forms() {
        let text = r#"
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            <http://e/s> <http://e/p> "plain" , 'single' , """long
line""" , "chat"@fr , "5"^^xsd:integer , 42 , -1.5 , 1e3 , true , "é" .
        "#;
        let graph = parse(text, None).unwrap();
        let s = Term::iri("http://e/s");
        let lits: Vec<&Literal> = graph
            .objects(&s, "http://e/p")
            .filter_map(Term::as_literal)
            .collect();
        assert_eq!(lits.len(), 10);
        assert!(lits.iter().any(|l| l.lexical() == "long\nline"));
        assert!(lits.iter().any(|l| l.language() == Some("fr")));
        assert!(lits.iter().any(|l| l.lexical() == "42" && l.datatype() == Some(xsd::INTEGER)));
        assert!(lits.iter().any(|l| l.lexical() == "-1.5" && l.datatype() == Some(xsd::DECIMAL)));
        assert!(lits.iter().any(|l| l.lexical() == "1e3" && l.datatype() == Some(xsd::DOUBLE)));
        assert!(lits.iter().any(|l| l.lexical() == "true" && l.datatype() == Some(xsd::BOOLEAN)));
        assert!(lits.iter().any(|l| l.lexical() == "é"));
    }

    #[test]
    fn test_parse_blank_node_labels_pass_through() {
        let graph = parse("_:b0 <http://e/p> _:b1 .", None).unwrap();
        let text = serialize(&graph);
        assert_eq!(text, "_:b0\n      <http://e/p>\n              _:b1 .\n");
    }

    #[test]
    fn test_parse_rejects_anonymous_blank_nodes() {
        let err = parse("<http://e/s> <http://e/p> [ <http://e/q> 1 ] .", None).unwrap_err();
        assert!(matches!(err, CodecError::Unsupported { .. }));
        let err = parse("<http://e/s> <http://e/p> ( 1 2 ) .", None).unwrap_err();
        assert!(matches!(err, CodecError::Unsupported { .. }));
    }

    #[test]
    fn test_parse_reports_position_of_syntax_error() {
        let err = parse("<http://e/s> <http://e/p> \"x\"\n<http://e/t>", None).unwrap_err();
        match err {
            CodecError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_undeclared_prefix() {
        let err = parse("<http://e/s> a prov:Activity .", None).unwrap_err();
        assert!(matches!(err, CodecError::UndeclaredPrefix { ref prefix, .. } if prefix == "prov"));
    }

    #[test]
    fn test_parse_prefixed_name_before_terminating_dot() {
        let text = "@prefix e: <http://e/> .\ne:s e:p e:o.";
        let graph = parse(text, None).unwrap();
        let s = Term::iri("http://e/s");
        assert_eq!(
            graph.objects(&s, "http://e/p").next(),
            Some(&Term::iri("http://e/o"))
        );
    }

    #[test]
    fn test_parse_blank_node_before_terminating_dot() {
        let graph = parse("<http://e/s> <http://e/p> _:b1.", None).unwrap();
        let s = Term::iri("http://e/s");
        assert_eq!(graph.objects(&s, "http://e/p").next(), Some(&Term::blank("b1")));

        let graph = parse("<http://e/s> <http://e/p> _:a.b .", None).unwrap();
        assert_eq!(graph.objects(&s, "http://e/p").next(), Some(&Term::blank("a.b")));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse("  # nothing here\n", None).unwrap().is_empty());
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("http://x"));
        assert!(has_scheme("urn:uuid:1"));
        assert!(!has_scheme("secure/jobFile.do?x=a:b"));
        assert!(!has_scheme("1http://x"));
    }
}
