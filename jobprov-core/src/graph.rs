//! In-memory statement graph.
//!
//! A [`Graph`] is an immutable, order-independent set of
//! `(subject, predicate, object)` statements. Graphs are assembled with a
//! [`GraphBuilder`] and finalized with [`GraphBuilder::build`]; extending a
//! parsed graph goes through [`Graph::to_builder`], which copies rather than
//! mutates.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::vocab::{rdf, xsd};

/// An RDF literal: lexical form plus an optional datatype IRI or language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    lexical: String,
    datatype: Option<String>,
    language: Option<String>,
}

impl Literal {
    /// A literal with an explicit datatype.
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// An untyped, untagged literal.
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    /// A language-tagged string.
    pub fn tagged(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// An `xsd:string` literal.
    pub fn string(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, xsd::STRING)
    }

    /// An `xsd:anyURI` literal.
    pub fn any_uri(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, xsd::ANY_URI)
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn is_string(&self) -> bool {
        self.datatype() == Some(xsd::STRING)
    }

    /// Interpret an `xsd:dateTime` literal. Returns `None` for any other
    /// datatype or an unparseable lexical form.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        if self.datatype() != Some(xsd::DATE_TIME) {
            return None;
        }
        Timestamp::parse(&self.lexical)
    }
}

/// An `xsd:dateTime` value that remembers its lexical form, so a parsed
/// timestamp serializes back byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    lexical: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Format a UTC instant as RFC 3339 with millisecond precision.
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        let instant = instant.trunc_subsecs(3);
        Self {
            lexical: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant,
        }
    }

    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Parse an `xsd:dateTime` lexical form. Values without a zone offset are
    /// read as UTC.
    pub fn parse(lexical: &str) -> Option<Self> {
        let instant = match DateTime::parse_from_rfc3339(lexical) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(_) => NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()?
                .and_utc(),
        };
        Some(Self {
            lexical: lexical.to_string(),
            instant,
        })
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn to_literal(&self) -> Literal {
        Literal::typed(self.lexical.clone(), xsd::DATE_TIME)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_utc(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}

/// A node in a statement: IRI, blank node label, or literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(label.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl From<&Timestamp> for Term {
    fn from(ts: &Timestamp) -> Self {
        Term::Literal(ts.to_literal())
    }
}

/// A single `(subject, predicate, object)` statement.
///
/// Field order matters: the derived `Ord` groups statements by subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Statement {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Statement {
    pub fn new(subject: Term, predicate: impl Into<String>, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// A finalized, read-only set of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    statements: BTreeSet<Statement>,
}

impl Graph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.statements.contains(statement)
    }

    /// Distinct subjects, in canonical order.
    pub fn subjects(&self) -> impl Iterator<Item = &Term> {
        let mut last: Option<&Term> = None;
        self.statements.iter().filter_map(move |s| {
            if last == Some(&s.subject) {
                None
            } else {
                last = Some(&s.subject);
                Some(&s.subject)
            }
        })
    }

    /// All statements whose subject is `subject`.
    pub fn about<'a>(&'a self, subject: &'a Term) -> impl Iterator<Item = &'a Statement> {
        self.statements.iter().filter(move |s| &s.subject == subject)
    }

    /// Objects of `subject predicate ?o`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a Term,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> {
        self.about(subject)
            .filter(move |s| s.predicate == predicate)
            .map(|s| &s.object)
    }

    pub fn has_type(&self, subject: &Term, class: &str) -> bool {
        self.objects(subject, rdf::TYPE)
            .any(|o| o.as_iri() == Some(class))
    }

    /// Statements grouped by subject, in canonical order.
    pub fn grouped(&self) -> BTreeMap<&Term, Vec<&Statement>> {
        let mut groups: BTreeMap<&Term, Vec<&Statement>> = BTreeMap::new();
        for statement in &self.statements {
            groups.entry(&statement.subject).or_default().push(statement);
        }
        groups
    }

    /// Statements present in `self` but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a Graph) -> impl Iterator<Item = &'a Statement> {
        self.statements.difference(&other.statements)
    }

    /// Reopen a copy of this graph for extension.
    pub fn to_builder(&self) -> GraphBuilder {
        GraphBuilder {
            statements: self.statements.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Statement;
    type IntoIter = std::collections::btree_set::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

impl FromIterator<Statement> for Graph {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        Self {
            statements: iter.into_iter().collect(),
        }
    }
}

/// Accumulates statements until [`build`](GraphBuilder::build) freezes them.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    statements: BTreeSet<Statement>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statement. Returns `false` if it was already present.
    pub fn insert(&mut self, statement: Statement) -> bool {
        self.statements.insert(statement)
    }

    pub fn add(&mut self, subject: &Term, predicate: &str, object: impl Into<Term>) -> &mut Self {
        self.statements
            .insert(Statement::new(subject.clone(), predicate, object));
        self
    }

    /// Add `subject rdf:type class`.
    pub fn add_type(&mut self, subject: &Term, class: &str) -> &mut Self {
        self.add(subject, rdf::TYPE, Term::iri(class))
    }

    /// Merge every statement of `graph`.
    pub fn merge(&mut self, graph: &Graph) -> &mut Self {
        self.statements.extend(graph.iter().cloned());
        self
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn build(self) -> Graph {
        Graph {
            statements: self.statements,
        }
    }
}

impl Extend<Statement> for GraphBuilder {
    fn extend<I: IntoIterator<Item = Statement>>(&mut self, iter: I) {
        self.statements.extend(iter);
    }
}
