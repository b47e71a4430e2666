//! Activity and Entity, the PROV view of a job.
//!
//! Both are plain values. Builder-style `with_*` methods consume and return
//! `self`; nothing here mutates a [`Graph`]. [`Activity::to_graph`] produces a
//! finalized graph, and [`Activity::from_graph`] rehydrates one while keeping
//! every statement it does not model, so `from_graph(g)?.to_graph() == g`.

use std::collections::BTreeMap;

use crate::error::CodecError;
use crate::graph::{Graph, GraphBuilder, Literal, Statement, Term, Timestamp};
use crate::vocab::{dcat, dcterms, prov, proms, rdfs, xsd};

/// A data item touched by an activity. Identity is the data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    data_uri: String,
    title: Option<String>,
    description: Option<String>,
    download_url: Option<String>,
    attributed_to: Option<String>,
    created_at: Option<Timestamp>,
    service: bool,
}

impl Entity {
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
            title: None,
            description: None,
            download_url: None,
            attributed_to: None,
            created_at: None,
            service: false,
        }
    }

    /// An entity whose download URL is its own data URI.
    pub fn downloadable(data_uri: impl Into<String>) -> Self {
        let data_uri = data_uri.into();
        Self::new(data_uri.clone()).with_download_url(data_uri)
    }

    /// An entity that also carries the `proms:ServiceEntity` type.
    pub fn service(data_uri: impl Into<String>) -> Self {
        Self {
            service: true,
            ..Self::new(data_uri)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// Attribute to `agent`. `None` leaves the entity unattributed.
    pub fn with_attributed_to(mut self, agent: Option<&str>) -> Self {
        self.attributed_to = agent.map(str::to_string);
        self
    }

    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    pub fn attributed_to(&self) -> Option<&str> {
        self.attributed_to.as_deref()
    }

    pub fn created_at(&self) -> Option<&Timestamp> {
        self.created_at.as_ref()
    }

    pub fn is_service(&self) -> bool {
        self.service
    }

    pub fn subject(&self) -> Term {
        Term::iri(&self.data_uri)
    }

    fn write_to(&self, builder: &mut GraphBuilder) {
        let subject = self.subject();
        builder.add_type(&subject, prov::ENTITY);
        if self.service {
            builder.add_type(&subject, proms::SERVICE_ENTITY);
        }
        if let Some(title) = &self.title {
            builder.add(&subject, rdfs::LABEL, Literal::string(title));
        }
        if let Some(description) = &self.description {
            builder.add(&subject, dcterms::DESCRIPTION, Literal::string(description));
        }
        if let Some(url) = &self.download_url {
            builder.add(&subject, dcat::DOWNLOAD_URL, Literal::any_uri(url));
        }
        if let Some(agent) = &self.attributed_to {
            builder.add(&subject, prov::WAS_ATTRIBUTED_TO, Term::iri(agent));
        }
        if let Some(created) = &self.created_at {
            builder.add(&subject, dcterms::CREATED, created);
        }
    }

    /// Read the entity described at `iri`, or `None` if the graph does not
    /// declare it a `prov:Entity`. Only values whose exact form `write_to`
    /// would reproduce are taken; anything else is left for pass-through.
    fn from_graph(iri: &str, graph: &Graph) -> Option<Self> {
        let subject = Term::iri(iri);
        if !graph.has_type(&subject, prov::ENTITY) {
            return None;
        }
        let mut entity = Entity::new(iri);
        entity.service = graph.has_type(&subject, proms::SERVICE_ENTITY);
        entity.title = first_typed(graph, &subject, rdfs::LABEL, xsd::STRING);
        entity.description = first_typed(graph, &subject, dcterms::DESCRIPTION, xsd::STRING);
        entity.download_url = first_typed(graph, &subject, dcat::DOWNLOAD_URL, xsd::ANY_URI);
        entity.attributed_to = first_iri(graph, &subject, prov::WAS_ATTRIBUTED_TO);
        entity.created_at = first_timestamp(graph, &subject, dcterms::CREATED);
        Some(entity)
    }
}

/// Entities keyed by data URI. Inserting an existing URI replaces the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySet {
    entities: BTreeMap<String, Entity>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entity`, returning the one it replaced.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.data_uri.clone(), entity)
    }

    pub fn get(&self, data_uri: &str) -> Option<&Entity> {
        self.entities.get(data_uri)
    }

    pub fn contains(&self, data_uri: &str) -> bool {
        self.entities.contains_key(data_uri)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

impl FromIterator<Entity> for EntitySet {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut set = EntitySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Entity> for EntitySet {
    fn extend<I: IntoIterator<Item = Entity>>(&mut self, iter: I) {
        for entity in iter {
            self.insert(entity);
        }
    }
}

impl IntoIterator for EntitySet {
    type Item = Entity;
    type IntoIter = std::collections::btree_map::IntoValues<String, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_values()
    }
}

/// One recorded execution of a job.
///
/// The activity URI is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    uri: String,
    title: Option<String>,
    description: Option<String>,
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    associated_with: Option<String>,
    used: EntitySet,
    generated: EntitySet,
    passthrough: Vec<Statement>,
}

impl Activity {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: None,
            description: None,
            started_at: None,
            ended_at: None,
            associated_with: None,
            used: EntitySet::new(),
            generated: EntitySet::new(),
            passthrough: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_started_at(mut self, started_at: Timestamp) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Set the end time, replacing any end time already recorded, including
    /// one carried over from a parsed graph in a form this model can't read.
    pub fn with_ended_at(mut self, ended_at: Timestamp) -> Self {
        let subject = self.subject();
        self.passthrough
            .retain(|s| !(s.subject == subject && s.predicate == prov::ENDED_AT_TIME));
        self.ended_at = Some(ended_at);
        self
    }

    pub fn with_associated_with(mut self, agent: Option<&str>) -> Self {
        self.associated_with = agent.map(str::to_string);
        self
    }

    /// Add input entities.
    pub fn with_used(mut self, entities: impl IntoIterator<Item = Entity>) -> Self {
        self.used.extend(entities);
        self
    }

    /// Add output entities.
    pub fn with_generated(mut self, entities: impl IntoIterator<Item = Entity>) -> Self {
        self.generated.extend(entities);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn started_at(&self) -> Option<&Timestamp> {
        self.started_at.as_ref()
    }

    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    pub fn associated_with(&self) -> Option<&str> {
        self.associated_with.as_deref()
    }

    pub fn used(&self) -> &EntitySet {
        &self.used
    }

    pub fn generated(&self) -> &EntitySet {
        &self.generated
    }

    /// Statements carried over from a parsed graph that this model does not
    /// interpret.
    pub fn passthrough(&self) -> &[Statement] {
        &self.passthrough
    }

    pub fn subject(&self) -> Term {
        Term::iri(&self.uri)
    }

    /// Materialize the activity, its entities and any pass-through statements.
    pub fn to_graph(&self) -> Graph {
        let mut builder = GraphBuilder::new();
        self.write_to(&mut builder);
        builder.build()
    }

    pub(crate) fn write_to(&self, builder: &mut GraphBuilder) {
        builder.extend(self.passthrough.iter().cloned());

        let subject = self.subject();
        builder.add_type(&subject, prov::ACTIVITY);
        if let Some(title) = &self.title {
            builder.add(&subject, rdfs::LABEL, Literal::string(title));
        }
        if let Some(description) = &self.description {
            builder.add(&subject, dcterms::DESCRIPTION, Literal::string(description));
        }
        if let Some(started) = &self.started_at {
            builder.add(&subject, prov::STARTED_AT_TIME, started);
        }
        if let Some(ended) = &self.ended_at {
            builder.add(&subject, prov::ENDED_AT_TIME, ended);
        }
        if let Some(agent) = &self.associated_with {
            builder.add(&subject, prov::WAS_ASSOCIATED_WITH, Term::iri(agent));
        }
        for entity in self.used.iter() {
            builder.add(&subject, prov::USED, entity.subject());
            entity.write_to(builder);
        }
        for entity in self.generated.iter() {
            builder.add(&subject, prov::GENERATED, entity.subject());
            entity.write_to(builder);
        }
    }

    /// Rehydrate the activity at `uri` from a parsed graph.
    ///
    /// Fails with [`CodecError::ActivityNotFound`] if the graph has no
    /// `<uri> a prov:Activity` statement.
    pub fn from_graph(uri: &str, graph: &Graph) -> Result<Self, CodecError> {
        let subject = Term::iri(uri);
        if !graph.has_type(&subject, prov::ACTIVITY) {
            return Err(CodecError::ActivityNotFound {
                uri: uri.to_string(),
            });
        }

        let entities_for = |predicate: &str| -> EntitySet {
            graph
                .objects(&subject, predicate)
                .filter_map(Term::as_iri)
                .filter_map(|iri| Entity::from_graph(iri, graph))
                .collect()
        };

        let mut activity = Activity {
            uri: uri.to_string(),
            title: first_typed(graph, &subject, rdfs::LABEL, xsd::STRING),
            description: first_typed(graph, &subject, dcterms::DESCRIPTION, xsd::STRING),
            started_at: first_timestamp(graph, &subject, prov::STARTED_AT_TIME),
            ended_at: first_timestamp(graph, &subject, prov::ENDED_AT_TIME),
            associated_with: first_iri(graph, &subject, prov::WAS_ASSOCIATED_WITH),
            used: entities_for(prov::USED),
            generated: entities_for(prov::GENERATED),
            passthrough: Vec::new(),
        };

        let understood = activity.to_graph();
        activity.passthrough = graph.difference(&understood).cloned().collect();
        Ok(activity)
    }
}

fn first_typed(graph: &Graph, subject: &Term, predicate: &str, datatype: &str) -> Option<String> {
    graph
        .objects(subject, predicate)
        .filter_map(Term::as_literal)
        .find(|lit| lit.datatype() == Some(datatype))
        .map(|lit| lit.lexical().to_string())
}

fn first_iri(graph: &Graph, subject: &Term, predicate: &str) -> Option<String> {
    graph
        .objects(subject, predicate)
        .find_map(Term::as_iri)
        .map(str::to_string)
}

fn first_timestamp(graph: &Graph, subject: &Term, predicate: &str) -> Option<Timestamp> {
    graph
        .objects(subject, predicate)
        .filter_map(Term::as_literal)
        .find_map(Literal::as_timestamp)
}
