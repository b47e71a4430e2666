//! IRIs for the slice of RDF, PROV-O, DCAT, Dublin Core and PROMS vocabulary
//! that job provenance needs.

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
}

pub mod dcterms {
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    pub const CREATED: &str = "http://purl.org/dc/terms/created";
}

pub mod dcat {
    pub const DOWNLOAD_URL: &str = "http://www.w3.org/ns/dcat#downloadURL";
}

pub mod prov {
    pub const ACTIVITY: &str = "http://www.w3.org/ns/prov#Activity";
    pub const ENTITY: &str = "http://www.w3.org/ns/prov#Entity";
    pub const USED: &str = "http://www.w3.org/ns/prov#used";
    pub const GENERATED: &str = "http://www.w3.org/ns/prov#generated";
    pub const STARTED_AT_TIME: &str = "http://www.w3.org/ns/prov#startedAtTime";
    pub const ENDED_AT_TIME: &str = "http://www.w3.org/ns/prov#endedAtTime";
    pub const WAS_ATTRIBUTED_TO: &str = "http://www.w3.org/ns/prov#wasAttributedTo";
    pub const WAS_ASSOCIATED_WITH: &str = "http://www.w3.org/ns/prov#wasAssociatedWith";
}

pub mod proms {
    pub const SERVICE_ENTITY: &str = "http://promsns.org/def/proms#ServiceEntity";
    pub const REPORT: &str = "http://promsns.org/def/proms#Report";
    pub const BASIC_REPORT: &str = "http://promsns.org/def/proms#BasicReport";
    pub const INTERNAL_REPORT: &str = "http://promsns.org/def/proms#InternalReport";
    pub const EXTERNAL_REPORT: &str = "http://promsns.org/def/proms#ExternalReport";
    pub const NATIVE_ID: &str = "http://promsns.org/def/proms#nativeId";
    pub const REPORTING_SYSTEM: &str = "http://promsns.org/def/proms#reportingSystem";
    pub const STARTING_ACTIVITY: &str = "http://promsns.org/def/proms#startingActivity";
    pub const ENDING_ACTIVITY: &str = "http://promsns.org/def/proms#endingActivity";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}
