//! # Dependency file loader.
//!
//! One service per line: the first whitespace-separated token is the service
//! id, the remaining tokens are the ids it depends on. Lines may introduce
//! ids in any order; an id first seen as a dependency gets its own entry with
//! an empty dependency list. Blank lines are ignored.
//!
//! Loading is all-or-nothing: an unreadable file or a dependency cycle
//! rejects the whole registry and no service entity is exposed.
//!
//! ```text
//! d b c        dependencies(d) = {b, c}
//! b a          dependencies(b) = {a}
//! c a          dependencies(c) = {a}
//! e            dependencies(e) = {}      (a appears only as a dependency)
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::LoadError;
use crate::events::Bus;
use crate::graph::cycle;
use crate::graph::registry::Registry;
use crate::payload::PayloadRef;
use crate::service::Service;

/// Reads, validates and materializes the dependency file.
///
/// `payload_for` supplies the payload installed into each service.
pub(crate) fn load(
    path: &Path,
    cfg: &Config,
    bus: &Bus,
    payload_for: &dyn Fn(&str) -> PayloadRef,
) -> Result<Registry, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    let edges = parse(&contents);
    cycle::ensure_acyclic(&edges)?;
    Ok(materialize(edges, cfg, bus, payload_for))
}

/// Parses the line format into an id adjacency map.
///
/// Repeated lines for the same id merge; duplicate dependency mentions
/// collapse into one edge.
fn parse(contents: &str) -> BTreeMap<String, Vec<String>> {
    let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for line in contents.lines() {
        let mut tokens = line.split_whitespace();
        let Some(id) = tokens.next() else {
            continue;
        };
        let deps = edges.entry(id.to_string()).or_default();
        for dep in tokens {
            if !deps.iter().any(|d| d == dep) {
                deps.push(dep.to_string());
            }
        }
    }

    // Every id referenced as a dependency becomes a first-class entry.
    let referenced: Vec<String> = edges
        .values()
        .flatten()
        .filter(|dep| !edges.contains_key(dep.as_str()))
        .cloned()
        .collect();
    for dep in referenced {
        edges.entry(dep).or_default();
    }

    edges
}

/// Builds the service entities and wires the dependency links both ways.
fn materialize(
    edges: BTreeMap<String, Vec<String>>,
    cfg: &Config,
    bus: &Bus,
    payload_for: &dyn Fn(&str) -> PayloadRef,
) -> Registry {
    let services: HashMap<String, Arc<Service>> = edges
        .keys()
        .map(|id| {
            let service = Service::new(
                id.clone(),
                payload_for(id),
                bus.clone(),
                cfg.stop_timeout,
            );
            (id.clone(), Arc::new(service))
        })
        .collect();

    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, deps) in &edges {
        for dep in deps {
            dependents.entry(dep.as_str()).or_default().push(id.as_str());
        }
    }

    for (id, deps) in &edges {
        let service = &services[id.as_str()];
        service.link_dependencies(
            deps.iter()
                .map(|dep| Arc::clone(&services[dep.as_str()]))
                .collect(),
        );
        service.link_dependents(
            dependents
                .remove(id.as_str())
                .unwrap_or_default()
                .into_iter()
                .map(|parent| Arc::downgrade(&services[parent]))
                .collect(),
        );
    }

    Registry::new(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_line_format() {
        let edges = parse("d b c\nb a\nc a\ne\n");
        assert_eq!(edges.len(), 5);
        assert_eq!(edges["d"], vec!["b", "c"]);
        assert_eq!(edges["b"], vec!["a"]);
        assert!(edges["a"].is_empty());
        assert!(edges["e"].is_empty());
    }

    #[test]
    fn ignores_blank_lines() {
        let edges = parse("\nb a\n\n   \ne\n");
        assert_eq!(edges.len(), 3);
        assert!(edges.contains_key("a"));
    }

    #[test]
    fn merges_repeated_lines_and_duplicate_edges() {
        let edges = parse("d b\nd c\nd b b\n");
        assert_eq!(edges["d"], vec!["b", "c"]);
    }
}
