//! # Cycle detection over the raw id adjacency map.
//!
//! Three-colour depth-first search: a node is White while unvisited, Grey
//! while somewhere on the current DFS stack, Black once fully explored.
//! Meeting a Grey node proves a cycle. The check runs over plain ids before
//! any service entity exists, so a rejected file leaves nothing behind, and
//! it is correct under any iteration order of the map.

use std::collections::{BTreeMap, HashMap};

use crate::error::LoadError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Verifies that the dependency relation is acyclic.
///
/// `edges[a] = [b, c]` means `a` depends on `b` and `c`. On failure the
/// error carries one offending cycle as a closed path.
pub(crate) fn ensure_acyclic(edges: &BTreeMap<String, Vec<String>>) -> Result<(), LoadError> {
    let mut colour: HashMap<&str, Colour> =
        edges.keys().map(|id| (id.as_str(), Colour::White)).collect();
    let mut path: Vec<&str> = Vec::new();

    for id in edges.keys() {
        if colour[id.as_str()] == Colour::White {
            visit(id, edges, &mut colour, &mut path)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    id: &'a str,
    edges: &'a BTreeMap<String, Vec<String>>,
    colour: &mut HashMap<&'a str, Colour>,
    path: &mut Vec<&'a str>,
) -> Result<(), LoadError> {
    colour.insert(id, Colour::Grey);
    path.push(id);

    if let Some(deps) = edges.get(id) {
        for dep in deps {
            match colour.get(dep.as_str()).copied().unwrap_or(Colour::White) {
                Colour::Grey => return Err(close_cycle(path, dep)),
                Colour::White => visit(dep, edges, colour, path)?,
                Colour::Black => {}
            }
        }
    }

    path.pop();
    colour.insert(id, Colour::Black);
    Ok(())
}

/// Extracts the cycle from the DFS stack and closes it on the repeated id.
fn close_cycle(path: &[&str], repeated: &str) -> LoadError {
    let start = path.iter().position(|id| *id == repeated).unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|id| id.to_string()).collect();
    cycle.push(repeated.to_string());
    LoadError::CyclicGraph { cycle }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(id, deps)| {
                (
                    id.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn accepts_a_chain() {
        let g = edges(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        assert!(ensure_acyclic(&g).is_ok());
    }

    #[test]
    fn accepts_a_diamond() {
        let g = edges(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        assert!(ensure_acyclic(&g).is_ok());
    }

    #[test]
    fn rejects_a_two_cycle() {
        let g = edges(&[("a", &["b"]), ("b", &["a"])]);
        let err = ensure_acyclic(&g).expect_err("cycle must be rejected");
        match err {
            LoadError::CyclicGraph { cycle } => {
                assert!(cycle.len() >= 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_a_self_cycle() {
        let g = edges(&[("a", &["a"])]);
        assert!(matches!(
            ensure_acyclic(&g),
            Err(LoadError::CyclicGraph { .. })
        ));
    }

    #[test]
    fn rejects_a_buried_cycle() {
        let g = edges(&[
            ("a", &[]),
            ("b", &["a", "d"]),
            ("c", &["b"]),
            ("d", &["c"]),
        ]);
        assert!(matches!(
            ensure_acyclic(&g),
            Err(LoadError::CyclicGraph { .. })
        ));
    }
}
