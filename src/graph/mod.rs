//! View-model derivation: flat contact list -> positioned primary/secondary graph.
//!
//! The whole graph is rebuilt from each snapshot; nothing is carried over
//! between calls. Secondaries whose `linkedId` names no primary in the
//! snapshot are left out without complaint.

pub mod layout;

pub use layout::Position;

use crate::contact::{ContactId, ContactRecord};
use serde::Serialize;

pub const EDGE_LABEL: &str = "linked to";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactNodeView {
    pub id: ContactId,
    pub position: Position,
    pub contact: ContactRecord,
    pub is_primary: bool,
    /// Consolidated for primaries, the contact's own email otherwise.
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    /// Directly linked secondaries; always 0 on secondary nodes.
    pub secondary_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactEdgeView {
    pub id: String,
    pub source: ContactId,
    pub target: ContactId,
    pub label: &'static str,
    pub animated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactGraph {
    pub nodes: Vec<ContactNodeView>,
    pub edges: Vec<ContactEdgeView>,
}

impl ContactGraph {
    pub fn primaries(&self) -> impl Iterator<Item = &ContactNodeView> {
        self.nodes.iter().filter(|n| n.is_primary)
    }
}

/// Derive the node/edge graph for a contact snapshot.
pub fn derive(contacts: &[ContactRecord]) -> ContactGraph {
    let (primaries, secondaries): (Vec<&ContactRecord>, Vec<&ContactRecord>) =
        contacts.iter().partition(|c| c.is_primary());

    let mut graph = ContactGraph::default();
    let mut layout = layout::ColumnLayout::default();

    for primary in primaries {
        let related: Vec<&ContactRecord> = secondaries
            .iter()
            .copied()
            .filter(|s| s.linked_id.as_ref() == Some(&primary.id))
            .collect();

        let emails = consolidate(primary.email(), related.iter().map(|s| s.email()));
        let phone_numbers = consolidate(
            primary.phone_number(),
            related.iter().map(|s| s.phone_number()),
        );

        let position = layout.place_primary(related.len());
        graph.nodes.push(ContactNodeView {
            id: primary.id.clone(),
            position,
            contact: primary.clone(),
            is_primary: true,
            emails,
            phone_numbers,
            secondary_count: related.len(),
        });

        for (idx, secondary) in related.into_iter().enumerate() {
            graph.nodes.push(ContactNodeView {
                id: secondary.id.clone(),
                position: layout::secondary_position(position, idx),
                contact: secondary.clone(),
                is_primary: false,
                emails: secondary.email().map(str::to_string).into_iter().collect(),
                phone_numbers: secondary
                    .phone_number()
                    .map(str::to_string)
                    .into_iter()
                    .collect(),
                secondary_count: 0,
            });
            graph.edges.push(ContactEdgeView {
                id: format!("{}-{}", primary.id, secondary.id),
                source: primary.id.clone(),
                target: secondary.id.clone(),
                label: EDGE_LABEL,
                animated: true,
            });
        }
    }

    graph
}

/// Primary's value first, then each secondary's; first occurrence wins.
fn consolidate<'a>(
    own: Option<&'a str>,
    linked: impl Iterator<Item = Option<&'a str>>,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in std::iter::once(own).chain(linked).flatten() {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::LinkPrecedence;
    use pretty_assertions::assert_eq;

    fn primary(id: &str, email: Option<&str>, phone: Option<&str>) -> ContactRecord {
        ContactRecord {
            id: ContactId::new(id),
            email: email.map(str::to_string),
            phone_number: phone.map(str::to_string),
            linked_id: None,
            link_precedence: LinkPrecedence::Primary,
            created_at: String::new(),
            updated_at: String::new(),
            deleted_at: None,
        }
    }

    fn secondary(
        id: &str,
        linked: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> ContactRecord {
        ContactRecord {
            linked_id: Some(ContactId::new(linked)),
            link_precedence: LinkPrecedence::Secondary,
            ..primary(id, email, phone)
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input() {
        assert_eq!(derive(&[]), ContactGraph::default());
    }

    #[test]
    fn single_primary_without_secondaries() {
        let graph = derive(&[primary("1", Some("p@x.com"), Some("+1"))]);

        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        let node = &graph.nodes[0];
        assert!(node.is_primary);
        assert_eq!(node.emails, strings(&["p@x.com"]));
        assert_eq!(node.phone_numbers, strings(&["+1"]));
        assert_eq!(node.secondary_count, 0);
        assert_eq!(node.position, Position { x: 100, y: 100 });
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let graph = derive(&[
            primary("1", Some("a@x.com"), None),
            secondary("2", "1", Some("a@x.com"), None),
            secondary("3", "1", Some("b@x.com"), None),
        ]);

        assert_eq!(graph.nodes[0].emails, strings(&["a@x.com", "b@x.com"]));
        assert_eq!(graph.nodes[0].secondary_count, 2);
    }

    #[test]
    fn missing_primary_phone_leaves_no_gap() {
        let graph = derive(&[
            primary("1", Some("a@x.com"), None),
            secondary("2", "1", None, Some("111")),
            secondary("3", "1", None, Some("222")),
            secondary("4", "1", None, Some("111")),
        ]);

        assert_eq!(graph.nodes[0].phone_numbers, strings(&["111", "222"]));
        assert_eq!(graph.nodes[0].emails, strings(&["a@x.com"]));
    }

    #[test]
    fn secondary_nodes_carry_only_their_own_fields() {
        let graph = derive(&[
            primary("1", Some("a@x.com"), Some("111")),
            secondary("2", "1", Some("b@x.com"), None),
            secondary("3", "1", None, None),
        ]);

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let second = &graph.nodes[1];
        assert!(!second.is_primary);
        assert_eq!(second.emails, strings(&["b@x.com"]));
        assert!(second.phone_numbers.is_empty());
        assert_eq!(second.secondary_count, 0);

        let bare = &graph.nodes[2];
        assert!(bare.emails.is_empty());
        assert!(bare.phone_numbers.is_empty());
    }

    #[test]
    fn orphans_are_dropped() {
        let graph = derive(&[
            primary("1", Some("a@x.com"), None),
            secondary("2", "1", Some("b@x.com"), None),
            secondary("9", "404", Some("ghost@x.com"), None),
        ]);

        assert!(graph.nodes.iter().all(|n| n.id.as_str() != "9"));
        assert!(graph.edges.iter().all(|e| e.target.as_str() != "9"));
        assert_eq!(graph.nodes[0].emails, strings(&["a@x.com", "b@x.com"]));
    }

    #[test]
    fn edge_count_matches_linked_secondaries() {
        let contacts = vec![
            secondary("s0", "p2", Some("early@x.com"), None),
            primary("p1", Some("one@x.com"), None),
            primary("p2", None, Some("222")),
            secondary("s1", "p1", None, Some("333")),
            secondary("s2", "p2", Some("two@x.com"), None),
            secondary("s3", "missing", None, None),
        ];
        let graph = derive(&contacts);

        assert_eq!(graph.edges.len(), 3);
        let edges: Vec<(&str, &str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.id.as_str(), e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("p1-s1", "p1", "s1"),
                ("p2-s0", "p2", "s0"),
                ("p2-s2", "p2", "s2"),
            ]
        );
        assert!(graph.edges.iter().all(|e| e.label == EDGE_LABEL && e.animated));
    }

    #[test]
    fn layout_follows_primary_order() {
        let graph = derive(&[
            primary("p1", None, None),
            secondary("a", "p1", None, None),
            secondary("b", "p1", None, None),
            secondary("c", "p1", None, None),
            primary("p2", None, None),
            secondary("d", "p2", None, None),
        ]);

        let positions: Vec<(&str, i64, i64)> = graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.position.x, n.position.y))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("p1", 100, 100),
                ("a", 500, 100),
                ("b", 500, 300),
                ("c", 500, 500),
                ("p2", 100, 800),
                ("d", 500, 800),
            ]
        );
    }

    #[test]
    fn deterministic() {
        let contacts = vec![
            primary("1", Some("a@x.com"), Some("1")),
            secondary("2", "1", Some("b@x.com"), Some("2")),
            primary("3", Some("c@x.com"), None),
            secondary("4", "3", Some("c@x.com"), Some("4")),
        ];
        assert_eq!(derive(&contacts), derive(&contacts.clone()));
        assert_eq!(derive(&contacts).primaries().count(), 2);
    }
}
