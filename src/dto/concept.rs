use std::collections::HashMap;

use serde::Serialize;

use crate::db::models::concept::Concept;

/// A root of the two-level concept map with its ordered sub-concepts.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConceptTreeNode {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub sub_concepts: Vec<SubConceptNode>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubConceptNode {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

impl ConceptTreeNode {
    /// Assembles the tree from flat rows ordered level-then-order_index (the
    /// repository's ordering): level 1 rows become roots in listing order,
    /// level 2 rows attach to their parent keeping sibling order. A child
    /// whose parent row is missing is dropped rather than promoted.
    pub fn from_rows(rows: Vec<Concept>) -> Vec<ConceptTreeNode> {
        let mut roots: Vec<ConceptTreeNode> = Vec::new();
        let mut root_index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            if row.level == 1 {
                root_index.insert(row.id.clone(), roots.len());
                roots.push(ConceptTreeNode {
                    id: row.id,
                    title: row.title,
                    description: row.description,
                    sub_concepts: Vec::new(),
                });
            } else if row.level == 2 {
                let parent = row
                    .parent_id
                    .as_ref()
                    .and_then(|parent_id| root_index.get(parent_id));
                if let Some(&index) = parent {
                    roots[index].sub_concepts.push(SubConceptNode {
                        id: row.id,
                        title: row.title,
                        description: row.description,
                    });
                }
            }
        }

        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, title: &str, parent_id: Option<&str>, level: i32, order_index: i32) -> Concept {
        Concept {
            id: id.to_string(),
            book_id: "book-1".to_string(),
            title: title.to_string(),
            description: Some(format!("About {title}")),
            parent_id: parent_id.map(str::to_string),
            level,
            order_index,
            created_at: "2025-03-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_tree_keeps_root_and_sibling_order() {
        // Rows arrive level-first, order_index within each level.
        let rows = vec![
            row("a", "Cell Structure", None, 1, 0),
            row("b", "Energy", None, 1, 1),
            row("a1", "Membrane", Some("a"), 2, 0),
            row("a2", "Nucleus", Some("a"), 2, 1),
            row("b1", "ATP", Some("b"), 2, 0),
        ];

        let tree = ConceptTreeNode::from_rows(rows);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].title, "Cell Structure");
        assert_eq!(tree[1].title, "Energy");

        let subs: Vec<&str> = tree[0].sub_concepts.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(subs, vec!["Membrane", "Nucleus"]);
        assert_eq!(tree[1].sub_concepts[0].title, "ATP");
    }

    #[test]
    fn test_orphan_children_are_dropped() {
        let rows = vec![
            row("a", "Cell Structure", None, 1, 0),
            row("x1", "Stray", Some("missing"), 2, 0),
        ];

        let tree = ConceptTreeNode::from_rows(rows);

        assert_eq!(tree.len(), 1);
        assert!(tree[0].sub_concepts.is_empty());
    }

    #[test]
    fn test_empty_rows_make_empty_tree() {
        assert!(ConceptTreeNode::from_rows(Vec::new()).is_empty());
    }
}
