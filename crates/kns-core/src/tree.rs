//! The group tree view-model and its renderings.
//!
//! [`GroupNode::build`] walks the hierarchy with an explicit stack and
//! assembles the nested model bottom-up, so depth is bounded by memory rather
//! than by the call stack. The JSON shape matches a D3 hierarchy: every node
//! carries a `children` array.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hierarchy::GroupTree;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
  pub group_id:         Uuid,
  pub name:             String,
  pub slug:             String,
  pub leader_name:      String,
  pub location:         String,
  /// Members plus the leader.
  pub member_count:     usize,
  pub descendant_count: usize,
  pub children:         Vec<GroupNode>,
}

/// Per-group figures the tree cannot derive from groups alone.
#[derive(Debug, Clone, Default)]
pub struct TreeStats {
  /// Members by group id, leader excluded.
  pub member_counts: HashMap<Uuid, usize>,
  /// Leader display name by group id.
  pub leader_names:  HashMap<Uuid, String>,
}

/// One row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescendantRow {
  pub depth:        usize,
  pub name:         String,
  pub slug:         String,
  pub leader_name:  String,
  pub member_count: usize,
}

impl GroupNode {
  /// The subtree rooted at `root`, or `None` if the group is unknown.
  pub fn build(tree: &GroupTree, stats: &TreeStats, root: Uuid) -> Option<Self> {
    tree.get(root)?;

    // Pre-order: (group, index of parent in `order`).
    let mut order: Vec<(Uuid, Option<usize>)> = Vec::new();
    let mut stack = vec![(root, None)];
    while let Some((id, parent)) = stack.pop() {
      if order.len() > tree.len() {
        break;
      }
      let index = order.len();
      order.push((id, parent));
      stack.extend(tree.child_ids(id).iter().rev().map(|c| (*c, Some(index))));
    }

    let mut nodes: Vec<Option<GroupNode>> = order
      .iter()
      .map(|(id, _)| tree.get(*id).map(|g| GroupNode {
        group_id:         g.group_id,
        name:             g.name.clone(),
        slug:             g.slug.clone(),
        leader_name:      stats.leader_names.get(&g.group_id).cloned().unwrap_or_default(),
        location:         g.location_display(),
        member_count:     stats.member_counts.get(&g.group_id).copied().unwrap_or(0) + 1,
        descendant_count: 0,
        children:         Vec::new(),
      }))
      .collect();

    // Reverse pre-order finishes every child before its parent.
    for index in (1..order.len()).rev() {
      let Some(mut node) = nodes[index].take() else { continue };
      node.children.reverse();
      let Some(parent) = order[index].1.and_then(|p| nodes[p].as_mut()) else { continue };
      parent.descendant_count += 1 + node.descendant_count;
      parent.children.push(node);
    }

    let mut root = nodes.first_mut()?.take()?;
    root.children.reverse();
    Some(root)
  }

  /// The descendants of this node in pre-order, depth 1 for children.
  pub fn flatten(&self) -> Vec<DescendantRow> {
    let mut rows = Vec::with_capacity(self.descendant_count);
    let mut stack: Vec<(usize, &GroupNode)> =
      self.children.iter().rev().map(|c| (1, c)).collect();
    while let Some((depth, node)) = stack.pop() {
      rows.push(DescendantRow {
        depth,
        name: node.name.clone(),
        slug: node.slug.clone(),
        leader_name: node.leader_name.clone(),
        member_count: node.member_count,
      });
      stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
    }
    rows
  }

  /// A nested `<ul>` list. All text is HTML-escaped.
  pub fn render_html(&self) -> String {
    enum Step<'a> {
      Open(&'a GroupNode),
      Close { has_children: bool },
    }

    let mut out = String::from("<ul class=\"kns-tree\">");
    let mut stack = vec![Step::Open(self)];
    while let Some(step) = stack.pop() {
      match step {
        Step::Open(node) => {
          out.push_str(&format!(
            "<li data-slug=\"{}\"><span class=\"group-name\">{}</span> \
             <span class=\"group-meta\">{} &middot; {} &middot; {} members</span>",
            escape(&node.slug),
            escape(&node.name),
            escape(&node.leader_name),
            escape(&node.location),
            node.member_count,
          ));
          let has_children = !node.children.is_empty();
          stack.push(Step::Close { has_children });
          if has_children {
            out.push_str("<ul>");
            stack.extend(node.children.iter().rev().map(Step::Open));
          }
        }
        Step::Close { has_children } => {
          if has_children {
            out.push_str("</ul>");
          }
          out.push_str("</li>");
        }
      }
    }
    out.push_str("</ul>");
    out
  }
}

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hierarchy::tests::{fixture, group};

  fn stats(f: &crate::hierarchy::tests::Fixture) -> TreeStats {
    TreeStats {
      member_counts: HashMap::from([(f.root.group_id, 4), (f.alpha.group_id, 2)]),
      leader_names:  HashMap::from([(f.root.group_id, "Ada Lovelace".to_owned())]),
    }
  }

  #[test]
  fn builds_nested_model_ordered_by_name() {
    let f = fixture();
    let node = GroupNode::build(&f.tree, &stats(&f), f.root.group_id).unwrap();

    assert_eq!(node.name, "Root");
    assert_eq!(node.leader_name, "Ada Lovelace");
    assert_eq!(node.member_count, 5);
    assert_eq!(node.descendant_count, 4);

    let names: Vec<_> = node.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta", "Gamma"]);

    let alpha = &node.children[0];
    assert_eq!(alpha.member_count, 3);
    assert_eq!(alpha.descendant_count, 1);
    assert_eq!(alpha.children[0].name, "Alpha One");
    assert_eq!(alpha.children[0].member_count, 1);
  }

  #[test]
  fn subtree_of_inner_node() {
    let f = fixture();
    let node = GroupNode::build(&f.tree, &TreeStats::default(), f.alpha.group_id).unwrap();
    assert_eq!(node.descendant_count, 1);
    assert_eq!(node.children.len(), 1);
    assert!(GroupNode::build(&f.tree, &TreeStats::default(), Uuid::new_v4()).is_none());
  }

  #[test]
  fn flatten_is_pre_order() {
    let f = fixture();
    let node = GroupNode::build(&f.tree, &stats(&f), f.root.group_id).unwrap();
    let rows: Vec<_> = node.flatten().into_iter().map(|r| (r.depth, r.name)).collect();
    assert_eq!(rows, [
      (1, "Alpha".to_owned()),
      (2, "Alpha One".to_owned()),
      (1, "Beta".to_owned()),
      (1, "Gamma".to_owned()),
    ]);
  }

  #[test]
  fn deep_chain_does_not_recurse() {
    let mut groups = vec![group("Level 0", None)];
    for i in 1..5_000 {
      let parent = groups[i - 1].clone();
      groups.push(group(&format!("Level {i}"), Some(&parent)));
    }
    let root = groups[0].group_id;
    let tree = GroupTree::new(groups);
    let node = GroupNode::build(&tree, &TreeStats::default(), root).unwrap();
    assert_eq!(node.descendant_count, 4_999);
    assert_eq!(node.flatten().len(), 4_999);
    assert!(node.render_html().ends_with("</li></ul>"));
  }

  #[test]
  fn html_is_nested_and_escaped() {
    let mut root = group("Root", None);
    root.name = "<Root & Co>".into();
    let child = group("Child", Some(&root));
    let tree = GroupTree::new([root.clone(), child]);
    let node = GroupNode::build(&tree, &TreeStats::default(), root.group_id).unwrap();
    let html = node.render_html();

    assert!(html.starts_with("<ul class=\"kns-tree\"><li data-slug=\"root\">"));
    assert!(html.contains("&lt;Root &amp; Co&gt;"));
    assert!(!html.contains("<Root"));
    assert!(html.contains("<ul><li data-slug=\"child\">"));
    assert_eq!(html.matches("<li").count(), html.matches("</li>").count());
    assert_eq!(html.matches("<ul").count(), html.matches("</ul>").count());
  }

  #[test]
  fn json_uses_children_arrays() {
    let f = fixture();
    let node = GroupNode::build(&f.tree, &TreeStats::default(), f.beta.group_id).unwrap();
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["children"], serde_json::json!([]));
    assert_eq!(json["member_count"], 1);
  }
}
