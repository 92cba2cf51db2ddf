//! Namespace tree builder.
//!
//! Turns the flat trigger/shared record sets of one organization into a
//! nested folder tree. Pure: no I/O, no cache — callers rebuild on every
//! read. Triggers and shareds live in one merged path space; equal paths of
//! different kinds become two sibling leaves distinguished by node type.

use serde::{Deserialize, Serialize};

use crate::types::{Shared, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Shared,
    Trigger,
}

/// Synthetic enable state of a folder, derived from its descendant leaves.
/// An empty folder is `Mixed`: there is nothing to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderState {
    AllEnabled,
    AllDisabled,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Absolute path of this node; folders keep their trailing separator.
    pub slug: String,
    /// Last path segment (the root keeps its full path, or `root` for `/`).
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FolderState>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn folder(slug: String, name: String) -> Self {
        Self {
            id: None,
            slug,
            name,
            kind: NodeKind::Folder,
            enable: None,
            state: None,
            children: Vec::new(),
        }
    }

    fn leaf(id: String, slug: String, name: String, kind: NodeKind, enable: bool) -> Self {
        Self {
            id: Some(id),
            slug,
            name,
            kind,
            enable: Some(enable),
            state: None,
            children: Vec::new(),
        }
    }
}

/// Build the folder tree rooted at `path` from flat record sets. Records
/// whose name does not start with `path` are ignored.
pub fn build_tree(path: &str, triggers: &[Trigger], shareds: &[Shared]) -> TreeNode {
    let root_name = if path == "/" { "root" } else { path };
    let mut root = TreeNode::folder(path.to_string(), root_name.to_string());

    for trigger in triggers {
        if trigger.name.starts_with(path) {
            insert(
                &mut root,
                &trigger.name,
                trigger.id.clone(),
                NodeKind::Trigger,
                trigger.enable,
            );
        }
    }
    for shared in shareds {
        if shared.name.starts_with(path) {
            insert(
                &mut root,
                &shared.name,
                shared.id.clone(),
                NodeKind::Shared,
                shared.enable,
            );
        }
    }

    sort_children(&mut root.children);
    annotate_folder_state(&mut root);
    root
}

/// Walk the full name segment by segment from the namespace root, creating
/// folder nodes on the way and a leaf at the end.
fn insert(root: &mut TreeNode, name: &str, id: String, kind: NodeKind, enable: bool) {
    let segments: Vec<&str> = name[1..].split('/').collect();
    let mut node = root;
    let mut slug = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let is_leaf = i == segments.len() - 1;
        if is_leaf {
            let leaf_slug = format!("{slug}/{segment}");
            node.children
                .push(TreeNode::leaf(id, leaf_slug, segment.to_string(), kind, enable));
            return;
        }

        slug.push('/');
        slug.push_str(segment);
        let folder_slug = format!("{slug}/");

        let pos = node
            .children
            .iter()
            .position(|child| child.kind == NodeKind::Folder && child.slug == folder_slug)
            .unwrap_or_else(|| {
                node.children
                    .push(TreeNode::folder(folder_slug.clone(), segment.to_string()));
                node.children.len() - 1
            });
        node = &mut node.children[pos];
    }
}

/// Deterministic order: folders, then shareds, then triggers, each group
/// lexicographic by slug.
fn sort_children(children: &mut [TreeNode]) {
    children.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.slug.cmp(&b.slug)));
    for child in children.iter_mut() {
        if child.kind == NodeKind::Folder {
            sort_children(&mut child.children);
        }
    }
}

fn annotate_folder_state(node: &mut TreeNode) {
    let mut enabled = 0usize;
    let mut disabled = 0usize;
    count_leaves(node, &mut enabled, &mut disabled);
    node.state = Some(match (enabled, disabled) {
        (n, 0) if n > 0 => FolderState::AllEnabled,
        (0, n) if n > 0 => FolderState::AllDisabled,
        _ => FolderState::Mixed,
    });
    for child in node.children.iter_mut() {
        if child.kind == NodeKind::Folder {
            annotate_folder_state(child);
        }
    }
}

fn count_leaves(node: &TreeNode, enabled: &mut usize, disabled: &mut usize) {
    for child in &node.children {
        match child.kind {
            NodeKind::Folder => count_leaves(child, enabled, disabled),
            _ => match child.enable {
                Some(true) => *enabled += 1,
                _ => *disabled += 1,
            },
        }
    }
}
