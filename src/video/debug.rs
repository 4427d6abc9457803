//! A dependency graph of resources and submissions, recorded while debug
//! mode is on.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::assets::prelude::*;
use super::command::Command;
use super::errors::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Buffer,
    Texture,
    Framebuffer,
    Program,
    Submit,
}

impl From<Resource> for NodeKind {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Buffer(_) => NodeKind::Buffer,
            Resource::Texture(_) => NodeKind::Texture,
            Resource::Framebuffer(_) => NodeKind::Framebuffer,
            Resource::Program(_) => NodeKind::Program,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: usize,
    pub kind: NodeKind,
    pub label: String,
    /// The enclosing submission of a nested submission.
    pub parent: Option<usize>,
}

/// `from` is used by `to`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    resources: HashMap<Resource, usize>,
    #[serde(skip)]
    open: Vec<usize>,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the node of `resource`, adding it on first use.
    pub fn resource(&mut self, resource: Resource) -> usize {
        if let Some(&id) = self.resources.get(&resource) {
            return id;
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            kind: resource.into(),
            label: format!("{}", resource),
            parent: None,
        });

        self.resources.insert(resource, id);
        id
    }

    /// Adds a submission of `cmd` below the innermost open submission, and
    /// opens it.
    pub fn begin(&mut self, cmd: &Command) -> usize {
        let id = self.nodes.len();
        let label = match cmd.name() {
            Some(name) => format!("{} {}", name, cmd.id()),
            None => format!("submit {}", cmd.id()),
        };

        self.nodes.push(Node {
            id,
            kind: NodeKind::Submit,
            label,
            parent: self.open.last().cloned(),
        });

        for resource in cmd.fields().resources() {
            let from = self.resource(resource);
            let edge = Edge { from, to: id };
            if !self.edges.contains(&edge) {
                self.edges.push(edge);
            }
        }

        self.open.push(id);
        id
    }

    /// Closes the innermost open submission.
    pub fn end(&mut self) {
        self.open.pop();
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Forgets every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.resources.clear();
        self.open.clear();
    }

    /// Renders the graph in Graphviz DOT, nested submissions as clusters.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot(self))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn children(&self, parent: Option<usize>) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(move |v| v.kind == NodeKind::Submit && v.parent == parent)
    }
}

struct Dot<'a>(&'a Graph);

impl<'a> Dot<'a> {
    fn submit(&self, f: &mut fmt::Formatter, node: &Node, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let mut children = self.0.children(Some(node.id)).peekable();

        if children.peek().is_none() {
            return writeln!(f, "{}n{} [label={:?}];", indent, node.id, node.label);
        }

        writeln!(f, "{}subgraph cluster_{} {{", indent, node.id)?;
        writeln!(f, "{}  label={:?};", indent, node.label)?;
        writeln!(f, "{}  n{} [label={:?}];", indent, node.id, node.label)?;
        for child in children {
            self.submit(f, child, depth + 1)?;
        }
        writeln!(f, "{}}}", indent)
    }
}

impl<'a> fmt::Display for Dot<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "digraph pastel {{")?;

        for node in self.0.nodes.iter().filter(|v| v.kind != NodeKind::Submit) {
            writeln!(f, "  n{} [label={:?}, shape=box];", node.id, node.label)?;
        }

        for node in self.0.children(None) {
            self.submit(f, node, 1)?;
        }

        for edge in &self.0.edges {
            writeln!(f, "  n{} -> n{};", edge.from, edge.to)?;
        }

        writeln!(f, "}}")
    }
}
