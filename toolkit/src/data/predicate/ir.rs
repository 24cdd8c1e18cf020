//! Intermediate representation between parsing and rendering
//!
//! A predicate parses into a tree of leaves (one comparison each) and groups
//! (children rendered together inside one clause). Every node except the
//! first child of a group carries the logical operator linking it to its
//! predecessor.

use super::operators::LogicalOp;
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub link: Option<LogicalOp>,
    pub field: String,
    pub operator: &'static str,
    pub value: Value,
    pub nested: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub link: Option<LogicalOp>,
    pub children: Vec<PredicateNode>,
}

impl Group {
    /// Linking operator of the last child
    pub fn trailing_link(&self) -> Option<LogicalOp> {
        self.children.last().and_then(PredicateNode::link)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Leaf(Leaf),
    Group(Group),
}

impl PredicateNode {
    pub fn link(&self) -> Option<LogicalOp> {
        match self {
            Self::Leaf(leaf) => leaf.link,
            Self::Group(group) => group.link,
        }
    }

    pub fn set_link(&mut self, link: Option<LogicalOp>) {
        match self {
            Self::Leaf(leaf) => leaf.link = link,
            Self::Group(group) => group.link = link,
        }
    }

    /// Builder-style variant of `set_link`
    pub fn linked(mut self, link: Option<LogicalOp>) -> Self {
        self.set_link(link);
        self
    }

    /// All leaves in left-to-right order
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            Self::Leaf(leaf) => out.push(leaf),
            Self::Group(group) => {
                for child in &group.children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}
