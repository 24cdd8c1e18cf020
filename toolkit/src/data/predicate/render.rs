//! SQL rendering
//!
//! Depth-first walk of the IR producing WHERE text and the ordered parameter
//! list. Parameter names are `<field>_p<n>` with one counter per render call,
//! so a field used twice never collides with itself.

use serde::Serialize;

use super::ir::{Group, Leaf, PredicateNode};
use super::value::Value;

/// Named parameter bound by a rendered predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// WHERE text plus parameters in left-to-right discovery order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedQuery {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl RenderedQuery {
    /// Look up a bound value by parameter name (without the `@`)
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Render a parsed predicate
pub fn render(root: &PredicateNode, escape_like: bool) -> RenderedQuery {
    let mut renderer = Renderer {
        escape_like,
        counter: 0,
        sql: String::new(),
        parameters: Vec::new(),
    };

    match root {
        PredicateNode::Leaf(leaf) => renderer.leaf(leaf),
        PredicateNode::Group(group) => renderer.children(group),
    }

    RenderedQuery {
        sql: renderer.sql,
        parameters: renderer.parameters,
    }
}

struct Renderer {
    escape_like: bool,
    counter: usize,
    sql: String,
    parameters: Vec<Parameter>,
}

impl Renderer {
    fn node(&mut self, node: &PredicateNode) {
        match node {
            PredicateNode::Leaf(leaf) => self.leaf(leaf),
            PredicateNode::Group(group) if group.children.len() == 1 => {
                self.node(&group.children[0])
            }
            PredicateNode::Group(group) => {
                self.sql.push('(');
                self.children(group);
                self.sql.push(')');
            }
        }
    }

    fn children(&mut self, group: &Group) {
        for (i, child) in group.children.iter().enumerate() {
            if i > 0 {
                self.sql.push(' ');
                if let Some(link) = child.link() {
                    self.sql.push_str(link.as_str());
                    self.sql.push(' ');
                }
            }
            self.node(child);
        }
    }

    fn leaf(&mut self, leaf: &Leaf) {
        if leaf.value.is_null() {
            let test = if leaf.operator == "=" {
                "IS NULL"
            } else {
                "IS NOT NULL"
            };
            self.sql.push_str(&format!("{} {}", leaf.field, test));
            return;
        }

        let name = format!("{}_p{}", leaf.field, self.counter);
        self.counter += 1;

        self.sql
            .push_str(&format!("{} {} @{}", leaf.field, leaf.operator, name));
        if self.escape_like && leaf.operator.ends_with("LIKE") {
            self.sql.push_str(" ESCAPE '\\'");
        }

        self.parameters.push(Parameter {
            name,
            value: leaf.value.clone(),
        });
    }
}
