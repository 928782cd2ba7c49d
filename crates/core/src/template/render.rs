use std::fmt::Write;

use serde_json::Value as Json;
use tracing::{debug, trace};

use super::parser::{Node, TemplateParser};
use crate::attrs::write_attrs;
use crate::error::{HamlyError, Result};
use crate::escape::escape_into;
use crate::value::{Value, escape};

/// A parsed template, ready to render against any number of contexts
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let nodes = TemplateParser::parse(source)?;
        debug!("Template parsed into {} root nodes", nodes.len());
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render with `context` supplying the values of output lines
    pub fn render(&self, context: &Json) -> Result<String> {
        let mut output = String::new();
        self.render_into(context, &mut output)?;
        Ok(output)
    }

    pub fn render_into<W: Write>(&self, context: &Json, dest: &mut W) -> Result<()> {
        for node in &self.nodes {
            write_node(node, context, dest)?;
        }
        Ok(())
    }
}

fn write_node<W: Write>(node: &Node, context: &Json, dest: &mut W) -> Result<()> {
    match node {
        Node::Tag {
            name,
            attrs,
            children,
        } => {
            write!(dest, "<{name}")?;
            write_attrs(attr_values(attrs), &mut *dest)?;
            dest.write_str(">\n")?;
            for child in children {
                write_node(child, context, dest)?;
            }
            writeln!(dest, "</{name}>")?;
        }
        Node::Text(text) => {
            dest.write_str(text)?;
            dest.write_char('\n')?;
        }
        Node::Output(path) => {
            let value = lookup(context, path)?;
            trace!(path = path.as_str(), "Writing output value");
            match value {
                Json::String(text) => escape_into(&mut *dest, text)?,
                other => dest.write_str(&escape(other)?)?,
            }
            dest.write_char('\n')?;
        }
    }
    Ok(())
}

// Array values contribute one attribute value per item
fn attr_values(attrs: &[(String, Json)]) -> Vec<(&str, Value<'_>)> {
    let mut pairs = Vec::with_capacity(attrs.len());
    for (name, value) in attrs {
        match value {
            Json::Array(items) => pairs.extend(items.iter().map(|item| (name.as_str(), item.into()))),
            value => pairs.push((name.as_str(), value.into())),
        }
    }
    pairs
}

/// Follow a dotted path through objects and arrays
fn lookup<'a>(context: &'a Json, path: &str) -> Result<&'a Json> {
    let mut current = context;
    for part in path.split('.') {
        let next = match current {
            Json::Object(map) => map.get(part),
            Json::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| HamlyError::undefined(path))?;
    }
    Ok(current)
}
