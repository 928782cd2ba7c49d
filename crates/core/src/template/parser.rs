use serde_json::Value as Json;
use tracing::debug;

use crate::error::{HamlyError, Result};

/// One node of a parsed template
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `%name.class#id{"attr": value} inline text`
    Tag {
        name: String,
        attrs: Vec<(String, Json)>,
        children: Vec<Node>,
    },
    /// Raw markup, written as is
    Text(String),
    /// `= path`, looked up in the render context and escaped
    Output(String),
}

// A non-blank source line and the lines nested under it
struct Line<'a> {
    num: usize,
    indent: usize,
    content: &'a str,
    children: Vec<Line<'a>>,
}

pub struct TemplateParser;

impl TemplateParser {
    /// Parse template source into a node tree
    pub fn parse(source: &str) -> Result<Vec<Node>> {
        let lines = Self::parse_lines(source)?;
        debug!("Parsed {} template lines", lines.len());
        Self::make_tree(lines)?
            .into_iter()
            .map(Self::line_to_node_tree)
            .collect()
    }

    fn parse_lines(source: &str) -> Result<Vec<Line<'_>>> {
        let mut lines = Vec::new();
        for (index, data) in source.split('\n').enumerate() {
            let content = data.trim();
            // blank lines and `/` comments
            if content.is_empty() || content.starts_with('/') {
                continue;
            }
            let indent = data.len() - data.trim_start().len();
            if indent % 2 != 0 {
                return Err(HamlyError::template(index + 1, "indent must be a multiple of two spaces"));
            }
            lines.push(Line {
                num: index + 1,
                indent: indent / 2,
                content,
                children: Vec::new(),
            });
        }
        Ok(lines)
    }

    // stack[k] always holds the open line at depth k
    fn make_tree(lines: Vec<Line<'_>>) -> Result<Vec<Line<'_>>> {
        let mut roots = Vec::new();
        let mut stack: Vec<Line<'_>> = Vec::new();

        for line in lines {
            if line.indent > stack.len() {
                return Err(HamlyError::template(line.num, "indent skips a level"));
            }
            Self::close_to(&mut stack, &mut roots, line.indent);
            stack.push(line);
        }
        Self::close_to(&mut stack, &mut roots, 0);

        Ok(roots)
    }

    fn close_to<'a>(stack: &mut Vec<Line<'a>>, roots: &mut Vec<Line<'a>>, depth: usize) {
        while stack.len() > depth {
            let Some(line) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some(parent) => parent.children.push(line),
                None => roots.push(line),
            }
        }
    }

    fn line_to_node_tree(line: Line<'_>) -> Result<Node> {
        let Line {
            num,
            content,
            children: nested,
            ..
        } = line;
        let mut node = Self::line_to_node(num, content)?;

        if !nested.is_empty() {
            let Node::Tag { children, .. } = &mut node else {
                return Err(HamlyError::template(num, "only tags can have nested lines"));
            };
            for child in nested {
                children.push(Self::line_to_node_tree(child)?);
            }
        }

        Ok(node)
    }

    fn line_to_node(num: usize, content: &str) -> Result<Node> {
        match content.chars().next() {
            Some('%' | '.' | '#') => Self::line_to_tag(num, content),
            Some('=') => Self::line_to_output(num, content[1..].trim()),
            Some('-') => Err(HamlyError::template(num, "control lines are not supported")),
            Some('+') => Err(HamlyError::template(num, "statement lines are not supported")),
            _ => Ok(Node::Text(content.to_string())),
        }
    }

    fn line_to_output(num: usize, path: &str) -> Result<Node> {
        let valid = !path.is_empty()
            && path
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'));
        if !valid {
            return Err(HamlyError::template(
                num,
                format!("expected a value path after '=', found {path:?}"),
            ));
        }
        Ok(Node::Output(path.to_string()))
    }

    fn line_to_tag(num: usize, content: &str) -> Result<Node> {
        let mut data = content;
        let mut name = "div";
        let mut classes: Vec<&str> = Vec::new();
        let mut id: Option<&str> = None;

        while let Some(sigil @ ('%' | '.' | '#')) = data.chars().next() {
            let rest = &data[1..];
            let end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let word = &rest[..end];
            if word.is_empty() {
                return Err(HamlyError::template(num, format!("expected a name after '{sigil}'")));
            }
            match sigil {
                '%' => name = word,
                '.' => classes.push(word),
                _ => id = Some(word),
            }
            data = &rest[end..];
        }

        let mut attrs = Vec::new();
        if !classes.is_empty() {
            attrs.push(("class".to_string(), Json::String(classes.join(" "))));
        }
        if let Some(id) = id {
            attrs.push(("id".to_string(), Json::String(id.to_string())));
        }

        if data.starts_with('(') {
            return Err(HamlyError::template(num, "parenthesised attributes are not supported"));
        }
        if data.starts_with('{') {
            let end = Self::closing_brace(data)
                .ok_or_else(|| HamlyError::template(num, "unbalanced '{' in attributes"))?;
            let map: serde_json::Map<String, Json> = serde_json::from_str(&data[..=end])
                .map_err(|e| HamlyError::template(num, format!("attributes must be a JSON object: {e}")))?;
            attrs.extend(map);
            data = &data[end + 1..];
        }

        let mut children = Vec::new();
        let inline = data.trim();
        if !inline.is_empty() {
            children.push(Self::line_to_node(num, inline)?);
        }

        Ok(Node::Tag {
            name: name.to_string(),
            attrs,
            children,
        })
    }

    /// Byte index of the `}` closing the `{` that starts `data`
    fn closing_brace(data: &str) -> Option<usize> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, c) in data.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }
}
