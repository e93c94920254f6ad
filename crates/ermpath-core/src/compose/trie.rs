use crate::{
    compose::ROOT_ALIAS,
    config::Config,
    source::{ResolvedHop, ResolvedSource},
};
use std::collections::BTreeMap;

///
/// HopTrie
///
/// Foreign-key hops keyed by `(direction, constraint, filter)`. A node is
/// aliased when a source ends there, when it branches, when a sourcekey
/// ending there is used more than once, or when its alias is forced.
/// Every other node has exactly one child and is inlined.
///

#[derive(Debug, Default)]
pub(super) struct HopTrie {
    root: Node,
}

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<String, (ResolvedHop, Self)>,
    endpoint: bool,
    shared: bool,
    forced: Option<String>,
    alias: Option<String>,
}

impl Node {
    fn needs_alias(&self) -> bool {
        self.endpoint || self.shared || self.forced.is_some() || self.children.len() > 1
    }
}

///
/// Emitted
///

pub(super) struct Emitted {
    pub segments: Vec<String>,
    pub joins: usize,
    pub aliases: usize,
}

impl HopTrie {
    pub fn insert(
        &mut self,
        source: &ResolvedSource,
        key_uses: &BTreeMap<&str, usize>,
        config: &Config,
    ) {
        if source.hops.is_empty() {
            return;
        }

        let mut depth_marks: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (key, len) in &source.prefixes {
            if *len > 0 {
                depth_marks.entry(*len).or_default().push(key);
            }
        }

        let mut node = &mut self.root;
        for (index, hop) in source.hops.iter().enumerate() {
            let (_, child) = node
                .children
                .entry(hop.canonical())
                .or_insert_with(|| (hop.clone(), Node::default()));
            node = child;

            for key in depth_marks.get(&(index + 1)).into_iter().flatten() {
                if key_uses.get(key).copied().unwrap_or_default() > 1 {
                    node.shared = true;
                }
                if node.forced.is_none()
                    && let Some(alias) = config.forced_aliases.get(*key)
                {
                    node.forced = Some(alias.clone());
                }
            }
        }
        node.endpoint = true;
    }

    /// Assign aliases and write the join segments.
    pub fn emit(&mut self) -> Emitted {
        let mut next = 0usize;
        assign(&mut self.root, &mut next);

        let mut writer = Writer {
            segments: Vec::new(),
            position: Some(ROOT_ALIAS.to_string()),
            joins: 0,
        };
        writer.children(&self.root, ROOT_ALIAS);
        if writer.position.as_deref() != Some(ROOT_ALIAS) {
            writer.segments.push(format!("${ROOT_ALIAS}"));
        }

        Emitted {
            segments: writer.segments,
            joins: writer.joins,
            aliases: next,
        }
    }

    /// Alias of the node reached by `hops`, if it has one.
    pub fn alias_at(&self, hops: &[ResolvedHop]) -> Option<String> {
        if hops.is_empty() {
            return None;
        }
        let mut node = &self.root;
        for hop in hops {
            node = &node.children.get(&hop.canonical())?.1;
        }

        node.alias.clone()
    }
}

// Depth-first over the ordered children, so numbering is canonical.
fn assign(node: &mut Node, next: &mut usize) {
    for (_, child) in node.children.values_mut() {
        if child.needs_alias() {
            child.alias = Some(match &child.forced {
                Some(forced) => forced.clone(),
                None => {
                    *next += 1;
                    format!("F{next}")
                }
            });
        }
        assign(child, next);
    }
}

///
/// Writer
///

struct Writer {
    segments: Vec<String>,
    position: Option<String>,
    joins: usize,
}

impl Writer {
    fn children(&mut self, node: &Node, anchor: &str) {
        for (hop, child) in node.children.values() {
            if self.position.as_deref() != Some(anchor) {
                self.segments.push(format!("${anchor}"));
                self.position = Some(anchor.to_string());
            }
            self.chain(hop, child);
        }
    }

    fn chain(&mut self, hop: &ResolvedHop, node: &Node) {
        self.joins += 1;
        match &node.alias {
            Some(alias) => self.segments.push(format!("{alias}:=left{}", hop.link())),
            None => self.segments.push(format!("left{}", hop.link())),
        }
        if let Some(filter) = &hop.filter {
            self.segments.push(filter.to_uri());
        }

        match &node.alias {
            Some(alias) => {
                self.position = Some(alias.clone());
                self.children(node, alias);
            }
            None => {
                self.position = None;
                for (hop, child) in node.children.values() {
                    self.chain(hop, child);
                }
            }
        }
    }
}
