use std::slice::Iter;

use crate::document::{MetadataNode, Scalar};

enum Frame<'a> {
    Record(Iter<'a, (String, MetadataNode)>),
    Sequence(Iter<'a, MetadataNode>),
}

impl<'a> Frame<'a> {
    fn of(node: &'a MetadataNode) -> Option<Self> {
        match node {
            MetadataNode::Record(fields) => Some(Frame::Record(fields.iter())),
            MetadataNode::Sequence(items) => Some(Frame::Sequence(items.iter())),
            MetadataNode::Scalar(_) => None,
        }
    }
}

/// Collect every value bound to `field` anywhere below `node`, in document
/// order.
///
/// A matching value is recorded and then still descended into, so a field
/// nested inside a value of the same name is found as well. Scalars yield
/// nothing. The walk keeps its own stack, so depth is bounded by memory
/// rather than by the thread's call stack.
pub fn collect<'a>(node: &'a MetadataNode, field: &str) -> Vec<&'a MetadataNode> {
    let mut found = Vec::new();
    let mut stack: Vec<Frame<'a>> = Frame::of(node).into_iter().collect();

    while let Some(frame) = stack.last_mut() {
        let next = match frame {
            Frame::Record(fields) => fields.next().map(|(key, value)| {
                if key == field {
                    found.push(value);
                }
                value
            }),
            Frame::Sequence(items) => items.next(),
        };
        match next {
            Some(child) => {
                if let Some(frame) = Frame::of(child) {
                    stack.push(frame);
                }
            }
            None => {
                stack.pop();
            }
        }
    }

    found
}

/// Scalar values bound to `field`; record and list values are skipped.
pub fn collect_scalars<'a>(node: &'a MetadataNode, field: &str) -> Vec<&'a Scalar> {
    collect(node, field)
        .into_iter()
        .filter_map(MetadataNode::as_scalar)
        .collect()
}
