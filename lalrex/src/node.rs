use crate::{Span, Token};
use smartstring::alias::String;
use std::fmt::{self, Display};

/// Syntax tree produced by a successful parse.
///
/// Interior nodes own their children; there is no sharing between trees.
/// Dropping, comparing and printing walk the tree with an explicit stack, so
/// a tree as deep as its input is long is handled without recursion.
#[derive(Debug, Clone)]
pub enum Node {
    Terminal(Token),
    NonTerminal {
        label: String,
        /// Index of the production that was reduced.
        rule: usize,
        children: Vec<Node>,
    },
}

impl Node {
    /// Grammar symbol this node stands for.
    pub fn label(&self) -> &str {
        match self {
            Node::Terminal(token) => &token.label,
            Node::NonTerminal { label, .. } => label,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Terminal(_) => &[],
            Node::NonTerminal { children, .. } => children,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal(_))
    }

    /// Leaf tokens, left to right.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            while let Some(node) = stack.pop() {
                match node {
                    Node::Terminal(token) => return Some(token),
                    Node::NonTerminal { children, .. } => stack.extend(children.iter().rev()),
                }
            }
            None
        })
    }

    /// Source range covered by the node. `None` for a subtree that matched
    /// no tokens (empty productions only).
    pub fn span(&self) -> Option<Span> {
        self.tokens()
            .map(|token| token.span)
            .reduce(|acc, span| acc.merge(&span))
    }

    /// Concatenated text of the leaves, left to right.
    pub fn text(&self) -> std::string::String {
        self.tokens().map(|token| token.value.as_str()).collect()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let Node::NonTerminal { children, .. } = self else {
            return;
        };
        let mut stack = std::mem::take(children);
        while let Some(mut node) = stack.pop() {
            if let Node::NonTerminal { children, .. } = &mut node {
                stack.append(children);
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some(pair) = stack.pop() {
            match pair {
                (Node::Terminal(a), Node::Terminal(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (
                    Node::NonTerminal {
                        label: la,
                        rule: ra,
                        children: ca,
                    },
                    Node::NonTerminal {
                        label: lb,
                        rule: rb,
                        children: cb,
                    },
                ) => {
                    if la != lb || ra != rb || ca.len() != cb.len() {
                        return false;
                    }
                    stack.extend(ca.iter().zip(cb));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            write!(f, "{:width$}", "", width = depth * 2)?;
            match node {
                Node::Terminal(token) => writeln!(f, "{}", token)?,
                Node::NonTerminal { label, children, .. } => {
                    writeln!(f, "{}", label)?;
                    stack.extend(children.iter().rev().map(|child| (child, depth + 1)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, span};

    fn leaf(label: &str, value: &str, column: usize) -> Node {
        Node::Terminal(Token::new(
            label,
            value,
            span!(0, column, 0, column + value.len()).unwrap(),
        ))
    }

    #[test]
    fn span_and_text_cover_leaves() {
        let tree = Node::NonTerminal {
            label: "A".into(),
            rule: 1,
            children: vec![
                leaf("n", "12", 0),
                leaf("+", "+", 2),
                Node::NonTerminal {
                    label: "E".into(),
                    rule: 3,
                    children: vec![],
                },
                leaf("n", "3", 3),
            ],
        };
        assert_eq!(tree.text(), "12+3");
        let span = tree.span().unwrap();
        assert_eq!(span.start, Position::new(0, 0));
        assert_eq!(span.end, Position::new(0, 4));
        assert_eq!(tree.children()[2].span(), None);
        assert_eq!(tree.label(), "A");
    }

    #[test]
    fn display_indents_children() {
        let tree = Node::NonTerminal {
            label: "U".into(),
            rule: 7,
            children: vec![leaf("n", "5", 0)],
        };
        assert_eq!(tree.to_string(), "U\n  n[5]\n");
    }

    fn chain(depth: usize) -> Node {
        let mut tree = leaf("n", "1", 0);
        for _ in 0..depth {
            tree = Node::NonTerminal {
                label: "A".into(),
                rule: 1,
                children: vec![tree],
            };
        }
        tree
    }

    #[test]
    fn deep_trees_are_walked_without_recursion() {
        let tree = chain(200_000);
        assert_eq!(tree.text(), "1");
        assert_eq!(tree.span().unwrap().end, Position::new(0, 1));
        assert_eq!(tree.tokens().count(), 1);
        assert!(tree == chain(200_000));
        assert!(tree != chain(199_999));
        let shown = tree.to_string();
        assert!(shown.ends_with(&format!("{:width$}n[1]\n", "", width = 400_000)));
        drop(tree);
    }

    #[test]
    fn equality_compares_shape_and_tokens() {
        let a = Node::NonTerminal {
            label: "A".into(),
            rule: 1,
            children: vec![leaf("n", "1", 0), leaf("n", "2", 1)],
        };
        let b = Node::NonTerminal {
            label: "A".into(),
            rule: 1,
            children: vec![leaf("n", "1", 0), leaf("n", "3", 1)],
        };
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.children()[0], a);
    }
}
