/*! Implements evaluation trees: a cross-cutting record of the decisions a
ranking function takes while computing a rank or an acceptance answer.

The same evaluation code runs with or without explanations. A disabled
sink ([`Explanation::Off`]) swallows every node, so passing it never
changes a numeric or boolean result and costs almost nothing. */
use std::fmt;

/// Is a node of an evaluation tree, or the disabled sink.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Explanation {
    /// Is the disabled sink: all writes are dropped.
    Off,

    /// Is a tree node with a text and child nodes.
    Node {
        /// Is the human-readable text of this evaluation step.
        text: String,
        /// Are the sub-evaluations of this step.
        children: Vec<Explanation>,
    },
}

impl Explanation {
    /// Returns an enabled, empty root node.
    pub fn root() -> Self {
        Explanation::Node {
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Returns true unless the receiver is the disabled sink.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Explanation::Off)
    }

    /// Appends an empty child node and returns it. On the disabled sink
    /// this is a no-op returning the sink itself.
    pub fn child(&mut self) -> &mut Explanation {
        if matches!(self, Explanation::Off) {
            return self;
        }
        if let Explanation::Node { children, .. } = self {
            children.push(Explanation::root());
            return children.last_mut().expect("a child was just appended");
        }
        unreachable!()
    }

    /// Appends a child node carrying `text`.
    pub fn leaf(&mut self, text: impl Into<String>) {
        if let Explanation::Node { children, .. } = self {
            children.push(Explanation::Node {
                text: text.into(),
                children: Vec::new(),
            });
        }
    }

    /// Sets the text of the receiver.
    pub fn set_text(&mut self, new_text: impl Into<String>) {
        if let Explanation::Node { text, .. } = self {
            *text = new_text.into();
        }
    }

    /// Returns the text of the receiver, empty on the disabled sink.
    pub fn text(&self) -> &str {
        match self {
            Explanation::Off => "",
            Explanation::Node { text, .. } => text,
        }
    }

    /// Returns the children of the receiver, empty on the disabled sink.
    pub fn children(&self) -> &[Explanation] {
        match self {
            Explanation::Off => &[],
            Explanation::Node { children, .. } => children,
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        if let Explanation::Node { text, children } = self {
            for _ in 0..depth {
                write!(f, "   ")?;
            }
            writeln!(f, "{}: {}", depth, text)?;
            for child in children {
                child.fmt_indented(f, depth + 1)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_is_rendered_with_indentation() {
        let mut root = Explanation::root();
        root.set_text("k |= F -> true");
        let child = root.child();
        child.set_text("k( F ) = 0");
        child.leaf("(a=1 b=0)");

        let rendered = root.to_string();
        assert_eq!(
            "0: k |= F -> true\n   1: k( F ) = 0\n      2: (a=1 b=0)\n",
            rendered
        );
    }

    #[test]
    fn disabled_sink_swallows_everything() {
        let mut off = Explanation::Off;
        off.set_text("ignored");
        off.leaf("ignored");
        let child = off.child();
        child.set_text("ignored");
        assert!(!off.is_enabled());
        assert_eq!("", off.text());
        assert!(off.children().is_empty());
    }
}
