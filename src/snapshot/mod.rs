//! # Style Snapshot
//!
//! Walks a live visual subtree and produces a detached copy in which every
//! node carries its fully resolved style as an explicit (property, value)
//! list. Nothing in the snapshot refers back to the live tree, so the
//! rasterizer can render it without any cascade or inheritance lookups.
//!
//! The live tree is abstracted by [`LiveNode`]. Computed styles are queried
//! from each live node independently; the builder never copies a parent's
//! snapshot values into a child.

use tracing::debug;

use crate::error::{ExportError, Result};
use crate::model::Frame;

/// Tag given to text leaves in the snapshot.
pub const TEXT_TAG: &str = "#text";

/// Read-only access to one node of a live, laid-out visual tree.
pub trait LiveNode: Sized {
    /// Element tag, or [`TEXT_TAG`] for text leaves.
    fn tag(&self) -> &str;

    /// Literal text content for text leaves.
    fn text(&self) -> Option<&str>;

    /// Layout frame in the live tree's coordinate space.
    ///
    /// Text leaves return `Ok(None)`; they are painted inside their parent's
    /// content box. An element that cannot report a frame is unreadable.
    fn frame(&self) -> Result<Option<Frame>>;

    /// Fully resolved longhand styles, in a stable property order.
    fn computed_style(&self) -> Result<Vec<(String, String)>>;

    fn children(&self) -> Vec<Self>;
}

/// A detached, style-resolved copy of one node of the captured region.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub tag: String,
    /// Resolved (property, value) pairs. Never shorthand, never inherited by lookup.
    pub styles: Vec<(String, String)>,
    /// Frame relative to the region's top-left corner. For text leaves this
    /// is the parent's content box.
    pub frame: Frame,
    pub children: Vec<VisualNode>,
    pub text: Option<String>,
}

impl VisualNode {
    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// A resolved `px` style as a number, 0 when absent.
    pub fn style_px(&self, name: &str) -> f64 {
        self.style(name)
            .and_then(|v| v.strip_suffix("px"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    /// The frame minus borders and padding.
    pub fn content_box(&self) -> Frame {
        self.frame.inset(
            self.style_px("border-top-width") + self.style_px("padding-top"),
            self.style_px("border-right-width") + self.style_px("padding-right"),
            self.style_px("border-bottom-width") + self.style_px("padding-bottom"),
            self.style_px("border-left-width") + self.style_px("padding-left"),
        )
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(VisualNode::node_count).sum::<usize>()
    }
}

/// Build a detached snapshot of `root` and everything below it.
///
/// Frames are translated so that the root's top-left corner is the origin.
/// Any unreadable node aborts the whole capture.
pub fn capture<N: LiveNode>(root: &N) -> Result<VisualNode> {
    let root_frame = root.frame()?.ok_or_else(|| {
        ExportError::snapshot(format!(
            "region root <{}> has no layout frame",
            root.tag()
        ))
    })?;

    let snapshot = capture_node(root, root_frame.x, root_frame.y, None)?;
    debug!(
        nodes = snapshot.node_count(),
        width = snapshot.frame.width,
        height = snapshot.frame.height,
        "captured style snapshot"
    );
    Ok(snapshot)
}

fn capture_node<N: LiveNode>(
    node: &N,
    origin_x: f64,
    origin_y: f64,
    parent_content: Option<Frame>,
) -> Result<VisualNode> {
    let styles = node.computed_style()?;

    let frame = match node.frame()? {
        Some(f) => f.translate(-origin_x, -origin_y),
        None => parent_content.ok_or_else(|| {
            ExportError::snapshot(format!("<{}> has neither a frame nor a parent", node.tag()))
        })?,
    };

    let mut snapshot = VisualNode {
        tag: node.tag().to_string(),
        styles,
        frame,
        children: Vec::new(),
        text: node.text().map(str::to_string),
    };

    let content = snapshot.content_box();
    snapshot.children = node
        .children()
        .iter()
        .map(|child| capture_node(child, origin_x, origin_y, Some(content)))
        .collect::<Result<Vec<_>>>()?;

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A hand-built live tree where every node reports fixed values.
    #[derive(Clone)]
    struct FakeNode {
        tag: &'static str,
        frame: Option<Frame>,
        styles: Vec<(String, String)>,
        children: Vec<FakeNode>,
        text: Option<&'static str>,
        readable: bool,
    }

    impl FakeNode {
        fn element(frame: Frame, children: Vec<FakeNode>) -> Self {
            Self {
                tag: "div",
                frame: Some(frame),
                styles: vec![("padding-top".into(), "5px".into())],
                children,
                text: None,
                readable: true,
            }
        }

        fn text(content: &'static str) -> Self {
            Self {
                tag: TEXT_TAG,
                frame: None,
                styles: vec![("color".into(), "rgb(0, 0, 0)".into())],
                children: vec![],
                text: Some(content),
                readable: true,
            }
        }
    }

    impl LiveNode for FakeNode {
        fn tag(&self) -> &str {
            self.tag
        }

        fn text(&self) -> Option<&str> {
            self.text
        }

        fn frame(&self) -> Result<Option<Frame>> {
            Ok(self.frame)
        }

        fn computed_style(&self) -> Result<Vec<(String, String)>> {
            if self.readable {
                Ok(self.styles.clone())
            } else {
                Err(ExportError::snapshot("node detached"))
            }
        }

        fn children(&self) -> Vec<Self> {
            self.children.clone()
        }
    }

    #[test]
    fn test_frames_are_relative_to_root() {
        let tree = FakeNode::element(
            Frame::new(100.0, 50.0, 200.0, 80.0),
            vec![FakeNode::element(Frame::new(110.0, 60.0, 20.0, 10.0), vec![])],
        );
        let snap = capture(&tree).unwrap();
        assert_eq!(snap.frame, Frame::new(0.0, 0.0, 200.0, 80.0));
        assert_eq!(snap.children[0].frame, Frame::new(10.0, 10.0, 20.0, 10.0));
    }

    #[test]
    fn test_text_leaf_uses_parent_content_box() {
        let tree = FakeNode::element(
            Frame::new(0.0, 0.0, 100.0, 40.0),
            vec![FakeNode::text("Total")],
        );
        let snap = capture(&tree).unwrap();
        let text = &snap.children[0];
        assert!(text.is_text());
        assert_eq!(text.text.as_deref(), Some("Total"));
        assert_eq!(text.frame, Frame::new(0.0, 5.0, 100.0, 35.0));
        assert_eq!(text.style("color"), Some("rgb(0, 0, 0)"));
    }

    #[test]
    fn test_unreadable_child_aborts_capture() {
        let mut broken = FakeNode::element(Frame::new(0.0, 0.0, 1.0, 1.0), vec![]);
        broken.readable = false;
        let tree = FakeNode::element(Frame::new(0.0, 0.0, 10.0, 10.0), vec![broken]);
        assert!(matches!(capture(&tree), Err(ExportError::Snapshot(_))));
    }

    #[test]
    fn test_root_without_frame_is_rejected() {
        let tree = FakeNode::text("orphan");
        assert!(matches!(capture(&tree), Err(ExportError::Snapshot(_))));
    }

    #[test]
    fn test_node_count() {
        let tree = FakeNode::element(
            Frame::new(0.0, 0.0, 10.0, 10.0),
            vec![FakeNode::text("a"), FakeNode::text("b")],
        );
        assert_eq!(capture(&tree).unwrap().node_count(), 3);
    }
}
