//! Headless scene implementing every capability trait.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Transforms carry a local TRS
//! transform and may own shape children; a curve created through
//! [`MemoryScene::add_curve`] is a transform plus a `<name>Shape` child, the
//! same layout hosts use. Names are unique: collisions get the next free
//! numeric suffix.
//!
//! Visibility is a per-transform flag and is not inherited. Frame capture
//! draws the world-space control polygon of every curve whose transform is
//! visible, seen from the front (X right, Y up), into a PNG.

use std::path::{Path, PathBuf};

use glam::DVec3;

use crate::curve::CurveData;
use crate::error::{CaptureError, SceneError};
use crate::scene::{FrameCapture, NodeKind, SceneEdit, SceneRead, ShapeView, WorldTransform};
use crate::thumbnail::{render_front, write_png, Polyline, View};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Transform,
    Curve(CurveData),
    /// Non-curve shape (mesh, surface, ...) identified by type name.
    OtherShape(String),
}

#[derive(Clone, Debug)]
struct Node {
    name: String,
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: WorldTransform,
    visible: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryScene {
    nodes: Vec<Node>,
    selection: Vec<NodeId>,
    view: View,
    view_stack: Vec<View>,
    fail_next_capture: Option<String>,
    captures: Vec<PathBuf>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: &NodeId) -> Result<&Node, SceneError> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| SceneError::StaleHandle(format!("{id:?}")))
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, SceneError> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| SceneError::StaleHandle(format!("{id:?}")))
    }

    fn name_taken(&self, name: &str, except: Option<NodeId>) -> bool {
        self.nodes
            .iter()
            .enumerate()
            .any(|(i, n)| n.name == name && except.map_or(true, |e| e.index() != i))
    }

    /// `base` itself when free, else `base` with its trailing digits replaced
    /// by the smallest free number.
    fn unique_name(&self, base: &str, except: Option<NodeId>) -> String {
        if !self.name_taken(base, except) {
            return base.to_string();
        }
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        (1u32..)
            .map(|n| format!("{stem}{n}"))
            .find(|candidate| !self.name_taken(candidate, except))
            .unwrap_or_else(|| base.to_string())
    }

    fn push(&mut self, name: &str, data: NodeData, parent: Option<NodeId>, local: WorldTransform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let name = self.unique_name(name, None);
        self.nodes.push(Node {
            name,
            data,
            parent,
            children: Vec::new(),
            local,
            visible: true,
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        id
    }

    /// Add an empty transform.
    pub fn add_transform(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        local: WorldTransform,
    ) -> Result<NodeId, SceneError> {
        if let Some(p) = parent {
            self.node(&p)?;
        }
        Ok(self.push(name, NodeData::Transform, parent, local))
    }

    /// Add a curve transform with its shape child. Returns the transform.
    pub fn add_curve(
        &mut self,
        name: &str,
        curve: CurveData,
        parent: Option<NodeId>,
        local: WorldTransform,
    ) -> Result<NodeId, SceneError> {
        let xform = self.add_transform(name, parent, local)?;
        let shape_name = format!("{}Shape", self.nodes[xform.index()].name);
        self.push(&shape_name, NodeData::Curve(curve), Some(xform), WorldTransform::IDENTITY);
        Ok(xform)
    }

    /// Attach a non-curve shape of type `kind` under `transform`.
    pub fn add_other_shape(
        &mut self,
        transform: NodeId,
        name: &str,
        kind: &str,
    ) -> Result<NodeId, SceneError> {
        self.node(&transform)?;
        Ok(self.push(
            name,
            NodeData::OtherShape(kind.to_string()),
            Some(transform),
            WorldTransform::IDENTITY,
        ))
    }

    pub fn select(&mut self, nodes: &[NodeId]) {
        self.selection = nodes.to_vec();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn local_transform(&self, id: NodeId) -> Option<WorldTransform> {
        self.nodes.get(id.index()).map(|n| n.local)
    }

    pub fn set_local_transform(&mut self, id: NodeId, local: WorldTransform) -> Result<(), SceneError> {
        self.node_mut(&id)?.local = local;
        Ok(())
    }

    /// Curve held by `id` or by its shape child.
    pub fn curve_of(&self, id: NodeId) -> Option<&CurveData> {
        let node = self.nodes.get(id.index())?;
        match &node.data {
            NodeData::Curve(c) => Some(c),
            NodeData::Transform => node.children.iter().find_map(|c| match &self.nodes[c.index()].data {
                NodeData::Curve(curve) => Some(curve),
                _ => None,
            }),
            NodeData::OtherShape(_) => None,
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| n.visible)
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Make the next [`FrameCapture::capture_frame`] fail with `reason`.
    pub fn fail_next_capture(&mut self, reason: impl Into<String>) {
        self.fail_next_capture = Some(reason.into());
    }

    /// Paths written by successful captures, oldest first.
    pub fn captures(&self) -> &[PathBuf] {
        &self.captures
    }

    fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    fn is_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        let mut cur = self.nodes[of.index()].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p.index()].parent;
        }
        false
    }

    fn world_points(&self, shape: NodeId) -> Result<Vec<DVec3>, SceneError> {
        let world = self.world_transform(&shape)?;
        Ok(match &self.node(&shape)?.data {
            NodeData::Curve(c) => c.points.iter().map(|p| world.transform_point(*p)).collect(),
            _ => Vec::new(),
        })
    }

    /// Control polygons of every curve whose transform is visible.
    fn visible_polylines(&self) -> Result<Vec<Polyline>, SceneError> {
        let mut out = Vec::new();
        for id in self.ids() {
            let node = &self.nodes[id.index()];
            let NodeData::Curve(curve) = &node.data else {
                continue;
            };
            let owner_visible = node
                .parent
                .map_or(node.visible, |p| self.nodes[p.index()].visible);
            if owner_visible {
                out.push(Polyline {
                    points: self.world_points(id)?,
                    closed: curve.periodic,
                });
            }
        }
        Ok(out)
    }
}

impl SceneRead for MemoryScene {
    type Handle = NodeId;

    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn lookup(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    fn name_of(&self, node: &NodeId) -> Result<String, SceneError> {
        Ok(self.node(node)?.name.clone())
    }

    fn kind(&self, node: &NodeId) -> Result<NodeKind, SceneError> {
        Ok(match self.node(node)?.data {
            NodeData::Transform => NodeKind::Transform,
            NodeData::Curve(_) | NodeData::OtherShape(_) => NodeKind::Shape,
        })
    }

    fn shape_child(&self, node: &NodeId) -> Result<Option<NodeId>, SceneError> {
        let n = self.node(node)?;
        if n.data != NodeData::Transform {
            return Ok(None);
        }
        Ok(n.children
            .iter()
            .copied()
            .find(|c| self.nodes[c.index()].data != NodeData::Transform))
    }

    fn shape(&self, node: &NodeId) -> Result<ShapeView<'_>, SceneError> {
        let n = self.node(node)?;
        match &n.data {
            NodeData::Curve(curve) => Ok(ShapeView::Curve(curve)),
            NodeData::OtherShape(kind) => Ok(ShapeView::Other(kind.clone())),
            NodeData::Transform => Err(SceneError::Host(format!("'{}' is not a shape", n.name))),
        }
    }

    fn parent(&self, node: &NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(node)?.parent)
    }

    fn world_transform(&self, node: &NodeId) -> Result<WorldTransform, SceneError> {
        let mut world = self.node(node)?.local;
        let mut cur = self.node(node)?.parent;
        while let Some(p) = cur {
            let parent = self.node(&p)?;
            world = parent.local.mul(&world);
            cur = parent.parent;
        }
        Ok(world)
    }
}

impl SceneEdit for MemoryScene {
    fn create_curve(&mut self, name: &str, curve: &CurveData) -> Result<NodeId, SceneError> {
        curve.validate().map_err(SceneError::CurveConstruction)?;
        self.add_curve(name, curve.clone(), None, WorldTransform::IDENTITY)
    }

    fn create_group(&mut self, name: &str) -> Result<NodeId, SceneError> {
        self.add_transform(name, None, WorldTransform::IDENTITY)
    }

    fn set_world_transform(&mut self, node: &NodeId, transform: &WorldTransform) -> Result<(), SceneError> {
        let parent_world = match self.node(node)?.parent {
            Some(p) => self.world_transform(&p)?,
            None => WorldTransform::IDENTITY,
        };
        self.node_mut(node)?.local = transform.relative_to(&parent_world);
        Ok(())
    }

    fn reset_local_transform(&mut self, node: &NodeId) -> Result<(), SceneError> {
        self.node_mut(node)?.local = WorldTransform::IDENTITY;
        Ok(())
    }

    fn rename(&mut self, node: &NodeId, name: &str) -> Result<String, SceneError> {
        let old = self.node(node)?.name.clone();
        let new = self.unique_name(name, Some(*node));
        self.node_mut(node)?.name = new.clone();

        // Shapes follow their transform's name.
        let old_shape = format!("{old}Shape");
        let children = self.node(node)?.children.clone();
        for child in children {
            if self.nodes[child.index()].name == old_shape {
                let shape_name = self.unique_name(&format!("{new}Shape"), Some(child));
                self.nodes[child.index()].name = shape_name;
            }
        }
        Ok(new)
    }

    fn set_parent(&mut self, node: &NodeId, parent: Option<&NodeId>) -> Result<(), SceneError> {
        self.node(node)?;
        if let Some(p) = parent {
            self.node(p)?;
            if p == node || self.is_ancestor(*node, *p) {
                return Err(SceneError::Host(format!(
                    "cannot parent {node:?} under its own descendant {p:?}"
                )));
            }
        }
        if let Some(old) = self.nodes[node.index()].parent {
            self.nodes[old.index()].children.retain(|c| c != node);
        }
        self.nodes[node.index()].parent = parent.copied();
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(*node);
        }
        Ok(())
    }
}

impl FrameCapture for MemoryScene {
    type Visibility = bool;

    fn visibility(&self, node: &NodeId) -> Result<bool, CaptureError> {
        Ok(self.node(node)?.visible)
    }

    fn set_visibility(&mut self, node: &NodeId, visible: bool) -> Result<(), CaptureError> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    fn hide_all(&mut self) -> Result<Vec<(NodeId, bool)>, CaptureError> {
        let mut hidden = Vec::new();
        for (i, n) in self.nodes.iter_mut().enumerate() {
            if n.data == NodeData::Transform && n.visible {
                n.visible = false;
                hidden.push((NodeId(i as u32), true));
            }
        }
        Ok(hidden)
    }

    fn show(&mut self, nodes: &[NodeId]) -> Result<(), CaptureError> {
        for id in nodes {
            self.node_mut(id)?.visible = true;
        }
        Ok(())
    }

    fn hide(&mut self, nodes: &[NodeId]) -> Result<(), CaptureError> {
        for id in nodes {
            self.node_mut(id)?.visible = false;
        }
        Ok(())
    }

    fn fit_view(&mut self, node: &NodeId) -> Result<(), CaptureError> {
        self.node(node)?;
        let mut points = Vec::new();
        for id in self.ids() {
            if id == *node || self.is_ancestor(*node, id) {
                points.extend(self.world_points(id)?);
            }
        }
        let framed = match View::framing(&points) {
            Some(view) => view,
            None => View {
                center: self.world_transform(node)?.translation,
                ..self.view
            },
        };
        self.view_stack.push(self.view);
        self.view = framed;
        Ok(())
    }

    fn restore_view(&mut self) -> Result<(), CaptureError> {
        if let Some(view) = self.view_stack.pop() {
            self.view = view;
        }
        Ok(())
    }

    fn capture_frame(&mut self, path: &Path, size: u32) -> Result<(), CaptureError> {
        if let Some(reason) = self.fail_next_capture.take() {
            return Err(CaptureError::Failed {
                path: path.to_path_buf(),
                reason,
            });
        }
        let img = render_front(&self.visible_polylines()?, &self.view, size);
        write_png(&img, path)?;
        self.captures.push(path.to_path_buf());
        Ok(())
    }
}
