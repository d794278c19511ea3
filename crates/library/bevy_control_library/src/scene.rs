//! [`WorldScene`]: the library's capability traits over a Bevy [`World`].
//!
//! Layout matches the core's expectations: a curve is a transform entity
//! (`Name` + `SpatialBundle`) with a child entity carrying [`ControlCurve`].
//! Names are kept unique the way hosts do it, by numeric suffix.
//!
//! World transforms are composed from `Transform` up the `Parent` chain so
//! results are correct before Bevy's propagation systems have run.
//!
//! Thumbnails are drawn with the core's software rasterizer: the control
//! polygon of every effectively visible [`ControlCurve`], front view.

use std::path::Path;

use bevy::prelude::*;
use control_library::thumbnail::{render_front, write_png};
use control_library::{
    CaptureError, CurveData, FrameCapture, NodeKind, Polyline, SceneEdit, SceneError, SceneRead,
    ShapeView, View, WorldTransform,
};
use glam::{DQuat, DVec3};

use crate::components::{ControlCurve, ControlGroup, OtherShape, Selected};

pub fn to_bevy_transform(t: &WorldTransform) -> Transform {
    let [qx, qy, qz, qw] = t.rotation.to_array();
    Transform {
        translation: Vec3::new(t.translation.x as f32, t.translation.y as f32, t.translation.z as f32),
        rotation: Quat::from_xyzw(qx as f32, qy as f32, qz as f32, qw as f32),
        scale: Vec3::new(t.scale.x as f32, t.scale.y as f32, t.scale.z as f32),
    }
}

pub fn from_bevy_transform(t: &Transform) -> WorldTransform {
    let q = t.rotation;
    WorldTransform {
        translation: DVec3::new(t.translation.x as f64, t.translation.y as f64, t.translation.z as f64),
        rotation: DQuat::from_xyzw(q.x as f64, q.y as f64, q.z as f64, q.w as f64).normalize(),
        scale: DVec3::new(t.scale.x as f64, t.scale.y as f64, t.scale.z as f64),
    }
}

pub struct WorldScene<'w> {
    world: &'w mut World,
    view: View,
    view_stack: Vec<View>,
}

impl<'w> WorldScene<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self {
            world,
            view: View::default(),
            view_stack: Vec::new(),
        }
    }

    pub fn world(&self) -> &World {
        &*self.world
    }

    pub fn view(&self) -> View {
        self.view
    }

    fn check(&self, e: &Entity) -> Result<(), SceneError> {
        match self.world.get_entity(*e) {
            Some(_) => Ok(()),
            None => Err(SceneError::StaleHandle(format!("{e:?}"))),
        }
    }

    fn is_shape(&self, e: Entity) -> bool {
        self.world.get::<ControlCurve>(e).is_some() || self.world.get::<OtherShape>(e).is_some()
    }

    fn local(&self, e: Entity) -> Transform {
        self.world.get::<Transform>(e).copied().unwrap_or_default()
    }

    fn name_taken(&self, name: &str, except: Option<Entity>) -> bool {
        self.world.iter_entities().any(|e| {
            Some(e.id()) != except && e.get::<Name>().is_some_and(|n| n.as_str() == name)
        })
    }

    fn unique_name(&self, base: &str, except: Option<Entity>) -> String {
        if !self.name_taken(base, except) {
            return base.to_string();
        }
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        (1u32..)
            .map(|n| format!("{stem}{n}"))
            .find(|candidate| !self.name_taken(candidate, except))
            .unwrap_or_else(|| base.to_string())
    }

    fn parent_of(&self, e: Entity) -> Option<Entity> {
        self.world.get::<Parent>(e).map(|p| p.get())
    }

    fn is_ancestor(&self, ancestor: Entity, of: Entity) -> bool {
        let mut cur = self.parent_of(of);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent_of(p);
        }
        false
    }

    /// `e` and everything below it, depth first.
    fn subtree(&self, e: Entity) -> Vec<Entity> {
        let mut out = vec![e];
        let mut i = 0;
        while i < out.len() {
            if let Some(children) = self.world.get::<Children>(out[i]) {
                out.extend(children.iter().copied());
            }
            i += 1;
        }
        out
    }

    /// Resolves `Inherited` up the hierarchy; roots are visible.
    fn effectively_visible(&self, e: Entity) -> bool {
        match self.world.get::<Visibility>(e) {
            Some(Visibility::Hidden) => false,
            Some(Visibility::Visible) => true,
            _ => self.parent_of(e).map_or(true, |p| self.effectively_visible(p)),
        }
    }

    fn world_points(&self, shape: Entity) -> Result<Vec<DVec3>, SceneError> {
        let Some(curve) = self.world.get::<ControlCurve>(shape) else {
            return Ok(Vec::new());
        };
        let world = self.world_transform(&shape)?;
        Ok(curve.0.points.iter().map(|p| world.transform_point(*p)).collect())
    }

    fn visible_polylines(&self) -> Result<Vec<Polyline>, SceneError> {
        let shapes: Vec<(Entity, bool)> = self
            .world
            .iter_entities()
            .filter_map(|e| e.get::<ControlCurve>().map(|c| (e.id(), c.0.periodic)))
            .collect();
        let mut out = Vec::new();
        for (shape, closed) in shapes {
            if self.effectively_visible(shape) {
                out.push(Polyline {
                    points: self.world_points(shape)?,
                    closed,
                });
            }
        }
        Ok(out)
    }

    fn apply_visibility(&mut self, nodes: &[Entity], value: Visibility) -> Result<(), CaptureError> {
        for e in nodes {
            self.check(e)?;
            self.world.entity_mut(*e).insert(value);
        }
        Ok(())
    }
}

impl SceneRead for WorldScene<'_> {
    type Handle = Entity;

    fn selection(&self) -> Vec<Entity> {
        let mut picked: Vec<(Selected, Entity)> = self
            .world
            .iter_entities()
            .filter_map(|e| e.get::<Selected>().map(|s| (*s, e.id())))
            .collect();
        picked.sort();
        picked.into_iter().map(|(_, e)| e).collect()
    }

    fn lookup(&self, name: &str) -> Option<Entity> {
        self.world
            .iter_entities()
            .find(|e| e.get::<Name>().is_some_and(|n| n.as_str() == name))
            .map(|e| e.id())
    }

    fn name_of(&self, node: &Entity) -> Result<String, SceneError> {
        self.check(node)?;
        Ok(self
            .world
            .get::<Name>(*node)
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| format!("{node:?}")))
    }

    fn kind(&self, node: &Entity) -> Result<NodeKind, SceneError> {
        self.check(node)?;
        Ok(if self.is_shape(*node) {
            NodeKind::Shape
        } else {
            NodeKind::Transform
        })
    }

    fn shape_child(&self, node: &Entity) -> Result<Option<Entity>, SceneError> {
        self.check(node)?;
        if self.is_shape(*node) {
            return Ok(None);
        }
        Ok(self
            .world
            .get::<Children>(*node)
            .and_then(|children| children.iter().copied().find(|c| self.is_shape(*c))))
    }

    fn shape(&self, node: &Entity) -> Result<ShapeView<'_>, SceneError> {
        self.check(node)?;
        if let Some(curve) = self.world.get::<ControlCurve>(*node) {
            return Ok(ShapeView::Curve(curve));
        }
        if let Some(other) = self.world.get::<OtherShape>(*node) {
            return Ok(ShapeView::Other(other.kind.clone()));
        }
        Err(SceneError::Host(format!("'{}' is not a shape", self.name_of(node)?)))
    }

    fn parent(&self, node: &Entity) -> Result<Option<Entity>, SceneError> {
        self.check(node)?;
        Ok(self.parent_of(*node))
    }

    fn world_transform(&self, node: &Entity) -> Result<WorldTransform, SceneError> {
        self.check(node)?;
        let mut world = from_bevy_transform(&self.local(*node));
        let mut cur = self.parent_of(*node);
        while let Some(p) = cur {
            world = from_bevy_transform(&self.local(p)).mul(&world);
            cur = self.parent_of(p);
        }
        Ok(world)
    }
}

impl SceneEdit for WorldScene<'_> {
    fn create_curve(&mut self, name: &str, curve: &CurveData) -> Result<Entity, SceneError> {
        curve.validate().map_err(SceneError::CurveConstruction)?;
        let name = self.unique_name(name, None);
        let shape_name = self.unique_name(&format!("{name}Shape"), None);
        let xform = self
            .world
            .spawn((Name::new(name), SpatialBundle::default()))
            .id();
        let shape = self
            .world
            .spawn((
                Name::new(shape_name),
                ControlCurve(curve.clone()),
                SpatialBundle::default(),
            ))
            .id();
        self.world.entity_mut(xform).add_child(shape);
        Ok(xform)
    }

    fn create_group(&mut self, name: &str) -> Result<Entity, SceneError> {
        let name = self.unique_name(name, None);
        Ok(self
            .world
            .spawn((Name::new(name), SpatialBundle::default(), ControlGroup))
            .id())
    }

    fn set_world_transform(&mut self, node: &Entity, transform: &WorldTransform) -> Result<(), SceneError> {
        self.check(node)?;
        let parent_world = match self.parent_of(*node) {
            Some(p) => self.world_transform(&p)?,
            None => WorldTransform::IDENTITY,
        };
        let local = to_bevy_transform(&transform.relative_to(&parent_world));
        self.world
            .entity_mut(*node)
            .insert((local, GlobalTransform::from(to_bevy_transform(transform))));
        Ok(())
    }

    fn reset_local_transform(&mut self, node: &Entity) -> Result<(), SceneError> {
        self.check(node)?;
        self.world.entity_mut(*node).insert(Transform::IDENTITY);
        Ok(())
    }

    fn rename(&mut self, node: &Entity, name: &str) -> Result<String, SceneError> {
        let old = self.name_of(node)?;
        let new = self.unique_name(name, Some(*node));
        self.world.entity_mut(*node).insert(Name::new(new.clone()));

        let old_shape = format!("{old}Shape");
        let children: Vec<Entity> = self
            .world
            .get::<Children>(*node)
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default();
        for child in children {
            if self.world.get::<Name>(child).is_some_and(|n| n.as_str() == old_shape) {
                let shape_name = self.unique_name(&format!("{new}Shape"), Some(child));
                self.world.entity_mut(child).insert(Name::new(shape_name));
            }
        }
        Ok(new)
    }

    fn set_parent(&mut self, node: &Entity, parent: Option<&Entity>) -> Result<(), SceneError> {
        self.check(node)?;
        match parent {
            Some(p) => {
                self.check(p)?;
                if p == node || self.is_ancestor(*node, *p) {
                    return Err(SceneError::Host(format!(
                        "cannot parent {node:?} under its own descendant {p:?}"
                    )));
                }
                self.world.entity_mut(*node).set_parent(*p);
            }
            None => {
                self.world.entity_mut(*node).remove_parent();
            }
        }
        Ok(())
    }
}

impl FrameCapture for WorldScene<'_> {
    /// `None` when the entity carries no `Visibility` component.
    type Visibility = Option<Visibility>;

    fn visibility(&self, node: &Entity) -> Result<Option<Visibility>, CaptureError> {
        self.check(node)?;
        Ok(self.world.get::<Visibility>(*node).copied())
    }

    fn set_visibility(&mut self, node: &Entity, state: Option<Visibility>) -> Result<(), CaptureError> {
        self.check(node)?;
        let mut entity = self.world.entity_mut(*node);
        match state {
            Some(v) => {
                entity.insert(v);
            }
            None => {
                entity.remove::<Visibility>();
            }
        }
        Ok(())
    }

    /// Hides every non-shape entity with a `Visibility` plus the owner of
    /// every curve (its parent, or the curve itself at the root), whether or
    /// not the owner carries a `Visibility`. Curves forced `Visible` are
    /// switched to `Inherited` so a hidden owner hides them too.
    fn hide_all(&mut self) -> Result<Vec<(Entity, Option<Visibility>)>, CaptureError> {
        let mut changes: Vec<(Entity, Visibility)> = self
            .world
            .iter_entities()
            .filter(|e| !e.contains::<ControlCurve>() && !e.contains::<OtherShape>())
            .filter(|e| e.get::<Visibility>().is_some_and(|v| *v != Visibility::Hidden))
            .map(|e| (e.id(), Visibility::Hidden))
            .collect();

        let shapes: Vec<Entity> = self
            .world
            .iter_entities()
            .filter(|e| e.contains::<ControlCurve>())
            .map(|e| e.id())
            .collect();
        for shape in shapes {
            let owner = self.parent_of(shape).unwrap_or(shape);
            let owner_hidden = self.world.get::<Visibility>(owner) == Some(&Visibility::Hidden);
            if !owner_hidden && !changes.iter().any(|(e, _)| *e == owner) {
                changes.push((owner, Visibility::Hidden));
            }
            let forced = self.world.get::<Visibility>(shape) == Some(&Visibility::Visible);
            if forced && owner != shape {
                changes.push((shape, Visibility::Inherited));
            }
        }

        let mut hidden = Vec::with_capacity(changes.len());
        for (e, value) in changes {
            let prior = self.world.get::<Visibility>(e).copied();
            self.world.entity_mut(e).insert(value);
            hidden.push((e, prior));
        }
        Ok(hidden)
    }

    fn show(&mut self, nodes: &[Entity]) -> Result<(), CaptureError> {
        self.apply_visibility(nodes, Visibility::Visible)
    }

    fn hide(&mut self, nodes: &[Entity]) -> Result<(), CaptureError> {
        self.apply_visibility(nodes, Visibility::Hidden)
    }

    fn fit_view(&mut self, node: &Entity) -> Result<(), CaptureError> {
        self.check(node)?;
        let mut points = Vec::new();
        for e in self.subtree(*node) {
            points.extend(self.world_points(e)?);
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
        let img = render_front(&self.visible_polylines()?, &self.view, size);
        write_png(&img, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_conversion_round_trips() {
        let t = WorldTransform {
            scale: DVec3::new(1.0, 2.0, 0.5),
            ..WorldTransform::from_translation_euler_deg(
                DVec3::new(1.0, -2.0, 3.5),
                DVec3::new(10.0, 20.0, 30.0),
            )
        };
        assert!(from_bevy_transform(&to_bevy_transform(&t)).abs_diff_eq(&t, 1e-5));
    }

    #[test]
    fn inherited_visibility_follows_parent() {
        let mut world = World::new();
        let parent = world.spawn((Name::new("p"), SpatialBundle::default())).id();
        let child = world.spawn((Name::new("c"), SpatialBundle::default())).id();
        world.entity_mut(parent).add_child(child);
        let mut scene = WorldScene::new(&mut world);
        assert!(scene.effectively_visible(child));
        scene.hide(&[parent]).unwrap();
        assert!(!scene.effectively_visible(child));
        scene.show(&[child]).unwrap();
        assert!(scene.effectively_visible(child));
    }
}
