//! Arena-backed scene graph.
//!
//! Nodes and materials live in flat vectors and are addressed by index
//! ([`NodeId`], [`MaterialId`]). Cloning a [`SceneGraph`] yields an
//! independent working copy, which is how the imported source asset is kept
//! pristine while normalisation and fixture instrumentation mutate the copy.

use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};

use crate::aabb::Aabb;
use crate::error::{Result, SceneError};
use crate::light::PointLight;
use crate::material::{Material, MaterialId};

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Translation / rotation / scale, composed as `T * R * S`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Local-to-parent matrix.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Geometry-bearing node payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Bounds of the geometry in the node's local space.
    pub local_bounds: Aabb,
    pub material: MaterialId,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshData {
    pub fn new(local_bounds: Aabb, material: MaterialId) -> Self {
        Self {
            local_bounds,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshData),
    PointLight(PointLight),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    /// Explicit fixture tag carried by the asset, if any.
    pub fixture_tag: Option<bool>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshData> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn point_light(&self) -> Option<&PointLight> {
        match &self.kind {
            NodeKind::PointLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn point_light_mut(&mut self) -> Option<&mut PointLight> {
        match &mut self.kind {
            NodeKind::PointLight(light) => Some(light),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    materials: Vec<Material>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Adds a node under `parent`, or as a new root when `parent` is `None`.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> Result<NodeId> {
        if let Some(p) = parent {
            if p.0 >= self.nodes.len() {
                return Err(SceneError::UnknownNode(p.0));
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            transform,
            kind,
            fixture_tag: None,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    pub fn add_group(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId> {
        self.add_node(parent, name, transform, NodeKind::Group)
    }

    pub fn add_mesh(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
        mesh: MeshData,
    ) -> Result<NodeId> {
        self.add_node(parent, name, transform, NodeKind::Mesh(mesh))
    }

    pub fn set_fixture_tag(&mut self, id: NodeId, tag: Option<bool>) -> Result<()> {
        let node = self.node_mut(id).ok_or(SceneError::UnknownNode(id.0))?;
        node.fixture_tag = tag;
        Ok(())
    }

    /// Depth-first, pre-order walk over every node reachable from the roots.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Mesh nodes in traversal order.
    pub fn mesh_nodes(&self) -> Vec<NodeId> {
        self.traverse()
            .into_iter()
            .filter(|id| self.nodes[id.0].mesh().is_some())
            .collect()
    }

    /// Composed local-to-world matrix of a node.
    pub fn world_transform(&self, id: NodeId) -> Result<Matrix4<f32>> {
        let mut node = self.node(id).ok_or(SceneError::UnknownNode(id.0))?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            matrix = node.transform.matrix() * matrix;
        }
        Ok(matrix)
    }

    /// World-space bounds over all mesh geometry, or `None` without meshes.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = self
            .roots
            .iter()
            .map(|id| (*id, Matrix4::identity()))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();
            if let Some(mesh) = node.mesh() {
                let mesh_bounds = mesh.local_bounds.transform(&world);
                bounds = Some(match bounds {
                    Some(b) => b.merge(&mesh_bounds),
                    None => mesh_bounds,
                });
            }
            stack.extend(node.children.iter().map(|child| (*child, world)));
        }
        bounds
    }

    /// Re-parents every current root under a new group node, which becomes
    /// the single root.
    pub fn wrap_roots(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        let old_roots = std::mem::take(&mut self.roots);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            transform,
            kind: NodeKind::Group,
            fixture_tag: None,
            parent: None,
            children: old_roots.clone(),
        });
        for root in old_roots {
            self.nodes[root.0].parent = Some(id);
        }
        self.roots.push(id);
        id
    }
}
