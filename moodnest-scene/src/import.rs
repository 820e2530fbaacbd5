//! glTF / GLB import into a [`SceneGraph`].
//!
//! Only what the mood pipeline needs is read: the node hierarchy with local
//! transforms, per-mesh bounds from the POSITION accessor's `min`/`max`, the
//! PBR material factors and any `fixture` tag in node or mesh extras. Vertex
//! buffers are never loaded.

use std::collections::HashMap;
use std::path::Path;

use cgmath::{Point3, Quaternion, Vector3};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::aabb::Aabb;
use crate::color::Rgb;
use crate::error::{Result, SceneError};
use crate::graph::{MeshData, NodeId, NodeKind, SceneGraph, Transform};
use crate::material::{Material, MaterialId};

/// Extras payload recognised on nodes and meshes: `{"fixture": true}`.
#[derive(Debug, Default, Deserialize)]
struct FixtureExtras {
    fixture: Option<bool>,
}

/// Imports a `.gltf` or `.glb` file.
///
/// # Errors
///
/// Returns [`SceneError::Import`] if the file cannot be read or parsed.
pub fn import_path(path: impl AsRef<Path>) -> Result<SceneGraph> {
    let path = path.as_ref();
    let gltf = gltf::Gltf::open(path)
        .map_err(|e| SceneError::Import(format!("{}: {e}", path.display())))?;
    let graph = build_graph(&gltf.document)?;
    info!(path = %path.display(), nodes = graph.len(), "scene imported");
    Ok(graph)
}

/// Imports glTF JSON or GLB bytes already in memory.
pub fn import_slice(bytes: &[u8]) -> Result<SceneGraph> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| SceneError::Import(e.to_string()))?;
    build_graph(&gltf.document)
}

fn build_graph(document: &gltf::Document) -> Result<SceneGraph> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| SceneError::Import("asset contains no scenes".into()))?;

    let mut graph = SceneGraph::new();
    let material_map: Vec<MaterialId> = document
        .materials()
        .map(|m| graph.add_material(convert_material(&m)))
        .collect();
    let mut builder = Builder {
        graph,
        material_map,
        fallback_material: None,
        mesh_cache: HashMap::new(),
    };

    for node in scene.nodes() {
        builder.add_node(&node, None)?;
    }
    Ok(builder.graph)
}

struct Builder {
    graph: SceneGraph,
    material_map: Vec<MaterialId>,
    fallback_material: Option<MaterialId>,
    /// glTF mesh index -> merged bounds and first material, computed once.
    mesh_cache: HashMap<usize, Option<(Aabb, MaterialId)>>,
}

impl Builder {
    fn add_node(&mut self, node: &gltf::Node, parent: Option<NodeId>) -> Result<()> {
        let name = node
            .name()
            .map(str::to_owned)
            .or_else(|| node.mesh().and_then(|m| m.name().map(str::to_owned)))
            .unwrap_or_else(|| format!("node-{}", node.index()));
        let transform = convert_transform(&node.transform());

        let mesh = node.mesh();
        let kind = match mesh.as_ref().and_then(|m| self.mesh_payload(m)) {
            Some((bounds, material)) => NodeKind::Mesh(MeshData::new(bounds, material)),
            None => NodeKind::Group,
        };

        let id = self.graph.add_node(parent, name, transform, kind)?;

        let tag = fixture_tag(node.extras())
            .or_else(|| mesh.as_ref().and_then(|m| fixture_tag(m.extras())));
        if tag.is_some() {
            self.graph.set_fixture_tag(id, tag)?;
        }

        for child in node.children() {
            self.add_node(&child, Some(id))?;
        }
        Ok(())
    }

    fn mesh_payload(&mut self, mesh: &gltf::Mesh) -> Option<(Aabb, MaterialId)> {
        if let Some(cached) = self.mesh_cache.get(&mesh.index()) {
            return *cached;
        }

        let mut bounds: Option<Aabb> = None;
        let mut material = None;
        for primitive in mesh.primitives() {
            let Some(prim_bounds) = primitive_bounds(&primitive) else {
                warn!(
                    mesh = mesh.name().unwrap_or("unnamed"),
                    "primitive has no POSITION bounds, skipping"
                );
                continue;
            };
            bounds = Some(match bounds {
                Some(b) => b.merge(&prim_bounds),
                None => prim_bounds,
            });
            if material.is_none() {
                material = Some(self.material_for(&primitive.material()));
            }
        }

        let payload = bounds.zip(material);
        self.mesh_cache.insert(mesh.index(), payload);
        payload
    }

    fn material_for(&mut self, material: &gltf::Material) -> MaterialId {
        if let Some(id) = material.index().and_then(|i| self.material_map.get(i)) {
            return *id;
        }
        *self
            .fallback_material
            .get_or_insert_with(|| self.graph.add_material(Material::default()))
    }
}

fn primitive_bounds(primitive: &gltf::Primitive) -> Option<Aabb> {
    let accessor = primitive.get(&gltf::Semantic::Positions)?;
    let min = vec3_from_json(accessor.min()?)?;
    let max = vec3_from_json(accessor.max()?)?;
    Some(Aabb::new(min, max))
}

fn vec3_from_json(value: serde_json::Value) -> Option<Point3<f32>> {
    let v: Vec<f32> = serde_json::from_value(value).ok()?;
    match v.as_slice() {
        [x, y, z] => Some(Point3::new(*x, *y, *z)),
        _ => None,
    }
}

fn convert_transform(transform: &gltf::scene::Transform) -> Transform {
    let (t, r, s) = transform.clone().decomposed();
    Transform {
        translation: Vector3::new(t[0], t[1], t[2]),
        // glTF stores quaternions as [x, y, z, w].
        rotation: Quaternion::new(r[3], r[0], r[1], r[2]),
        scale: Vector3::new(s[0], s[1], s[2]),
    }
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [er, eg, eb] = material.emissive_factor();
    let mut converted = Material::default()
        .with_base_color(Rgb::from_rgba_slice(pbr.base_color_factor()))
        .with_emissive(Rgb::new(er, eg, eb), 1.0)
        .with_metalness_roughness(pbr.metallic_factor(), pbr.roughness_factor());
    if let Some(name) = material.name() {
        converted = converted.with_name(name);
    }
    converted
}

fn fixture_tag(extras: &gltf::json::Extras) -> Option<bool> {
    let raw = extras.as_ref()?;
    match serde_json::from_str::<FixtureExtras>(raw.get()) {
        Ok(parsed) => parsed.fixture,
        Err(e) => {
            debug!(error = %e, "ignoring non-object extras");
            None
        }
    }
}
