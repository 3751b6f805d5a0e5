//! Asset sinks: where finished meshes end up.
//!
//! Sinks take `&mut self` and accept one complete mesh per call; callers must
//! not assume they can be re-entered.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::mesh::StaticMesh;

/// Handle to a stored mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub name: String,
    /// File the mesh was written to, if the sink persists to disk.
    pub path: Option<PathBuf>,
}

/// Destination for finished terrain meshes.
pub trait AssetSink {
    fn store(&mut self, mesh: &StaticMesh) -> Result<AssetHandle>;
}

/// Keeps meshes in memory. Useful for hosts that upload buffers themselves.
#[derive(Debug, Default)]
pub struct MemoryAssetSink {
    pub meshes: Vec<StaticMesh>,
}

impl AssetSink for MemoryAssetSink {
    fn store(&mut self, mesh: &StaticMesh) -> Result<AssetHandle> {
        if self.meshes.iter().any(|m| m.name == mesh.name) {
            bail!("asset '{}' already stored", mesh.name);
        }
        self.meshes.push(mesh.clone());
        Ok(AssetHandle {
            name: mesh.name.clone(),
            path: None,
        })
    }
}

/// Writes Wavefront OBJ files (with per-vertex colors) into a directory.
#[derive(Debug, Clone)]
pub struct ObjAssetSink {
    dir: PathBuf,
}

impl ObjAssetSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an asset with this name is written to.
    pub fn asset_path(&self, name: &str) -> Result<PathBuf> {
        validate_asset_name(name)?;
        Ok(self.dir.join(format!("{name}.obj")))
    }
}

impl AssetSink for ObjAssetSink {
    fn store(&mut self, mesh: &StaticMesh) -> Result<AssetHandle> {
        let path = self.asset_path(&mesh.name)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create asset directory {:?}", self.dir))?;

        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut out = BufWriter::new(file);
        write_obj(&mut out, mesh).with_context(|| format!("Failed to write {:?}", path))?;
        out.flush().with_context(|| format!("Failed to flush {:?}", path))?;

        log::info!(
            "Stored mesh '{}' ({} vertices, {} triangles) at {:?}",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count(),
            path
        );
        Ok(AssetHandle {
            name: mesh.name.clone(),
            path: Some(path),
        })
    }
}

/// Asset names become file names, so they must be a single path component.
fn validate_asset_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !ok {
        bail!("invalid asset name {:?}: use letters, digits, '_', '-' or '.'", name);
    }
    Ok(())
}

/// Serialize a mesh as OBJ. Vertex colors use the common `v x y z r g b`
/// extension; faces reference position, UV and normal by the same index.
pub fn write_obj<W: Write>(out: &mut W, mesh: &StaticMesh) -> std::io::Result<()> {
    writeln!(out, "# Morphscape terrain mesh")?;
    writeln!(
        out,
        "# grid {}x{} cells, spacing {}",
        mesh.spec.size, mesh.spec.size, mesh.spec.spacing
    )?;
    writeln!(out, "o {}", mesh.name)?;

    for v in &mesh.vertices {
        let [x, y, z] = v.position;
        let [r, g, b, _] = v.color;
        writeln!(out, "v {x} {y} {z} {r} {g} {b}")?;
    }
    for v in &mesh.vertices {
        let [u, w] = v.tex_coords;
        writeln!(out, "vt {u} {w}")?;
    }
    for v in &mesh.vertices {
        let [x, y, z] = v.normal;
        writeln!(out, "vn {x} {y} {z}")?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::GridMesh;
    use terrain_core::GridSpec;

    fn mesh(name: &str) -> StaticMesh {
        let spec = GridSpec::new(1, 1.0);
        let grid = GridMesh::build(spec).unwrap();
        StaticMesh::from_buffers(name, spec, &grid.positions, &grid.uvs, &grid.indices, None)
            .unwrap()
    }

    #[test]
    fn obj_lists_every_vertex_and_face() {
        let mut buf = Vec::new();
        write_obj(&mut buf, &mesh("cell")).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 4);
        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, vec!["f 1/1/1 2/2/2 3/3/3", "f 2/2/2 4/4/4 3/3/3"]);
        assert!(text.contains("o cell"));
    }

    #[test]
    fn obj_sink_writes_file() {
        let dir = std::env::temp_dir().join(format!("morphscape-obj-{}", std::process::id()));
        let mut sink = ObjAssetSink::new(&dir);
        let handle = sink.store(&mesh("terrain_a")).unwrap();

        let path = handle.path.unwrap();
        assert_eq!(path, dir.join("terrain_a.obj"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Morphscape terrain mesh"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_path_like_names() {
        let sink = ObjAssetSink::new("out");
        assert!(sink.asset_path("../escape").is_err());
        assert!(sink.asset_path("a/b").is_err());
        assert!(sink.asset_path("..").is_err());
        assert!(sink.asset_path("Terrain_01").is_ok());
    }

    #[test]
    fn memory_sink_refuses_duplicates() {
        let mut sink = MemoryAssetSink::default();
        assert_eq!(sink.store(&mesh("a")).unwrap().name, "a");
        assert!(sink.store(&mesh("a")).is_err());
        assert_eq!(sink.meshes.len(), 1);
    }
}
