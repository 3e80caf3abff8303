use super::Mesh;
use crate::constants::{STL_FACET_LEN, STL_HEADER_LEN, STL_HEADER_TEXT};
use crate::error::{Result, SimError};
use glam::Vec3;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

impl Mesh {
    pub fn write_stl<W: Write>(&self, out: &mut W, format: StlFormat) -> Result<()> {
        match format {
            StlFormat::Binary => self.write_binary_stl(out),
            StlFormat::Ascii => self.write_ascii_stl(out, "snowfake"),
        }
    }

    pub fn save_stl<P: AsRef<Path>>(&self, path: P, format: StlFormat) -> Result<()> {
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        self.write_stl(&mut out, format)?;
        out.flush()?;
        log::info!(
            "wrote {} triangles to {}",
            self.triangle_count(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// 80-byte header, little-endian facet count, then 50 bytes per facet.
    fn write_binary_stl<W: Write>(&self, out: &mut W) -> Result<()> {
        let count = u32::try_from(self.triangles.len())
            .map_err(|_| SimError::validation("mesh has too many triangles for binary STL"))?;

        let mut header = [0u8; STL_HEADER_LEN];
        header[..STL_HEADER_TEXT.len()].copy_from_slice(STL_HEADER_TEXT.as_bytes());
        out.write_all(&header)?;
        out.write_all(&count.to_le_bytes())?;

        let mut facet = [0u8; STL_FACET_LEN];
        for t in 0..self.triangles.len() {
            let normal = self.normal(t);
            let corners = self.corners(t);
            for (slot, v) in std::iter::once(normal).chain(corners).enumerate() {
                for (axis, value) in v.to_array().into_iter().enumerate() {
                    let at = (slot * 3 + axis) * 4;
                    facet[at..at + 4].copy_from_slice(&value.to_le_bytes());
                }
            }
            // attribute byte count stays zero
            facet[48] = 0;
            facet[49] = 0;
            out.write_all(&facet)?;
        }
        Ok(())
    }

    fn write_ascii_stl<W: Write>(&self, out: &mut W, name: &str) -> Result<()> {
        writeln!(out, "solid {}", name)?;
        for t in 0..self.triangles.len() {
            let n = self.normal(t);
            writeln!(out, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
            writeln!(out, "    outer loop")?;
            for v in self.corners(t) {
                writeln!(out, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
            }
            writeln!(out, "    endloop")?;
            writeln!(out, "  endfacet")?;
        }
        writeln!(out, "endsolid {}", name)?;
        Ok(())
    }
}

/// Parse binary or ASCII STL. Vertices with identical coordinates are welded.
pub fn read_stl<R: Read>(input: &mut R) -> Result<Mesh> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;

    if is_binary(&bytes) {
        parse_binary(&bytes)
    } else if bytes.starts_with(b"solid") {
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| SimError::MalformedStl("ASCII STL is not valid UTF-8".to_string()))?;
        parse_ascii(text)
    } else {
        Err(SimError::MalformedStl(format!(
            "{} bytes is neither a binary nor an ASCII STL",
            bytes.len()
        )))
    }
}

pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let mut input = BufReader::new(File::open(path)?);
    read_stl(&mut input)
}

fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < STL_HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([
        bytes[STL_HEADER_LEN],
        bytes[STL_HEADER_LEN + 1],
        bytes[STL_HEADER_LEN + 2],
        bytes[STL_HEADER_LEN + 3],
    ]) as usize;
    bytes.len() == STL_HEADER_LEN + 4 + count * STL_FACET_LEN
}

#[derive(Default)]
struct Welder {
    keys: HashMap<[u32; 3], u32>,
    mesh: Mesh,
}

impl Welder {
    fn vertex(&mut self, v: Vec3) -> u32 {
        let key = v.to_array().map(f32::to_bits);
        if let Some(&idx) = self.keys.get(&key) {
            return idx;
        }
        let idx = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(v);
        self.keys.insert(key, idx);
        idx
    }

    fn triangle(&mut self, corners: [Vec3; 3]) {
        let tri = corners.map(|v| self.vertex(v));
        self.mesh.triangles.push(tri);
    }
}

fn parse_binary(bytes: &[u8]) -> Result<Mesh> {
    let read_f32 = |at: usize| f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let read_vec = |at: usize| Vec3::new(read_f32(at), read_f32(at + 4), read_f32(at + 8));

    let count = (bytes.len() - STL_HEADER_LEN - 4) / STL_FACET_LEN;
    let mut welder = Welder::default();
    for n in 0..count {
        let start = STL_HEADER_LEN + 4 + n * STL_FACET_LEN;
        // skip the stored normal; winding carries the orientation
        welder.triangle([
            read_vec(start + 12),
            read_vec(start + 24),
            read_vec(start + 36),
        ]);
    }
    Ok(welder.mesh)
}

fn parse_ascii(text: &str) -> Result<Mesh> {
    let mut welder = Welder::default();
    let mut pending: Vec<Vec3> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("vertex") => {
                let coords: Vec<f32> = words
                    .map(|w| w.parse::<f32>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| SimError::MalformedStl(format!("line {}: {}", line_no + 1, e)))?;
                if coords.len() != 3 {
                    return Err(SimError::MalformedStl(format!(
                        "line {}: vertex needs three coordinates",
                        line_no + 1
                    )));
                }
                pending.push(Vec3::new(coords[0], coords[1], coords[2]));
            }
            Some("endloop") => {
                if pending.len() != 3 {
                    return Err(SimError::MalformedStl(format!(
                        "line {}: facet has {} vertices",
                        line_no + 1,
                        pending.len()
                    )));
                }
                welder.triangle([pending[0], pending[1], pending[2]]);
                pending.clear();
            }
            _ => {}
        }
    }
    if !pending.is_empty() {
        return Err(SimError::MalformedStl("unterminated facet".to_string()));
    }
    Ok(welder.mesh)
}
