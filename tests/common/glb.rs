//! Builds small glTF assets in memory so tests need no binary fixtures.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub const RED: [f32; 3] = [1.0, 0.0, 0.0];
pub const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
pub const BLUE: [f32; 3] = [0.0, 0.0, 1.0];
pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Corners of the tetrahedron; faces are wound outward.
const CORNERS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];
const FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];

/// glTF UV (top-left origin) used by every loop of each face, and the color it hits.
pub const FACE_UVS: [([f32; 2], [f32; 3]); 4] = [
    ([0.0, 0.0], RED),
    ([1.0, 0.0], GREEN),
    ([0.0, 1.0], BLUE),
    ([1.0, 1.0], WHITE),
];

/// 2x2 PNG: red, green on the top row; blue, white on the bottom row.
pub fn checker_png() -> Vec<u8> {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
    img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
    img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn pad(bytes: &mut Vec<u8>, with: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(with);
    }
}

/// One binary buffer with its buffer views and accessors.
#[derive(Default)]
struct Buffer {
    bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
}

impl Buffer {
    fn view(&mut self, bytes: &[u8]) -> usize {
        pad(&mut self.bin, 0);
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
            self.bin.len(),
            bytes.len()
        ));
        self.bin.extend_from_slice(bytes);
        self.views.len() - 1
    }

    fn accessor(&mut self, bytes: &[u8], component: u32, count: usize, kind: &str, bounds: &str) -> usize {
        let view = self.view(bytes);
        self.accessors.push(format!(
            r#"{{"bufferView":{view},"componentType":{component},"count":{count},"type":"{kind}"{bounds}}}"#
        ));
        self.accessors.len() - 1
    }

    fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        let mut bytes = Vec::new();
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
                bytes.extend_from_slice(&p[axis].to_le_bytes());
            }
        }
        let bounds = format!(
            r#","min":[{:?},{:?},{:?}],"max":[{:?},{:?},{:?}]"#,
            min[0], min[1], min[2], max[0], max[1], max[2]
        );
        self.accessor(&bytes, 5126, positions.len(), "VEC3", &bounds)
    }

    fn uvs(&mut self, uvs: &[[f32; 2]]) -> usize {
        let bytes: Vec<u8> = uvs.iter().flatten().flat_map(|c| c.to_le_bytes()).collect();
        self.accessor(&bytes, 5126, uvs.len(), "VEC2", "")
    }

    fn indices(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        self.accessor(&bytes, 5125, indices.len(), "SCALAR", "")
    }

    /// The JSON members describing this buffer; `uri` is omitted for GLB.
    fn json(&self, uri: Option<&str>) -> String {
        let uri = uri.map(|u| format!(r#","uri":"{u}""#)).unwrap_or_default();
        format!(
            r#""buffers":[{{"byteLength":{}{uri}}}],
"bufferViews":[{}],
"accessors":[{}]"#,
            self.bin.len(),
            self.views.join(","),
            self.accessors.join(",")
        )
    }

    fn glb(mut self, body: &str) -> Vec<u8> {
        let mut json = format!("{{{body},\n{}}}", self.json(None)).into_bytes();
        pad(&mut json, b' ');
        pad(&mut self.bin, 0);

        let total = 12 + 8 + json.len() + 8 + self.bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&self.bin);
        glb
    }

    /// A self-contained `.gltf` document with the buffer as a data URI.
    fn embedded_gltf(self, body: &str) -> String {
        let uri = format!("data:application/octet-stream;base64,{}", STANDARD.encode(&self.bin));
        format!("{{{body},\n{}}}", self.json(Some(&uri)))
    }
}

/// Where the tetrahedron's texture lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TextureSource {
    None,
    BufferView,
    DataUri,
}

fn tetrahedron(texture: TextureSource) -> (Buffer, String) {
    let mut buffer = Buffer::default();
    let positions: Vec<[f32; 3]> = FACES
        .iter()
        .flat_map(|face| face.map(|corner| CORNERS[corner]))
        .collect();
    let uvs: Vec<[f32; 2]> = FACE_UVS.iter().flat_map(|(uv, _)| [*uv; 3]).collect();
    let position = buffer.positions(&positions);
    let uv = buffer.uvs(&uvs);
    let indices = buffer.indices(&(0..12).collect::<Vec<u32>>());

    let (texture_ref, image) = match texture {
        TextureSource::None => ("", String::new()),
        TextureSource::BufferView => {
            let view = buffer.view(&checker_png());
            (
                r#","baseColorTexture":{"index":0}"#,
                format!(r#"{{"bufferView":{view},"mimeType":"image/png"}}"#),
            )
        }
        TextureSource::DataUri => (
            r#","baseColorTexture":{"index":0}"#,
            format!(r#"{{"uri":"data:image/png;base64,{}"}}"#, STANDARD.encode(checker_png())),
        ),
    };
    let (textures, images) = if image.is_empty() {
        (String::new(), String::new())
    } else {
        (
            r#""textures":[{"source":0}],"#.to_string(),
            format!(r#""images":[{image}],"#),
        )
    };

    let body = format!(
        r#""asset":{{"version":"2.0"}},
"scene":0,
"scenes":[{{"nodes":[0,1,2]}}],
"nodes":[
  {{"name":"Tetra","mesh":0,"translation":[0.0,0.0,1.0]}},
  {{"name":"Camera","camera":0}},
  {{"name":"Empty"}}
],
"cameras":[{{"type":"perspective","perspective":{{"yfov":0.8,"znear":0.1}}}}],
"meshes":[{{"name":"TetraMesh","primitives":[{{"attributes":{{"POSITION":{position},"TEXCOORD_0":{uv}}},"indices":{indices},"material":0}}]}}],
{textures}{images}
"materials":[{{"name":"Painted","pbrMetallicRoughness":{{"baseColorFactor":[1.0,1.0,1.0,1.0]{texture_ref}}}}}]"#
    );
    (buffer, body)
}

/**
 * A GLB with one tetrahedron node named "Tetra" (translated by +1 on z, every
 * face split into its own three vertices), a camera node and an empty node.
 *
 * With `textured`, the material samples [`checker_png`] so that face `i` maps
 * to `FACE_UVS[i].1`.
 */
pub fn tetrahedron_glb(textured: bool) -> Vec<u8> {
    let source = if textured {
        TextureSource::BufferView
    } else {
        TextureSource::None
    };
    let (buffer, body) = tetrahedron(source);
    buffer.glb(&body)
}

/// The textured tetrahedron as a single `.gltf` file: buffer and PNG are both
/// base64 data URIs.
pub fn tetrahedron_embedded_gltf() -> String {
    let (buffer, body) = tetrahedron(TextureSource::DataUri);
    buffer.embedded_gltf(&body)
}

/**
 * A GLB with a "Parent" node (translated by +2 on z) whose child "Child"
 * (translated by +1 on x) holds one mesh of three primitives:
 *
 * - a triangle list of one face using material 1 ("Blue"),
 * - a strip of four vertices (two faces) using material 0 ("Red"),
 * - a fan of four vertices (two faces) using material 1 again.
 *
 * Every primitive starts at the origin, so vertex 0, 3 and 7 all sit there.
 */
pub fn hierarchy_glb() -> Vec<u8> {
    let mut buffer = Buffer::default();
    let quad = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];

    let list_positions = buffer.positions(&quad[..3]);
    let list_indices = buffer.indices(&[0, 1, 2]);
    let strip_positions = buffer.positions(&quad);
    let strip_indices = buffer.indices(&[0, 1, 2, 3]);
    let fan_positions = buffer.positions(&[quad[0], quad[1], quad[3], quad[2]]);
    let fan_indices = buffer.indices(&[0, 1, 2, 3]);

    let body = format!(
        r#""asset":{{"version":"2.0"}},
"scene":0,
"scenes":[{{"nodes":[0]}}],
"nodes":[
  {{"name":"Parent","children":[1],"translation":[0.0,0.0,2.0]}},
  {{"name":"Child","mesh":0,"translation":[1.0,0.0,0.0]}}
],
"meshes":[{{"name":"Parts","primitives":[
  {{"attributes":{{"POSITION":{list_positions}}},"indices":{list_indices},"material":1}},
  {{"attributes":{{"POSITION":{strip_positions}}},"indices":{strip_indices},"material":0,"mode":5}},
  {{"attributes":{{"POSITION":{fan_positions}}},"indices":{fan_indices},"material":1,"mode":6}}
]}}],
"materials":[
  {{"name":"Red","pbrMetallicRoughness":{{"baseColorFactor":[1.0,0.0,0.0,1.0]}}}},
  {{"name":"Blue","pbrMetallicRoughness":{{"baseColorFactor":[0.0,0.0,1.0,1.0]}}}}
]"#
    );
    buffer.glb(&body)
}

pub fn write_glb(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write glb");
    path
}
