//! Materials as small shader node graphs.
//!
//! Only the node types that texture baking reads or writes are modelled. Links
//! connect a named output socket of one node to a named input socket of another.

use std::sync::Arc;

use crate::data_structures::texture::Image;

/// Default base color of a fresh Principled BSDF node.
pub const DEFAULT_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

pub const BASE_COLOR_SOCKET: &str = "Base Color";
pub const COLOR_SOCKET: &str = "Color";
pub const BSDF_SOCKET: &str = "BSDF";
pub const SURFACE_SOCKET: &str = "Surface";

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Samples an image; `image` is `None` when the texture failed to load.
    ImageTexture { image: Option<Arc<Image>> },
    PrincipledBsdf { base_color: [f32; 4] },
    /// Reads a per-loop color layer by name.
    VertexColor { layer_name: String },
    MaterialOutput,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub from_node: usize,
    pub from_socket: String,
    pub to_node: usize,
    pub to_socket: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTree {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl NodeTree {
    pub fn add_node(&mut self, name: &str, kind: NodeKind) -> usize {
        self.nodes.push(Node {
            name: name.to_string(),
            kind,
        });
        self.nodes.len() - 1
    }

    pub fn node(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Connect two sockets. An input socket takes only one link, so an existing
    /// link into `to_socket` is replaced.
    pub fn link(&mut self, from_node: usize, from_socket: &str, to_node: usize, to_socket: &str) {
        self.links
            .retain(|l| !(l.to_node == to_node && l.to_socket == to_socket));
        self.links.push(Link {
            from_node,
            from_socket: from_socket.to_string(),
            to_node,
            to_socket: to_socket.to_string(),
        });
    }

    /// The node feeding `to_socket` of `to_node`, if any.
    pub fn input_of(&self, to_node: usize, to_socket: &str) -> Option<&Node> {
        self.links
            .iter()
            .find(|l| l.to_node == to_node && l.to_socket == to_socket)
            .and_then(|l| self.nodes.get(l.from_node))
    }

    /// First image-texture node that actually holds an image.
    pub fn first_image(&self) -> Option<&Arc<Image>> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::ImageTexture { image: Some(image) } => Some(image),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub node_tree: NodeTree,
}

impl Material {
    pub const PRINCIPLED_BSDF: &'static str = "Principled BSDF";
    pub const MATERIAL_OUTPUT: &'static str = "Material Output";
    pub const IMAGE_TEXTURE: &'static str = "Image Texture";
    pub const VERTEX_COLOR: &'static str = "Color Attribute";

    /// A material with the default node setup: Principled BSDF into Material Output.
    pub fn new(name: &str) -> Self {
        let mut node_tree = NodeTree::default();
        let bsdf = node_tree.add_node(
            Self::PRINCIPLED_BSDF,
            NodeKind::PrincipledBsdf {
                base_color: DEFAULT_BASE_COLOR,
            },
        );
        let output = node_tree.add_node(Self::MATERIAL_OUTPUT, NodeKind::MaterialOutput);
        node_tree.link(bsdf, BSDF_SOCKET, output, SURFACE_SOCKET);
        Self {
            name: name.to_string(),
            node_tree,
        }
    }

    /// A default material whose base color comes from an image texture.
    pub fn with_base_color_texture(name: &str, image: Option<Arc<Image>>) -> Self {
        let mut material = Self::new(name);
        let tree = &mut material.node_tree;
        let tex = tree.add_node(Self::IMAGE_TEXTURE, NodeKind::ImageTexture { image });
        if let Some(bsdf) = tree.node(Self::PRINCIPLED_BSDF) {
            tree.link(tex, COLOR_SOCKET, bsdf, BASE_COLOR_SOCKET);
        }
        material
    }

    /// Flat base color of the BSDF node, ignoring anything linked into it.
    pub fn base_color(&self) -> [f32; 4] {
        self.node_tree
            .nodes
            .iter()
            .find_map(|n| match n.kind {
                NodeKind::PrincipledBsdf { base_color } => Some(base_color),
                _ => None,
            })
            .unwrap_or(DEFAULT_BASE_COLOR)
    }

    pub fn set_base_color(&mut self, color: [f32; 4]) {
        for node in &mut self.node_tree.nodes {
            if let NodeKind::PrincipledBsdf { base_color } = &mut node.kind {
                *base_color = color;
            }
        }
    }
}
