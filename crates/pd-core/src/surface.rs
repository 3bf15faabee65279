//! The live surface: the editable tree the host mirrors into its view.
//!
//! The paper is the root. Its structural children (margin guides, border
//! container, header, footer) survive every render; element nodes are
//! cleared and rebuilt. Each element node owns a content layer (carrying
//! the mirror scale) with one content child, eight resize handles, a
//! rotate stick and a rotate handle.

use crate::id::ElementId;
use crate::model::{BorderDecoration, BorderStyle, Content, Element, ElementKind};
use crate::units::{Rotation, Scale, format_number, format_px};
use kurbo::{Point, Rect};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Compass direction of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HandleDir {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl HandleDir {
    /// Handles in the order they are attached to an element node.
    pub const ALL: [HandleDir; 8] = [
        HandleDir::NW,
        HandleDir::N,
        HandleDir::NE,
        HandleDir::E,
        HandleDir::SE,
        HandleDir::S,
        HandleDir::SW,
        HandleDir::W,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            HandleDir::N => "n",
            HandleDir::NE => "ne",
            HandleDir::E => "e",
            HandleDir::SE => "se",
            HandleDir::S => "s",
            HandleDir::SW => "sw",
            HandleDir::W => "w",
            HandleDir::NW => "nw",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.tag() == tag)
    }

    pub fn moves_east(&self) -> bool {
        matches!(self, HandleDir::NE | HandleDir::E | HandleDir::SE)
    }

    pub fn moves_west(&self) -> bool {
        matches!(self, HandleDir::NW | HandleDir::W | HandleDir::SW)
    }

    pub fn moves_north(&self) -> bool {
        matches!(self, HandleDir::NW | HandleDir::N | HandleDir::NE)
    }

    pub fn moves_south(&self) -> bool {
        matches!(self, HandleDir::SW | HandleDir::S | HandleDir::SE)
    }

    /// Center of the handle on an unrotated element box.
    pub fn position(&self, frame: Rect) -> Point {
        let x = if self.moves_west() {
            frame.x0
        } else if self.moves_east() {
            frame.x1
        } else {
            (frame.x0 + frame.x1) / 2.0
        };
        let y = if self.moves_north() {
            frame.y0
        } else if self.moves_south() {
            frame.y1
        } else {
            (frame.y0 + frame.y1) / 2.0
        };
        Point::new(x, y)
    }
}

/// The outer box of a placed element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub id: ElementId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
    pub z_index: i32,
    pub kind: ElementKind,
    pub selected: bool,
    pub cropping: bool,
}

impl ElementNode {
    pub fn frame(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.frame().center()
    }
}

/// Header or footer band.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub html: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperNode {
    pub width: f64,
    pub height: f64,
    pub background: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceNode {
    Paper(PaperNode),
    MarginGuides { visible: bool },
    Border(BorderStyle),
    Header(Band),
    Footer(Band),
    Element(ElementNode),
    /// Wraps the content and carries its mirror scale.
    ContentLayer { scale: Scale },
    Content(Content),
    ResizeHandle(HandleDir),
    RotateStick,
    RotateHandle,
}

impl SurfaceNode {
    /// Affordance nodes are stripped from captures.
    pub fn is_affordance(&self) -> bool {
        matches!(
            self,
            SurfaceNode::ResizeHandle(_) | SurfaceNode::RotateStick | SurfaceNode::RotateHandle
        )
    }
}

/// How header/footer bands are treated when the surface is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCapture {
    /// Bands keep their content regardless of visibility.
    ShowAll,
    /// Bands without visible text are dropped.
    HideEmpty,
    /// Both bands are dropped.
    HideAll,
}

// ─── Live surface ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LiveSurface {
    pub graph: StableDiGraph<SurfaceNode, ()>,
    pub paper: NodeIndex,
    guides: NodeIndex,
    border: NodeIndex,
    header: NodeIndex,
    footer: NodeIndex,
    /// Element nodes in list order.
    elements: Vec<NodeIndex>,
    id_index: HashMap<ElementId, NodeIndex>,
}

impl LiveSurface {
    /// An empty paper with its structural children.
    pub fn new(width: f64, height: f64) -> Self {
        let mut graph = StableDiGraph::new();
        let paper = graph.add_node(SurfaceNode::Paper(PaperNode {
            width,
            height,
            background: "#ffffff".to_string(),
        }));
        let mut child = |node: SurfaceNode| {
            let idx = graph.add_node(node);
            graph.add_edge(paper, idx, ());
            idx
        };
        let guides = child(SurfaceNode::MarginGuides { visible: true });
        let border = child(SurfaceNode::Border(BorderStyle::None));
        let header = child(SurfaceNode::Header(Band {
            html: String::new(),
            visible: false,
        }));
        let footer = child(SurfaceNode::Footer(Band {
            html: String::new(),
            visible: false,
        }));
        Self {
            graph,
            paper,
            guides,
            border,
            header,
            footer,
            elements: Vec::new(),
            id_index: HashMap::new(),
        }
    }

    fn children(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 12]> {
        let mut children: SmallVec<[NodeIndex; 12]> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    // ── Page-level attributes ──

    pub fn paper(&self) -> &PaperNode {
        match &self.graph[self.paper] {
            SurfaceNode::Paper(p) => p,
            _ => unreachable!("paper index always holds the paper node"),
        }
    }

    pub fn paper_mut(&mut self) -> &mut PaperNode {
        match &mut self.graph[self.paper] {
            SurfaceNode::Paper(p) => p,
            _ => unreachable!("paper index always holds the paper node"),
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        let paper = self.paper_mut();
        paper.width = width;
        paper.height = height;
    }

    pub fn border(&self) -> BorderStyle {
        match &self.graph[self.border] {
            SurfaceNode::Border(style) => *style,
            _ => BorderStyle::None,
        }
    }

    pub fn set_border(&mut self, style: BorderStyle) {
        self.graph[self.border] = SurfaceNode::Border(style);
    }

    pub fn guides_visible(&self) -> bool {
        matches!(
            self.graph[self.guides],
            SurfaceNode::MarginGuides { visible: true }
        )
    }

    pub fn set_guides_visible(&mut self, visible: bool) {
        self.graph[self.guides] = SurfaceNode::MarginGuides { visible };
    }

    pub fn header(&self) -> &Band {
        self.band(self.header)
    }

    pub fn footer(&self) -> &Band {
        self.band(self.footer)
    }

    pub fn header_mut(&mut self) -> &mut Band {
        let idx = self.header;
        self.band_mut(idx)
    }

    pub fn footer_mut(&mut self) -> &mut Band {
        let idx = self.footer;
        self.band_mut(idx)
    }

    fn band(&self, idx: NodeIndex) -> &Band {
        match &self.graph[idx] {
            SurfaceNode::Header(b) | SurfaceNode::Footer(b) => b,
            _ => unreachable!("band index always holds a header or footer"),
        }
    }

    fn band_mut(&mut self, idx: NodeIndex) -> &mut Band {
        match &mut self.graph[idx] {
            SurfaceNode::Header(b) | SurfaceNode::Footer(b) => b,
            _ => unreachable!("band index always holds a header or footer"),
        }
    }

    /// Show or hide both header and footer.
    pub fn set_headers_visible(&mut self, visible: bool) {
        self.header_mut().visible = visible;
        self.footer_mut().visible = visible;
    }

    // ── Elements ──

    /// Build an element node with its content layer and affordances.
    /// New nodes start deselected and out of crop mode.
    pub fn add_element(&mut self, element: &Element) -> ElementId {
        let id = ElementId::fresh();
        let node = ElementNode {
            id,
            left: element.left,
            top: element.top,
            width: element.width,
            height: element.height,
            rotation: element.rotation,
            z_index: element.z_index,
            kind: element.kind,
            selected: false,
            cropping: false,
        };
        let el_idx = self.graph.add_node(SurfaceNode::Element(node));
        self.graph.add_edge(self.paper, el_idx, ());

        let layer = self.graph.add_node(SurfaceNode::ContentLayer {
            scale: element.scale,
        });
        self.graph.add_edge(el_idx, layer, ());
        let content = self
            .graph
            .add_node(SurfaceNode::Content(element.content.clone()));
        self.graph.add_edge(layer, content, ());

        for dir in HandleDir::ALL {
            let h = self.graph.add_node(SurfaceNode::ResizeHandle(dir));
            self.graph.add_edge(el_idx, h, ());
        }
        for node in [SurfaceNode::RotateStick, SurfaceNode::RotateHandle] {
            let h = self.graph.add_node(node);
            self.graph.add_edge(el_idx, h, ());
        }

        self.elements.push(el_idx);
        self.id_index.insert(id, el_idx);
        log::trace!("surface: add {id:?} ({})", element.kind.tag());
        id
    }

    /// Remove an element subtree, returning its model form.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let model = self.element_model(id)?;
        let idx = self.id_index.remove(&id)?;
        self.remove_subtree(idx);
        self.elements.retain(|&e| e != idx);
        Some(model)
    }

    fn remove_subtree(&mut self, idx: NodeIndex) {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        self.graph.remove_node(idx);
    }

    /// Drop every non-structural node.
    pub fn clear_elements(&mut self) {
        for idx in std::mem::take(&mut self.elements) {
            self.remove_subtree(idx);
        }
        self.id_index.clear();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementNode> {
        match self.graph.node_weight(*self.id_index.get(&id)?) {
            Some(SurfaceNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        let idx = *self.id_index.get(&id)?;
        match self.graph.node_weight_mut(idx) {
            Some(SurfaceNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Element nodes in list order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementNode> + '_ {
        self.elements
            .iter()
            .filter_map(|&idx| match &self.graph[idx] {
                SurfaceNode::Element(el) => Some(el),
                _ => None,
            })
    }

    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements().map(|el| el.id).collect()
    }

    /// Ids in paint order: ascending z-index, ties by list order.
    pub fn paint_order(&self) -> Vec<ElementId> {
        let mut nodes: Vec<&ElementNode> = self.elements().collect();
        nodes.sort_by_key(|el| el.z_index);
        nodes.into_iter().map(|el| el.id).collect()
    }

    fn content_layer(&self, id: ElementId) -> Option<NodeIndex> {
        let idx = *self.id_index.get(&id)?;
        self.children(idx)
            .into_iter()
            .find(|&c| matches!(self.graph[c], SurfaceNode::ContentLayer { .. }))
    }

    fn content_index(&self, id: ElementId) -> Option<NodeIndex> {
        let layer = self.content_layer(id)?;
        self.children(layer)
            .into_iter()
            .find(|&c| matches!(self.graph[c], SurfaceNode::Content(_)))
    }

    pub fn content(&self, id: ElementId) -> Option<&Content> {
        match &self.graph[self.content_index(id)?] {
            SurfaceNode::Content(c) => Some(c),
            _ => None,
        }
    }

    pub fn content_mut(&mut self, id: ElementId) -> Option<&mut Content> {
        let idx = self.content_index(id)?;
        match &mut self.graph[idx] {
            SurfaceNode::Content(c) => Some(c),
            _ => None,
        }
    }

    pub fn scale(&self, id: ElementId) -> Option<Scale> {
        match self.graph[self.content_layer(id)?] {
            SurfaceNode::ContentLayer { scale } => Some(scale),
            _ => None,
        }
    }

    pub fn set_scale(&mut self, id: ElementId, scale: Scale) -> bool {
        match self.content_layer(id) {
            Some(layer) => {
                self.graph[layer] = SurfaceNode::ContentLayer { scale };
                true
            }
            None => false,
        }
    }

    /// Resize handles attached to an element, in attachment order.
    pub fn handles(&self, id: ElementId) -> Vec<HandleDir> {
        let Some(&idx) = self.id_index.get(&id) else {
            return Vec::new();
        };
        self.children(idx)
            .into_iter()
            .filter_map(|c| match self.graph[c] {
                SurfaceNode::ResizeHandle(dir) => Some(dir),
                _ => None,
            })
            .collect()
    }

    pub fn has_rotate_handle(&self, id: ElementId) -> bool {
        self.id_index.get(&id).is_some_and(|&idx| {
            self.children(idx)
                .into_iter()
                .any(|c| matches!(self.graph[c], SurfaceNode::RotateHandle))
        })
    }

    /// The element in model form (fresh from the live nodes).
    pub fn element_model(&self, id: ElementId) -> Option<Element> {
        let node = self.element(id)?;
        Some(Element {
            left: node.left,
            top: node.top,
            width: node.width,
            height: node.height,
            rotation: node.rotation,
            z_index: node.z_index,
            kind: node.kind,
            content: self.content(id)?.clone(),
            scale: self.scale(id).unwrap_or_default(),
            crop_mode: node.cropping,
        })
    }

    // ── Selection flags ──

    pub fn selected(&self) -> Option<ElementId> {
        self.elements().find(|el| el.selected).map(|el| el.id)
    }

    /// Mark exactly one element as selected.
    pub fn select(&mut self, id: ElementId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.clear_selection();
        if let Some(el) = self.element_mut(id) {
            el.selected = true;
        }
        true
    }

    /// Clear every selected and cropping flag.
    pub fn clear_selection(&mut self) {
        for &idx in &self.elements {
            if let SurfaceNode::Element(el) = &mut self.graph[idx] {
                el.selected = false;
                el.cropping = false;
            }
        }
    }

    // ── Capture ──

    /// A copy suitable for rasterization: no affordances, no guides, no
    /// selection or crop flags.
    pub fn stripped_for_capture(&self, headers: HeaderCapture) -> LiveSurface {
        let mut copy = self.clone();
        let affordances: Vec<NodeIndex> = copy
            .graph
            .node_indices()
            .filter(|&i| copy.graph[i].is_affordance())
            .collect();
        for idx in affordances {
            copy.graph.remove_node(idx);
        }
        copy.set_guides_visible(false);
        copy.clear_selection();
        for idx in [copy.header, copy.footer] {
            let band = copy.band_mut(idx);
            band.visible = band_shown(band, headers);
            // an invisible band carries no content into the capture
            if !band.visible {
                band.html.clear();
            }
        }
        copy
    }

    // ── View ──

    /// Serializable description of the surface for the host view.
    pub fn to_view(&self) -> SurfaceView {
        let paper = self.paper();
        SurfaceView {
            width: format_px(paper.width),
            height: format_px(paper.height),
            background: paper.background.clone(),
            border: self.border().tag(),
            border_decoration: self.border().decoration(),
            guides_visible: self.guides_visible(),
            header: BandView::from(self.header()),
            footer: BandView::from(self.footer()),
            elements: self
                .elements()
                .filter_map(|el| self.element_view(el))
                .collect(),
        }
    }

    fn element_view(&self, el: &ElementNode) -> Option<ElementView> {
        let scale = self.scale(el.id).unwrap_or_default();
        Some(ElementView {
            id: el.id.to_string(),
            kind: el.kind.tag(),
            left: format_px(el.left),
            top: format_px(el.top),
            width: format_px(el.width),
            height: format_px(el.height),
            transform: el.rotation.to_string(),
            z_index: el.z_index.to_string(),
            scale_x: format_number(scale.x),
            scale_y: format_number(scale.y),
            content_transform: scale.css(),
            selected: el.selected,
            cropping: el.cropping,
            handles: self.handles(el.id).iter().map(|d| d.tag()).collect(),
            rotate_handle: self.has_rotate_handle(el.id),
            content: ContentView::from(self.content(el.id)?),
        })
    }
}

fn band_shown(band: &Band, headers: HeaderCapture) -> bool {
    match headers {
        HeaderCapture::ShowAll => true,
        HeaderCapture::HideEmpty => !visible_text(&band.html).trim().is_empty(),
        HeaderCapture::HideAll => false,
    }
}

/// Text content of a markup fragment with tags removed.
pub fn visible_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
}

// ─── View DTOs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceView {
    pub width: String,
    pub height: String,
    pub background: String,
    pub border: &'static str,
    pub border_decoration: BorderDecoration,
    pub guides_visible: bool,
    pub header: BandView,
    pub footer: BandView,
    pub elements: Vec<ElementView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandView {
    pub html: String,
    pub visible: bool,
}

impl From<&Band> for BandView {
    fn from(band: &Band) -> Self {
        Self {
            html: band.html.clone(),
            visible: band.visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub left: String,
    pub top: String,
    pub width: String,
    pub height: String,
    pub transform: String,
    pub z_index: String,
    pub scale_x: String,
    pub scale_y: String,
    pub content_transform: String,
    pub selected: bool,
    pub cropping: bool,
    pub handles: Vec<&'static str>,
    pub rotate_handle: bool,
    pub content: ContentView,
}

/// Inner content ready for the host: either raw markup or an image with
/// its inline style string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "camelCase")]
pub enum ContentView {
    Markup { html: String },
    Image { src: String, style: String },
    Shape { clip_path: String, fill: String },
}

impl From<&Content> for ContentView {
    fn from(content: &Content) -> Self {
        match content {
            Content::Markup { html } => ContentView::Markup { html: html.clone() },
            Content::Image { src, style } => {
                let dim = |d: Option<crate::units::Dim>, fallback: &str| {
                    d.map(|d| d.to_string())
                        .unwrap_or_else(|| fallback.to_string())
                };
                let style = format!(
                    "width:{}; height:{}; top:{}; left:{}; position:{}; filter:{}; max-width:{}; max-height:{}",
                    dim(style.width, "100%"),
                    dim(style.height, "100%"),
                    format_px(style.top.unwrap_or(0.0)),
                    format_px(style.left.unwrap_or(0.0)),
                    style.position.as_deref().unwrap_or("absolute"),
                    style.filter.as_deref().unwrap_or("none"),
                    dim(style.max_width, "none"),
                    dim(style.max_height, "none"),
                );
                ContentView::Image {
                    src: src.clone(),
                    style,
                }
            }
            Content::Shape { clip_path, fill } => ContentView::Shape {
                clip_path: clip_path.clone(),
                fill: fill.clone(),
            },
        }
    }
}
