//! Persisted document format: `{ title, pages: [...] }` JSON.
//!
//! Lengths are stored as unit-suffixed strings (`"794px"`), rotations as
//! transform strings, and `zIndex`/`scaleX`/`scaleY` as strings. Readers
//! accept numbers in those positions as well, since hand-edited and older
//! files carry both forms.

use crate::error::{CoreError, CoreResult};
use crate::id::PageId;
use crate::model::{
    BorderStyle, Content, DEFAULT_Z_INDEX, Document, Element, ElementKind, ImageStyle, Page,
    PagePreset,
};
use crate::units::{
    Dim, Rotation, Scale, format_number, format_px, parse_length, parse_positive_length,
};
use serde::{Deserialize, Serialize};

// ─── Wire types ──────────────────────────────────────────────────────────

/// A JSON scalar that may be written as a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrOrNum {
    Int(u64),
    Num(f64),
    Str(String),
}

impl StrOrNum {
    fn text(&self) -> String {
        match self {
            StrOrNum::Int(n) => n.to_string(),
            StrOrNum::Num(n) => format_number(*n),
            StrOrNum::Str(s) => s.clone(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, StrOrNum::Str(s) if s.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    pages: Vec<PageWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<StrOrNum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumb: Option<String>,
    #[serde(default)]
    width: Option<StrOrNum>,
    #[serde(default)]
    height: Option<StrOrNum>,
    #[serde(default)]
    background: Option<String>,
    #[serde(default)]
    header: String,
    #[serde(default)]
    footer: String,
    #[serde(default)]
    border_style: Option<String>,
    #[serde(default)]
    elements: Vec<ElementWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementWire {
    left: StrOrNum,
    top: StrOrNum,
    width: StrOrNum,
    height: StrOrNum,
    #[serde(default)]
    transform: Option<String>,
    #[serde(default)]
    z_index: Option<StrOrNum>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, rename = "innerHTML")]
    inner_html: String,
    #[serde(default)]
    img_src: String,
    #[serde(default)]
    clip_path: String,
    #[serde(default)]
    bg: String,
    #[serde(default)]
    crop_mode: bool,
    #[serde(default)]
    img_style: ImageStyleWire,
    #[serde(default, rename = "scaleX")]
    scale_x: Option<StrOrNum>,
    #[serde(default, rename = "scaleY")]
    scale_y: Option<StrOrNum>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageStyleWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_height: Option<String>,
}

// ─── Decoding ────────────────────────────────────────────────────────────

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn decode_image_style(wire: &ImageStyleWire) -> CoreResult<ImageStyle> {
    let dim = |s: &Option<String>| non_empty(s).map(Dim::parse).transpose();
    let len = |s: &Option<String>| non_empty(s).map(parse_length).transpose();
    Ok(ImageStyle {
        width: dim(&wire.width)?,
        height: dim(&wire.height)?,
        left: len(&wire.left)?,
        top: len(&wire.top)?,
        position: non_empty(&wire.position).map(str::to_string),
        filter: non_empty(&wire.filter).map(str::to_string),
        max_width: dim(&wire.max_width)?,
        max_height: dim(&wire.max_height)?,
    })
}

fn decode_z_index(wire: Option<&StrOrNum>) -> CoreResult<i32> {
    match wire {
        None => Ok(DEFAULT_Z_INDEX),
        Some(v) if v.is_blank() => Ok(DEFAULT_Z_INDEX),
        Some(StrOrNum::Int(n)) => {
            i32::try_from(*n).map_err(|_| CoreError::InvalidZIndex(n.to_string()))
        }
        Some(StrOrNum::Num(n))
            if n.is_finite() && *n >= f64::from(i32::MIN) && *n <= f64::from(i32::MAX) =>
        {
            Ok(n.trunc() as i32)
        }
        Some(v) => v
            .text()
            .trim()
            .parse::<i32>()
            .map_err(|_| CoreError::InvalidZIndex(v.text())),
    }
}

fn decode_scale_factor(wire: Option<&StrOrNum>) -> CoreResult<f64> {
    match wire {
        None => Ok(1.0),
        Some(v) => Scale::parse_factor(&v.text()),
    }
}

fn decode_element(wire: &ElementWire) -> CoreResult<Element> {
    let content = if !wire.img_src.is_empty() {
        Content::Image {
            src: wire.img_src.clone(),
            style: decode_image_style(&wire.img_style)?,
        }
    } else if !wire.clip_path.is_empty() {
        Content::Shape {
            clip_path: wire.clip_path.clone(),
            fill: wire.bg.clone(),
        }
    } else {
        Content::Markup {
            html: wire.inner_html.clone(),
        }
    };

    Ok(Element {
        left: parse_length(&wire.left.text())?,
        top: parse_length(&wire.top.text())?,
        width: parse_positive_length(&wire.width.text(), "element width")?,
        height: parse_positive_length(&wire.height.text(), "element height")?,
        rotation: Rotation::parse(wire.transform.as_deref().unwrap_or(""))?,
        z_index: decode_z_index(wire.z_index.as_ref())?,
        kind: ElementKind::from_tag(wire.kind.as_deref().unwrap_or("")),
        content,
        scale: Scale::new(
            decode_scale_factor(wire.scale_x.as_ref())?,
            decode_scale_factor(wire.scale_y.as_ref())?,
        ),
        crop_mode: wire.crop_mode,
    })
}

fn decode_page_id(wire: Option<&StrOrNum>) -> Option<PageId> {
    match wire? {
        StrOrNum::Int(n) => Some(PageId(*n)),
        StrOrNum::Num(n) if n.is_finite() && *n >= 0.0 => Some(PageId(*n as u64)),
        StrOrNum::Str(s) => s.trim().parse::<u64>().ok().map(PageId),
        _ => None,
    }
}

fn decode_page(wire: &PageWire, fallback_id: PageId) -> CoreResult<Page> {
    let (default_w, default_h) = PagePreset::A4.size();
    let size = |v: &Option<StrOrNum>, what: &'static str, default: f64| match v {
        Some(v) if !v.is_blank() => parse_positive_length(&v.text(), what),
        _ => Ok(default),
    };
    let border = match non_empty(&wire.border_style) {
        None => BorderStyle::None,
        Some(tag) => BorderStyle::from_tag(tag).unwrap_or_else(|| {
            log::warn!("format: unknown border style `{tag}`, using none");
            BorderStyle::None
        }),
    };

    Ok(Page {
        id: decode_page_id(wire.id.as_ref()).unwrap_or(fallback_id),
        width: size(&wire.width, "page width", default_w)?,
        height: size(&wire.height, "page height", default_h)?,
        background: non_empty(&wire.background)
            .unwrap_or("#ffffff")
            .to_string(),
        header: wire.header.clone(),
        footer: wire.footer.clone(),
        border,
        elements: wire
            .elements
            .iter()
            .map(decode_element)
            .collect::<CoreResult<_>>()?,
        thumbnail: wire.thumb.clone().filter(|t| !t.is_empty()),
    })
}

/// Parse a persisted document. The first page becomes current.
///
/// Pages without an id get one minted from `now_ms`, kept distinct from
/// the ids already present in the file.
pub fn load_document(json: &str, now_ms: f64) -> CoreResult<Document> {
    let wire: DocumentWire = serde_json::from_str(json)?;
    if wire.pages.is_empty() {
        return Err(CoreError::EmptyDocument);
    }

    let mut last = wire
        .pages
        .iter()
        .filter_map(|p| decode_page_id(p.id.as_ref()))
        .max();
    let mut pages = Vec::with_capacity(wire.pages.len());
    for (index, page) in wire.pages.iter().enumerate() {
        let fallback = PageId::from_clock(now_ms, last);
        let page = decode_page(page, fallback).map_err(|e| CoreError::Page {
            index,
            source: Box::new(e),
        })?;
        if page.id == fallback {
            last = Some(fallback);
        }
        pages.push(page);
    }

    let mut doc = Document::new(
        wire.title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Document::default().title),
    );
    doc.pages = pages;
    log::debug!("format: loaded `{}` ({} pages)", doc.title, doc.pages.len());
    Ok(doc)
}

// ─── Encoding ────────────────────────────────────────────────────────────

fn encode_image_style(style: &ImageStyle) -> ImageStyleWire {
    ImageStyleWire {
        width: style.width.map(|d| d.to_string()),
        height: style.height.map(|d| d.to_string()),
        top: style.top.map(format_px),
        left: style.left.map(format_px),
        position: style.position.clone(),
        filter: style.filter.clone(),
        max_width: style.max_width.map(|d| d.to_string()),
        max_height: style.max_height.map(|d| d.to_string()),
    }
}

fn encode_element(el: &Element) -> ElementWire {
    let mut wire = ElementWire {
        left: StrOrNum::Str(format_px(el.left)),
        top: StrOrNum::Str(format_px(el.top)),
        width: StrOrNum::Str(format_px(el.width)),
        height: StrOrNum::Str(format_px(el.height)),
        transform: Some(el.rotation.to_string()),
        z_index: Some(StrOrNum::Str(el.z_index.to_string())),
        kind: Some(el.kind.tag().to_string()),
        inner_html: String::new(),
        img_src: String::new(),
        clip_path: String::new(),
        bg: String::new(),
        crop_mode: el.crop_mode,
        img_style: ImageStyleWire::default(),
        scale_x: Some(StrOrNum::Str(format_number(el.scale.x))),
        scale_y: Some(StrOrNum::Str(format_number(el.scale.y))),
    };
    match &el.content {
        Content::Markup { html } => wire.inner_html = html.clone(),
        Content::Image { src, style } => {
            wire.img_src = src.clone();
            wire.img_style = encode_image_style(style);
        }
        Content::Shape { clip_path, fill } => {
            wire.clip_path = clip_path.clone();
            wire.bg = fill.clone();
        }
    }
    wire
}

fn encode_page(page: &Page) -> PageWire {
    PageWire {
        id: Some(StrOrNum::Int(page.id.0)),
        thumb: page.thumbnail.clone(),
        width: Some(StrOrNum::Str(format_px(page.width))),
        height: Some(StrOrNum::Str(format_px(page.height))),
        background: Some(page.background.clone()),
        header: page.header.clone(),
        footer: page.footer.clone(),
        border_style: Some(page.border.tag().to_string()),
        elements: page.elements.iter().map(encode_element).collect(),
    }
}

/// Serialize a document to its persisted JSON form.
pub fn save_document(doc: &Document) -> CoreResult<String> {
    let wire = DocumentWire {
        title: Some(doc.title.clone()),
        pages: doc.pages.iter().map(encode_page).collect(),
    };
    Ok(serde_json::to_string(&wire)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_numbers_and_strings_for_scalar_fields() {
        let json = r##"{
            "title": "Flyer",
            "pages": [{
                "id": 1700000000000,
                "width": "794px", "height": "1123px",
                "background": "#fafafa", "header": "", "footer": "",
                "borderStyle": "none",
                "elements": [
                    { "left": "10px", "top": 20, "width": "30px", "height": "40px",
                      "transform": "rotate(15deg)", "zIndex": 12, "type": "box",
                      "innerHTML": "<p>a</p>", "scaleX": -1, "scaleY": "1" },
                    { "left": "0px", "top": "0px", "width": "5px", "height": "5px",
                      "zIndex": "", "type": "sparkle", "innerHTML": "x" }
                ]
            }]
        }"##;
        let doc = load_document(json, 0.0).unwrap();
        let el = &doc.pages[0].elements[0];
        assert_eq!(el.top, 20.0);
        assert_eq!(el.z_index, 12);
        assert_eq!(el.scale, Scale::new(-1.0, 1.0));
        assert_eq!(el.rotation, Rotation::degrees(15.0));
        let fallback = &doc.pages[0].elements[1];
        assert_eq!(fallback.z_index, DEFAULT_Z_INDEX);
        assert_eq!(fallback.kind, ElementKind::Box);
        assert_eq!(fallback.rotation, Rotation::NONE);
    }

    #[test]
    fn writes_scalars_as_strings() {
        let mut doc = Document::new("T");
        let mut page = Page::blank(PageId(5), 794.0, 1123.0);
        page.elements.push(Element::new(
            ElementKind::Shape,
            Content::shape("circle(50%)", "blue"),
            kurbo::Rect::new(0.0, 0.0, 100.0, 100.0),
        ));
        doc.pages.push(page);
        let json = save_document(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let el = &value["pages"][0]["elements"][0];
        assert_eq!(el["zIndex"], "10");
        assert_eq!(el["scaleX"], "1");
        assert_eq!(el["width"], "100px");
        assert_eq!(el["clipPath"], "circle(50%)");
        assert_eq!(el["bg"], "blue");
        assert_eq!(value["pages"][0]["id"], 5);
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(
            load_document(r#"{"title":"x","pages":[]}"#, 0.0),
            Err(CoreError::EmptyDocument)
        ));
        assert!(matches!(
            load_document("not json", 0.0),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn bad_element_reports_page_index() {
        let json = r#"{"pages":[
            {"elements":[]},
            {"elements":[{"left":"0px","top":"0px","width":"0px","height":"4px"}]}
        ]}"#;
        match load_document(json, 0.0) {
            Err(CoreError::Page { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, CoreError::NonPositive { .. }));
            }
            other => panic!("expected page error, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_z_index_is_rejected() {
        for z in ["4294967296", "-3000000000", "\"99999999999\""] {
            let json = format!(
                r#"{{"pages":[{{"elements":[{{"left":"0px","top":"0px","width":"4px","height":"4px","zIndex":{z}}}]}}]}}"#
            );
            match load_document(&json, 0.0) {
                Err(CoreError::Page { source, .. }) => {
                    assert!(matches!(*source, CoreError::InvalidZIndex(_)), "{z}: {source:?}");
                }
                other => panic!("{z}: expected z-index error, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_ids_are_minted_distinct() {
        let json = r#"{"pages":[{"id": 1000}, {}, {}]}"#;
        let doc = load_document(json, 500.0).unwrap();
        let ids: Vec<u64> = doc.pages.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1000, 1001, 1002]);
        assert_eq!(doc.title, "Publication");
        assert_eq!(doc.pages[1].width, 794.0);
    }
}
