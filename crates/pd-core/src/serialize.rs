//! Live surface → page model.

use crate::id::PageId;
use crate::model::Page;
use crate::surface::LiveSurface;

/// Capture the live surface as a page.
///
/// Element nodes are read in list order. The page id and the cached
/// thumbnail come from `previous` so a capture never changes page identity
/// and never blanks a thumbnail; `fresh_id` is used only when there is no
/// previous page.
pub fn serialize_page(surface: &LiveSurface, previous: Option<&Page>, fresh_id: PageId) -> Page {
    let paper = surface.paper();
    let elements = surface
        .element_ids()
        .into_iter()
        .filter_map(|id| surface.element_model(id))
        .collect();

    Page {
        id: previous.map(|p| p.id).unwrap_or(fresh_id),
        width: paper.width,
        height: paper.height,
        background: paper.background.clone(),
        header: surface.header().html.clone(),
        footer: surface.footer().html.clone(),
        border: surface.border(),
        elements,
        thumbnail: previous.and_then(|p| p.thumbnail.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Content, Element, ElementKind};
    use kurbo::Rect;

    #[test]
    fn keeps_previous_identity_and_thumbnail() {
        let mut surface = LiveSurface::new(794.0, 1123.0);
        surface.add_element(&Element::new(
            ElementKind::Image,
            Content::image("cat.png"),
            Rect::new(0.0, 0.0, 40.0, 40.0),
        ));
        let mut prev = Page::blank(PageId(42), 794.0, 1123.0);
        prev.thumbnail = Some("data:image/png;base64,AAAA".into());

        let page = serialize_page(&surface, Some(&prev), PageId(99));
        assert_eq!(page.id, PageId(42));
        assert_eq!(page.thumbnail, prev.thumbnail);
        assert_eq!(page.elements.len(), 1);
        assert!(page.elements[0].content.is_image());
    }

    #[test]
    fn mints_id_without_previous() {
        let surface = LiveSurface::new(816.0, 1056.0);
        let page = serialize_page(&surface, None, PageId(7));
        assert_eq!(page.id, PageId(7));
        assert_eq!(page.thumbnail, None);
        assert_eq!((page.width, page.height), (816.0, 1056.0));
    }

    #[test]
    fn captures_crop_flag() {
        let mut surface = LiveSurface::new(794.0, 1123.0);
        let id = surface.add_element(&Element::new(
            ElementKind::Image,
            Content::image("a.png"),
            Rect::new(0.0, 0.0, 40.0, 40.0),
        ));
        surface.element_mut(id).unwrap().cropping = true;
        let page = serialize_page(&surface, None, PageId(1));
        assert!(page.elements[0].crop_mode);
    }
}
