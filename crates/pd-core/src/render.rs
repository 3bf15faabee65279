//! Page model → live surface.

use crate::id::ElementId;
use crate::model::Page;
use crate::surface::LiveSurface;

/// Rebuild the live surface from a page.
///
/// Every element node is cleared and rebuilt with its full set of
/// affordances, so selection is always empty afterwards and elements start
/// out of crop mode. Structural nodes keep their visibility flags; only
/// their page-level content is replaced. Returns the new element handles
/// in page order.
pub fn render_page(surface: &mut LiveSurface, page: &Page) -> Vec<ElementId> {
    surface.clear_elements();

    surface.set_size(page.width, page.height);
    surface.paper_mut().background = page.background.clone();
    surface.header_mut().html = page.header.clone();
    surface.footer_mut().html = page.footer.clone();
    surface.set_border(page.border);

    let ids: Vec<ElementId> = page
        .elements
        .iter()
        .map(|element| surface.add_element(element))
        .collect();

    log::debug!(
        "render: page {} ({} elements, {}x{})",
        page.id,
        ids.len(),
        page.width,
        page.height
    );
    ids
}
