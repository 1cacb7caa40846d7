//! The element store: elements, links and the pending link source.

use crate::elements::{Element, ElementId, ElementKind, ElementLayout, Height, HitRegion, ResizeLimits};
use crate::geometry::{self, EdgePoints, LinkArrow};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A directed link between two elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub from: ElementId,
    pub to: ElementId,
}

impl Link {
    pub fn new(from: ElementId, to: ElementId) -> Self {
        Self { from, to }
    }

    /// True if this link joins `a` and `b` in either direction.
    pub fn connects(&self, a: ElementId, b: ElementId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    pub fn touches(&self, id: ElementId) -> bool {
        self.from == id || self.to == id
    }
}

/// Result of [`Board::toggle_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkToggle {
    /// The element is now the pending link source.
    Pending(ElementId),
    /// The pending source was selected again and cleared.
    Cancelled,
    /// A new link was created.
    Linked(Link),
    /// The pair was already linked; the pending source was cleared.
    AlreadyLinked,
    /// The id does not exist.
    Ignored,
}

/// Element found under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: ElementId,
    pub region: HitRegion,
}

/// The live collection of elements and links.
///
/// Operations naming an unknown id are silent no-ops: pointer sessions may
/// still reference an element after it has been deleted.
#[derive(Debug, Clone, Default)]
pub struct Board {
    elements: HashMap<ElementId, Element>,
    /// Paint order (back to front).
    z_order: Vec<ElementId>,
    links: Vec<Link>,
    linking_from: Option<ElementId>,
    limits: ResizeLimits,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ResizeLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Rebuild a board from stored parts.
    ///
    /// Elements with duplicate ids keep their first occurrence. Links that are
    /// self-links, duplicates in either direction, or reference missing
    /// elements are dropped.
    pub fn from_parts(elements: Vec<Element>, links: Vec<Link>, limits: ResizeLimits) -> Self {
        let mut board = Self::with_limits(limits);
        for mut element in elements {
            if board.elements.contains_key(&element.id) {
                log::warn!("Dropping element with duplicate id {}", element.id);
                continue;
            }
            element.is_linking = false;
            board.insert(element);
        }
        for link in links {
            if link.from == link.to
                || !board.contains(link.from)
                || !board.contains(link.to)
                || board.are_linked(link.from, link.to)
            {
                log::warn!("Dropping invalid link {} -> {}", link.from, link.to);
                continue;
            }
            board.links.push(link);
        }
        board
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = element.id;
        self.z_order.push(id);
        self.elements.insert(id, element);
        id
    }

    /// Append a new element with a fresh id.
    pub fn add_element(&mut self, kind: ElementKind, position: Point, width: f64, height: Height) -> ElementId {
        let element = Element::new(kind, position, width, height);
        log::debug!("Adding {} {} at ({}, {})", element.kind.name(), element.id, position.x, position.y);
        self.insert(element)
    }

    /// Move an element by a board-space delta.
    pub fn move_element(&mut self, id: ElementId, delta: Vec2) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.translate(delta);
        }
    }

    /// Resize an element by a board-space delta.
    pub fn resize_element(&mut self, id: ElementId, delta: Vec2) {
        let limits = self.limits;
        if let Some(element) = self.elements.get_mut(&id) {
            element.resize(delta, limits);
        }
    }

    /// Remove an element and every link touching it.
    pub fn delete_element(&mut self, id: ElementId) -> Option<Element> {
        let removed = self.elements.remove(&id)?;
        self.z_order.retain(|&other| other != id);
        self.links.retain(|link| !link.touches(id));
        if self.linking_from == Some(id) {
            self.linking_from = None;
        }
        log::debug!("Deleted {} {}", removed.kind.name(), id);
        Some(removed)
    }

    /// Replace a note's text. Images are left untouched.
    pub fn update_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(Element {
            kind: ElementKind::Note { text: current },
            ..
        }) = self.elements.get_mut(&id)
        {
            *current = text.into();
        }
    }

    /// Advance the linking state with a selection of `id`.
    ///
    /// With no pending source the element becomes the source and is
    /// highlighted. Selecting the source again cancels. Selecting another
    /// element links the pair unless already linked in either direction.
    pub fn toggle_link(&mut self, id: ElementId) -> LinkToggle {
        if !self.contains(id) {
            return LinkToggle::Ignored;
        }
        self.clear_highlights();

        match self.linking_from.take() {
            None => {
                self.linking_from = Some(id);
                if let Some(element) = self.elements.get_mut(&id) {
                    element.is_linking = true;
                }
                LinkToggle::Pending(id)
            }
            Some(source) if source == id => LinkToggle::Cancelled,
            Some(source) => {
                if self.are_linked(source, id) {
                    LinkToggle::AlreadyLinked
                } else {
                    let link = Link::new(source, id);
                    self.links.push(link);
                    log::debug!("Linked {} -> {}", source, id);
                    LinkToggle::Linked(link)
                }
            }
        }
    }

    fn clear_highlights(&mut self) {
        for element in self.elements.values_mut() {
            element.is_linking = false;
        }
    }

    /// Drop the pending link source and any highlight.
    pub fn cancel_linking(&mut self) {
        self.linking_from = None;
        self.clear_highlights();
    }

    pub fn linking_from(&self) -> Option<ElementId> {
        self.linking_from
    }

    pub fn are_linked(&self, a: ElementId, b: ElementId) -> bool {
        self.links.iter().any(|link| link.connects(a, b))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Elements in paint order (back to front).
    pub fn elements_ordered(&self) -> impl Iterator<Item = &Element> {
        self.z_order.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Remove everything, including the pending link source.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.z_order.clear();
        self.links.clear();
        self.linking_from = None;
    }

    /// Top-most element under a board-space point.
    pub fn hit_test(&self, point: Point, layout: ElementLayout) -> Option<Hit> {
        self.z_order.iter().rev().find_map(|&id| {
            let region = self.elements.get(&id)?.region_at(point, layout)?;
            Some(Hit { id, region })
        })
    }

    /// Edge points for a link, if both ends exist.
    pub fn edge_points(&self, link: &Link) -> Option<EdgePoints> {
        let from = self.elements.get(&link.from)?;
        let to = self.elements.get(&link.to)?;
        Some(geometry::resolve_edge_points(from, to))
    }

    /// Arrows for every link that can be drawn.
    pub fn link_arrows(&self, head_size: f64) -> Vec<(Link, LinkArrow)> {
        self.links
            .iter()
            .filter_map(|link| {
                let arrow = geometry::link_arrow(self.edge_points(link)?, head_size)?;
                Some((*link, arrow))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_at(board: &mut Board, x: f64, y: f64) -> ElementId {
        board.add_element(ElementKind::note(""), Point::new(x, y), 160.0, Height::Fixed(100.0))
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        let b = note_at(&mut board, 0.0, 0.0);
        assert_ne!(a, b);
        assert_eq!(board.len(), 2);
        let order: Vec<_> = board.elements_ordered().map(|e| e.id()).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_link_then_delete_scenario() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        let b = note_at(&mut board, 400.0, 0.0);

        assert_eq!(board.toggle_link(a), LinkToggle::Pending(a));
        assert!(board.get(a).unwrap().is_linking);
        assert_eq!(board.toggle_link(b), LinkToggle::Linked(Link::new(a, b)));
        assert_eq!(board.links().len(), 1);
        assert_eq!(board.linking_from(), None);
        assert!(board.elements_ordered().all(|e| !e.is_linking));

        board.delete_element(a);
        assert!(board.links().is_empty());
        assert_eq!(board.len(), 1);
        assert!(board.contains(b));
    }

    #[test]
    fn test_reselecting_source_cancels() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        board.toggle_link(a);
        assert_eq!(board.toggle_link(a), LinkToggle::Cancelled);
        assert_eq!(board.linking_from(), None);
        assert!(!board.get(a).unwrap().is_linking);
        assert!(board.links().is_empty());
    }

    #[test]
    fn test_no_duplicate_links_in_either_direction() {
        let mut board = Board::new();
        let ids: Vec<_> = (0..4).map(|i| note_at(&mut board, i as f64 * 300.0, 0.0)).collect();

        // Every ordered pair, twice over.
        for _ in 0..2 {
            for &x in &ids {
                for &y in &ids {
                    board.toggle_link(x);
                    board.toggle_link(y);
                }
            }
        }

        let links = board.links();
        for (i, l) in links.iter().enumerate() {
            assert_ne!(l.from, l.to);
            for other in &links[i + 1..] {
                assert!(!other.connects(l.from, l.to), "duplicate link {l:?}");
            }
        }
        assert_eq!(links.len(), 6);
    }

    #[test]
    fn test_reverse_link_is_rejected() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        let b = note_at(&mut board, 400.0, 0.0);
        board.toggle_link(a);
        board.toggle_link(b);
        board.toggle_link(b);
        assert_eq!(board.toggle_link(a), LinkToggle::AlreadyLinked);
        assert_eq!(board.links(), &[Link::new(a, b)]);
        assert_eq!(board.linking_from(), None);
    }

    #[test]
    fn test_delete_cascades_every_link() {
        let mut board = Board::new();
        let hub = note_at(&mut board, 0.0, 0.0);
        let spokes: Vec<_> = (1..5).map(|i| note_at(&mut board, i as f64 * 300.0, 0.0)).collect();
        for &s in &spokes {
            board.toggle_link(hub);
            board.toggle_link(s);
        }
        board.toggle_link(spokes[0]);
        board.toggle_link(spokes[1]);
        assert_eq!(board.links().len(), 5);

        board.delete_element(hub);
        assert!(board.links().iter().all(|l| !l.touches(hub)));
        assert_eq!(board.links().len(), 1);
    }

    #[test]
    fn test_delete_clears_pending_source() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        board.toggle_link(a);
        board.delete_element(a);
        assert_eq!(board.linking_from(), None);
    }

    #[test]
    fn test_stale_ids_are_noops() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        board.delete_element(a);

        board.move_element(a, Vec2::new(5.0, 5.0));
        board.resize_element(a, Vec2::new(5.0, 5.0));
        board.update_text(a, "hello");
        assert!(board.delete_element(a).is_none());
        assert_eq!(board.toggle_link(a), LinkToggle::Ignored);
        assert!(board.is_empty());
    }

    #[test]
    fn test_move_and_resize() {
        let mut board = Board::new();
        let a = note_at(&mut board, 10.0, 10.0);
        board.move_element(a, Vec2::new(5.0, -5.0));
        board.resize_element(a, Vec2::new(20.0, 30.0));
        let el = board.get(a).unwrap();
        assert_eq!(el.position, Point::new(15.0, 5.0));
        assert!((el.width - 180.0).abs() < f64::EPSILON);
        assert_eq!(el.height, Height::Fixed(130.0));
    }

    #[test]
    fn test_update_text_only_affects_notes() {
        let mut board = Board::new();
        let n = note_at(&mut board, 0.0, 0.0);
        let i = board.add_element(ElementKind::image("data:image/png;base64,"), Point::ZERO, 200.0, Height::Auto);
        board.update_text(n, "hello");
        board.update_text(i, "nope");
        assert_eq!(board.get(n).unwrap().text(), Some("hello"));
        assert_eq!(board.get(i).unwrap().content(), Some("data:image/png;base64,"));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut board = Board::new();
        let _below = note_at(&mut board, 0.0, 0.0);
        let above = note_at(&mut board, 50.0, 50.0);
        let hit = board.hit_test(Point::new(100.0, 140.0), ElementLayout::default()).unwrap();
        assert_eq!(hit.id, above);
        assert!(board.hit_test(Point::new(-10.0, -10.0), ElementLayout::default()).is_none());
    }

    #[test]
    fn test_from_parts_sanitizes_links() {
        let a = Element::new(ElementKind::note("a"), Point::ZERO, 160.0, Height::Fixed(100.0));
        let b = Element::new(ElementKind::note("b"), Point::new(400.0, 0.0), 160.0, Height::Fixed(100.0));
        let (ia, ib) = (a.id(), b.id());
        let ghost = ElementId::new_v4();
        let links = vec![
            Link::new(ia, ib),
            Link::new(ib, ia),
            Link::new(ia, ia),
            Link::new(ia, ghost),
        ];
        let board = Board::from_parts(vec![a, b], links, ResizeLimits::default());
        assert_eq!(board.links(), &[Link::new(ia, ib)]);
    }

    #[test]
    fn test_link_arrows_skip_overlapping_centers() {
        let mut board = Board::new();
        let a = note_at(&mut board, 0.0, 0.0);
        let b = note_at(&mut board, 400.0, 0.0);
        let c = note_at(&mut board, 0.0, 0.0);
        board.toggle_link(a);
        board.toggle_link(b);
        board.toggle_link(a);
        board.toggle_link(c);
        assert_eq!(board.links().len(), 2);

        let arrows = board.link_arrows(8.0);
        assert_eq!(arrows.len(), 1);
        let (link, arrow) = arrows[0];
        assert_eq!(link, Link::new(a, b));
        assert_eq!(arrow.line.p0, Point::new(160.0, 50.0));
        assert_eq!(arrow.line.p1, Point::new(400.0, 50.0));
    }
}
