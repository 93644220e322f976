//! Page arithmetic and the windowed page strip.
//!
//! The strip always shows the first and last page; pages around the
//! current one form a sliding window, and a gap on either side collapses
//! to an ellipsis.

/// Upper bound on the sliding window of nearby page numbers.
pub const MAX_VISIBLE_PAGES: u32 = 5;

/// One element of the rendered page strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Number of pages needed for `total_count` items, at least 1 per page.
///
/// An empty list still has zero pages; callers clamp to page 1 when
/// rendering.
#[must_use]
pub fn total_pages(total_count: u64, per_page: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(per_page.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a 1-based page number into the valid range.
#[must_use]
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Whether a page precedes this one.
#[must_use]
pub const fn has_previous(page: u32) -> bool {
    page > 1
}

/// Whether a page follows this one.
#[must_use]
pub const fn has_next(page: u32, total_pages: u32) -> bool {
    page < total_pages
}

/// Build the page strip for the current position.
///
/// The first and last page are always present. Around the current page a
/// window of neighbors is shown; when the window does not touch the
/// edges, the gap on that side becomes an [`PageItem::Ellipsis`]. Both
/// sides can carry an ellipsis at once for a current page deep inside a
/// long list.
#[must_use]
pub fn page_numbers(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 1 {
        return vec![PageItem::Page(1)];
    }

    let current = clamp_page(current, total_pages);
    let radius = MAX_VISIBLE_PAGES / 2;
    let window_start = current.saturating_sub(radius).max(2);
    let window_end = current.saturating_add(radius).min(total_pages - 1);

    let mut items = vec![PageItem::Page(1)];
    if window_start > 2 {
        items.push(PageItem::Ellipsis);
    }
    for page in window_start..=window_end {
        items.push(PageItem::Page(page));
    }
    if window_end < total_pages - 1 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total_pages));
    items
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
