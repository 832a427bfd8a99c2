use serde::Serialize;

/// Clients per page on the dashboard list
pub const DEFAULT_PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices `items` into one page.
///
/// `page` is 1-based. A page past the end comes back empty with the page
/// number clamped to the last page; `per_page == 0` falls back to the default.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = if per_page == 0 { DEFAULT_PAGE_SIZE } else { per_page };
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);

    let start = page.saturating_sub(1).saturating_mul(per_page);
    let slice = if page == 0 || start >= total_items {
        Vec::new()
    } else {
        let end = (start + per_page).min(total_items);
        items[start..end].to_vec()
    };

    Page {
        items: slice,
        page: page.clamp(1, total_pages),
        per_page,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_page_count() {
        let items: Vec<u32> = (0..13).collect();
        let page = paginate(&items, 3, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![12]);

        let first = paginate(&items, 1, DEFAULT_PAGE_SIZE);
        assert_eq!(first.items, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let page = paginate::<u32>(&[], 1, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_out_of_range_page() {
        let items: Vec<u32> = (0..4).collect();
        let page = paginate(&items, 9, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 2);

        let zero = paginate(&items, 0, 2);
        assert!(zero.items.is_empty());
        assert_eq!(zero.page, 1);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_items_once(len in 0usize..50, per_page in 1usize..10) {
            let items: Vec<usize> = (0..len).collect();
            let total_pages = paginate(&items, 1, per_page).total_pages;
            let joined: Vec<usize> = (1..=total_pages)
                .flat_map(|p| paginate(&items, p, per_page).items)
                .collect();
            prop_assert_eq!(joined, items);
        }
    }
}
