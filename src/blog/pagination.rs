use serde::Serialize;

const MAX_LINKS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub number: Option<usize>,
    pub is_current: bool,
    pub url: Option<String>,
    pub ellipsis: bool,
}

impl PageLink {
    fn page(number: usize, current: usize, query: &[(String, String)]) -> Self {
        Self {
            number: Some(number),
            is_current: number == current,
            url: Some(page_url(number, query)),
            ellipsis: false,
        }
    }

    fn gap() -> Self {
        Self {
            number: None,
            is_current: false,
            url: None,
            ellipsis: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub pages: Vec<PageLink>,
    pub show_prev: bool,
    pub show_next: bool,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// `/blog/<page>` carrying every current query parameter except `page`.
pub fn page_url(page: usize, query: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query.iter().filter(|(key, _)| key != "page") {
        serializer.append_pair(key, value);
    }
    let encoded = serializer.finish();

    if encoded.is_empty() {
        format!("/blog/{}", page)
    } else {
        format!("/blog/{}?{}", page, encoded)
    }
}

/// At most ten numbered links around `current`, plus first/last with gaps.
pub fn paginate(current: usize, total_pages: usize, query: &[(String, String)]) -> Pagination {
    if total_pages <= 1 {
        return Pagination::default();
    }

    let (start, end) = if total_pages <= MAX_LINKS {
        (1, total_pages)
    } else {
        let start = current.saturating_sub(MAX_LINKS / 2).max(1);
        let end = (start + MAX_LINKS - 1).min(total_pages);
        if end == total_pages {
            ((end + 1).saturating_sub(MAX_LINKS).max(1), end)
        } else {
            (start, end)
        }
    };

    let mut pages = Vec::new();

    if start > 1 {
        pages.push(PageLink::page(1, current, query));
        if start > 2 {
            pages.push(PageLink::gap());
        }
    }

    pages.extend((start..=end).map(|number| PageLink::page(number, current, query)));

    if end < total_pages {
        if end + 1 < total_pages {
            pages.push(PageLink::gap());
        }
        pages.push(PageLink::page(total_pages, current, query));
    }

    let show_prev = current > 1;
    let show_next = current < total_pages;

    Pagination {
        pages,
        show_prev,
        show_next,
        prev_url: show_prev.then(|| page_url(current - 1, query)),
        next_url: show_next.then(|| page_url(current + 1, query)),
    }
}
