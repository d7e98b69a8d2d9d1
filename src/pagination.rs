use serde::{Deserialize, Serialize};

use crate::{
    error::{CatalogError, CatalogResult},
    models::Film,
};

/// A validated, caller-facing page request: `page` starts at 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> CatalogResult<Self> {
        if size <= 0 {
            return Err(CatalogError::InvalidPageSize(size));
        }
        if page <= 0 {
            return Err(CatalogError::InvalidPageNumber(page));
        }
        Ok(Self { page: page as u64, size: size as u64 })
    }

    pub fn size(self) -> u64 {
        self.size
    }

    /// Zero-based page index handed to the repository.
    pub fn index(self) -> u64 {
        self.page - 1
    }

    pub fn cache_key(self) -> String {
        format!("page={}&size={}", self.page, self.size)
    }
}

/// One page of films plus the navigation metadata derived from the total count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Film>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
}

impl Page {
    pub fn assemble(request: PageRequest, total_count: u64, items: Vec<Film>) -> Self {
        let total_pages = total_pages(total_count, request.size);
        let page = request.page;
        Self {
            items,
            page_number: page,
            page_size: request.size,
            total_count,
            total_pages,
            next_page: (page < total_pages).then(|| page + 1),
            prev_page: (page > 1).then(|| page - 1),
        }
    }
}

/// `ceil(total / size)`, never less than one page.
pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    if total_count <= page_size { 1 } else { total_count.div_ceil(page_size) }
}
