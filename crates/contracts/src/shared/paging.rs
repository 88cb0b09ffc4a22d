use serde::{Deserialize, Serialize};

/// Параметры постраничных списков (`page` с единицы)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    #[serde(rename = "store_id")]
    pub store_id: Option<String>,
}

/// Страница результатов
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PagedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };
        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        let page: PagedResponse<u8> = PagedResponse::new(vec![], 101, 1, 50);
        assert_eq!(page.total_pages, 3);

        let exact: PagedResponse<u8> = PagedResponse::new(vec![], 100, 1, 50);
        assert_eq!(exact.total_pages, 2);
    }
}
