use std::fmt;

pub const RESULTS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub identity: String,
    pub target_domain: String,
    pub category: String,
}

impl SearchQuery {
    pub fn build(identity: &str, target_domain: &str, category: &str) -> Self {
        SearchQuery {
            identity: identity.trim().to_string(),
            target_domain: target_domain.trim().to_string(),
            category: category.trim().to_string(),
        }
    }

    /// `"identity" "domain" "category"`, every term quoted for exact matching.
    pub fn text(&self) -> String {
        format!(
            r#""{}" "{}" "{}""#,
            self.identity, self.target_domain, self.category
        )
    }

    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.text()).into_owned()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.identity, self.target_domain, self.category
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub query: &'a SearchQuery,
    pub page_index: u32,
}

impl<'a> PageRequest<'a> {
    pub fn new(query: &'a SearchQuery, page_index: u32) -> Self {
        PageRequest { query, page_index }
    }

    pub fn offset(&self) -> u32 {
        self.page_index * RESULTS_PER_PAGE
    }

    pub fn url(&self, search_url: &str) -> String {
        format!(
            "{}?q={}&start={}",
            search_url.trim_end_matches('?'),
            self.query.encoded(),
            self.offset()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{PageRequest, SearchQuery};

    #[test]
    fn build_quotes_each_term() {
        let query = SearchQuery::build("Alice", "example.com", "bakery");

        assert_eq!(query.text(), r#""Alice" "example.com" "bakery""#);
    }

    #[test]
    fn build_trims_components() {
        let query = SearchQuery::build("  Jane Doe ", "\texample.com", "cake shop \n");

        assert_eq!(query, SearchQuery::build("Jane Doe", "example.com", "cake shop"));
        assert_eq!(query.text(), r#""Jane Doe" "example.com" "cake shop""#);
    }

    #[test]
    fn encoded_uses_percent_escapes() {
        let query = SearchQuery::build("Jane Doe", "example.com", "cake & tea");

        assert_eq!(
            query.encoded(),
            "%22Jane%20Doe%22%20%22example.com%22%20%22cake%20%26%20tea%22"
        );
    }

    #[test]
    fn offsets_are_increasing_multiples_of_ten() {
        let query = SearchQuery::build("a", "b", "c");
        let offsets: Vec<u32> = (0..5).map(|i| PageRequest::new(&query, i).offset()).collect();

        assert_eq!(offsets, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn url_carries_query_and_offset() {
        let query = SearchQuery::build("Alice", "example.com", "bakery");
        let url = PageRequest::new(&query, 2).url("https://www.google.com/search");

        assert_eq!(
            url,
            "https://www.google.com/search?q=%22Alice%22%20%22example.com%22%20%22bakery%22&start=20"
        );
    }
}
