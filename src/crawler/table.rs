//! Ordered storage for reassembled results
//!
//! Results are stored sparsely, keyed by value: keyword → page → index.
//! The positional keyword → `Vec<page>` → `Vec<result>` shape is produced on
//! demand by [`ResultTable::to_nested`], which fills unseen slots with
//! placeholders.

use crate::crawler::types::{SearchResult, TaggedResult};
use std::collections::BTreeMap;

/// Positional view: keyword → page-indexed pages → index-addressed results
pub type NestedResults = BTreeMap<String, Vec<Vec<SearchResult>>>;

type PageResults = BTreeMap<usize, SearchResult>;

/// Results addressed by (keyword, page, index)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    keywords: BTreeMap<String, BTreeMap<u32, PageResults>>,
}

impl ResultTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a tagged result at its coordinates
    ///
    /// Returns the result previously stored at the same slot, if any. The
    /// latest write always wins.
    pub fn insert(&mut self, tagged: TaggedResult) -> Option<SearchResult> {
        self.keywords
            .entry(tagged.keyword)
            .or_default()
            .entry(tagged.page)
            .or_default()
            .insert(tagged.index, tagged.result)
    }

    /// Returns the result stored at the given coordinates
    pub fn get(&self, keyword: &str, page: u32, index: usize) -> Option<&SearchResult> {
        self.keywords.get(keyword)?.get(&page)?.get(&index)
    }

    /// Iterates over keywords that received at least one result, in order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    /// Number of page slots the keyword occupies: one plus the highest page seen
    pub fn page_count(&self, keyword: &str) -> usize {
        self.keywords
            .get(keyword)
            .and_then(|pages| pages.keys().next_back())
            .map_or(0, |max| *max as usize + 1)
    }

    /// Number of result slots the page occupies: one plus the highest index seen
    pub fn result_count(&self, keyword: &str, page: u32) -> usize {
        self.keywords
            .get(keyword)
            .and_then(|pages| pages.get(&page))
            .and_then(|results| results.keys().next_back())
            .map_or(0, |max| max + 1)
    }

    /// Total number of stored results (placeholders excluded)
    pub fn len(&self) -> usize {
        self.keywords
            .values()
            .flat_map(|pages| pages.values())
            .map(|results| results.len())
            .sum()
    }

    /// Returns true if no result has been stored
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Returns one page as a contiguous sequence
    ///
    /// Gaps are filled with placeholders. A page that never received a
    /// result yields an empty vector.
    pub fn page(&self, keyword: &str, page: u32) -> Vec<SearchResult> {
        let mut results = vec![SearchResult::default(); self.result_count(keyword, page)];

        if let Some(stored) = self.keywords.get(keyword).and_then(|pages| pages.get(&page)) {
            for (index, result) in stored {
                results[*index] = result.clone();
            }
        }

        results
    }

    /// Builds the positional view of every keyword
    pub fn to_nested(&self) -> NestedResults {
        self.keywords
            .keys()
            .map(|keyword| (keyword.clone(), self.keyword_pages(keyword)))
            .collect()
    }

    fn keyword_pages(&self, keyword: &str) -> Vec<Vec<SearchResult>> {
        (0..self.page_count(keyword))
            .map(|page| self.page(keyword, page as u32))
            .collect()
    }
}
