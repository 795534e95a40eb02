use crate::listing::{Listing, ListingCategory};
use tembea_core::client::{Filter, Ordering, Query, SubscriptionSpec};
use tembea_shared::Table;
use uuid::Uuid;

/// Listing selection is two-stage: the primary category and free-text search
/// go to the store; the secondary sub-category tag is refined locally after
/// the fetch, because the tag is not queryable remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub category: Option<ListingCategory>,
    pub search: Option<String>,
}

impl ListingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: ListingCategory) -> Self {
        Self {
            category: Some(category),
            search: None,
        }
    }

    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self
    }

    /// Stage one: the remote query. Published-only always; category and
    /// search only when given; newest first.
    pub fn remote_query(&self) -> Query {
        let mut query = Query::table(Table::Listings).filter(Filter::ilike("status", "published"));

        if let Some(category) = self.category {
            query = query.filter(Filter::ilike("category", category.as_str()));
        }

        if let Some(term) = &self.search {
            query = query.filter(Filter::search_or(&["title", "description"], term));
        }

        query.order_by(Ordering::created_at_desc())
    }

    /// Singleton fetch by id, with the same published guard.
    pub fn singleton_query(id: Uuid) -> Query {
        Query::table(Table::Listings)
            .filter(Filter::eq("id", id.to_string()))
            .filter(Filter::ilike("status", "published"))
    }

    /// Channel scope for the list subscription, mirroring the parameters so
    /// equally-parameterized views share a registry entry.
    pub fn subscription(&self) -> SubscriptionSpec {
        let category = self
            .category
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| "all".to_string());
        let search = self.search.clone().unwrap_or_else(|| "all".to_string());
        SubscriptionSpec::table(Table::Listings).scope(&format!("{}:{}", category, search))
    }

    pub fn singleton_subscription(id: Uuid) -> SubscriptionSpec {
        SubscriptionSpec::table(Table::Listings).row_eq("id", id.to_string())
    }

    /// Stage two: refine an already-fetched page by the secondary tag.
    /// Case-insensitive; "all" passes everything through.
    pub fn refine_by_subtype(listings: &[Listing], tag: &str) -> Vec<Listing> {
        if tag.eq_ignore_ascii_case("all") {
            return listings.to_vec();
        }
        listings
            .iter()
            .filter(|listing| {
                listing
                    .subtype
                    .as_deref()
                    .map(|subtype| subtype.eq_ignore_ascii_case(tag))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}
