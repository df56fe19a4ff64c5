//! Filtering, sorting and paging of listings
//!
//! Selections within one facet are any-of (a product matches if it carries
//! any selected tag); facets combine with all-of. Sorting by seller uses the
//! sellers' display names, case-insensitively; in ascending order a seller
//! missing from the name map comes after every named one.

use core_kernel::{CategoryId, ConditionId, Currency, Money, Pagination, TagId, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::product::Listed;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub condition_ids: Vec<ConditionId>,
    pub category_ids: Vec<CategoryId>,
    pub tag_ids: Vec<TagId>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub max_price: Option<Money>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_max_price(mut self, max_price: Money) -> Self {
        self.max_price = Some(max_price);
        self
    }

    pub fn with_conditions(mut self, ids: Vec<ConditionId>) -> Self {
        self.condition_ids = ids;
        self
    }

    pub fn with_categories(mut self, ids: Vec<CategoryId>) -> Self {
        self.category_ids = ids;
        self
    }

    pub fn with_tags(mut self, ids: Vec<TagId>) -> Self {
        self.tag_ids = ids;
        self
    }

    pub fn matches<L: Listed>(&self, listing: &L) -> bool {
        let core = listing.core();

        let condition_ok = self.condition_ids.is_empty()
            || core
                .condition
                .as_ref()
                .is_some_and(|c| self.condition_ids.contains(&c.id));
        let category_ok = self.category_ids.is_empty()
            || core
                .category
                .as_ref()
                .is_some_and(|c| self.category_ids.contains(&c.id));
        let tags_ok = self.tag_ids.is_empty() || self.tag_ids.iter().any(|t| core.has_tag(*t));
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => core.title.to_lowercase().contains(&term.to_lowercase()),
        };
        let price_ok = self
            .max_price
            .map_or(true, |max| listing.listed_price().amount() <= max.amount());

        condition_ok && category_ok && tags_ok && search_ok && price_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Price,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSort {
    pub key: SortKey,
    pub ascending: bool,
}

impl ListingSort {
    pub fn ascending(key: SortKey) -> Self {
        Self { key, ascending: true }
    }

    pub fn descending(key: SortKey) -> Self {
        Self { key, ascending: false }
    }

    fn compare<L: Listed>(&self, a: &L, b: &L, seller_names: &SellerNames) -> Ordering {
        let ordering = match self.key {
            SortKey::Title => a.core().title.to_lowercase().cmp(&b.core().title.to_lowercase()),
            SortKey::Price => a.listed_price().amount().cmp(&b.listed_price().amount()),
            SortKey::Seller => {
                let name = |l: &L| seller_names.get(&l.core().seller_id).map(|n| n.to_lowercase());
                match (name(a), name(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
                .then(a.core().seller_id.cmp(&b.core().seller_id))
            }
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Display name per seller, for [`SortKey::Seller`]
pub type SellerNames = HashMap<UserId, String>;

/// One page of filtered listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredListings<L> {
    pub items: Vec<L>,
    /// Matches before paging
    pub total_count: usize,
    /// Highest listed price over all listings, for the price slider
    pub max_price: Money,
}

/// Filters, sorts and pages a set of listings
pub fn filter_listings<L: Listed + Clone>(
    listings: &[L],
    filter: &ListingFilter,
    sort: Option<ListingSort>,
    page: Pagination,
    seller_names: &SellerNames,
) -> FilteredListings<L> {
    let max_price = max_listed_price(listings);

    let mut matched: Vec<L> = listings.iter().filter(|l| filter.matches(*l)).cloned().collect();
    if let Some(sort) = sort {
        matched.sort_by(|a, b| sort.compare(a, b, seller_names));
    }
    let total_count = matched.len();

    FilteredListings {
        items: page.apply(matched),
        total_count,
        max_price,
    }
}

/// Highest listed price, zero for an empty set
pub fn max_listed_price<L: Listed>(listings: &[L]) -> Money {
    listings
        .iter()
        .map(Listed::listed_price)
        .max_by(|a, b| a.amount().cmp(&b.amount()))
        .unwrap_or_else(|| Money::zero(Currency::USD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buy::BuyProduct;
    use crate::product::{Category, ListingCore, Tag};
    use core_kernel::UserId;
    use rust_decimal_macros::dec;

    fn product(title: &str, price: rust_decimal::Decimal) -> BuyProduct {
        BuyProduct::new(ListingCore::new(title, "", UserId::new()), Money::usd(price))
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = vec![product("Red Bicycle", dec!(100)), product("Blue chair", dec!(30))];
        let result = filter_listings(
            &items,
            &ListingFilter::new().with_search("bICY"),
            None,
            Pagination::all(),
            &SellerNames::new(),
        );
        assert_eq!(result.total_count, 1);
        assert_eq!(result.items[0].core.title, "Red Bicycle");
        assert_eq!(result.max_price.amount(), dec!(100));
    }

    #[test]
    fn test_any_of_within_facet() {
        let (outdoor, garden) = (Tag::new("outdoor"), Tag::new("garden"));
        let sports = Category::new("Sports", "");
        let mut a = product("Tent", dec!(80));
        a.core.tags = vec![outdoor.clone()];
        a.core.category = Some(sports.clone());
        let mut b = product("Rake", dec!(15));
        b.core.tags = vec![garden.clone()];
        let c = product("Mug", dec!(5));

        let filter = ListingFilter::new().with_tags(vec![outdoor.id, garden.id]);
        let items = [a, b, c];
        assert_eq!(filter_listings(&items, &filter, None, Pagination::all(), &SellerNames::new()).total_count, 2);

        let filter = filter.with_categories(vec![sports.id]);
        assert_eq!(filter_listings(&items, &filter, None, Pagination::all(), &SellerNames::new()).total_count, 1);
    }

    #[test]
    fn test_sort_and_page() {
        let items = vec![
            product("b", dec!(20)),
            product("a", dec!(30)),
            product("c", dec!(10)),
        ];
        let result = filter_listings(
            &items,
            &ListingFilter::new().with_max_price(Money::usd(dec!(25))),
            Some(ListingSort::descending(SortKey::Price)),
            Pagination::new(0, 1),
            &SellerNames::new(),
        );
        assert_eq!(result.total_count, 2);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].core.title, "b");

        let result = filter_listings(
            &items,
            &ListingFilter::new(),
            Some(ListingSort::ascending(SortKey::Title)),
            Pagination::all(),
            &SellerNames::new(),
        );
        let titles: Vec<_> = result.items.iter().map(|p| p.core.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_seller_sort_uses_display_names() {
        let items = vec![product("Tent", dec!(80)), product("Rake", dec!(15)), product("Mug", dec!(5))];
        let mut names = SellerNames::new();
        names.insert(items[0].core.seller_id, "zoe_outdoors".to_string());
        names.insert(items[1].core.seller_id, "Anna_garden".to_string());

        let result = filter_listings(
            &items,
            &ListingFilter::new(),
            Some(ListingSort::ascending(SortKey::Seller)),
            Pagination::all(),
            &names,
        );
        let titles: Vec<_> = result.items.iter().map(|p| p.core.title.as_str()).collect();
        assert_eq!(titles, vec!["Rake", "Tent", "Mug"]);

        let result = filter_listings(
            &items,
            &ListingFilter::new(),
            Some(ListingSort::descending(SortKey::Seller)),
            Pagination::all(),
            &names,
        );
        assert_eq!(result.items[0].core.title, "Mug");
        assert_eq!(result.items[1].core.title, "Tent");
    }
}
