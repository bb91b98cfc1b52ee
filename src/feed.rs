use crate::api::{ApiClient, Transport};
use crate::error::ClientError;
use crate::models::{PopularGame, Review};
use failure::{ensure, Error};

pub const REVIEWS_PER_PAGE: u32 = 9;
pub const POPULAR_GAMES: u32 = 3;

/// The home listing: newest reviews, optionally narrowed to one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub category: Option<String>,
    pub page: u32, // 1-based
    pub per_page: u32,
}

#[derive(Debug, Clone)]
pub struct FeedPage {
    pub reviews: Vec<Review>,
    pub page: u32,
    pub has_next: bool,
}

impl Feed {
    pub fn new(category: Option<String>, page: u32, per_page: u32) -> Feed {
        Feed { category, page, per_page }
    }

    pub fn load<T: Transport>(&self, api: &ApiClient<T>) -> Result<FeedPage, Error> {
        ensure!(self.page > 0, "Pages start at 1.");
        ensure!(self.per_page > 0, "Page size must be positive.");
        let skip = (self.page - 1).checked_mul(self.per_page);
        // one extra row tells whether another page follows
        let limit = self.per_page.checked_add(1);
        let (skip, limit) = match (skip, limit) {
            (Some(skip), Some(limit)) => (skip, limit),
            _ => return Err(ClientError::invalid(format!("Page {} is out of range.", self.page))),
        };
        let mut reviews = api.reviews(skip, limit, self.category.as_ref().map(String::as_str))?;
        let has_next = reviews.len() > self.per_page as usize;
        reviews.truncate(self.per_page as usize);
        Ok(FeedPage { reviews, page: self.page, has_next })
    }

    /// Switching category always starts over from the first page.
    pub fn with_category(&self, category: Option<String>) -> Feed {
        Feed { category, page: 1, per_page: self.per_page }
    }

    pub fn next(&self) -> Feed {
        Feed { page: self.page.saturating_add(1), ..self.clone() }
    }
}

pub fn categories<T: Transport>(api: &ApiClient<T>) -> Result<Vec<String>, Error> {
    api.categories()
}

pub fn popular_games<T: Transport>(api: &ApiClient<T>, limit: u32) -> Result<Vec<PopularGame>, Error> {
    api.popular_games(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::error::{notice, GENERIC_FAILURE};
    use crate::testing::{sample_review, to_json, FakeTransport};
    use serde_json::json;

    #[test]
    fn page_window_and_next_flag() {
        let api = ApiClient::new(FakeTransport::new());
        let rows: Vec<_> = (0..3).map(|i| to_json(&sample_review(&format!("r{}", i)))).collect();
        api.transport().on(Method::Get, "reviews", 200, json!(rows));

        let feed = Feed::new(Some("RPG".into()), 2, 2);
        let page = feed.load(&api).unwrap();
        assert_eq!(page.reviews.len(), 2);
        assert!(page.has_next);

        let call = &api.transport().calls()[0];
        assert!(call.query.contains(&("skip".to_string(), "2".to_string())));
        assert!(call.query.contains(&("limit".to_string(), "3".to_string())));
        assert!(call.query.contains(&("category".to_string(), "RPG".to_string())));
    }

    #[test]
    fn category_switch_resets_page() {
        let feed = Feed::new(None, 1, 9).next().next();
        assert_eq!(feed.page, 3);
        assert_eq!(feed.with_category(Some("FPS".into())), Feed::new(Some("FPS".into()), 1, 9));
    }

    #[test]
    fn page_zero_is_rejected() {
        let api = ApiClient::new(FakeTransport::new());
        assert!(Feed::new(None, 0, 9).load(&api).is_err());
        assert!(api.transport().calls().is_empty());
    }

    #[test]
    fn far_pages_fail_instead_of_wrapping() {
        let api = ApiClient::new(FakeTransport::new());
        let err = Feed::new(None, 500_000_000, 9).load(&api).unwrap_err();
        assert_eq!(notice(&err, GENERIC_FAILURE), "Page 500000000 is out of range.");
        assert!(Feed::new(None, 1, u32::MAX).load(&api).is_err());
        assert!(api.transport().calls().is_empty());

        let last = Feed::new(None, u32::MAX, 1).next();
        assert_eq!(last.page, u32::MAX);
    }

    #[test]
    fn popular_games_unwraps_listing() {
        let api = ApiClient::new(FakeTransport::new());
        api.transport().on(
            Method::Get,
            "popular-games",
            200,
            json!({"popular_games": [{
                "game_name": "Hades",
                "review_count": 4,
                "total_likes": 12,
                "avg_rating": 8.5,
                "cover_image": null,
                "popularity_score": 117.0
            }]}),
        );
        let games = popular_games(&api, POPULAR_GAMES).unwrap();
        assert_eq!(games[0].game_name, "Hades");
        assert_eq!(api.transport().calls()[0].query, vec![("limit".to_string(), "3".to_string())]);
    }
}
