use crate::api::{ApiClient, Transport};
use crate::assist;
use crate::error::ClientError;
use crate::models::{Comment, NewReview, Review, User};
use crate::session::Session;
use failure::{ensure, Error};
use tracing::warn;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

/// Splits comma separated tags, trimming each and dropping the empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn parse_rating(raw: &str) -> Result<Option<u8>, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let rating = match raw.parse::<u8>() {
        Ok(r) if r >= MIN_RATING && r <= MAX_RATING => r,
        _ => {
            return Err(ClientError::invalid(format!(
                "Rating must be a whole number from {} to {}.",
                MIN_RATING, MAX_RATING
            )))
        }
    };
    Ok(Some(rating))
}

/// Raw contents of the create/edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub title: String,
    pub game_name: String,
    pub content: String,
    pub category: String,
    pub tags: String,
    pub rating: String,
    pub cover_image: String,
}

impl ReviewDraft {
    /// Pre-fills the form for editing an existing review.
    pub fn from_review(review: &Review) -> ReviewDraft {
        ReviewDraft {
            title: review.title.clone(),
            game_name: review.game_name.clone(),
            content: review.content.clone(),
            category: review.category.clone(),
            tags: review.tags.join(", "),
            rating: review.rating.map(|r| r.to_string()).unwrap_or_default(),
            cover_image: review.cover_image.clone().unwrap_or_default(),
        }
    }

    /// Checks the form. `categories` is the server's list; when it is empty
    /// any non-empty category passes.
    pub fn validate(&self, categories: &[String]) -> Result<NewReview, Error> {
        let title = self.title.trim();
        let game_name = self.game_name.trim();
        let content = self.content.trim();
        let category = self.category.trim();
        if title.is_empty() || game_name.is_empty() || content.is_empty() || category.is_empty() {
            return Err(ClientError::invalid("Please fill in all fields!"));
        }
        if !categories.is_empty() && !categories.iter().any(|c| c == category) {
            return Err(ClientError::invalid(format!("Unknown category `{}`.", category)));
        }
        let cover_image = match self.cover_image.trim() {
            "" => None,
            url => Some(url.to_string()),
        };
        Ok(NewReview {
            title: title.to_string(),
            content: content.to_string(),
            game_name: game_name.to_string(),
            category: category.to_string(),
            tags: parse_tags(&self.tags),
            rating: parse_rating(&self.rating)?,
            cover_image,
        })
    }
}

/// Create or edit, depending on whether a review id is attached.
pub struct ReviewForm {
    pub editing: Option<String>,
    pub draft: ReviewDraft,
    pub categories: Vec<String>,
}

impl ReviewForm {
    pub fn create<T: Transport>(api: &ApiClient<T>) -> ReviewForm {
        ReviewForm {
            editing: None,
            draft: ReviewDraft::default(),
            categories: load_categories(api),
        }
    }

    pub fn edit<T: Transport>(api: &ApiClient<T>, id: &str) -> Result<ReviewForm, Error> {
        let review = api.review(id)?;
        Ok(ReviewForm {
            editing: Some(review.id.clone()),
            draft: ReviewDraft::from_review(&review),
            categories: load_categories(api),
        })
    }

    /// Validation happens before anything is sent.
    pub fn submit<T: Transport>(&self, session: &Session<T>) -> Result<Review, Error> {
        session.require_user()?;
        let review = self.draft.validate(&self.categories)?;
        match &self.editing {
            Some(id) => session.api().update_review(id, &review),
            None => session.api().create_review(&review),
        }
    }
}

fn load_categories<T: Transport>(api: &ApiClient<T>) -> Vec<String> {
    match api.categories() {
        Ok(categories) => categories,
        Err(e) => {
            warn!(error = %e, "failed to fetch categories");
            Vec::new()
        }
    }
}

/// A review with everything shown alongside it.
#[derive(Debug, Clone)]
pub struct ReviewPage {
    pub review: Review,
    pub comments: Vec<Comment>,
    pub liked: bool,
}

impl ReviewPage {
    /// Only the review itself is required; comments and the liked flag
    /// degrade to empty.
    pub fn load<T: Transport>(api: &ApiClient<T>, id: &str, signed_in: bool) -> Result<ReviewPage, Error> {
        let review = api.review(id)?;
        let comments = api.comments(id).unwrap_or_else(|e| {
            warn!(error = %e, "failed to fetch comments");
            Vec::new()
        });
        let liked = if signed_in {
            api.liked(id).unwrap_or_else(|e| {
                warn!(error = %e, "failed to check like status");
                false
            })
        } else {
            false
        };
        Ok(ReviewPage { review, comments, liked })
    }

    /// Flips the like and moves the counter by one in the direction the
    /// server reports.
    pub fn toggle_like<T: Transport>(&mut self, session: &Session<T>) -> Result<bool, Error> {
        session.require_user()?;
        let state = session.api().toggle_like(&self.review.id)?;
        self.liked = state.liked;
        self.review.likes_count += if state.liked { 1 } else { -1 };
        Ok(state.liked)
    }

    /// Blank comments are ignored.
    pub fn add_comment<T: Transport>(&mut self, session: &Session<T>, text: &str) -> Result<Option<&Comment>, Error> {
        session.require_user()?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let comment = session.api().add_comment(&self.review.id, text)?;
        self.comments.insert(0, comment);
        self.review.comments_count += 1;
        Ok(self.comments.first())
    }

    pub fn is_author(&self, user: Option<&User>) -> bool {
        user.map_or(false, |u| u.id == self.review.author_id)
    }

    pub fn can_edit(&self, user: Option<&User>) -> bool {
        self.is_author(user) || user.map_or(false, |u| self.review.collaborators.contains(&u.id))
    }

    pub fn can_delete(&self, user: Option<&User>) -> bool {
        self.is_author(user)
    }

    pub fn delete<T: Transport>(self, session: &Session<T>) -> Result<(), Error> {
        let user = session.require_user()?;
        ensure!(self.can_delete(Some(user)), "Only the author can delete this review.");
        session.api().delete_review(&self.review.id)
    }

    pub fn add_collaborator<T: Transport>(&mut self, session: &Session<T>, user_id: &str) -> Result<(), Error> {
        let user = session.require_user()?;
        ensure!(self.is_author(Some(user)), "Only the author can add collaborators.");
        session.api().add_collaborator(&self.review.id, user_id)?;
        if !self.review.collaborators.iter().any(|c| c == user_id) {
            self.review.collaborators.push(user_id.to_string());
        }
        Ok(())
    }

    /// Explains a selection from the review text, see `assist::explain`.
    pub fn explain<T: Transport>(&self, api: &ApiClient<T>, selection: &str) -> Option<String> {
        assist::explain(api, selection, &self.review.content)
    }
}
