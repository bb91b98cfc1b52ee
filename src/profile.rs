use crate::api::{ApiClient, Transport};
use crate::models::{ProfileUpdate, Review, User};
use crate::session::Session;
use failure::Error;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub user: User,
    pub reviews: Vec<Review>,
}

impl ProfilePage {
    pub fn load<T: Transport>(api: &ApiClient<T>, user_id: &str) -> Result<ProfilePage, Error> {
        let user = api.user(user_id)?;
        let reviews = api.user_reviews(user_id).unwrap_or_else(|e| {
            warn!(error = %e, "failed to fetch user reviews");
            Vec::new()
        });
        Ok(ProfilePage { user, reviews })
    }

    pub fn is_own<T: Transport>(&self, session: &Session<T>) -> bool {
        session.user().map_or(false, |u| u.id == self.user.id)
    }

    /// Saves a self-edit and refreshes both this page and the session copy.
    pub fn save<T: Transport>(&mut self, session: &mut Session<T>, edit: &ProfileEdit) -> Result<&User, Error> {
        session.require_user()?;
        let updated = session.api().update_me(&edit.to_update())?;
        session.replace_user(updated.clone());
        self.user = updated;
        Ok(&self.user)
    }
}

/// Fields of the profile edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileEdit {
    pub username: String,
    pub bio: String,
    pub avatar_url: String,
}

impl ProfileEdit {
    pub fn from_user(user: &User) -> ProfileEdit {
        ProfileEdit {
            username: user.username.clone(),
            bio: user.bio.clone().unwrap_or_default(),
            avatar_url: user.avatar_url.clone().unwrap_or_default(),
        }
    }

    /// A blank username is left unchanged; bio and avatar are sent as typed
    /// so that they can be emptied.
    pub fn to_update(&self) -> ProfileUpdate {
        let username = self.username.trim();
        ProfileUpdate {
            username: if username.is_empty() { None } else { Some(username.to_string()) },
            bio: Some(self.bio.trim().to_string()),
            avatar_url: Some(self.avatar_url.trim().to_string()),
        }
    }
}
