use structopt::StructOpt;

#[derive(Debug, StructOpt)]
/// Read, write and discuss game reviews
/// from the terminal.
pub enum Cli {
    #[structopt(name = "new")]
    /// Creates new .config and session .db files.
    New {},
    #[structopt(name = "register")]
    /// Creates an account and signs in.
    /// Asks for the password on stdin.
    Register { email: String, username: String },
    #[structopt(name = "login")]
    /// Signs in. Asks for the password on stdin.
    Login { email: String },
    #[structopt(name = "logout")]
    /// Forgets the stored session.
    Logout {},
    #[structopt(name = "whoami")]
    /// Shows the signed in user.
    Whoami {},
    #[structopt(name = "reviews")]
    /// Lists the newest reviews.
    Reviews {
        #[structopt(short = "c", long = "category")]
        category: Option<String>,
        #[structopt(short = "p", long = "page", default_value = "1")]
        page: u32,
    },
    #[structopt(name = "show")]
    /// Shows a review with its comments.
    Show { id: String },
    #[structopt(name = "create")]
    /// Publishes a new review.
    Create {
        #[structopt(flatten)]
        draft: DraftArgs,
    },
    #[structopt(name = "edit")]
    /// Edits a review; omitted fields keep
    /// their current value.
    Edit {
        id: String,
        #[structopt(flatten)]
        draft: DraftArgs,
    },
    #[structopt(name = "delete")]
    /// Deletes one of your reviews.
    Delete { id: String },
    #[structopt(name = "like")]
    /// Likes a review, or takes the like back.
    Like { id: String },
    #[structopt(name = "comment")]
    /// Comments on a review.
    Comment { id: String, text: String },
    #[structopt(name = "collaborator")]
    /// Lets another user edit your review.
    Collaborator { id: String, user_id: String },
    #[structopt(name = "search")]
    /// Searches reviews and users once.
    Search { query: String },
    #[structopt(name = "find")]
    /// Interactive search. Every line replaces
    /// the query, `:N` opens result N, `:q` quits.
    Find {},
    #[structopt(name = "profile")]
    /// Shows a user and their reviews.
    Profile { id: String },
    #[structopt(name = "edit-profile")]
    /// Edits your own profile.
    EditProfile {
        #[structopt(long = "username")]
        username: Option<String>,
        #[structopt(long = "bio")]
        bio: Option<String>,
        #[structopt(long = "avatar")]
        avatar_url: Option<String>,
    },
    #[structopt(name = "categories")]
    /// Lists review categories.
    Categories {},
    #[structopt(name = "popular")]
    /// Lists the most popular games.
    Popular {
        #[structopt(short = "l", long = "limit", default_value = "3")]
        limit: u32,
    },
    #[structopt(name = "assist")]
    /// Asks the writing assistant for help
    /// with a draft.
    Assist {
        prompt: String,
        #[structopt(long = "draft", default_value = "")]
        draft: String,
    },
    #[structopt(name = "explain")]
    /// Explains a word or short phrase from
    /// a review.
    Explain { review_id: String, selection: String },
}

#[derive(Debug, StructOpt)]
pub struct DraftArgs {
    #[structopt(long = "title")]
    pub title: Option<String>,
    #[structopt(long = "game")]
    pub game_name: Option<String>,
    #[structopt(long = "content")]
    pub content: Option<String>,
    #[structopt(long = "category")]
    pub category: Option<String>,
    #[structopt(long = "tags")]
    /// Comma separated.
    pub tags: Option<String>,
    #[structopt(long = "rating")]
    /// 1 to 10.
    pub rating: Option<String>,
    #[structopt(long = "cover")]
    pub cover_image: Option<String>,
}
