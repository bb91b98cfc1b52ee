mod cli;

use cli::{Cli, DraftArgs};
use exitfailure::ExitFailure;
use failure::Error;
use game_reviews::api::{HttpTransport, Transport};
use game_reviews::app;
use game_reviews::assist;
use game_reviews::error::{notice, ClientError, GENERIC_FAILURE};
use game_reviews::feed::{self, Feed};
use game_reviews::models::{Review, User};
use game_reviews::profile::{ProfileEdit, ProfilePage};
use game_reviews::review::{ReviewForm, ReviewPage};
use game_reviews::search::{plan, Hit, Plan, Route, SearchBox, SearchEvent, SearchPanel};
use game_reviews::session::Session;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use structopt::StructOpt;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

type Live = Session<HttpTransport>;

fn main() -> Result<(), ExitFailure> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::from_args();
    if let Cli::New {} = cli {
        app::create_structure()?;
        println!("Created initial structure files.");
        return Ok(());
    }
    let config = app::config()?;
    let mut session = app::connect(&config)?;
    let result = match cli {
        Cli::New {} => Ok(()),
        Cli::Register { email, username } => register(&mut session, &email, &username),
        Cli::Login { email } => login(&mut session, &email),
        Cli::Logout {} => logout(&mut session),
        Cli::Whoami {} => whoami(&session),
        Cli::Reviews { category, page } => list_reviews(&session, Feed::new(category, page, config.page_size)),
        Cli::Show { id } => show_review(&session, &id),
        Cli::Create { draft } => write_review(&session, None, draft),
        Cli::Edit { id, draft } => write_review(&session, Some(&id), draft),
        Cli::Delete { id } => delete_review(&session, &id),
        Cli::Like { id } => like(&session, &id),
        Cli::Comment { id, text } => comment(&session, &id, &text),
        Cli::Collaborator { id, user_id } => collaborator(&session, &id, &user_id),
        Cli::Search { query } => search_once(&session, &query, config.min_query_chars),
        Cli::Find {} => find(&session, &config),
        Cli::Profile { id } => show_profile(&session, &id),
        Cli::EditProfile { username, bio, avatar_url } => edit_profile(&mut session, username, bio, avatar_url),
        Cli::Categories {} => list_categories(&session),
        Cli::Popular { limit } => popular(&session, limit),
        Cli::Assist { prompt, draft } => assist_draft(&session, &prompt, &draft),
        Cli::Explain { review_id, selection } => explain(&session, &review_id, &selection),
    };
    match result {
        // problems the user can act on are shown, not raised
        Err(ref e) if e.downcast_ref::<ClientError>().is_some() => {
            paint(Color::Red, &notice(e, GENERIC_FAILURE));
            Ok(())
        }
        other => Ok(other?),
    }
}

fn paint(color: Color, line: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)));
    let _ = writeln!(&mut stdout, "{}", line);
    let _ = stdout.reset();
}

fn read_password() -> Result<String, Error> {
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn register(session: &mut Live, email: &str, username: &str) -> Result<(), Error> {
    let password = read_password()?;
    let user = session.register(email, username, &password)?;
    paint(Color::Green, &format!("Welcome, {}!", user.username));
    Ok(())
}

fn login(session: &mut Live, email: &str) -> Result<(), Error> {
    let password = read_password()?;
    let user = session.login(email, &password)?;
    paint(Color::Green, &format!("Signed in as {}.", user.username));
    Ok(())
}

fn logout(session: &mut Live) -> Result<(), Error> {
    session.logout()?;
    println!("Signed out.");
    Ok(())
}

fn whoami(session: &Live) -> Result<(), Error> {
    let user = session.require_user()?;
    print_user(user);
    Ok(())
}

fn list_reviews(session: &Live, feed: Feed) -> Result<(), Error> {
    let page = feed.load(session.api())?;
    if page.reviews.is_empty() {
        println!("No reviews yet.");
    }
    for review in &page.reviews {
        print_card(review);
    }
    if page.has_next {
        println!("More on page {}.", page.page + 1);
    }
    Ok(())
}

fn show_review(session: &Live, id: &str) -> Result<(), Error> {
    let page = ReviewPage::load(session.api(), id, session.user().is_some())?;
    print_review_page(&page, session.user());
    Ok(())
}

fn write_review(session: &Live, id: Option<&str>, args: DraftArgs) -> Result<(), Error> {
    session.require_user()?;
    let mut form = match id {
        Some(id) => ReviewForm::edit(session.api(), id)?,
        None => ReviewForm::create(session.api()),
    };
    let draft = &mut form.draft;
    let fields = vec![
        (&mut draft.title, args.title),
        (&mut draft.game_name, args.game_name),
        (&mut draft.content, args.content),
        (&mut draft.category, args.category),
        (&mut draft.tags, args.tags),
        (&mut draft.rating, args.rating),
        (&mut draft.cover_image, args.cover_image),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            *field = value;
        }
    }
    let review = form.submit(session)?;
    let verb = if form.editing.is_some() { "updated" } else { "published" };
    paint(Color::Green, &format!("Review {} ({}).", verb, review.id));
    Ok(())
}

fn delete_review(session: &Live, id: &str) -> Result<(), Error> {
    session.require_user()?;
    let page = ReviewPage::load(session.api(), id, true)?;
    page.delete(session)?;
    paint(Color::Green, "Review deleted.");
    Ok(())
}

fn like(session: &Live, id: &str) -> Result<(), Error> {
    session.require_user()?;
    let mut page = ReviewPage::load(session.api(), id, true)?;
    let liked = page.toggle_like(session)?;
    let verb = if liked { "Liked" } else { "Unliked" };
    println!("{} \"{}\" ({} likes).", verb, page.review.title, page.review.likes_count);
    Ok(())
}

fn comment(session: &Live, id: &str, text: &str) -> Result<(), Error> {
    session.require_user()?;
    let mut page = ReviewPage::load(session.api(), id, true)?;
    match page.add_comment(session, text)? {
        Some(_) => paint(Color::Green, "Comment added."),
        None => println!("Nothing to post."),
    }
    Ok(())
}

fn collaborator(session: &Live, id: &str, user_id: &str) -> Result<(), Error> {
    session.require_user()?;
    let mut page = ReviewPage::load(session.api(), id, true)?;
    page.add_collaborator(session, user_id)?;
    paint(Color::Green, "Collaborator added.");
    Ok(())
}

fn search_once(session: &Live, query: &str, min_chars: usize) -> Result<(), Error> {
    let query = match plan(query, min_chars) {
        Plan::Search(query) => query,
        Plan::Clear => {
            println!("Type at least {} characters.", min_chars);
            return Ok(());
        }
    };
    let mut panel = SearchPanel::new(min_chars);
    panel.set_query(&query);
    panel.apply(SearchEvent::Started { ticket: 0, query: query.clone() });
    let results = session.api().search(&query)?;
    panel.apply(SearchEvent::Results { ticket: 0, query, results });
    print_hits(&panel);
    Ok(())
}

enum Input {
    Line(String),
    Closed,
}

fn find(session: &Live, config: &app::Config) -> Result<(), Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let (line_tx, line_rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = line_tx.send(Input::Closed);
    });

    let (event_tx, event_rx) = mpsc::channel();
    let search = SearchBox::spawn(session.api().clone(), config.search_options(), event_tx);
    let mut panel = SearchPanel::new(config.min_query_chars);
    println!("Type to search, `:N` opens a result, `:q` quits.");

    while running.load(Ordering::SeqCst) {
        while let Ok(event) = event_rx.try_recv() {
            let shown = match &event {
                SearchEvent::Results { ticket, .. } => panel.is_current(*ticket),
                SearchEvent::Cleared => true,
                SearchEvent::Failed { ticket, error, .. } if panel.is_current(*ticket) => {
                    paint(Color::Red, &notice(error, "Search failed."));
                    false
                }
                SearchEvent::Failed { .. } | SearchEvent::Started { .. } => false,
            };
            panel.apply(event);
            if shown {
                print_hits(&panel);
            }
        }
        let input = match line_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(input) => input,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        let line = match input {
            Input::Line(line) => line,
            Input::Closed => break,
        };
        if line.trim() == ":q" {
            break;
        }
        if let Some(n) = line.trim().strip_prefix(':').and_then(|n| n.parse::<usize>().ok()) {
            match panel.select_numbered(n) {
                Some(route) => open(session, route)?,
                None => println!("No result {}.", n),
            }
            continue;
        }
        panel.set_query(&line);
        search.type_query(&line);
    }
    Ok(())
}

fn open<T: Transport>(session: &Session<T>, route: Route) -> Result<(), Error> {
    match route {
        Route::Review(id) => {
            let page = ReviewPage::load(session.api(), &id, session.user().is_some())?;
            print_review_page(&page, session.user());
        }
        Route::Profile(id) => {
            let page = ProfilePage::load(session.api(), &id)?;
            print_profile(&page);
        }
    }
    Ok(())
}

fn show_profile(session: &Live, id: &str) -> Result<(), Error> {
    let page = ProfilePage::load(session.api(), id)?;
    print_profile(&page);
    if page.is_own(session) {
        println!("This is you. Use `edit-profile` to change it.");
    }
    Ok(())
}

fn edit_profile(
    session: &mut Live,
    username: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
) -> Result<(), Error> {
    let id = session.require_user()?.id.clone();
    let mut page = ProfilePage::load(session.api(), &id)?;
    let mut edit = ProfileEdit::from_user(&page.user);
    if let Some(username) = username {
        edit.username = username;
    }
    if let Some(bio) = bio {
        edit.bio = bio;
    }
    if let Some(avatar_url) = avatar_url {
        edit.avatar_url = avatar_url;
    }
    let user = page.save(session, &edit)?;
    paint(Color::Green, &format!("Profile updated for {}.", user.username));
    Ok(())
}

fn list_categories(session: &Live) -> Result<(), Error> {
    for category in feed::categories(session.api())? {
        println!("{}", category);
    }
    Ok(())
}

fn popular(session: &Live, limit: u32) -> Result<(), Error> {
    println!("Game\tReviews\tLikes\tAvg Rating\tScore");
    for game in feed::popular_games(session.api(), limit)? {
        let avg = game.avg_rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}\t{}\t{:.1}",
            game.game_name, game.review_count, game.total_likes, avg, game.popularity_score);
    }
    Ok(())
}

fn assist_draft(session: &Live, prompt: &str, draft: &str) -> Result<(), Error> {
    session.require_user()?;
    let suggestion = assist::suggest(session.api(), prompt, draft)?;
    paint(Color::Cyan, &suggestion);
    Ok(())
}

fn explain(session: &Live, review_id: &str, selection: &str) -> Result<(), Error> {
    let page = ReviewPage::load(session.api(), review_id, false)?;
    match page.explain(session.api(), selection) {
        Some(text) => paint(Color::Cyan, &text),
        None => println!("Select between 1 and {} characters.", assist::MAX_SELECTION_CHARS - 1),
    }
    Ok(())
}

fn print_user(user: &User) {
    paint(Color::Yellow, &format!("{} <{}>", user.username, user.email));
    if let Some(bio) = &user.bio {
        println!("{}", bio);
    }
    println!("Member since {}", user.created_at.format("%Y-%m-%d"));
}

fn print_card(review: &Review) {
    let rating = review.rating.map(|r| format!("{}/10", r)).unwrap_or_else(|| "-".to_string());
    paint(Color::Yellow, &format!("{}  {}", review.id, review.title));
    let tags: Vec<&str> = review.tags.iter().take(4).map(String::as_str).collect();
    println!("  {} | {} | {} | by {} | {} likes, {} comments",
        review.game_name, review.category, rating, review.author_username,
        review.likes_count, review.comments_count);
    if !tags.is_empty() {
        println!("  #{}", tags.join(" #"));
    }
}

fn print_review_page(page: &ReviewPage, viewer: Option<&User>) {
    let review = &page.review;
    print_card(review);
    if let Some(cover) = &review.cover_image {
        println!("  cover: {}", cover);
    }
    println!();
    println!("{}", review.content);
    println!();
    if page.liked {
        paint(Color::Magenta, "You like this review.");
    }
    if page.can_edit(viewer) {
        println!("You can edit this review.");
    }
    println!("Comments ({}):", page.comments.len());
    for comment in &page.comments {
        println!("  {} ({}): {}", comment.author_username,
            comment.created_at.format("%Y-%m-%d %H:%M"), comment.content);
    }
}

fn print_profile(page: &ProfilePage) {
    print_user(&page.user);
    println!("Reviews: {}", page.reviews.len());
    for review in &page.reviews {
        print_card(review);
    }
}

fn print_hits(panel: &SearchPanel) {
    if panel.shows_empty_notice() {
        println!("No results found.");
        return;
    }
    if !panel.is_open() {
        return;
    }
    for (i, hit) in panel.hits().iter().enumerate() {
        match hit {
            Hit::Review(review) => println!("{:>3}. [review] {} - {}", i + 1, review.title, review.game_name),
            Hit::User(user) => println!("{:>3}. [user]   {}", i + 1, user.username),
        }
    }
}
