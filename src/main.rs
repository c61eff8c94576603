mod api;
mod comments;
mod config;
mod engine;
mod feed;
mod filter;
mod geo;
mod models;
mod rank;
mod reactions;
mod store;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use api::HttpJobsApi;
use config::Config;
use engine::{Action, Engine};
use filter::SearchInput;
use models::{CommentOwner, GeoPoint, JobListing};

#[derive(Parser)]
#[command(name = "jobdeck")]
#[command(about = "Job board client - browse, search and react to listings from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search job listings
    Search {
        /// Free-text query
        query: Option<String>,

        /// Comma-separated skills
        #[arg(short, long)]
        skills: Option<String>,

        /// Seniority (junior, mid, senior)
        #[arg(long)]
        seniority: Option<String>,

        /// Availability (full_time, part_time, hybrid, contract, freelance)
        #[arg(short, long)]
        availability: Option<String>,

        /// Workplace (remote, office, hybrid)
        #[arg(short, long)]
        workplace: Option<String>,

        /// Date range (today, week, month, 3months)
        #[arg(short, long)]
        date_range: Option<String>,

        /// Latitude of the search center
        #[arg(long)]
        lat: Option<f64>,

        /// Longitude of the search center
        #[arg(long)]
        lng: Option<f64>,

        /// Search radius in km (default 50 when a center is given)
        #[arg(short, long)]
        radius: Option<f64>,

        /// Keep jobs with unspecified seniority
        #[arg(long)]
        loose_seniority: bool,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Show a job's details
    Show {
        /// Job ID
        id: String,

        /// Also fetch your server-computed match score (needs a token)
        #[arg(long = "match")]
        with_match: bool,
    },

    /// Toggle like on a job
    Like {
        /// Job ID
        id: String,
    },

    /// Toggle dislike on a job
    Dislike {
        /// Job ID
        id: String,
    },

    /// Toggle favorite on a job
    Favorite {
        /// Job ID
        id: String,
    },

    /// Print a job's application link and record the apply click
    Apply {
        /// Job ID
        id: String,
    },

    /// Show comments for a job or news article
    Comments {
        /// Job (or news) ID
        id: String,

        /// Treat the ID as a news article
        #[arg(long)]
        news: bool,
    },

    /// Manage comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Search, then rank the results against your profile locally
    Rank {
        /// Free-text query
        query: Option<String>,

        /// Number of jobs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the most frequent skills across all listings
    Skills,

    /// Show server-computed match scores for the current search
    Match {
        /// Free-text query
        query: Option<String>,
    },

    /// Show or change client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Post a comment on a job
    Add {
        /// Job ID
        job_id: String,

        /// Comment text
        text: String,

        /// Comment ID to reply to
        #[arg(short, long)]
        reply_to: Option<String>,
    },

    /// Edit one of your comments
    Edit {
        /// Job ID the comment belongs to
        job_id: String,

        /// Comment ID
        comment_id: String,

        /// New text
        text: String,
    },

    /// Delete one of your comments (and its replies)
    Delete {
        /// Job ID the comment belongs to
        job_id: String,

        /// Comment ID
        comment_id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current configuration
    Show,

    /// Set the backend base URL
    SetUrl { url: String },

    /// Set the bearer token for authenticated calls
    SetToken { token: String },

    /// Drop the stored token (read-only mode)
    ClearToken,

    /// Set profile languages (comma-separated)
    SetLanguages { languages: String },

    /// Set profile skills (comma-separated)
    SetSkills { skills: String },

    /// Set profile seniority (junior, mid, senior)
    SetSeniority { seniority: String },
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn build_search_input(
    query: Option<String>,
    skills: Option<String>,
    seniority: Option<String>,
    availability: Option<String>,
    workplace: Option<String>,
    date_range: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
    loose_seniority: bool,
) -> Result<SearchInput> {
    let center = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        (None, None) => None,
        _ => return Err(anyhow!("Both --lat and --lng are required for a geo search")),
    };
    Ok(SearchInput {
        query,
        skills: skills.as_deref().map(split_csv).unwrap_or_default(),
        seniority: seniority.as_deref().map(filter::parse_seniority).transpose()?,
        availability: availability
            .as_deref()
            .map(filter::parse_availability)
            .transpose()?,
        workplace,
        date_range: date_range
            .as_deref()
            .map(filter::parse_date_range)
            .transpose()?,
        center,
        radius_km: radius,
        languages: vec![],
        loose_seniority,
    })
}

fn print_job_table(jobs: &[&JobListing]) {
    println!(
        "{:<10} {:<30} {:<18} {:<8} {:>6} {:>6} {:>6}",
        "ID", "TITLE", "COMPANY", "LEVEL", "LIKES", "TRUST", "FAV"
    );
    println!("{}", "-".repeat(90));
    for job in jobs {
        println!(
            "{:<10} {:<30} {:<18} {:<8} {:>6} {:>5.0}% {:>6}",
            truncate(&job.id, 10),
            truncate(&job.title, 28),
            truncate(&job.company, 16),
            job.seniority.as_str(),
            job.likes,
            job.company_score,
            if job.favorite { "*" } else { "" }
        );
    }
}

fn print_job_detail(job: &JobListing) {
    println!("{} at {}", job.title, job.company);
    println!("ID: {}", job.id);
    println!("Seniority: {}", job.seniority.as_str());
    println!("Availability: {}", job.availability.as_str());
    if let Some(location) = &job.location {
        println!("Location: {}{}", location, if job.remote { " (remote)" } else { "" });
    } else if job.remote {
        println!("Location: remote");
    }
    if let Some(salary) = &job.salary {
        println!("Salary: {}", salary);
    }
    if let Some(language) = &job.language {
        println!("Language: {}", language);
    }
    if !job.skills.is_empty() {
        println!("Skills: {}", job.skills.join(", "));
    }
    println!(
        "Reactions: {} likes / {} dislikes{}",
        job.likes,
        job.dislikes,
        match job.user_reaction {
            Some(r) => format!(" (yours: {})", r.as_str()),
            None => String::new(),
        }
    );
    println!(
        "Company: {:.0}% trust ({} likes / {} dislikes)",
        job.company_score, job.company_likes, job.company_dislikes
    );
    println!("Comments: {}", job.comment_count);
    println!("Published: {}", job.published_at.format("%Y-%m-%d"));
    if !job.description.is_empty() {
        println!("\n{}", textwrap::fill(&job.description, 78));
    }
}

fn print_comment_tree(comments: &[models::Comment], indent: usize) {
    for comment in comments {
        println!(
            "{}[{}] {} ({})",
            "  ".repeat(indent),
            comment.id,
            comment.user_name,
            comment.created_at.format("%Y-%m-%d %H:%M")
        );
        for line in textwrap::fill(&comment.text, 70 - indent * 2).lines() {
            println!("{}{}", "  ".repeat(indent + 1), line);
        }
        print_comment_tree(&comment.replies, indent + 1);
    }
}

fn reaction_summary(engine: &Engine, id: &str) -> String {
    match engine.store.get(id) {
        Some(job) => format!(
            "{} likes / {} dislikes, yours: {}, favorite: {}",
            job.likes,
            job.dislikes,
            job.user_reaction.map(|r| r.as_str()).unwrap_or("none"),
            if job.favorite { "yes" } else { "no" }
        ),
        None => "gone".to_string(),
    }
}

fn open_job(engine: &mut Engine, id: &str) -> Result<()> {
    engine.dispatch(Action::OpenJob { id: id.to_string() })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let api = HttpJobsApi::new(&config.base_url, config.token.clone());
    let has_token = config.token.is_some();
    let mut engine = Engine::new(
        Box::new(api),
        config.profile.clone(),
        config.fingerprint.clone(),
    );

    match cli.command {
        Commands::Search {
            query,
            skills,
            seniority,
            availability,
            workplace,
            date_range,
            lat,
            lng,
            radius,
            loose_seniority,
            pages,
        } => {
            let input = build_search_input(
                query,
                skills,
                seniority,
                availability,
                workplace,
                date_range,
                lat,
                lng,
                radius,
                loose_seniority,
            )?;
            engine.dispatch(Action::Search(input))?;
            for _ in 1..pages {
                engine.dispatch(Action::LoadMore)?;
            }

            let jobs = engine.store.feed_jobs();
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                print_job_table(&jobs);
                println!(
                    "\n{} of {} jobs{}",
                    jobs.len(),
                    engine.pagination.total,
                    if engine.pagination.has_more {
                        " (more available)"
                    } else {
                        ""
                    }
                );
            }
        }

        Commands::Show { id, with_match } => {
            open_job(&mut engine, &id)?;
            match engine.store.detail_job() {
                Some(job) => print_job_detail(job),
                None => println!("Job {} not found.", id),
            }
            if with_match {
                require_token(has_token)?;
                let score = engine.match_score_for(&id)?;
                println!("\nMatch score: {:.0}%", score);
            }
        }

        Commands::Like { id } => {
            require_token(has_token)?;
            open_job(&mut engine, &id)?;
            engine.dispatch(Action::ToggleLike { id: id.clone() })?;
            println!("{}", reaction_summary(&engine, &id));
        }

        Commands::Dislike { id } => {
            require_token(has_token)?;
            open_job(&mut engine, &id)?;
            engine.dispatch(Action::ToggleDislike { id: id.clone() })?;
            println!("{}", reaction_summary(&engine, &id));
        }

        Commands::Favorite { id } => {
            require_token(has_token)?;
            open_job(&mut engine, &id)?;
            engine.dispatch(Action::ToggleFavorite { id: id.clone() })?;
            println!("{}", reaction_summary(&engine, &id));
            let favorites = engine.store.favorite_jobs();
            if !favorites.is_empty() {
                println!("\nFavorites this session:");
                print_job_table(&favorites);
            }
        }

        Commands::Apply { id } => {
            open_job(&mut engine, &id)?;
            let job = engine
                .store
                .detail_job()
                .ok_or_else(|| anyhow!("Job {} not found", id))?;
            let url = job.apply_url.clone();
            if url.is_empty() {
                println!("Job {} has no application link.", id);
            } else {
                println!("{}", url);
                engine.dispatch(Action::TrackApply { id })?;
            }
        }

        Commands::Comments { id, news } => {
            let owner = if news {
                CommentOwner::News(id)
            } else {
                CommentOwner::Job(id)
            };
            engine.dispatch(Action::LoadComments { owner: owner.clone() })?;
            let thread = engine.comments.thread(&owner);
            if thread.is_empty() {
                println!("No comments yet.");
            } else {
                print_comment_tree(&thread, 0);
            }
        }

        Commands::Comment { command } => {
            require_token(has_token)?;
            match command {
                CommentCommands::Add {
                    job_id,
                    text,
                    reply_to,
                } => {
                    let owner = CommentOwner::Job(job_id.clone());
                    open_job(&mut engine, &job_id)?;
                    engine.dispatch(Action::LoadComments { owner: owner.clone() })?;
                    engine.dispatch(Action::AddComment {
                        owner,
                        text,
                        reply_to,
                    })?;
                    println!("Comment posted.");
                }
                CommentCommands::Edit {
                    job_id,
                    comment_id,
                    text,
                } => {
                    let owner = CommentOwner::Job(job_id);
                    engine.dispatch(Action::LoadComments { owner: owner.clone() })?;
                    engine.dispatch(Action::EditComment {
                        owner,
                        comment_id,
                        text,
                    })?;
                    println!("Comment updated.");
                }
                CommentCommands::Delete { job_id, comment_id } => {
                    let owner = CommentOwner::Job(job_id.clone());
                    open_job(&mut engine, &job_id)?;
                    engine.dispatch(Action::LoadComments { owner: owner.clone() })?;
                    engine.dispatch(Action::DeleteComment { owner, comment_id })?;
                    println!("Comment deleted.");
                }
            }
        }

        Commands::Rank { query, limit } => {
            engine.dispatch(Action::Search(SearchInput {
                query,
                ..Default::default()
            }))?;
            let ranked = engine.personalized_feed();
            if ranked.is_empty() {
                println!("Nothing matches your profile.");
            } else {
                let shown: Vec<&JobListing> = ranked.iter().take(limit).collect();
                print_job_table(&shown);
            }
        }

        Commands::Skills => {
            let stats = engine.skill_stats()?;
            if stats.is_empty() {
                println!("No skill stats available.");
            } else {
                println!("{:<30} {:>8}", "SKILL", "JOBS");
                println!("{}", "-".repeat(39));
                for stat in stats {
                    println!("{:<30} {:>8}", truncate(&stat.skill, 28), stat.count);
                }
            }
        }

        Commands::Match { query } => {
            require_token(has_token)?;
            engine.dispatch(Action::Search(SearchInput {
                query,
                ..Default::default()
            }))?;
            let scores = engine.match_scores_for_feed()?;
            if scores.is_empty() {
                println!("No match scores available.");
            } else {
                println!("{:<10} {:<30} {:>8}", "ID", "TITLE", "MATCH");
                println!("{}", "-".repeat(50));
                for m in scores {
                    let title = engine
                        .store
                        .get(&m.job_id)
                        .map(|j| j.title.clone())
                        .unwrap_or_default();
                    println!(
                        "{:<10} {:<30} {:>7.0}%",
                        truncate(&m.job_id, 10),
                        truncate(&title, 28),
                        m.score
                    );
                }
            }
        }

        Commands::Config { command } => {
            let mut config = config;
            match command {
                ConfigCommands::Show => {
                    println!("URL: {}", config.base_url);
                    println!(
                        "Token: {}",
                        if config.token.is_some() { "set" } else { "not set (read-only)" }
                    );
                    println!("Languages: {}", config.profile.languages.join(", "));
                    println!("Skills: {}", config.profile.skills.join(", "));
                    println!(
                        "Seniority: {}",
                        config
                            .profile
                            .seniority
                            .map(|s| s.as_str())
                            .unwrap_or("not set")
                    );
                    println!("Config file: {}", Config::default_path().display());
                    return Ok(());
                }
                ConfigCommands::SetUrl { url } => config.base_url = url,
                ConfigCommands::SetToken { token } => config.token = Some(token),
                ConfigCommands::ClearToken => config.token = None,
                ConfigCommands::SetLanguages { languages } => {
                    config.profile.languages = split_csv(&languages);
                }
                ConfigCommands::SetSkills { skills } => {
                    config.profile.skills = split_csv(&skills);
                }
                ConfigCommands::SetSeniority { seniority } => {
                    config.profile.seniority = Some(filter::parse_seniority(&seniority)?);
                }
            }
            config.save().context("Failed to save config")?;
            println!("Saved.");
        }
    }

    Ok(())
}

fn require_token(has_token: bool) -> Result<()> {
    if has_token {
        Ok(())
    } else {
        Err(anyhow!(
            "This action needs a token. Set one with 'jobdeck config set-token <token>'."
        ))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
