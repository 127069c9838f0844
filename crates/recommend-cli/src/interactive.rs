//! Interactive query panel on stdin/stdout.
//!
//! Each line is a query and is submitted on Enter. A line ending in `\` continues the
//! query on the next line. Lines starting with `:` are panel commands. Submissions run
//! on their own task so the prompt stays usable while a request is in flight.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use recommend_common::client::RecommendationSource;
use recommend_common::error::QueryError;
use recommend_common::panel::{QueryPanel, Submission};
use recommend_common::samples::SAMPLE_QUERIES;

use crate::config::validate_api_url;
use crate::error::AppError;
use crate::render::{render_samples, render_view};

const HELP: &str = "\
Type a hiring query and press Enter to get recommendations.
End a line with \\ to continue the query on the next line.

Commands:
  :samples      list sample queries
  :sample N     put sample N in the query field (does not submit)
  :submit       submit the current query field
  :url [URL]    show or change the backend base URL
  :status       show the current query, URL and request state
  :help         show this help
  :quit         exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(Option<String>),
    Samples,
    Sample(usize),
    Url(Option<String>),
    Status,
    Help,
    Quit,
    Invalid(String),
}

/// Interpret one complete input line. Query text is returned untrimmed; trimming and
/// emptiness checks belong to the panel.
pub fn parse_line(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return Command::Submit(Some(line.to_string()));
    };
    let mut parts = rest.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match (name, arg) {
        ("samples", None) => Command::Samples,
        ("sample", Some(n)) => match n.parse::<usize>() {
            Ok(n) if (1..=SAMPLE_QUERIES.len()).contains(&n) => Command::Sample(n - 1),
            _ => Command::Invalid(format!(
                "sample number must be between 1 and {}",
                SAMPLE_QUERIES.len()
            )),
        },
        ("submit", None) => Command::Submit(None),
        ("url", url) => Command::Url(url.map(str::to_string)),
        ("status", None) => Command::Status,
        ("help", None) => Command::Help,
        ("quit" | "exit" | "q", None) => Command::Quit,
        _ => Command::Invalid(format!("unknown command: :{}", rest.trim())),
    }
}

/// Accumulate continued lines. A line ending in `\` is stored (with a newline in place
/// of the backslash) and `None` is returned; otherwise the full input is returned and
/// `pending` is left empty.
pub fn join_continued(pending: &mut String, line: String) -> Option<String> {
    if let Some(head) = line.strip_suffix('\\') {
        pending.push_str(head);
        pending.push('\n');
        return None;
    }
    if pending.is_empty() {
        return Some(line);
    }
    let mut full = std::mem::take(pending);
    full.push_str(&line);
    Some(full)
}

pub async fn run<S: RecommendationSource>(panel: Arc<QueryPanel<S>>) -> Result<(), AppError> {
    println!("Assessment recommendations. Backend: {}", panel.view().base_url);
    println!("Type :help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();
    let mut pending = String::new();

    loop {
        prompt(if pending.is_empty() { "> " } else { "... " })?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let Some(line) = join_continued(&mut pending, line) else {
            continue;
        };

        match parse_line(&line) {
            Command::Quit => break,
            Command::Help => print!("{HELP}"),
            Command::Samples => print!("{}", render_samples()),
            Command::Sample(index) => {
                if let Some(sample) = panel.select_sample(index) {
                    println!("Query set to: {sample}");
                    println!("Type :submit to search with it.");
                }
            }
            Command::Url(None) => println!("{}", panel.view().base_url),
            Command::Url(Some(url)) => match validate_api_url(&url) {
                Ok(()) => {
                    panel.set_base_url(&url);
                    println!("Backend set to {}", panel.view().base_url);
                }
                Err(e) => println!("{e}"),
            },
            Command::Status => {
                let view = panel.view();
                println!("query   : {}", view.query);
                println!("backend : {}", view.base_url);
                println!("state   : {:?}", view.state());
            }
            Command::Invalid(message) => println!("{message}"),
            Command::Submit(text) => {
                if let Some(text) = text {
                    panel.set_query(text);
                }
                let panel = Arc::clone(&panel);
                in_flight.spawn(async move {
                    let submission = panel.submit().await;
                    match submission {
                        Submission::Superseded => debug!("superseded result not shown"),
                        // An earlier request may still be loading; show the rejection itself.
                        Submission::Rejected => println!("{}", QueryError::Validation),
                        Submission::Applied => print!("{}", render_view(&panel.view())),
                    }
                });
            }
        }

        // Reap finished submissions so the set does not grow for the whole session.
        while let Some(joined) = in_flight.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "submission task failed");
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "submission task failed");
        }
    }
    Ok(())
}

fn prompt(text: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}
