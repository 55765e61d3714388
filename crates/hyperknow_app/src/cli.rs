pub const USAGE: &str = "\
Usage:
  hyperknow_app [--user <id>] <query> [--books b1,b2] [--no-websearch] [--comments <text>]
  hyperknow_app [--user <id>] --resume
  hyperknow_app [--user <id>] --archive <conversation_id>
  hyperknow_app [--user <id>] --list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask {
        query: String,
        book_ids: Vec<String>,
        web_search: bool,
        comments: Option<String>,
    },
    Resume,
    Archive { conversation_id: String },
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub user_id: Option<String>,
}

pub fn parse_args(args: impl Iterator<Item = String>) -> Result<Invocation, String> {
    let mut user_id = None;
    let mut query_words: Vec<String> = Vec::new();
    let mut book_ids: Vec<String> = Vec::new();
    let mut web_search = true;
    let mut comments = None;
    let mut resume = false;
    let mut archive = None;
    let mut list = false;

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user_id = Some(required_value(&mut args, "--user")?),
            "--books" => {
                let value = required_value(&mut args, "--books")?;
                book_ids = value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(ToOwned::to_owned)
                    .collect();
            }
            "--no-websearch" => web_search = false,
            "--comments" => comments = Some(required_value(&mut args, "--comments")?),
            "--resume" => resume = true,
            "--archive" => archive = Some(required_value(&mut args, "--archive")?),
            "--list" => list = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown option {other}"));
            }
            word => query_words.push(word.to_string()),
        }
    }

    let query = query_words.join(" ");
    let command = match (resume, archive, list) {
        (true, None, false) => Command::Resume,
        (false, Some(conversation_id), false) => Command::Archive { conversation_id },
        (false, None, true) => Command::List,
        (false, None, false) => {
            if query.trim().is_empty() {
                return Err("missing query".to_string());
            }
            Command::Ask {
                query,
                book_ids,
                web_search,
                comments,
            }
        }
        _ => return Err("pick one of: a query, --resume, --archive, --list".to_string()),
    };

    Ok(Invocation { command, user_id })
}

fn required_value<I: Iterator<Item = String>>(args: &mut I, option: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{option} needs a value"))
}

#[cfg(test)]
mod tests {
    use super::{parse_args, Command};

    fn parse(line: &[&str]) -> Result<super::Invocation, String> {
        parse_args(line.iter().map(ToString::to_string))
    }

    #[test]
    fn bare_words_become_the_query() {
        let invocation = parse(&["Explain", "Neural", "Networks"]).unwrap();
        assert_eq!(
            invocation.command,
            Command::Ask {
                query: "Explain Neural Networks".to_string(),
                book_ids: Vec::new(),
                web_search: true,
                comments: None,
            }
        );
        assert_eq!(invocation.user_id, None);
    }

    #[test]
    fn books_split_on_commas() {
        let invocation =
            parse(&["--user", "u1", "quantum", "--books", "b1, b2,", "--no-websearch"]).unwrap();
        match invocation.command {
            Command::Ask {
                book_ids,
                web_search,
                ..
            } => {
                assert_eq!(book_ids, vec!["b1".to_string(), "b2".to_string()]);
                assert!(!web_search);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(invocation.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn archive_takes_a_conversation_id() {
        let invocation = parse(&["--archive", "abc123"]).unwrap();
        assert_eq!(
            invocation.command,
            Command::Archive {
                conversation_id: "abc123".to_string(),
            }
        );
    }

    #[test]
    fn empty_query_is_an_error() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--user", "u1"]).is_err());
    }

    #[test]
    fn conflicting_modes_are_rejected() {
        assert!(parse(&["--resume", "--list"]).is_err());
        assert!(parse(&["--unknown"]).is_err());
    }
}
