//! `lexo practice`: an offline round on stdin.

use std::{
    collections::BTreeSet,
    io::{self, Write},
    path::Path,
    time::Duration,
};

use lexo_client::{AcceptAll, Lexicon, PracticeSession, PracticeSummary};
use lexo_core::{Environment, SystemEnv, engine};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::{
    CliError,
    args::PracticeArgs,
    commands::{self, Command},
    render,
};

/// Play one practice round on the terminal.
pub async fn run(args: &PracticeArgs) -> Result<PracticeSummary, CliError> {
    let env = SystemEnv;
    let seed = args.seed.unwrap_or_else(|| env.random_u64());
    info!(seed, "starting practice round");
    let rng = StdRng::seed_from_u64(seed);
    let input = BufReader::new(tokio::io::stdin());
    let mut out = io::stdout();

    match &args.words {
        Some(path) => {
            let lexicon = load_lexicon(path)?;
            let session = PracticeSession::new(args.config(), lexicon, rng, env.wall_clock_ms());
            play(session, &env, input, &mut out).await
        },
        None => {
            let session = PracticeSession::new(args.config(), AcceptAll, rng, env.wall_clock_ms());
            play(session, &env, input, &mut out).await
        },
    }
}

/// Read a newline-separated word list.
pub fn load_lexicon(path: &Path) -> Result<BTreeSet<String>, CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| CliError::Lexicon { path: path.to_path_buf(), source })?;
    Ok(contents
        .lines()
        .map(engine::normalize)
        .filter(|word| !word.is_empty())
        .collect())
}

/// Drive `session` from `input` until time runs out, input ends, or the
/// player quits.
pub async fn play<L, R, E, I, W>(
    mut session: PracticeSession<L, R>,
    env: &E,
    input: I,
    out: &mut W,
) -> Result<PracticeSummary, CliError>
where
    L: Lexicon,
    R: Rng,
    E: Environment,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "make words from the pool; /quit to stop")?;
    let mut lines = input.lines();

    loop {
        let left = session.remaining(env.wall_clock_ms());
        if left == 0 {
            writeln!(out, "time is up")?;
            break;
        }
        writeln!(out, "[{left}s] {} | score {}", render::pool(session.pool()), session.total())?;

        let wait = Duration::from_secs(u64::from(left));
        let Ok(line) = tokio::time::timeout(wait, lines.next_line()).await else {
            continue;
        };
        let Some(line) = line? else { break };

        match commands::parse(&line) {
            Command::Quit => break,
            Command::Word { text } => match session.submit(&text, env.wall_clock_ms()) {
                Ok(word) => writeln!(out, "+{} {}", word.score, word.text)?,
                Err(error) => writeln!(out, "error: {error}")?,
            },
            _ => writeln!(out, "only words and /quit work in practice")?,
        }
    }

    let summary = session.finish();
    writeln!(out, "{} words, {} points", summary.words.len(), summary.total)?;
    if let Some(best) = &summary.best {
        writeln!(out, "best: {} ({})", best.text, best.score)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use lexo_client::PracticeConfig;

    use super::*;

    fn session() -> PracticeSession<AcceptAll, StdRng> {
        PracticeSession::new(
            PracticeConfig::default(),
            AcceptAll,
            StdRng::seed_from_u64(3),
            SystemEnv.wall_clock_ms(),
        )
    }

    #[tokio::test]
    async fn plays_until_quit() {
        let session = session();
        let word: String = session.pool()[..2].iter().collect();
        let input = format!("{word}\n{word}\nq\n/join\n/quit\n{word}\n");
        let mut out = Vec::new();

        let summary = play(session, &SystemEnv, input.as_bytes(), &mut out).await.unwrap();

        assert_eq!(summary.words.len(), 1);
        assert_eq!(summary.best.map(|w| w.text), Some(word));
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("has already been played"));
        assert!(printed.contains("at least 2 letters"));
        assert!(printed.contains("only words and /quit"));
        let best = &summary.words[0];
        let tail = format!("1 words, {} points\nbest: {} ({})\n", summary.total, best.text, best.score);
        assert!(printed.ends_with(&tail));
    }

    #[tokio::test]
    async fn end_of_input_closes_the_round() {
        let mut out = Vec::new();
        let summary = play(session(), &SystemEnv, &b""[..], &mut out).await.unwrap();

        assert!(summary.words.is_empty());
        assert_eq!(summary.total, 0);
        assert!(String::from_utf8(out).unwrap().ends_with("0 words, 0 points\n"));
    }

    #[test]
    fn word_list_is_normalized() {
        let path = std::env::temp_dir().join(format!("lexo-words-{}.txt", std::process::id()));
        std::fs::write(&path, "Kalem\n  test \n\nBAT\n").unwrap();

        let lexicon = load_lexicon(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(lexicon.into_iter().collect::<Vec<_>>(), vec!["bat", "kalem", "test"]);
    }

    #[test]
    fn missing_word_list_names_the_file() {
        let error = load_lexicon(Path::new("/nonexistent/lexo/words.txt")).unwrap_err();
        assert!(error.to_string().contains("/nonexistent/lexo/words.txt"));
    }
}
