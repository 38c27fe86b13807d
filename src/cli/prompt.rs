//! Interactive prompts.
//!
//! The pipeline never blocks on a human. The install command asks these
//! questions after a run has returned and released its locks.

use std::io::{BufRead, IsTerminal, Write};

/// Asks whether to install `package` despite a suitability rejection.
///
/// Without an interactive terminal the answer is no.
pub async fn confirm_override(package: &str, target: &str, alternatives: Option<&str>) -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }

    let mut question = format!("{} was flagged as unsuitable for the {} target", package, target);
    if let Some(alternatives) = alternatives {
        question.push_str(&format!(":\n  {}\n", alternatives));
    }
    question.push_str("\nInstall anyway? [y/N] ");

    let answer = tokio::task::spawn_blocking(move || read_answer(&question))
        .await
        .ok()
        .flatten();

    answer.as_deref().is_some_and(is_yes)
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Asks "Retry or Exit?" and returns true for Retry.
///
/// Without an interactive terminal the answer is Exit.
pub async fn ask_retry() -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }

    let answer = tokio::task::spawn_blocking(|| read_answer("Retry or Exit? [Retry/Exit] "))
        .await
        .ok()
        .flatten();

    answer.as_deref().is_some_and(is_retry)
}

fn is_retry(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("retry") || answer.eq_ignore_ascii_case("r")
}

fn read_answer(question: &str) -> Option<String> {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}", question);
    let _ = stdout.flush();

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes("YES"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_retry_answers() {
        assert!(is_retry("Retry\n"));
        assert!(is_retry("r"));
        assert!(!is_retry("Exit"));
        assert!(!is_retry(""));
    }

    #[tokio::test]
    async fn test_prompts_run_on_current_thread_runtime() {
        // Under `cargo test` stdin is not a terminal, so both answer "no"
        // without touching the blocking pool.
        if std::io::stdin().is_terminal() {
            return;
        }
        assert!(!confirm_override("foo", "mobile", Some("use libbar")).await);
        assert!(!ask_retry().await);
    }
}
