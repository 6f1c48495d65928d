//! `sitecost chat`: the FAQ assistant in the terminal.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::chat::{Chatbot, QUICK_REPLIES, ReplyDelay};

/// Answer one question, or run an interactive session when `text` is empty.
pub async fn run_chat_command(text: &str, no_delay: bool) -> anyhow::Result<()> {
    let mut bot = Chatbot::default();
    if no_delay {
        bot = bot.with_delay(ReplyDelay::none());
    }

    let text = text.trim();
    if !text.is_empty() {
        // ThreadRng is not Send; pick the delay before awaiting.
        let delay = bot.delay().typed(&mut rand::thread_rng());
        answer(&bot, text, delay).await;
        return Ok(());
    }

    println!("Ask about costs, timelines, materials or permits. Type 'exit' to quit.");
    print_suggestions();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let (message, delay) = match quick_reply(line) {
            Some(suggestion) => {
                println!("{}", suggestion);
                (suggestion, bot.delay().quick())
            }
            None => (line, bot.delay().typed(&mut rand::thread_rng())),
        };
        answer(&bot, message, delay).await;
    }
    Ok(())
}

fn print_suggestions() {
    println!("Or pick a question:");
    for (i, suggestion) in QUICK_REPLIES.iter().enumerate() {
        println!("  {}. {}", i + 1, suggestion);
    }
    println!();
}

/// A 1-based suggestion number picks that quick reply.
fn quick_reply(input: &str) -> Option<&'static str> {
    let index = input.parse::<usize>().ok()?.checked_sub(1)?;
    QUICK_REPLIES.get(index).copied()
}

async fn answer(bot: &Chatbot, message: &str, delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    println!("{}", bot.respond(message).text());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ResponseCategory;

    #[test]
    fn test_quick_reply_numbers() {
        assert_eq!(quick_reply("1"), Some(QUICK_REPLIES[0]));
        assert_eq!(quick_reply("5"), Some(QUICK_REPLIES[4]));
        assert_eq!(quick_reply("0"), None);
        assert_eq!(quick_reply("6"), None);
        assert_eq!(quick_reply("how long?"), None);
    }

    #[test]
    fn test_quick_replies_are_understood() {
        let bot = Chatbot::default();
        for suggestion in QUICK_REPLIES {
            assert_ne!(bot.respond(suggestion).category, ResponseCategory::Fallback, "{}", suggestion);
        }
    }

    #[tokio::test]
    async fn test_single_question_without_delay() {
        run_chat_command("what permits do I need?", true).await.unwrap();
    }
}
