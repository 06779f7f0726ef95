//! Asking the operator yes/no questions.

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tracing::debug;

/// Something that can answer a yes/no question.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, question: &str) -> bool;
}

/// Asks on the terminal. Anything but `y`/`yes` is a no, so is a closed stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, question: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        let prompt = format!("\n{question} (y/n): ");
        if let Err(e) = stdout.write_all(prompt.as_bytes()).await {
            debug!("Failed to write prompt: {e}");
        }
        if let Err(e) = stdout.flush().await {
            debug!("Failed to flush prompt: {e}");
        }

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut answer).await {
            Ok(0) => {
                debug!("Stdin closed, treating as no.");
                false
            }
            Ok(_) => is_yes(&answer),
            Err(e) => {
                debug!("Failed to read answer: {e}");
                false
            }
        }
    }
}

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, question: &str) -> bool {
        debug!("Answering '{question}' with {}", self.0);
        self.0
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
