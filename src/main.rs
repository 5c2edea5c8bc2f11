//! Minimal line-oriented chat REPL against the Anima backend.
//!
//! Reads prompts from stdin, streams the assistant's reply to stdout as
//! deltas arrive. Ctrl+C cancels the in-flight turn instead of exiting.

use anima::client::AnimaClient;
use anima::conversation::{Conversation, TurnState};
use anima::transport::CancelToken;

use color_eyre::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let client = AnimaClient::from_env()?;

    if !client.health_check().await.unwrap_or(false) {
        eprintln!("warning: backend at {} is not responding", client.base_url());
    }

    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<String>();
    let mut conversation = Conversation::new().with_delta_channel(delta_tx);

    // Print deltas as they arrive, off the turn-driving task.
    let printer = tokio::spawn(async move {
        while let Some(delta) = delta_rx.recv().await {
            print!("{}", delta);
            let _ = std::io::stdout().flush();
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }

        let token = CancelToken::new();
        let ctrl_c_token = token.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c_token.cancel();
            }
        });

        let state = conversation
            .send_with_token(&client, &line, token)
            .await;
        ctrl_c.abort();

        match state {
            TurnState::Errored => {
                if let Some(error) = conversation.last_error() {
                    eprintln!("\nerror: {}", error);
                }
            }
            TurnState::Cancelled => println!("\n(cancelled)"),
            _ => println!(),
        }
    }

    drop(conversation);
    let _ = printer.await;
    Ok(())
}
