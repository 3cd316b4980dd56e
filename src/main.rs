use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nomad::{Answer, Config, Conversation, ImageInput, Pipeline, markdown};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "nomad", version, about = "Ask travel questions or identify landmarks in photos")]
struct Cli {
    /// Print responses as JSON instead of Markdown
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single question
    Ask {
        /// Travel question (may be empty when an image is given)
        #[arg(default_value = "")]
        query: String,
        /// Photo of a landmark or place
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Interactive session. `/image <path>` attaches a photo to the next question, `/quit` exits.
    Chat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nomad=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pipeline = Pipeline::from_config(&config)?;

    match cli.command {
        Command::Ask { query, image } => {
            if query.trim().is_empty() && image.is_none() {
                return Err("provide a question or --image".into());
            }
            let image = image.map(ImageInput::Path);
            let answer = pipeline.ask(&query, image.as_ref()).await;
            println!("{}", format_answer(&answer, cli.json)?);
        }
        Command::Chat => chat(&pipeline, cli.json).await?,
    }
    Ok(())
}

async fn chat<S, M>(
    pipeline: &Pipeline<S, M>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: nomad::search::SearchClient,
    M: nomad::llm::ChatModel,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut conversation = Conversation::new();
    let mut pending_image: Option<PathBuf> = None;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if line == "/quit" {
            break;
        }
        if let Some(path) = line.strip_prefix("/image") {
            let path = path.trim();
            if path.is_empty() {
                eprintln!("usage: /image <path>");
            } else {
                pending_image = Some(PathBuf::from(path));
                eprintln!("image attached; ask your question (or press enter)");
            }
            continue;
        }
        if line.is_empty() && pending_image.is_none() {
            continue;
        }

        let image = pending_image.take();
        let input = image.clone().map(ImageInput::Path);
        let answer = pipeline.ask(line, input.as_ref()).await;
        let exchange = conversation.record(line, image, answer);
        let rendered = format_answer(&exchange.answer, json)?;
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    info!(exchanges = conversation.len(), "chat ended");
    Ok(())
}

fn format_answer(answer: &Answer, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(answer)
    } else {
        Ok(markdown::render(answer))
    }
}
