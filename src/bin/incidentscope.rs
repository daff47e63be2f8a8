use clap::Parser;
use incidentscope::incident::analyze_incident_tagged;
use incidentscope::ollama::{OllamaClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::fs;
use std::io::{self, Read};

#[derive(Parser, Debug)]
#[command(name = "incidentscope", version, about = "Incident analysis for application logs")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Upgrade the heuristic summary with a narrative from a local Ollama
    /// instance (best effort; silently skipped when unreachable)
    #[arg(long = "llm", default_value_t = false)]
    llm: bool,

    /// Ollama base URL
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Ollama model name
    #[arg(long = "model", default_value = DEFAULT_MODEL)]
    model: String,

    /// Correlation token stored on the analysis output
    #[arg(long = "token", default_value_t = 0)]
    token: u64,

    /// Force pretty-printed JSON even when stdout is not a terminal
    #[arg(long = "pretty", default_value_t = false)]
    pretty: bool,
}

fn read_input(paths: &[String]) -> io::Result<String> {
    let mut buf = String::new();
    if paths.is_empty() {
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    for p in paths {
        if p == "-" {
            io::stdin().read_to_string(&mut buf)?;
        } else {
            buf.push_str(&fs::read_to_string(p)?);
        }
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
    }
    Ok(buf)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let text = read_input(&cli.input)?;
    let entries = incidentscope::parser::parse(&text);
    let mut analysis = analyze_incident_tagged(&entries, cli.token);

    if cli.llm {
        let client = OllamaClient::new(cli.base_url, cli.model);
        analysis.llm_summary = client.summarize_incident(&analysis).await;
    }

    let out = if cli.pretty || atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string(&analysis)?
    };
    println!("{out}");
    Ok(())
}
