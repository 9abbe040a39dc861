use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "alias-cli")]
#[command(about = "Management CLI for the alias dispatcher", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ALIAS_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show router status
    Status,
    /// List bindings, most recent first
    Bindings,
    /// Bind an alias template to a route template
    Bind { alias: String, route: String },
    /// Remove the binding for an alias
    Unbind { alias: String },
    /// Resolve an alias, or a route with --reverse
    Resolve {
        path: String,
        /// Treat PATH as a route and print its canonical alias
        #[arg(short, long)]
        reverse: bool,
    },
    /// Write the router cache now
    Flush,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let bindings_url = format!("{}/admin/bindings", cli.url);
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Bindings => client.get(bindings_url),
        Commands::Bind { alias, route } => client
            .post(bindings_url)
            .json(&json!({ "alias": alias, "route": route })),
        Commands::Unbind { alias } => client.delete(bindings_url).json(&json!({ "alias": alias })),
        Commands::Resolve { path, reverse } => {
            let param = if reverse { "route" } else { "alias" };
            client
                .get(format!("{}/admin/resolve", cli.url))
                .query(&[(param, path)])
        }
        Commands::Flush => client.post(format!("{}/admin/flush", cli.url)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
