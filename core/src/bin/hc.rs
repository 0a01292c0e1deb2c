use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use http_proxy::{load_config, logging, ContentType, Cookie, HttpProxy, Options, ProxyError};

#[derive(Parser)]
#[command(name = "hc")]
#[command(about = "Send requests through a pooled HTTP client.")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = "hc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// GET a URL, merging parameters into its query string
    Get(RequestArgs),
    /// POST parameters as a JSON (default) or form body
    Post {
        #[command(flatten)]
        request: RequestArgs,

        /// Encode parameters as application/x-www-form-urlencoded
        #[arg(long)]
        form: bool,
    },
    /// Upload a file as a multipart form field
    Upload {
        url: String,
        field: String,
        file: PathBuf,
    },
    /// PUT a file's bytes with a content type taken from its extension
    Put { url: String, file: PathBuf },
}

#[derive(Args)]
struct RequestArgs {
    url: String,

    /// Parameter as name=value
    #[arg(short, long = "param", value_parser = parse_pair::<'='>)]
    params: Vec<(String, String)>,

    /// Header as name:value
    #[arg(short = 'H', long = "header", value_parser = parse_pair::<':'>)]
    headers: Vec<(String, String)>,

    /// Cookie as name=value
    #[arg(short = 'b', long = "cookie", value_parser = parse_pair::<'='>)]
    cookies: Vec<(String, String)>,
}

impl RequestArgs {
    fn into_options(self, content_type: ContentType) -> Result<Options, ProxyError> {
        Options::builder()
            .uri(self.url)
            .parameters(self.params)
            .headers(self.headers)
            .cookies(self.cookies.into_iter().map(|(name, value)| Cookie::new(name, value)))
            .content_type(content_type)
            .build()
    }
}

fn parse_pair<const SEP: char>(raw: &str) -> Result<(String, String), String> {
    raw.split_once(SEP)
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected NAME{SEP}VALUE, got {raw:?}"))
}

fn run(cli: Cli) -> Result<String, ProxyError> {
    let config = load_config(&cli.config)?;
    logging::init(&config.logging)?;
    let proxy = HttpProxy::from_config(&config)?;

    match cli.command {
        Command::Get(request) => proxy.get(request.into_options(ContentType::Json)?),
        Command::Post { request, form } => {
            let content_type = if form {
                ContentType::FormUrlEncoded
            } else {
                ContentType::Json
            };
            proxy.post(request.into_options(content_type)?)
        }
        Command::Upload { url, field, file } => proxy.upload_multipart(&url, &field, file),
        Command::Put { url, file } => proxy.upload_put(&url, file),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(body) => {
            println!("{body}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
