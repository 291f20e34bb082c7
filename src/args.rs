use clap::{error::ErrorKind, Parser};

#[derive(Parser, Debug)]
#[command(name = "dota2-match-browser")]
pub struct Args {
    pub port: u16,
    #[arg(long, env = "DATABASE_URL", default_value = "http://127.0.0.1:8123")]
    pub database_url: String,
    #[arg(long, env = "DB_USERNAME")]
    pub database_user: Option<String>,
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub database_password: Option<String>,
    #[arg(long, env = "DB_NAME", default_value = "dota2")]
    pub database_name: String,
    #[arg(long, env = "DB_COLLECTION", default_value = "matches")]
    pub collection: String,
    #[arg(long, default_value = crate::client::Client::URL_OPENDOTA)]
    pub api_url: String,
    #[arg(long)]
    pub proxy: Option<String>,
    /// milliseconds between two match requests of a save batch
    #[arg(long, default_value_t = 1000)]
    pub dispatch_interval: u64,
}

impl Args {
    pub const USAGE: &'static str = "Command syntax: dota2-match-browser <port number>";

    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                err.exit()
            }
            Err(err) => {
                log::debug!("argument error: {}", err);
                println!("{}", Self::USAGE);
                std::process::exit(1);
            }
        }
    }
}
