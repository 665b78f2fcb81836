use clap::Parser;

/// HTTP JSON service for a small collection of posts
#[derive(Debug, Parser)]
#[command(name = "posts", version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "POSTS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "POSTS_PORT", default_value_t = 5002)]
    pub port: u16,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
