use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone)]
pub struct Config {
    #[clap(env, long)]
    pub environment: String,

    #[clap(env, long, default_value = "3000")]
    pub port: u16,

    #[clap(env, long, default_value = "http://localhost:8080")]
    pub origin_urls: String,

    #[clap(env, long, default_value = "seeds/restaurants.json")]
    pub seed_feed_path: PathBuf,

    #[clap(env, long, default_value = "")]
    pub google_api_key: String,
}
