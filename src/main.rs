use clap::Parser;
use iron::Iron;
use log::{error, info};
use logger::Logger;

use posts::config::Config;
use posts::handlers::*;
use posts::store::PostStore;

// RUST_LOG=debug posts --port 5002
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();
    let (logger_before, logger_after) = Logger::new(None);

    let mut chain = app(PostStore::seeded());
    chain.link_before(logger_before); // Should be first!
    chain.link_after(logger_after); // Should be last!

    let address = config.address();
    match Iron::new(chain).http(address.as_str()) {
        Ok(_) => info!("listening on {}", address),
        Err(e) => {
            error!("could not listen on {}: {}", address, e);
            std::process::exit(1);
        }
    }
}
