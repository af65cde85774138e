use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod metadata;
pub mod storage;

fn main() {
    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
