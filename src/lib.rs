//! parlance, a small concurrent IRC server.
//!
//! # Usage
//!
//! ```console
//! parlance -o OPER_PASSWD [-c CONFIG_FILE] [-p PORT] [-s SERVERNAME] [-q | -v | -vv]
//! ```
//!
//! The configuration file is optional.  The git repository contains an example
//! `doc/parlance.conf`, with comments describing the different options.  Options given on the
//! command line take precedence over the configuration file.
//!
//! During development: `cargo run -- -o hunter2 -p 6667 -v`

#![forbid(unsafe_code)]
#![warn(clippy::all, rust_2018_idioms)]
#![allow(clippy::shadow_unrelated, clippy::use_self)]

pub use crate::client::{MessageQueueItem, User};
pub use crate::config::Config;
pub use crate::state::State;
use std::{env, process};

#[macro_use]
mod lines;
mod channel;
mod client;
pub mod config;
pub mod net;
mod reader;
mod state;
mod util;

/// The beginning of everything
pub fn start() {
    let args = config::Args::parse(env::args_os()).unwrap_or_else(|err| err.exit());

    let log_settings = env_logger::Env::new()
        .filter_or("PARLANCE_LOG", args.verbosity.filter())
        .write_style("PARLANCE_LOG_STYLE");
    env_logger::Builder::from_env(log_settings)
        .format(|buf, r| {
            use std::io::Write;
            writeln!(buf, "[{:<5} {}] {}", r.level(), r.target(), r.args())
        })
        .init();

    let mut cfg = match args.config_file {
        Some(ref path) => Config::from_file(path).unwrap_or_else(|err| {
            log::error!("Failed to read {:?}: {}", path, err);
            process::exit(1);
        }),
        None => Config::default(),
    };
    cfg.apply_args(&args);
    if let Err(err) = cfg.validate() {
        log::error!("Invalid configuration: {}", err);
        process::exit(1);
    }

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if cfg.workers != 0 {
        builder.worker_threads(cfg.workers);
    }
    let runtime = builder.build().unwrap_or_else(|err| {
        log::error!("Failed to start the tokio runtime: {}", err);
        process::exit(1);
    });

    log::info!("Starting {} as {}", server_version!(), cfg.state.domain);
    let listen = cfg.listen;
    let shared = State::new(cfg.state);

    runtime.block_on(async {
        tokio::spawn(net::listen(listen, shared));
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Interrupted, shutting down"),
            Err(err) => log::error!("Failed to listen for ctrl-c: {}", err),
        }
    });
}
