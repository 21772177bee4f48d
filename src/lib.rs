#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;

pub use config::Config;
use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;
use store::SharedStore;

/// Build a server whose record store is chosen from the configuration at ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(LoggerFairing)
}

/// Build a server over an existing record store.
pub fn rocket_for_store(store: SharedStore) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .manage(store)
        .attach(LoggerFairing)
}
