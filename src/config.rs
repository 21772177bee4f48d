use std::sync::Arc;

use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::{
    model::db::Settings,
    store::{MemoryStore, MongoStore, SharedStore},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    initial_voting_open: bool,
    #[serde(default)]
    require_registration: bool,
}

impl Config {
    /// Whether voting starts open on a fresh database.
    pub fn initial_voting_open(&self) -> bool {
        self.initial_voting_open
    }

    /// Whether votes are only accepted from pre-registered codes.
    pub fn require_registration(&self) -> bool {
        self.require_registration
    }

    /// Settings to seed a store with if it has none yet.
    pub fn initial_settings(&self) -> Settings {
        Settings {
            voting_open: self.initial_voting_open,
            require_registration: self.require_registration,
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: Option<String>,
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
}

fn default_db_name() -> String {
    "carshow".to_string()
}

/// A fairing that connects to the record store and places it into managed
/// state as a [`SharedStore`].
///
/// Without a `db_uri` the server runs over an empty in-memory store, which is
/// lost on shutdown. Must be attached after [`ConfigFairing`].
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "Record store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let initial = match rocket.state::<Config>() {
            Some(app_config) => app_config.initial_settings(),
            None => {
                error!("Application config must be loaded before the record store");
                return Err(rocket);
            }
        };

        let store: SharedStore = match config.db_uri {
            Some(db_uri) => {
                info!("Loaded database config, connecting...");
                // Construct the connection.
                let client = match MongoClient::with_uri_str(db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(&config.db_name);
                // Ensure indexes and the settings document exist.
                match MongoStore::connect(client, db, initial).await {
                    Ok(store) => {
                        info!("...database connection online!");
                        Arc::new(store)
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
            None => {
                warn!("No `db_uri` configured; records will be kept in memory only");
                Arc::new(MemoryStore::new(initial))
            }
        };

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}
