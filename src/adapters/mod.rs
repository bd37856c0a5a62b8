pub mod postgres;
pub mod yahoo;

pub use postgres::PostgresStore;
pub use yahoo::{parse_league_players, YahooClient, DEFAULT_YAHOO_API_BASE};
