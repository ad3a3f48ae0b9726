pub mod aggregate;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod records;
pub mod registry;
pub mod server;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
