use std::path::PathBuf;

use clap::Parser;
use time::macros::format_description;
use time::Date;

use crate::client::DEFAULT_BASE_URL;

/// Export Moves storylines for a range of days as a GPX track.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// First day to export, YYYY-MM-DD (default: today)
    #[arg(short, long, value_parser = parse_date)]
    pub start: Option<Date>,

    /// Last day to export, YYYY-MM-DD (default: today)
    #[arg(short, long, value_parser = parse_date)]
    pub end: Option<Date>,

    /// File to save the GPX to
    #[arg(short, long, default_value = "out.gpx")]
    pub output: PathBuf,

    /// Seconds to wait between API calls
    #[arg(short, long, default_value_t = 0)]
    pub wait: u64,

    /// Config file holding the OAuth credentials
    #[arg(short, long, default_value = "config.ini")]
    pub config: PathBuf,

    /// Name of the track in the GPX file
    #[arg(short, long, default_value = "output")]
    pub track_name: String,

    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    pub api_base_url: String,
}

pub fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
