//! edt-ics HTTP server binary
//!
//! Accepts timetable workbooks over HTTP and answers with .ics files.

use std::path::PathBuf;

use clap::Parser;
use edt_ics::api::{run_api_server, ApiConfig};
use edt_ics::config::ConverterConfig;

#[derive(Parser, Debug)]
#[command(name = "edt-ics-server")]
#[command(version)]
#[command(about = "edt-ics server - upload a timetable workbook, download an iCalendar file")]
#[command(long_about = r#"
edt-ics server - timetable workbooks to iCalendar over HTTP

Endpoints:
  - POST /api/v1/convert   - multipart upload, returns text/calendar
  - POST /api/v1/inspect   - multipart upload, returns the JSON report
  - GET  /health           - Health check
  - GET  /version          - Server version and active settings
  - GET  /                 - Endpoint list

Multipart fields:
  file    the workbook (.xlsx, .xlsm, .xls, .xlsb, .ods)
  sheet   sheet name to convert instead of EDT P1 / EDT P2 (repeatable)
  utc     "true" to write UTC timestamps

Responses of /api/v1/convert carry X-Events and X-Skipped-Rows headers.
A workbook without a timetable sheet is answered with 422.

Example usage:
  edt-ics-server                           # Start on localhost:8080
  edt-ics-server --host 0.0.0.0 --port 3000 --config edt.yaml

  curl -F file=@edt.xlsx http://localhost:8080/api/v1/convert -o edt.ics
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "EDT_ICS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "EDT_ICS_PORT")]
    port: u16,

    /// YAML configuration file
    #[arg(short, long, env = "EDT_ICS_CONFIG")]
    config: Option<PathBuf>,

    /// Largest accepted upload, in bytes
    #[arg(long, default_value_t = edt_ics::api::server::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let converter = ConverterConfig::load_or_default(args.config.as_deref())?;
    let config = ApiConfig {
        host: args.host,
        port: args.port,
        max_upload_bytes: args.max_upload_bytes,
    };

    run_api_server(config, converter).await
}
