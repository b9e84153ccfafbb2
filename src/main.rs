use clap::{Parser, Subcommand};
use edt_ics::cli::{self, ConvertArgs};
use edt_ics::error::ConvertResult;
use edt_ics::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edt-ics")]
#[command(about = "Convert a spreadsheet class schedule into an iCalendar (.ics) file.")]
#[command(long_about = "edt-ics - timetable spreadsheets to iCalendar

Reads the \"EDT P1\" and \"EDT P2\" sheets of a schedule workbook and writes
one calendar event per row (date, start, end, subject, teachers, groups).

COMMANDS:
  convert   - Convert a workbook to .ics
  sheets    - List the sheets of a workbook
  config    - Print the default configuration (YAML)
  template  - Write a blank timetable workbook

EXAMPLES:
  edt-ics convert edt.xlsx                     # writes edt.ics
  edt-ics convert edt.xlsx -o - > edt.ics      # calendar on stdout
  edt-ics convert edt.xlsx --split -o out/     # one .ics per sheet
  edt-ics convert edt.xlsx --sheet \"Semestre 1\"
  edt-ics config -o edt.yaml                   # then edit column layout")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Convert a timetable workbook to an iCalendar file.

Each row of the recognized sheets becomes one event. Rows without a date,
a start or end time, or a subject are skipped and counted; they never stop
the conversion. If no recognized sheet exists, nothing is written.

COLUMNS:
  A header row (Date, Heure Début, Heure Fin, Matière, Enseignant, Groupe)
  is detected in the first rows. Without one, columns are read by position
  in that order. Use --config to change names or positions.

Use --utc to write UTC timestamps instead of Europe/Paris local times.")]
    /// Convert a timetable workbook to .ics
    Convert {
        /// Path to the workbook (.xlsx, .xlsm, .xls, .xlsb, .ods)
        input: PathBuf,

        /// Output .ics file ("-" for stdout), or directory with --split
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write one .ics file per sheet
        #[arg(long)]
        split: bool,

        /// Sheet name to convert instead of EDT P1 / EDT P2 (repeatable)
        #[arg(short, long = "sheet")]
        sheets: Vec<String>,

        /// YAML configuration file
        #[arg(short, long, env = "EDT_ICS_CONFIG")]
        config: Option<PathBuf>,

        /// Write UTC timestamps
        #[arg(long)]
        utc: bool,

        /// Show verbose output (lists skipped rows)
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the sheets of a workbook, marking timetable sheets
    Sheets {
        /// Path to the workbook
        input: PathBuf,

        /// YAML configuration file
        #[arg(short, long, env = "EDT_ICS_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as YAML
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a blank timetable workbook with the expected headers
    Template {
        /// Output workbook path (.xlsx)
        output: PathBuf,

        /// YAML configuration file
        #[arg(short, long, env = "EDT_ICS_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> ConvertResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            split,
            sheets,
            config,
            utc,
            verbose,
        } => {
            logging::init(logging::cli_filter(verbose));
            cli::convert(ConvertArgs {
                input,
                output,
                split,
                sheets,
                config,
                utc,
                verbose,
            })
        }

        Commands::Sheets { input, config } => {
            logging::init(logging::cli_filter(false));
            cli::sheets(input, config)
        }

        Commands::Config { output } => cli::config(output),

        Commands::Template { output, config } => cli::template(output, config),
    }
}
