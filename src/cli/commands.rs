use crate::config::ConverterConfig;
use crate::converter::{list_sheets, sheet_file_name, Converter};
use crate::error::{ConvertError, ConvertResult};
use crate::excel::{is_recognized, TemplateWriter};
use crate::types::ConversionReport;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Options of the convert command
#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub input: PathBuf,
    /// Output file, output directory with `split`, or "-" for stdout
    pub output: Option<PathBuf>,
    pub split: bool,
    pub sheets: Vec<String>,
    pub config: Option<PathBuf>,
    pub utc: bool,
    pub verbose: bool,
}

fn is_stdout(path: &Option<PathBuf>) -> bool {
    path.as_deref() == Some(Path::new("-"))
}

fn load_config(path: Option<&Path>) -> ConvertResult<ConverterConfig> {
    ConverterConfig::load_or_default(path)
}

/// Execute the convert command
pub fn convert(args: ConvertArgs) -> ConvertResult<()> {
    let to_stdout = is_stdout(&args.output);
    if to_stdout && args.split {
        return Err(ConvertError::Config(
            "--split writes one file per sheet and cannot target stdout".to_string(),
        ));
    }

    // Keep stdout clean for the calendar when it is the output
    let mut log: Box<dyn Write> = if to_stdout {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    writeln!(log, "{}", "📅 EDT → iCalendar".bold().green())?;
    writeln!(log, "   Input: {}", args.input.display())?;

    let mut config = load_config(args.config.as_deref())?.with_sheets(args.sheets.clone());
    if args.utc {
        config.utc = true;
    }
    let converter = Converter::new(config)?;

    if args.verbose {
        writeln!(
            log,
            "   {} {}",
            "Looking for sheets:".cyan(),
            converter.config().sheets.join(", ")
        )?;
    }

    let conversion = converter.convert_file(&args.input)?;

    if to_stdout {
        io::stdout().write_all(conversion.calendar.as_bytes())?;
    } else if args.split {
        let dir = match &args.output {
            Some(dir) => dir.clone(),
            None => args
                .input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)?;
        }
        for (sheet, calendar) in converter.split(&conversion)? {
            let path = dir.join(sheet_file_name(&sheet));
            fs::write(&path, calendar)?;
            writeln!(log, "   Output: {}", path.display())?;
        }
    } else {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| args.input.with_extension("ics"));
        fs::write(&path, &conversion.calendar)?;
        writeln!(log, "   Output: {}", path.display())?;
    }

    writeln!(log)?;
    print_report(&mut log, &conversion.report, args.verbose)?;
    Ok(())
}

fn print_report(out: &mut dyn Write, report: &ConversionReport, verbose: bool) -> io::Result<()> {
    for sheet in &report.sheets {
        writeln!(
            out,
            "   {} {} events, {} rows skipped",
            format!("{}:", sheet.name).bright_blue(),
            sheet.events,
            sheet.skipped.len()
        )?;
        if verbose {
            for row in &sheet.skipped {
                writeln!(out, "      {} row {}: {}", "⚠".yellow(), row.row, row.reason)?;
            }
        }
    }

    let skipped = report.total_skipped();
    writeln!(
        out,
        "\n{} {} events written",
        "✅".green(),
        report.total_events().to_string().bold()
    )?;
    if skipped > 0 {
        writeln!(
            out,
            "{} {} rows skipped (missing date, time or subject){}",
            "⚠️ ".yellow(),
            skipped.to_string().bold(),
            if verbose { "" } else { ", use --verbose to list them" }
        )?;
    }
    Ok(())
}

/// Execute the sheets command: list the workbook's sheets
pub fn sheets(input: PathBuf, config: Option<PathBuf>) -> ConvertResult<()> {
    let config = load_config(config.as_deref())?;
    let bytes = fs::read(&input)?;
    let names = list_sheets(bytes)?;

    println!("{}", "📖 Sheets found".bold().green());
    println!("   File: {}\n", input.display());
    for name in &names {
        if is_recognized(name, &config.sheets) {
            println!("   {} {}", "✓".green(), name.bold());
        } else {
            println!("     {}", name.dimmed());
        }
    }

    if !names.iter().any(|n| is_recognized(n, &config.sheets)) {
        println!(
            "\n{} none of the sheets is a timetable (expected: {})",
            "⚠️ ".yellow(),
            config.sheets.join(", ")
        );
    }
    Ok(())
}

/// Execute the config command: print or save the default configuration
pub fn config(output: Option<PathBuf>) -> ConvertResult<()> {
    let yaml = ConverterConfig::default().to_yaml()?;
    match output {
        Some(path) => {
            fs::write(&path, yaml)?;
            println!("{} {}", "✅ Configuration written to".green(), path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

/// Execute the template command: write a blank timetable workbook
pub fn template(output: PathBuf, config: Option<PathBuf>) -> ConvertResult<()> {
    let config = load_config(config.as_deref())?;
    TemplateWriter::new(&config).write(&output)?;

    println!("{}", "✅ Template written".bold().green());
    println!("   File:   {}", output.display());
    println!("   Sheets: {}", config.sheets.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MalformedRow, SheetReport, SkipReason};

    #[test]
    fn test_is_stdout() {
        assert!(is_stdout(&Some(PathBuf::from("-"))));
        assert!(!is_stdout(&Some(PathBuf::from("out.ics"))));
        assert!(!is_stdout(&None));
    }

    #[test]
    fn test_split_to_stdout_rejected() {
        let err = convert(ConvertArgs {
            input: PathBuf::from("edt.xlsx"),
            output: Some(PathBuf::from("-")),
            split: true,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_print_report_counts() {
        colored::control::set_override(false);
        let report = ConversionReport {
            sheets_found: vec!["EDT P1".to_string()],
            sheets: vec![SheetReport {
                name: "EDT P1".to_string(),
                events: 4,
                skipped: vec![MalformedRow {
                    sheet: "EDT P1".to_string(),
                    row: 9,
                    reason: SkipReason::EmptySubject,
                }],
            }],
        };

        let mut out = Vec::new();
        print_report(&mut out, &report, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("EDT P1: 4 events, 1 rows skipped"));
        assert!(text.contains("row 9: empty subject"));
        assert!(text.contains("4 events written"));
        assert!(text.contains("1 rows skipped"));
    }
}
