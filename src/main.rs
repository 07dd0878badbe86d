use clap::Parser;
use sheetmodel::definition;
use sheetmodel::writer::{self, OutputFormat};
use sheetmodel::{Error, ExportOptions, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetmodel")]
#[command(version, about = "Build a financial model from a definition file and export it")]
pub struct Args {
    /// Model definition (.json or .toml)
    pub input: PathBuf,

    /// Write the model to this xlsx file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print every scenario sheet to stdout
    #[arg(short, long)]
    pub print: bool,

    /// Dump every sheet's evaluated values as CSV into this directory
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// CSV flavour
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Value for empty cells in CSV output
    #[arg(short, long, default_value = "")]
    pub empty: String,

    /// Author recorded in the xlsx document properties
    #[arg(long, default_value = "sheetmodel")]
    pub creator: String,

    /// Scenario header fill as hex RGB
    #[arg(long, default_value = "1B3A5C", value_parser = parse_color)]
    pub header_color: u32,

    /// Print detailed progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_color(s: &str) -> std::result::Result<u32, String> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("expected six hex digits, got {:?}", s));
    }
    u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<()> {
    if !args.print && args.csv.is_none() && args.output.is_none() {
        return Err(Error::NothingToDo);
    }

    if args.verbose {
        eprintln!("reading: {:?}", args.input);
    }

    let definition = definition::open_definition(&args.input)?;
    let mut model = definition.build()?;

    if args.verbose {
        let names: Vec<&str> = model.sheets().iter().map(|s| s.name()).collect();
        eprintln!("sheets: {}", names.join(", "));
        eprintln!("names: {}", model.names().len());
    }

    if args.print {
        let scenario_sheets: Vec<String> = model
            .sheets()
            .iter()
            .filter(|s| s.is_scenario())
            .map(|s| s.name().to_string())
            .collect();
        for sheet in &scenario_sheets {
            println!("{}", sheet);
            model.print_scenarios(sheet)?;
        }
    }

    if let Some(dir) = &args.csv {
        std::fs::create_dir_all(dir)?;
        let config = writer::CsvConfig {
            format: args.format,
            empty_value: args.empty.clone(),
        };
        let sheet_names: Vec<String> = model.sheets().iter().map(|s| s.name().to_string()).collect();
        for sheet in &sheet_names {
            let file_path = dir.join(format!("{}.csv", sheet));
            if args.verbose {
                eprintln!("output: {:?}", file_path);
            }
            let file = std::fs::File::create(&file_path)?;
            writer::write_evaluated_sheet(&mut model, sheet, file, &config)?;
        }
    }

    if let Some(path) = &args.output {
        let options = ExportOptions {
            creator: args.creator.clone(),
            header_color: args.header_color,
        };
        let written = model.export_xlsx(path, &options)?;
        if args.verbose {
            eprintln!("output: {:?}", written);
        }
    }

    Ok(())
}
