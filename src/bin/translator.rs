//! MT → MX Translator - CLI tool for converting SWIFT MT messages to
//! ISO 20022 XML.

use clap::Parser;
use std::fs::{self, File};
use std::io::{self, Read};
use swiftmx::{MappingConfig, MtParser, MtSchema, MtValidator, MxMapper, Result, ValidationConfig};

#[derive(Parser)]
#[command(name = "mtmx_translator")]
#[command(about = "Translate SWIFT MT messages (MT103, MT202) to ISO 20022 XML", long_about = None)]
struct Cli {
    /// Field schema configuration (JSON)
    #[arg(long)]
    schema: String,

    /// Mapping rule configuration (JSON)
    #[arg(long)]
    mapping: String,

    /// Validation rule configuration (JSON)
    #[arg(long)]
    validation: Option<String>,

    /// Input MT file (or stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Output XML file (or stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Validate only; do not produce XML
    #[arg(long)]
    check: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let schema = MtSchema::from_json(&fs::read_to_string(&cli.schema)?)?;
    let mapping = MappingConfig::from_json(&fs::read_to_string(&cli.mapping)?)?;
    let validator = match &cli.validation {
        Some(path) => Some(MtValidator::new(ValidationConfig::from_json(
            &fs::read_to_string(path)?,
        )?)),
        None => None,
    };

    let raw = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let message = MtParser::new(schema).parse(&raw)?;

    let mut violation_count = 0;
    if let Some(ref validator) = validator {
        for violation in validator.validate(&message) {
            eprintln!("violation: {}", violation);
            violation_count += 1;
        }
    }
    if cli.check {
        if violation_count > 0 {
            std::process::exit(2);
        }
        return Ok(());
    }

    let tree = MxMapper::new(mapping).map(&message);

    if let Some(ref path) = cli.output {
        let mut file = File::create(path)?;
        tree.write_to(&mut file)?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        tree.write_to(&mut handle)?;
    }

    Ok(())
}
