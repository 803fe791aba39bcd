use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Arg, Command};

fn output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{stem}-cleaned.js"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("jscleaner")
        .about("Rewrites string-array obfuscated JavaScript into readable source")
        .arg(
            Arg::new("input")
                .help("Path to the obfuscated .js file")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .get_matches();

    let input = PathBuf::from(matches.get_one::<String>("input").expect("required arg"));
    if input.extension().and_then(|ext| ext.to_str()) != Some("js") {
        log::error!("unsupported extension: {}", input.display());
        process::exit(1);
    }

    let source = match fs::read_to_string(&input) {
        Ok(source) => source,
        Err(err) => {
            log::error!("cannot read {}: {err}", input.display());
            process::exit(1);
        }
    };

    match jscleaner::optimize(&source) {
        Ok(cleaned) => {
            let output = output_path(&input);
            if let Err(err) = fs::write(&output, cleaned) {
                log::error!("cannot write {}: {err}", output.display());
                process::exit(1);
            }
            log::info!("wrote {}", output.display());
        }
        Err(err) => {
            log::error!("{err}");
            process::exit(1);
        }
    }
}
