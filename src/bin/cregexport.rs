//! cregexport: export the keys and values of a Windows 9x/Me Registry
//! File (CREG).

use creg_parser::{Codepage, CregFile, Key, ValueType};
use std::env;
use std::fs::File;
use std::process::ExitCode;

fn print_usage() {
    println!(
        "Use cregexport to export the keys and values of a Windows 9x/Me\n\
         Registry File (CREG).\n\n\
         Usage: cregexport [ -c codepage ] [ -K key_path ] [ -l logfile ]\n\
         \x20                 [ -hvV ] source\n\n\
         \tsource: the source file\n\n\
         \t-c:     codepage of ASCII strings, options: ascii, windows-874,\n\
         \t        windows-932, windows-936, windows-949, windows-950,\n\
         \t        windows-1250, windows-1251, windows-1252 (default),\n\
         \t        windows-1253, windows-1254, windows-1255, windows-1256,\n\
         \t        windows-1257 or windows-1258\n\
         \t-K:     exports the sub keys and values of the key at the path,\n\
         \t        e.g. Software\\Microsoft\n\
         \t-h:     shows this help\n\
         \t-l:     logs verbose output to the log file\n\
         \t-v:     verbose output to stderr\n\
         \t-V:     print version"
    );
}

/// Renders a value's data the way regedit-style exports do.
fn render_value_data(value: &creg_parser::Value) -> creg_parser::Result<String> {
    match value.value_type()? {
        ValueType::None => Ok(String::from("(none)")),
        ValueType::String | ValueType::ExpandString | ValueType::Link => value.utf8_string(),
        ValueType::MultiString => {
            let decoded = value.utf8_string()?;
            Ok(decoded
                .split('\0')
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "))
        }
        ValueType::Dword | ValueType::DwordBigEndian => {
            let data = value.as_u32()?;
            Ok(format!("{} (0x{:08x})", data, data))
        }
        ValueType::Qword => {
            let data = value.as_u64()?;
            Ok(format!("{} (0x{:016x})", data, data))
        }
        ValueType::Binary | ValueType::Unknown(_) => {
            Ok(format!("0x{}", hex::encode(value.data()?)))
        }
    }
}

fn export_key(key: &Key, key_path: &str) -> creg_parser::Result<()> {
    println!("[{}]", if key_path.is_empty() { "\\" } else { key_path });

    for value_index in 0..key.value_count()? {
        let value = key.value_by_index(value_index)?;
        let value_name = value.utf8_name()?;
        let type_name = value.value_type()?.name();
        let rendered = render_value_data(&value)?;

        if value_name.is_empty() {
            println!("(default) ({}) = {}", type_name, rendered);
        } else {
            println!("{} ({}) = {}", value_name, type_name, rendered);
        }
    }

    println!();

    for sub_key_index in 0..key.sub_key_count()? {
        let sub_key = key.sub_key_by_index(sub_key_index)?;
        let sub_key_path = format!("{}\\{}", key_path, sub_key.utf8_name()?);
        export_key(&sub_key, &sub_key_path)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let mut codepage = Codepage::default();
    let mut key_path: Option<String> = None;
    let mut log_file: Option<String> = None;
    let mut verbose = false;
    let mut source: Option<String> = None;

    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => {
                let Some(option) = args.next() else {
                    eprintln!("Missing argument for option: -c");
                    print_usage();
                    return ExitCode::FAILURE;
                };
                match Codepage::from_option_string(&option) {
                    Some(parsed) => codepage = parsed,
                    None => {
                        eprintln!(
                            "Unsupported codepage: {}, defaulting to windows-1252",
                            option
                        );
                    }
                }
            }
            "-K" => {
                let Some(path) = args.next() else {
                    eprintln!("Missing argument for option: -K");
                    print_usage();
                    return ExitCode::FAILURE;
                };
                key_path = Some(path);
            }
            "-l" => {
                let Some(path) = args.next() else {
                    eprintln!("Missing argument for option: -l");
                    print_usage();
                    return ExitCode::FAILURE;
                };
                log_file = Some(path);
            }
            "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-v" => verbose = true,
            "-V" => {
                println!("cregexport {}", creg_parser::VERSION);
                return ExitCode::SUCCESS;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unsupported option: {}", arg);
                print_usage();
                return ExitCode::FAILURE;
            }
            _ => source = Some(arg),
        }
    }

    let Some(source) = source else {
        eprintln!("Missing source file.");
        print_usage();
        return ExitCode::FAILURE;
    };

    if let Some(log_path) = &log_file {
        match File::create(log_path) {
            Ok(log) => {
                tracing_subscriber::fmt()
                    .with_max_level(tracing::Level::DEBUG)
                    .with_writer(std::sync::Arc::new(log))
                    .with_ansi(false)
                    .init();
            }
            Err(error) => {
                eprintln!("Unable to open log file: {}", error);
                return ExitCode::FAILURE;
            }
        }
    } else if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = (|| -> creg_parser::Result<()> {
        let file = CregFile::open(&source)?;
        file.set_ascii_codepage(codepage)?;

        match &key_path {
            Some(path) => match file.key_by_utf8_path(path)? {
                Some(key) => export_key(&key, path.trim_end_matches('\\'))?,
                None => {
                    return Err(creg_parser::CregError::not_found("key", path));
                }
            },
            None => {
                let root_key = file.root_key()?;
                export_key(&root_key, "")?;
            }
        }

        file.close()?;
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Unable to export source file: {}", error);
            ExitCode::FAILURE
        }
    }
}
