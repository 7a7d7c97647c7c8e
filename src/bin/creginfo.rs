//! creginfo: determine information about a Windows 9x/Me Registry File
//! (CREG).

use creg_parser::{Codepage, CregFile, Key};
use std::env;
use std::process::ExitCode;

fn print_usage() {
    println!(
        "Use creginfo to determine information about a Windows 9x/Me\n\
         Registry File (CREG).\n\n\
         Usage: creginfo [ -c codepage ] [ -hHvV ] source\n\n\
         \tsource: the source file\n\n\
         \t-c:     codepage of ASCII strings, options: ascii, windows-874,\n\
         \t        windows-932, windows-936, windows-949, windows-950,\n\
         \t        windows-1250, windows-1251, windows-1252 (default),\n\
         \t        windows-1253, windows-1254, windows-1255, windows-1256,\n\
         \t        windows-1257 or windows-1258\n\
         \t-h:     shows this help\n\
         \t-H:     shows the key and value hierarchy\n\
         \t-v:     verbose output to stderr\n\
         \t-V:     print version"
    );
}

fn print_key_hierarchy(key: &Key, indentation_level: usize) -> creg_parser::Result<()> {
    let name = key.utf8_name()?;

    print!("{}", " ".repeat(indentation_level));
    if name.is_empty() {
        println!("(key:)");
    } else {
        println!("(key:) {}", name);
    }

    for value_index in 0..key.value_count()? {
        let value = key.value_by_index(value_index)?;
        let value_name = value.utf8_name()?;

        print!("{}", " ".repeat(indentation_level + 1));
        if value_name.is_empty() {
            println!("(value: {}) (default)", value_index);
        } else {
            println!("(value: {}) {}", value_index, value_name);
        }
    }

    for sub_key_index in 0..key.sub_key_count()? {
        let sub_key = key.sub_key_by_index(sub_key_index)?;
        print_key_hierarchy(&sub_key, indentation_level + 1)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let mut codepage = Codepage::default();
    let mut print_hierarchy = false;
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
            "-h" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-H" => print_hierarchy = true,
            "-v" => verbose = true,
            "-V" => {
                println!("creginfo {}", creg_parser::VERSION);
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

    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    println!("creginfo {}\n", creg_parser::VERSION);

    let result = (|| -> creg_parser::Result<()> {
        let file = CregFile::open(&source)?;
        file.set_ascii_codepage(codepage)?;

        let (major_version, minor_version) = file.format_version()?;

        println!("Windows 9x/Me Registry File information:");
        println!("\tVersion:\t{}.{}", major_version, minor_version);
        println!();

        if file.is_corrupted()? {
            println!("File is corrupted\n");
        }

        if print_hierarchy {
            println!("Key and value hierarchy:");
            let root_key = file.root_key()?;
            print_key_hierarchy(&root_key, 0)?;
            println!();
        }

        file.close()?;
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Unable to process source file: {}", error);
            ExitCode::FAILURE
        }
    }
}
